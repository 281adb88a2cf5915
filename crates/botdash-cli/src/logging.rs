use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Default filter: command progress only. Poller diagnostics are opt-in via
/// `RUST_LOG` (e.g. `RUST_LOG=botdash_poller=debug`).
const DEFAULT_FILTER: &str = "error,botdash_cli=info";

/// Install the global tracing subscriber. Logs go to stderr so they never mix
/// with table output on stdout.
pub fn init(json: bool) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        let filter = EnvFilter::try_new(DEFAULT_FILTER).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("botdash_cli=info"));
        assert!(!rendered.contains("botdash_poller"));
    }
}
