use anyhow::{bail, Context, Result};
use botdash_api::DashboardClient;
use botdash_core::{BotId, BotSummary, StatusLabel};
use botdash_poller::{PollerConfig, PollerRegistry};
use botdash_ui::table::styled_label;
use botdash_ui::TerminalBoard;
use std::sync::Arc;
use tracing::info;

pub struct WatchParams {
    pub client: DashboardClient,
    /// Bots to watch; empty means every bot of the account.
    pub bots: Vec<BotId>,
    pub poller: PollerConfig,
}

/// Keep only the requested bots, in list order. Unknown IDs are an error.
fn select_bots(all: Vec<BotSummary>, wanted: &[BotId]) -> Result<Vec<BotSummary>> {
    if wanted.is_empty() {
        return Ok(all);
    }
    let missing: Vec<String> = wanted
        .iter()
        .filter(|id| !all.iter().any(|b| b.id == **id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        bail!("No bot found with ID {}", missing.join(", "));
    }
    Ok(all.into_iter().filter(|b| wanted.contains(&b.id)).collect())
}

/// Follow readiness of the selected bots until all sessions end or Ctrl+C.
pub async fn run(params: WatchParams) -> Result<()> {
    let client = Arc::new(params.client);

    println!("Fetching bots...\n");
    let bots = client.list_bots().await.context("Failed to list bots")?;
    let bots = select_bots(bots, &params.bots)?;

    if bots.is_empty() {
        println!("No bots deployed yet. Run `botdash deploy` to get started.");
        return Ok(());
    }

    follow(client, &bots, params.poller).await
}

/// Poll `bots` on a terminal board until every session ends or Ctrl+C, then
/// print where each one got to.
pub async fn follow(
    client: Arc<DashboardClient>,
    bots: &[BotSummary],
    poller: PollerConfig,
) -> Result<()> {
    let board = Arc::new(TerminalBoard::new());
    let registry = PollerRegistry::new(client, board.clone(), poller);

    for bot in bots {
        board.mount(bot);
        registry.poll(bot.id, bot.bot_username.clone());
    }
    info!(count = bots.len(), "watching bots");

    tokio::select! {
        _ = registry.settled() => {}
        _ = tokio::signal::ctrl_c() => {
            board.println("Interrupted, stopping status checks.");
            registry.teardown();
        }
    }
    board.finish();

    print_summary(bots, &board);
    Ok(())
}

fn print_summary(bots: &[BotSummary], board: &TerminalBoard) {
    let divider = "=".repeat(60);
    println!("\n{divider}");
    for bot in bots {
        let label = board.label(bot.id).unwrap_or(StatusLabel::Checking);
        println!("  @{:<24} {}", bot.bot_username, styled_label(label));
        if let Some(url) = board.test_url(bot.id) {
            println!("    Test it: {url}");
        }
    }
    println!("{divider}\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot(id: u64) -> BotSummary {
        BotSummary {
            id: BotId(id),
            bot_name: "openclaw-bot".into(),
            bot_username: format!("bot{id}"),
            ip_address: "192.0.2.10".into(),
            droplet_id: None,
            region: None,
            status: Some("running".into()),
            message_count: 0,
            created_at: None,
        }
    }

    #[test]
    fn no_filter_keeps_everything() {
        let bots = select_bots(vec![bot(1), bot(2)], &[]).unwrap();
        assert_eq!(bots.len(), 2);
    }

    #[test]
    fn filter_keeps_list_order() {
        let bots = select_bots(vec![bot(1), bot(2), bot(3)], &[BotId(3), BotId(1)]).unwrap();
        let ids: Vec<BotId> = bots.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![BotId(1), BotId(3)]);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let err = select_bots(vec![bot(1)], &[BotId(1), BotId(7)]).unwrap_err();
        assert!(err.to_string().contains('7'));
    }
}
