mod commands;
mod logging;

use botdash_api::DashboardClient;
use botdash_core::config::{
    self, DEFAULT_DASHBOARD_URL, DEFAULT_PLATFORM_URL, ENV_PLATFORM_URL, ENV_SESSION,
    ENV_TELEGRAM_TOKEN, ENV_URL,
};
use botdash_core::BotId;
use botdash_poller::PollerConfig;
use clap::{Args, Parser, Subcommand};
use commands::delete::DeleteParams;
use commands::deploy::DeployParams;
use commands::watch::WatchParams;

#[derive(Parser)]
#[command(
    name = "botdash",
    version,
    about = "Watch and manage chat bots deployed through the bot dashboard"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Dashboard base URL
    #[arg(long, global = true, env = ENV_URL, default_value = DEFAULT_DASHBOARD_URL)]
    url: String,

    /// Dashboard session cookie value
    #[arg(long, global = true, env = ENV_SESSION, hide_env_values = true)]
    session: Option<String>,

    /// Messaging platform base URL used for "test bot" links
    #[arg(long, global = true, env = ENV_PLATFORM_URL, default_value = DEFAULT_PLATFORM_URL)]
    platform_url: String,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true, default_value = "false")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a new bot and follow it until it is ready
    Deploy {
        /// Telegram bot token from @BotFather
        #[arg(long, env = ENV_TELEGRAM_TOKEN, hide_env_values = true)]
        telegram_token: String,

        /// Return once the deploy call completes
        #[arg(long, default_value = "false")]
        no_watch: bool,

        /// Give up on the bot after this many failed checks in a row
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_failures: Option<u32>,
    },

    /// Follow bot readiness live until every bot is ready (Ctrl+C to stop)
    Watch {
        /// Only watch these bot IDs
        #[arg(long = "bot")]
        bots: Vec<u64>,

        /// Give up on a bot after this many failed checks in a row
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_failures: Option<u32>,
    },

    /// List deployed bots with their current readiness
    Status,

    /// Show the latest gateway log lines of a bot
    Logs {
        /// Bot ID
        id: u64,
    },

    /// Delete a bot and its server
    Delete {
        /// Bot ID
        id: u64,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y', default_value = "false")]
        yes: bool,
    },

    /// Serve a live JSON/SSE mirror of the bot board
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "3456")]
        port: u16,

        /// Give up on a bot after this many failed checks in a row
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_failures: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Env files must be loaded before clap reads `env = ...` fallbacks.
    config::load_env()?;
    let cli = Cli::parse();
    logging::init(cli.global.json_logs)?;

    let client = DashboardClient::new(&cli.global.url, cli.global.session.as_deref())?;
    let poller = PollerConfig::default().with_platform_url(cli.global.platform_url.clone());

    match cli.command {
        Commands::Deploy {
            telegram_token,
            no_watch,
            max_failures,
        } => {
            let params = DeployParams {
                client,
                telegram_token,
                poller: poller.with_max_failures(max_failures),
                no_watch,
            };
            commands::deploy::run(params).await?;
        }
        Commands::Watch { bots, max_failures } => {
            let params = WatchParams {
                client,
                bots: bots.into_iter().map(BotId).collect(),
                poller: poller.with_max_failures(max_failures),
            };
            commands::watch::run(params).await?;
        }
        Commands::Status => {
            commands::status::run(&client).await?;
        }
        Commands::Logs { id } => {
            commands::logs::run(&client, BotId(id)).await?;
        }
        Commands::Delete { id, yes } => {
            let params = DeleteParams {
                client,
                bot: BotId(id),
                skip_confirm: yes,
            };
            commands::delete::run(params).await?;
        }
        Commands::Serve { port, max_failures } => {
            commands::serve::run(client, poller.with_max_failures(max_failures), port).await?;
        }
    }

    Ok(())
}
