use anyhow::{Context, Result};
use botdash_api::DashboardClient;
use botdash_poller::PollerConfig;
use std::sync::Arc;
use tracing::info;

pub struct DeployParams {
    pub client: DashboardClient,
    pub telegram_token: String,
    pub poller: PollerConfig,
    /// Stop after the deploy call instead of following the bot to ready.
    pub no_watch: bool,
}

/// Deploy a bot through the dashboard, then follow it until it is ready.
pub async fn run(params: DeployParams) -> Result<()> {
    let client = Arc::new(params.client);

    let sp = botdash_ui::spinner("Deploying bot (this takes a few minutes)...");
    let deployed = client.deploy_bot(&params.telegram_token).await;
    sp.finish_and_clear();
    let deployed = deployed.context("Deployment failed")?;

    println!("✓ Bot deployed successfully!");
    println!("  Bot: @{}", deployed.bot_username);
    if !deployed.ip_address.is_empty() {
        println!("  IP:  {}", deployed.ip_address);
    }
    info!(handle = %deployed.bot_username, "bot deployed");

    if params.no_watch {
        return Ok(());
    }

    let bots = client.list_bots().await.context("Failed to list bots")?;
    let bot = deployed.find_in(&bots).cloned().with_context(|| {
        format!(
            "@{} is not in the bot list yet; run `botdash watch` to follow it",
            deployed.bot_username
        )
    })?;

    println!("\nWaiting for @{} to come online...\n", bot.bot_username);
    super::watch::follow(client, std::slice::from_ref(&bot), params.poller).await
}
