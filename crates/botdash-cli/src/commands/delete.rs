use anyhow::{Context, Result};
use botdash_api::DashboardClient;
use botdash_core::BotId;
use tracing::info;

pub struct DeleteParams {
    pub client: DashboardClient,
    pub bot: BotId,
    pub skip_confirm: bool,
}

pub async fn run(params: DeleteParams) -> Result<()> {
    let client = &params.client;

    println!("Fetching bots...");
    let bots = client.list_bots().await.context("Failed to list bots")?;
    let bot = bots
        .into_iter()
        .find(|b| b.id == params.bot)
        .ok_or_else(|| anyhow::anyhow!("No bot found with ID {}", params.bot))?;

    if !params.skip_confirm && !botdash_ui::prompt::confirm_delete(&bot)? {
        println!("Cancelled.");
        return Ok(());
    }

    println!("\nDeleting bot @{} (ID {})...", bot.bot_username, bot.id);
    let message = client
        .delete_bot(bot.id)
        .await
        .with_context(|| format!("Failed to delete bot {}", bot.id))?;
    info!(bot_id = %bot.id, "bot deleted");
    if message.is_empty() {
        println!("Bot deleted.");
    } else {
        println!("{message}");
    }
    Ok(())
}
