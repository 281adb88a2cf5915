use anyhow::{Context, Result};
use botdash_api::DashboardClient;
use botdash_core::BotId;
use console::style;

/// Print the latest gateway log lines of one bot.
pub async fn run(client: &DashboardClient, bot: BotId) -> Result<()> {
    println!("Fetching logs for bot {bot}...\n");
    let logs = client
        .bot_logs(bot)
        .await
        .with_context(|| format!("Failed to fetch logs for bot {bot}"))?;

    if logs.trim().is_empty() {
        println!("{}", style("No log lines yet.").yellow());
        return Ok(());
    }

    for line in logs.lines() {
        println!("  {line}");
    }
    Ok(())
}
