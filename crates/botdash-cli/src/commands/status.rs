use anyhow::{Context, Result};
use botdash_api::DashboardClient;
use botdash_core::StatusLabel;
use botdash_ui::table::{self, BotStats};
use std::collections::HashMap;
use tracing::warn;

/// List deployed bots with a one-off readiness check each.
pub async fn run(client: &DashboardClient) -> Result<()> {
    println!("Fetching bots...\n");
    let bots = client.list_bots().await.context("Failed to list bots")?;

    if bots.is_empty() {
        println!("No bots deployed yet.");
        return Ok(());
    }

    let mut readiness = HashMap::new();
    for bot in &bots {
        match client.bot_status(bot.id).await {
            Ok(reply) if reply.success => {
                readiness.insert(bot.id, StatusLabel::for_state(reply.lifecycle()));
            }
            Ok(reply) => warn!(
                bot_id = %bot.id,
                message = reply.message.as_deref().unwrap_or(""),
                "status check refused"
            ),
            Err(e) => warn!(bot_id = %bot.id, error = %e, "status check failed"),
        }
    }

    table::print_bots(&bots, &readiness);
    table::print_stats(&BotStats::from_bots(&bots));
    Ok(())
}
