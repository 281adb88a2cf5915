use botdash_core::BotSummary;
use dialoguer::Confirm;

/// Ask before deleting a bot and its server.
pub fn confirm_delete(bot: &BotSummary) -> Result<bool, anyhow::Error> {
    println!();
    println!("Bot to delete:");
    println!("  ID:     {}", bot.id);
    println!("  Handle: @{}", bot.bot_username);
    println!("  IP:     {}", bot.ip_address);
    if let Some(region) = &bot.region {
        println!("  Region: {region}");
    }

    let confirmed = Confirm::new()
        .with_prompt("Permanently delete this bot and its server?")
        .default(false)
        .interact()?;
    Ok(confirmed)
}
