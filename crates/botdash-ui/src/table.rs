use botdash_core::{BotId, BotSummary, ColorToken, StatusLabel};
use console::style;
use std::collections::HashMap;

/// Label text coloured by its colour token.
pub fn styled_label(label: StatusLabel) -> String {
    let text = style(label.text());
    match label.color() {
        ColorToken::Green => text.green().to_string(),
        ColorToken::Amber => text.yellow().to_string(),
        ColorToken::Cyan => text.cyan().to_string(),
        ColorToken::Red => text.red().to_string(),
    }
}

/// Header counters of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotStats {
    pub active: usize,
    pub total: usize,
    pub messages: u64,
}

impl BotStats {
    pub fn from_bots(bots: &[BotSummary]) -> Self {
        Self {
            active: bots.iter().filter(|b| b.is_running()).count(),
            total: bots.len(),
            messages: bots.iter().map(|b| b.message_count).sum(),
        }
    }
}

/// Print the bot list with a readiness column.
///
/// Bots missing from `readiness` (the status check failed) show as checking.
pub fn print_bots(bots: &[BotSummary], readiness: &HashMap<BotId, StatusLabel>) {
    println!(
        "  {:<6}  {:<24}  {:<16}  {:<10}  {:<10}  {:<20}",
        "ID", "Handle", "IP", "Deployed", "Server", "Telegram"
    );
    println!("  {}", "-".repeat(94));

    for bot in bots {
        let deployed = bot
            .deployed_on()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".into());
        let server = bot.status.as_deref().unwrap_or("unknown");
        let server_styled = match server {
            "running" => style(server).green().to_string(),
            _ => style(server).red().to_string(),
        };
        let label = readiness
            .get(&bot.id)
            .copied()
            .unwrap_or(StatusLabel::Checking);
        println!(
            "  {:<6}  {:<24}  {:<16}  {:<10}  {:<10}  {}",
            bot.id,
            format!("@{}", bot.bot_username),
            bot.ip_address,
            deployed,
            server_styled,
            styled_label(label)
        );
    }
}

pub fn print_stats(stats: &BotStats) {
    println!(
        "\n  Active: {}   Total: {}   Messages: {}",
        style(stats.active).green(),
        stats.total,
        stats.messages
    );
}
