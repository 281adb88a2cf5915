use crate::table::styled_label;
use botdash_core::{BotId, BotSummary, StatusLabel, TestAction};
use botdash_poller::StatusView;
use dashmap::DashMap;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

struct TerminalCard {
    bar: ProgressBar,
    handle: String,
    label: StatusLabel,
    test_url: Option<String>,
}

impl TerminalCard {
    fn render(&self) -> String {
        let mut line = format!("@{:<24} {}", self.handle, styled_label(self.label));
        if let Some(url) = &self.test_url {
            line.push_str(&format!("  💬 {url}"));
        }
        line
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
        .template("{spinner:.cyan} {msg}")
        .expect("valid template")
}

/// A standalone spinner for one long request.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Terminal rendering of the bot cards: one spinner line per bot.
pub struct TerminalBoard {
    multi: MultiProgress,
    cards: DashMap<BotId, TerminalCard>,
}

impl Default for TerminalBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalBoard {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            cards: DashMap::new(),
        }
    }

    /// A board that renders nothing, for tests and non-interactive output.
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            cards: DashMap::new(),
        }
    }

    pub fn mount(&self, bot: &BotSummary) {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(spinner_style());
        bar.enable_steady_tick(Duration::from_millis(100));
        let card = TerminalCard {
            bar,
            handle: bot.bot_username.clone(),
            label: StatusLabel::SettingUp,
            test_url: None,
        };
        card.bar.set_message(card.render());
        if let Some(previous) = self.cards.insert(bot.id, card) {
            previous.bar.finish_and_clear();
        }
    }

    pub fn label(&self, bot: BotId) -> Option<StatusLabel> {
        self.cards.get(&bot).map(|c| c.label)
    }

    pub fn test_url(&self, bot: BotId) -> Option<String> {
        self.cards.get(&bot).and_then(|c| c.test_url.clone())
    }

    /// Print a line above the cards without tearing the spinners.
    pub fn println(&self, msg: &str) {
        if self.multi.println(msg).is_err() {
            println!("{msg}");
        }
    }

    /// Stop every spinner, leaving the final lines on screen.
    pub fn finish(&self) {
        for card in self.cards.iter() {
            if !card.bar.is_finished() {
                card.bar.finish_with_message(card.render());
            }
        }
    }
}

impl StatusView for TerminalBoard {
    fn has_label(&self, bot: BotId) -> bool {
        self.cards.contains_key(&bot)
    }

    fn set_label(&self, bot: BotId, label: StatusLabel) {
        if let Some(mut card) = self.cards.get_mut(&bot) {
            card.label = label;
            let line = card.render();
            match label {
                StatusLabel::Ready | StatusLabel::Unreachable => card.bar.finish_with_message(line),
                _ => card.bar.set_message(line),
            }
        }
    }

    fn has_test_action(&self, bot: BotId) -> bool {
        self.cards
            .get(&bot)
            .is_some_and(|card| card.test_url.is_some())
    }

    fn insert_test_action(&self, bot: BotId, action: TestAction) {
        if let Some(mut card) = self.cards.get_mut(&bot) {
            card.test_url = Some(action.url);
            let line = card.render();
            card.bar.set_message(line);
        }
    }
}
