use botdash_core::{BotId, BotSummary, ColorToken, StatusLabel, TestAction};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;

/// Render target of polling sessions: one card per bot, each with a status
/// label and an actions container.
///
/// Implementations must tolerate calls for bots whose card is gone.
pub trait StatusView: Send + Sync + 'static {
    fn has_label(&self, bot: BotId) -> bool;

    fn set_label(&self, bot: BotId, label: StatusLabel);

    fn has_test_action(&self, bot: BotId) -> bool;

    fn insert_test_action(&self, bot: BotId, action: TestAction);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardAction {
    TestBot(TestAction),
    Logs,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub bot_id: BotId,
    pub handle: String,
    pub ip_address: String,
    pub label: StatusLabel,
    pub color: ColorToken,
    pub actions: Vec<CardAction>,
}

impl Card {
    pub fn new(bot: &BotSummary) -> Self {
        let label = StatusLabel::SettingUp;
        Self {
            bot_id: bot.id,
            handle: bot.bot_username.clone(),
            ip_address: bot.ip_address.clone(),
            label,
            color: label.color(),
            actions: vec![CardAction::Logs, CardAction::Delete],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    Mounted { bot_id: BotId, handle: String },
    Label { bot_id: BotId, label: StatusLabel, text: &'static str, color: ColorToken },
    TestAction { bot_id: BotId, url: String },
    Unmounted { bot_id: BotId },
}

/// In-memory board that broadcasts every change it applies.
pub struct MemoryBoard {
    cards: DashMap<BotId, Card>,
    events: broadcast::Sender<BoardEvent>,
}

impl Default for MemoryBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBoard {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            cards: DashMap::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Render a card for `bot`, replacing any previous card for it.
    pub fn mount(&self, bot: &BotSummary) {
        self.cards.insert(bot.id, Card::new(bot));
        self.emit(BoardEvent::Mounted {
            bot_id: bot.id,
            handle: bot.bot_username.clone(),
        });
    }

    /// Render a card for `bot` unless it already has one. Returns whether a
    /// card was added; an existing card keeps its label and actions.
    pub fn mount_new(&self, bot: &BotSummary) -> bool {
        match self.cards.entry(bot.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Card::new(bot));
                self.emit(BoardEvent::Mounted {
                    bot_id: bot.id,
                    handle: bot.bot_username.clone(),
                });
                true
            }
        }
    }

    /// Remove the card for `bot`. Returns whether there was one.
    pub fn unmount(&self, bot: BotId) -> bool {
        let removed = self.cards.remove(&bot).is_some();
        if removed {
            self.emit(BoardEvent::Unmounted { bot_id: bot });
        }
        removed
    }

    pub fn has_card(&self, bot: BotId) -> bool {
        self.cards.contains_key(&bot)
    }

    pub fn card(&self, bot: BotId) -> Option<Card> {
        self.cards.get(&bot).map(|c| c.clone())
    }

    pub fn bot_ids(&self) -> Vec<BotId> {
        let mut ids: Vec<BotId> = self.cards.iter().map(|c| *c.key()).collect();
        ids.sort();
        ids
    }

    /// All cards ordered by bot id.
    pub fn snapshot(&self) -> Vec<Card> {
        let mut cards: Vec<Card> = self.cards.iter().map(|c| c.value().clone()).collect();
        cards.sort_by_key(|c| c.bot_id);
        cards
    }

    fn emit(&self, event: BoardEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl StatusView for MemoryBoard {
    fn has_label(&self, bot: BotId) -> bool {
        self.has_card(bot)
    }

    fn set_label(&self, bot: BotId, label: StatusLabel) {
        let changed = match self.cards.get_mut(&bot) {
            Some(mut card) => {
                let changed = card.label != label;
                card.label = label;
                card.color = label.color();
                changed
            }
            None => return,
        };
        if changed {
            self.emit(BoardEvent::Label {
                bot_id: bot,
                label,
                text: label.text(),
                color: label.color(),
            });
        }
    }

    fn has_test_action(&self, bot: BotId) -> bool {
        self.cards.get(&bot).is_some_and(|card| {
            card.actions
                .iter()
                .any(|a| matches!(a, CardAction::TestBot(_)))
        })
    }

    fn insert_test_action(&self, bot: BotId, action: TestAction) {
        let url = action.url.clone();
        match self.cards.get_mut(&bot) {
            Some(mut card) => card.actions.insert(0, CardAction::TestBot(action)),
            None => return,
        }
        self.emit(BoardEvent::TestAction { bot_id: bot, url });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot(id: u64, handle: &str) -> BotSummary {
        BotSummary {
            id: BotId(id),
            bot_name: "openclaw-bot".into(),
            bot_username: handle.into(),
            ip_address: "203.0.113.7".into(),
            droplet_id: None,
            region: None,
            status: Some("running".into()),
            message_count: 0,
            created_at: None,
        }
    }

    #[test]
    fn mounted_card_starts_setting_up() {
        let board = MemoryBoard::new();
        board.mount(&bot(1, "alpha"));
        let card = board.card(BotId(1)).unwrap();
        assert_eq!(card.label, StatusLabel::SettingUp);
        assert_eq!(card.actions, vec![CardAction::Logs, CardAction::Delete]);
        assert!(board.has_label(BotId(1)));
        assert!(!board.has_label(BotId(2)));
    }

    #[test]
    fn updates_to_missing_cards_are_ignored() {
        let board = MemoryBoard::new();
        let mut rx = board.subscribe();
        board.set_label(BotId(9), StatusLabel::Ready);
        board.insert_test_action(BotId(9), TestAction::for_handle("https://t.me", "x"));
        assert!(board.snapshot().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn mount_new_keeps_existing_cards() {
        let board = MemoryBoard::new();
        assert!(board.mount_new(&bot(4, "delta")));
        board.set_label(BotId(4), StatusLabel::Ready);
        board.insert_test_action(BotId(4), TestAction::for_handle("https://t.me", "delta"));

        assert!(!board.mount_new(&bot(4, "delta")));
        let card = board.card(BotId(4)).unwrap();
        assert_eq!(card.label, StatusLabel::Ready);
        assert_eq!(card.actions.len(), 3);
    }

    #[test]
    fn test_action_goes_first() {
        let board = MemoryBoard::new();
        board.mount(&bot(1, "alpha"));
        board.insert_test_action(BotId(1), TestAction::for_handle("https://t.me", "alpha"));
        let card = board.card(BotId(1)).unwrap();
        assert!(matches!(card.actions[0], CardAction::TestBot(ref a) if a.url == "https://t.me/alpha"));
        assert!(board.has_test_action(BotId(1)));
    }

    #[test]
    fn events_follow_changes() {
        let board = MemoryBoard::new();
        let mut rx = board.subscribe();
        board.mount(&bot(3, "gamma"));
        board.set_label(BotId(3), StatusLabel::Initializing);
        board.set_label(BotId(3), StatusLabel::Initializing);
        assert!(board.unmount(BotId(3)));
        assert!(!board.unmount(BotId(3)));

        assert!(matches!(rx.try_recv().unwrap(), BoardEvent::Mounted { .. }));
        assert!(matches!(
            rx.try_recv().unwrap(),
            BoardEvent::Label { label: StatusLabel::Initializing, .. }
        ));
        assert_eq!(rx.try_recv().unwrap(), BoardEvent::Unmounted { bot_id: BotId(3) });
        assert!(rx.try_recv().is_err());
    }
}
