use crate::config::PollerConfig;
use crate::session::{run_session, SessionEnd};
use crate::view::StatusView;
use botdash_api::StatusSource;
use botdash_core::BotId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, Instrument};

/// Counts a session as live until its future completes or is dropped.
struct LiveSession(Arc<watch::Sender<usize>>);

impl LiveSession {
    fn enter(live: &Arc<watch::Sender<usize>>) -> Self {
        live.send_modify(|n| *n += 1);
        Self(live.clone())
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Owns the polling sessions of one view, keyed by bot.
///
/// At most one running session exists per bot. Dropping the registry tears
/// all of its sessions down.
pub struct PollerRegistry<S: StatusSource + ?Sized, V: StatusView + ?Sized> {
    source: Arc<S>,
    view: Arc<V>,
    config: PollerConfig,
    sessions: DashMap<BotId, JoinHandle<SessionEnd>>,
    live: Arc<watch::Sender<usize>>,
}

impl<S, V> PollerRegistry<S, V>
where
    S: StatusSource + ?Sized,
    V: StatusView + ?Sized,
{
    pub fn new(source: Arc<S>, view: Arc<V>, config: PollerConfig) -> Self {
        let (live, _) = watch::channel(0);
        Self {
            source,
            view,
            config,
            sessions: DashMap::new(),
            live: Arc::new(live),
        }
    }

    /// Start polling `bot` unless a session for it is already running.
    ///
    /// Returns whether a new session was started. A session that already
    /// finished (ready, unmounted, gave up) is replaced.
    pub fn poll(&self, bot: BotId, handle: impl Into<String>) -> bool {
        match self.sessions.entry(bot) {
            Entry::Occupied(existing) if !existing.get().is_finished() => {
                debug!(bot_id = %bot, "session already running");
                false
            }
            Entry::Occupied(mut existing) => {
                existing.insert(self.spawn(bot, handle.into()));
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(self.spawn(bot, handle.into()));
                true
            }
        }
    }

    fn spawn(&self, bot: BotId, handle: String) -> JoinHandle<SessionEnd> {
        let span = info_span!("poll", bot_id = %bot);
        let live = LiveSession::enter(&self.live);
        let session = run_session(
            bot,
            handle,
            self.source.clone(),
            self.view.clone(),
            self.config.clone(),
        );
        tokio::spawn(
            async move {
                let _live = live;
                session.await
            }
            .instrument(span),
        )
    }

    /// Cancel the session for `bot`, if any. Returns whether one was running.
    pub fn unmount(&self, bot: BotId) -> bool {
        match self.sessions.remove(&bot) {
            Some((_, task)) => {
                let running = !task.is_finished();
                task.abort();
                running
            }
            None => false,
        }
    }

    /// Cancel every session.
    pub fn teardown(&self) {
        for entry in self.sessions.iter() {
            entry.value().abort();
        }
        self.sessions.clear();
    }

    pub fn is_polling(&self, bot: BotId) -> bool {
        self.sessions
            .get(&bot)
            .is_some_and(|task| !task.is_finished())
    }

    /// Bots with a running session, in id order.
    pub fn active(&self) -> Vec<BotId> {
        let mut ids: Vec<BotId> = self
            .sessions
            .iter()
            .filter(|e| !e.value().is_finished())
            .map(|e| *e.key())
            .collect();
        ids.sort();
        ids
    }

    pub fn active_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|e| !e.value().is_finished())
            .count()
    }

    /// Wait until no session is running.
    pub async fn settled(&self) {
        let mut live = self.live.subscribe();
        // The sender lives in `self`, so this only returns once the count is 0.
        let _ = live.wait_for(|n| *n == 0).await;
    }
}

impl<S, V> Drop for PollerRegistry<S, V>
where
    S: StatusSource + ?Sized,
    V: StatusView + ?Sized,
{
    fn drop(&mut self) {
        for entry in self.sessions.iter() {
            entry.value().abort();
        }
    }
}
