//! Readiness polling for deployed bots.
//!
//! Each bot card mounted on a [`StatusView`] gets one polling session: a
//! task that asks the dashboard for the bot's status, updates the card's
//! label, and either sleeps and asks again or stops once the bot is ready.
//! Sessions are owned by a [`PollerRegistry`] scoped to the view.

pub mod config;
pub mod registry;
pub mod session;
pub mod transition;
pub mod view;

pub use config::PollerConfig;
pub use registry::PollerRegistry;
pub use session::{run_session, SessionEnd};
pub use transition::{transition, Next, PollOutcome, Transition};
pub use view::{BoardEvent, Card, CardAction, MemoryBoard, StatusView};
