pub mod config;
pub mod error;
pub mod types;

pub use error::AppError;
pub use types::{
    BotId, BotSummary, ColorToken, DeployedBot, LifecycleState, StatusLabel, StatusReply,
    TestAction,
};
