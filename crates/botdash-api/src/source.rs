use async_trait::async_trait;
use botdash_core::{AppError, BotId, StatusReply};

use crate::client::DashboardClient;

/// Where a polling session gets its status replies from.
///
/// A transport or decode failure is an `Err`; an application-level refusal
/// (`success: false`) is an `Ok` reply for the caller to interpret.
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    async fn bot_status(&self, bot: BotId) -> Result<StatusReply, AppError>;
}

#[async_trait]
impl StatusSource for DashboardClient {
    async fn bot_status(&self, bot: BotId) -> Result<StatusReply, AppError> {
        DashboardClient::bot_status(self, bot).await
    }
}
