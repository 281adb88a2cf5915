use crate::config::PollerConfig;
use crate::transition::{transition, Next, PollOutcome};
use crate::view::StatusView;
use botdash_api::StatusSource;
use botdash_core::{BotId, TestAction};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a polling session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The bot reported ready.
    Ready,
    /// The bot's card disappeared from the view.
    Unmounted,
    /// `max_failures` consecutive polls failed.
    GaveUp,
}

/// Poll one bot until it is ready or its card goes away.
///
/// One request is in flight at a time; the next is only scheduled after the
/// previous outcome has been applied to the view.
pub async fn run_session<S, V>(
    bot: BotId,
    handle: String,
    source: Arc<S>,
    view: Arc<V>,
    config: PollerConfig,
) -> SessionEnd
where
    S: StatusSource + ?Sized,
    V: StatusView + ?Sized,
{
    let mut consecutive_failures: u32 = 0;

    loop {
        if !view.has_label(bot) {
            debug!("status label gone, stopping checks");
            return SessionEnd::Unmounted;
        }

        debug!("checking status");
        let result = source.bot_status(bot).await;
        let outcome = PollOutcome::from_result(&result);
        match &result {
            Ok(reply) if reply.success => debug!(
                status = reply.status.as_deref().unwrap_or(""),
                telegram_ready = ?reply.telegram_ready,
                service_active = ?reply.service_active,
                "status reply"
            ),
            Ok(reply) => warn!(
                message = reply.message.as_deref().unwrap_or(""),
                "status check refused"
            ),
            Err(e) => warn!(error = %e, "status check failed"),
        }

        if outcome.is_failure() {
            consecutive_failures = consecutive_failures.saturating_add(1);
        } else {
            consecutive_failures = 0;
        }

        // The card may have been torn down while the request was in flight.
        if !view.has_label(bot) {
            debug!("status label gone, stopping checks");
            return SessionEnd::Unmounted;
        }

        let step = transition(&outcome, &config, consecutive_failures);
        if let Some(label) = step.label {
            view.set_label(bot, label);
        }
        if step.reveal_test_action && !view.has_test_action(bot) {
            view.insert_test_action(bot, TestAction::for_handle(&config.platform_url, &handle));
            info!(handle = %handle, "added test action");
        }

        match step.next {
            Next::Stop if step.reveal_test_action => {
                info!("bot is ready");
                return SessionEnd::Ready;
            }
            Next::Stop => {
                warn!(consecutive_failures, "giving up on status checks");
                return SessionEnd::GaveUp;
            }
            Next::RetryAfter(delay) => {
                debug!(delay_secs = delay.as_secs_f64(), "checking again later");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
