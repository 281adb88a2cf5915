use crate::config::PollerConfig;
use botdash_core::{AppError, LifecycleState, StatusLabel, StatusReply};
use std::time::Duration;

/// What one status request produced, reduced to what the table branches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// `success: true` with the reported lifecycle state.
    Reported(LifecycleState),
    /// `success: false`, with the server's message if any.
    Rejected(Option<String>),
    /// The request never produced a usable body (network, timeout, bad JSON).
    Failed,
}

impl PollOutcome {
    pub fn from_result(result: &Result<StatusReply, AppError>) -> Self {
        match result {
            Ok(reply) if reply.success => Self::Reported(reply.lifecycle()),
            Ok(reply) => Self::Rejected(reply.message.clone()),
            Err(_) => Self::Failed,
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Reported(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Stop,
    RetryAfter(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// New label, or `None` to leave the card as it is.
    pub label: Option<StatusLabel>,
    pub reveal_test_action: bool,
    pub next: Next,
}

/// Decide how a session reacts to one outcome.
///
/// `consecutive_failures` counts failed or rejected polls in a row, this one
/// included; it only matters when `config.max_failures` is set.
pub fn transition(
    outcome: &PollOutcome,
    config: &PollerConfig,
    consecutive_failures: u32,
) -> Transition {
    if outcome.is_failure() {
        if let Some(max) = config.max_failures {
            if consecutive_failures >= max {
                return Transition {
                    label: Some(StatusLabel::Unreachable),
                    reveal_test_action: false,
                    next: Next::Stop,
                };
            }
        }
    }

    match outcome {
        PollOutcome::Reported(state) if state.is_terminal() => Transition {
            label: Some(StatusLabel::Ready),
            reveal_test_action: true,
            next: Next::Stop,
        },
        PollOutcome::Reported(LifecycleState::Initializing) => Transition {
            label: Some(StatusLabel::Initializing),
            reveal_test_action: false,
            next: Next::RetryAfter(config.initializing_delay),
        },
        PollOutcome::Reported(state) => Transition {
            label: Some(StatusLabel::for_state(*state)),
            reveal_test_action: false,
            next: Next::RetryAfter(config.provisioning_delay),
        },
        PollOutcome::Rejected(_) => Transition {
            label: None,
            reveal_test_action: false,
            next: Next::RetryAfter(config.failure_delay),
        },
        PollOutcome::Failed => Transition {
            label: Some(StatusLabel::Checking),
            reveal_test_action: false,
            next: Next::RetryAfter(config.failure_delay),
        },
    }
}
