use crate::analysis::{ConversationAnalysis, ConversationData};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Fixed-delay retry schedule for post-call analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before the first fetch
    pub initial_delay: Duration,

    /// Wait after each "processing" answer
    pub retry_delay: Duration,

    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            retry_delay: Duration::from_secs(5),
            max_attempts: 3,
        }
    }
}

/// Result of polling the analysis endpoint
#[derive(Debug, Clone, Default)]
pub struct PollOutcome {
    /// Last payload fetched, complete or not
    pub data: Option<ConversationData>,

    /// Whether the last payload was past processing
    pub ready: bool,

    /// Fetches actually performed
    pub attempts: u32,

    pub cancelled: bool,
}

/// Sleep unless cancelled first; returns false on cancellation.
async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Fetch the analysis for `conversation_id`, retrying while it is still
/// processing. Never fails: errors stop polling and keep what was fetched.
pub async fn poll_analysis(
    analysis: &dyn ConversationAnalysis,
    conversation_id: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> PollOutcome {
    let mut outcome = PollOutcome::default();

    info!(
        "Waiting {:?} for conversation {} to be processed",
        policy.initial_delay, conversation_id
    );
    if !pause(policy.initial_delay, cancel).await {
        warn!("Analysis polling cancelled before the first fetch");
        outcome.cancelled = true;
        return outcome;
    }

    while outcome.attempts < policy.max_attempts {
        outcome.attempts += 1;
        info!(
            "Fetching conversation data ({}/{})",
            outcome.attempts, policy.max_attempts
        );

        match analysis.fetch_conversation(conversation_id).await {
            Ok(data) => {
                let processing = data.is_processing();
                outcome.data = Some(data);

                if !processing {
                    outcome.ready = true;
                    break;
                }
            }
            Err(e) => {
                error!("Failed to fetch conversation {}: {}", conversation_id, e);
                break;
            }
        }

        if outcome.attempts < policy.max_attempts {
            info!("Conversation still processing, waiting {:?}", policy.retry_delay);
            if !pause(policy.retry_delay, cancel).await {
                warn!("Analysis polling cancelled");
                outcome.cancelled = true;
                break;
            }
        }
    }

    if !outcome.ready && outcome.data.is_some() {
        warn!("Conversation still processing after retries; data will be incomplete");
    }

    outcome
}
