use std::time::Duration;

use hound_application::{RetentionEnforcer, RetentionSweepSummary};
use hound_core::AppResult;
use hound_domain::RetentionLimit;
use tracing::{info, warn};

/// Runs one sweep pass.
///
/// A failed pass is returned in one-shot mode so the process exits non-zero. In periodic
/// mode it is logged and the next tick retries.
pub async fn run_sweep_pass(
    enforcer: &RetentionEnforcer,
    limit: RetentionLimit,
    interval: Option<Duration>,
) -> AppResult<Option<RetentionSweepSummary>> {
    match enforcer.sweep(limit).await {
        Ok(summary) => {
            info!(
                entities_over_limit = summary.entities_over_limit,
                entities_trimmed = summary.entities_trimmed,
                entities_failed = summary.entities_failed,
                actions_deleted = summary.actions_deleted,
                "retention sweep finished"
            );
            Ok(Some(summary))
        }
        Err(error) if interval.is_some() => {
            warn!(error = %error, "retention sweep failed");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}
