//! Per-entity history bounding.
//!
//! A trim keeps the `limit` most recent actions of one entity and removes the rest in a
//! single exclusion delete. Trims run after each recorded action, so two concurrent
//! writers may both compute a kept set before either deletes. The resulting over-count
//! is corrected by the next trim; the limit is a best-effort bound.

use std::sync::Arc;

use tracing::{debug, warn};

use hound_core::AppResult;
use hound_domain::{ActionableRef, RetentionLimit};

use crate::ActionRepository;

/// Outcome of a store-wide retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionSweepSummary {
    /// Entities whose history exceeded the limit.
    pub entities_over_limit: usize,
    /// Entities trimmed successfully.
    pub entities_trimmed: usize,
    /// Entities whose trim failed.
    pub entities_failed: usize,
    /// Total actions deleted.
    pub actions_deleted: u64,
}

/// Application service that trims action history beyond a retention limit.
#[derive(Clone)]
pub struct RetentionEnforcer {
    repository: Arc<dyn ActionRepository>,
}

impl RetentionEnforcer {
    /// Creates an enforcer over the action store.
    #[must_use]
    pub fn new(repository: Arc<dyn ActionRepository>) -> Self {
        Self { repository }
    }

    /// Trims one entity's history to `limit` actions.
    ///
    /// Returns the number of deleted actions. Does nothing without a limit.
    pub async fn enforce(
        &self,
        actionable: &ActionableRef,
        limit: Option<RetentionLimit>,
    ) -> AppResult<u64> {
        let Some(limit) = limit else {
            return Ok(0);
        };

        let count = self.repository.count_actions(actionable).await?;
        if count <= u64::from(limit.get()) {
            return Ok(0);
        }

        let kept = self
            .repository
            .list_recent_action_ids(actionable, limit.get())
            .await?;
        let deleted = self
            .repository
            .delete_actions_except(actionable, &kept)
            .await?;

        debug!(
            actionable_type = %actionable.actionable_type(),
            actionable_id = %actionable.actionable_id(),
            limit = limit.get(),
            count,
            deleted,
            "trimmed action history"
        );

        Ok(deleted)
    }

    /// Trims every entity in the store whose history exceeds `limit`.
    ///
    /// A failed trim is logged and counted; the sweep continues with the next entity.
    pub async fn sweep(&self, limit: RetentionLimit) -> AppResult<RetentionSweepSummary> {
        let over_limit = self
            .repository
            .list_actionables_exceeding(limit.get())
            .await?;

        let mut summary = RetentionSweepSummary {
            entities_over_limit: over_limit.len(),
            ..RetentionSweepSummary::default()
        };

        for actionable in over_limit {
            match self.enforce(&actionable, Some(limit)).await {
                Ok(deleted) => {
                    summary.entities_trimmed += 1;
                    summary.actions_deleted += deleted;
                }
                Err(error) => {
                    summary.entities_failed += 1;
                    warn!(
                        actionable_type = %actionable.actionable_type(),
                        actionable_id = %actionable.actionable_id(),
                        error = %error,
                        "failed to trim action history"
                    );
                }
            }
        }

        Ok(summary)
    }
}
