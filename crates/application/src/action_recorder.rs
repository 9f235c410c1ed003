//! Records lifecycle events of tracked entities as immutable actions.
//!
//! Create and update recordings are load-bearing: a failed write is returned to the
//! caller, who decides whether to roll back the entity mutation. Destroy recordings are
//! best effort and never fail the caller. Retention trims run after every recorded
//! action and never fail the caller either; a missed trim is repaired by the next one.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::{debug, warn};

use hound_core::{ActorContext, AppError, AppResult};
use hound_domain::{
    Action, ActionKind, ActionableRef, NewAction, TrackingPolicy, is_tracking_enabled,
};

use crate::{ActionRepository, RetentionEnforcer, Trackable, TrackingRegistry};

/// Application service that turns lifecycle events into action records.
#[derive(Clone)]
pub struct ActionRecorder {
    repository: Arc<dyn ActionRepository>,
    registry: Arc<TrackingRegistry>,
    retention: RetentionEnforcer,
}

impl ActionRecorder {
    /// Creates a recorder over the action store and a frozen registry.
    #[must_use]
    pub fn new(repository: Arc<dyn ActionRepository>, registry: Arc<TrackingRegistry>) -> Self {
        let retention = RetentionEnforcer::new(repository.clone());

        Self {
            repository,
            registry,
            retention,
        }
    }

    /// Records a `create` action. Call after the entity was persisted.
    ///
    /// Returns `None` when the event is not tracked for the entity.
    pub async fn after_create<T>(
        &self,
        actor: &ActorContext,
        entity: &T,
    ) -> AppResult<Option<Action>>
    where
        T: Trackable + ?Sized,
    {
        let Some(policy) = self.policy_allowing(entity, ActionKind::Create) else {
            return Ok(None);
        };

        let draft = NewAction::new(
            entity.actionable()?,
            ActionKind::Create,
            actor.user_id().cloned(),
            None,
        )?;
        let action = self.repository.append_action(draft).await?;
        self.enforce_limit(action.actionable(), policy).await;

        Ok(Some(action))
    }

    /// Records an `update` action. Call before pending changes are committed.
    ///
    /// A save without effective changes still records an update with an empty
    /// changeset.
    pub async fn before_update<T>(
        &self,
        actor: &ActorContext,
        entity: &T,
    ) -> AppResult<Option<Action>>
    where
        T: Trackable + ?Sized,
    {
        let Some(policy) = self.policy_allowing(entity, ActionKind::Update) else {
            return Ok(None);
        };

        let changeset = entity.pending_changes()?;
        let draft = NewAction::new(
            entity.actionable()?,
            ActionKind::Update,
            actor.user_id().cloned(),
            Some(changeset),
        )?;
        let action = self.repository.append_action(draft).await?;
        self.enforce_limit(action.actionable(), policy).await;

        Ok(Some(action))
    }

    /// Records a `destroy` action. Call after the entity was removed.
    ///
    /// The identity is captured from the in-memory instance because the stored entity is
    /// gone. Failures are logged and swallowed. The retention trim runs whether or not the
    /// insert succeeded.
    pub async fn after_destroy<T>(&self, actor: &ActorContext, entity: &T) -> Option<Action>
    where
        T: Trackable + ?Sized,
    {
        let policy = self.policy_allowing(entity, ActionKind::Destroy)?;

        let identity = ActionableRef::new(entity.actionable_type(), entity.actionable_id());
        let actionable = match identity {
            Ok(actionable) => actionable,
            Err(error) => {
                warn!(
                    actionable_type = %entity.actionable_type(),
                    actionable_id = %entity.actionable_id(),
                    error = %error,
                    "failed to capture identity of destroyed entity"
                );
                return None;
            }
        };

        let recorded = self.append_destroy(actor, actionable.clone()).await;
        if let Err(error) = &recorded {
            warn!(
                actionable_type = %actionable.actionable_type(),
                actionable_id = %actionable.actionable_id(),
                error = %error,
                "failed to record destroy action"
            );
        }
        self.enforce_limit(&actionable, policy).await;

        recorded.ok()
    }

    /// Lists every action recorded for the entity, oldest first.
    pub async fn actions_for<T>(&self, entity: &T) -> AppResult<Vec<Action>>
    where
        T: Trackable + ?Sized,
    {
        self.repository.list_actions(&entity.actionable()?).await
    }

    /// Lists the entity's actions whose `created_at` falls on `date` (UTC).
    pub async fn actions_for_date<T>(&self, entity: &T, date: NaiveDate) -> AppResult<Vec<Action>>
    where
        T: Trackable + ?Sized,
    {
        let (from, until) = utc_day_bounds(date)?;
        self.repository
            .list_actions_between(&entity.actionable()?, from, until)
            .await
    }

    async fn append_destroy(
        &self,
        actor: &ActorContext,
        actionable: ActionableRef,
    ) -> AppResult<Action> {
        let draft = NewAction::new(
            actionable,
            ActionKind::Destroy,
            actor.user_id().cloned(),
            None,
        )?;
        self.repository.append_action(draft).await
    }

    fn policy_allowing<T>(&self, entity: &T, action: ActionKind) -> Option<&TrackingPolicy>
    where
        T: Trackable + ?Sized,
    {
        let policy = self.registry.policy_for(entity.actionable_type());
        let tracked = policy.is_some_and(|policy| policy.tracks(action));
        if !tracked || !is_tracking_enabled(entity.tracking()) {
            debug!(
                actionable_type = %entity.actionable_type(),
                action = %action,
                tracked,
                tracking = ?entity.tracking(),
                "skipped action recording"
            );
            return None;
        }

        policy
    }

    async fn enforce_limit(&self, actionable: &ActionableRef, policy: &TrackingPolicy) {
        if let Err(error) = self.retention.enforce(actionable, policy.limit()).await {
            warn!(
                actionable_type = %actionable.actionable_type(),
                actionable_id = %actionable.actionable_id(),
                error = %error,
                "failed to enforce action retention limit"
            );
        }
    }
}

fn utc_day_bounds(date: NaiveDate) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let next_day = date
        .succ_opt()
        .ok_or_else(|| AppError::Validation(format!("date '{date}' is out of range")))?;

    Ok((
        date.and_time(NaiveTime::MIN).and_utc(),
        next_day.and_time(NaiveTime::MIN).and_utc(),
    ))
}

#[cfg(test)]
mod tests;
