use async_trait::async_trait;
use chrono::{DateTime, Utc};

use hound_core::AppResult;
use hound_domain::{Action, ActionId, ActionableRef, NewAction};

/// Port for the shared action store.
///
/// One store holds the history of every tracked entity type, keyed by
/// [`ActionableRef`]. Ordering methods follow `created_at` then id.
#[async_trait]
pub trait ActionRepository: Send + Sync {
    /// Persists one action and returns it with store-assigned id and timestamp.
    async fn append_action(&self, action: NewAction) -> AppResult<Action>;

    /// Counts the actions recorded for an entity.
    async fn count_actions(&self, actionable: &ActionableRef) -> AppResult<u64>;

    /// Returns the ids of the `limit` most recent actions for an entity, newest first.
    async fn list_recent_action_ids(
        &self,
        actionable: &ActionableRef,
        limit: u32,
    ) -> AppResult<Vec<ActionId>>;

    /// Deletes every action of an entity whose id is not in `keep`.
    ///
    /// Returns the number of deleted actions.
    async fn delete_actions_except(
        &self,
        actionable: &ActionableRef,
        keep: &[ActionId],
    ) -> AppResult<u64>;

    /// Lists all actions for an entity, oldest first.
    async fn list_actions(&self, actionable: &ActionableRef) -> AppResult<Vec<Action>>;

    /// Lists an entity's actions created in `[from, until)`, oldest first.
    async fn list_actions_between(
        &self,
        actionable: &ActionableRef,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Vec<Action>>;

    /// Lists every entity that has more than `limit` actions.
    async fn list_actionables_exceeding(&self, limit: u32) -> AppResult<Vec<ActionableRef>>;
}

/// Port for the persistence layer that owns tracked entities.
#[async_trait]
pub trait EntityStore<E>: Send + Sync {
    /// Persists a new entity.
    async fn insert(&self, entity: &E) -> AppResult<()>;

    /// Commits pending changes of an existing entity.
    async fn update(&self, entity: &E) -> AppResult<()>;

    /// Removes an entity.
    async fn delete(&self, entity: &E) -> AppResult<()>;
}
