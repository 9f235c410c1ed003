use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use hound_application::ActionRepository;
use hound_core::AppResult;
use hound_domain::{Action, ActionId, ActionableRef, NewAction};

#[derive(Debug, Default)]
struct ActionLog {
    last_id: i64,
    histories: BTreeMap<ActionableRef, Vec<Action>>,
}

impl ActionLog {
    fn insert(&mut self, action: NewAction, created_at: DateTime<Utc>) -> Action {
        self.last_id += 1;
        let persisted = action.persisted(ActionId::new(self.last_id), created_at);

        let history = self
            .histories
            .entry(persisted.actionable().clone())
            .or_default();
        let position =
            history.partition_point(|stored| stored.recency_key() <= persisted.recency_key());
        history.insert(position, persisted.clone());

        persisted
    }

    fn history(&self, actionable: &ActionableRef) -> &[Action] {
        self.histories
            .get(actionable)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// In-memory action store.
///
/// Histories are kept per entity in `created_at`, id order.
#[derive(Debug, Default)]
pub struct InMemoryActionRepository {
    log: RwLock<ActionLog>,
}

impl InMemoryActionRepository {
    /// Creates an empty in-memory action store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an action with an explicit timestamp, for backfills and fixtures.
    pub async fn append_action_at(&self, action: NewAction, created_at: DateTime<Utc>) -> Action {
        self.log.write().await.insert(action, created_at)
    }
}

#[async_trait]
impl ActionRepository for InMemoryActionRepository {
    async fn append_action(&self, action: NewAction) -> AppResult<Action> {
        Ok(self.append_action_at(action, Utc::now()).await)
    }

    async fn count_actions(&self, actionable: &ActionableRef) -> AppResult<u64> {
        Ok(self.log.read().await.history(actionable).len() as u64)
    }

    async fn list_recent_action_ids(
        &self,
        actionable: &ActionableRef,
        limit: u32,
    ) -> AppResult<Vec<ActionId>> {
        Ok(self
            .log
            .read()
            .await
            .history(actionable)
            .iter()
            .rev()
            .take(limit as usize)
            .map(Action::id)
            .collect())
    }

    async fn delete_actions_except(
        &self,
        actionable: &ActionableRef,
        keep: &[ActionId],
    ) -> AppResult<u64> {
        let mut log = self.log.write().await;
        let Some(history) = log.histories.get_mut(actionable) else {
            return Ok(0);
        };

        let before = history.len();
        history.retain(|action| keep.contains(&action.id()));
        let deleted = (before - history.len()) as u64;
        if history.is_empty() {
            log.histories.remove(actionable);
        }

        Ok(deleted)
    }

    async fn list_actions(&self, actionable: &ActionableRef) -> AppResult<Vec<Action>> {
        Ok(self.log.read().await.history(actionable).to_vec())
    }

    async fn list_actions_between(
        &self,
        actionable: &ActionableRef,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Vec<Action>> {
        Ok(self
            .log
            .read()
            .await
            .history(actionable)
            .iter()
            .filter(|action| action.created_at() >= from && action.created_at() < until)
            .cloned()
            .collect())
    }

    async fn list_actionables_exceeding(&self, limit: u32) -> AppResult<Vec<ActionableRef>> {
        Ok(self
            .log
            .read()
            .await
            .histories
            .iter()
            .filter(|(_, history)| history.len() > limit as usize)
            .map(|(actionable, _)| actionable.clone())
            .collect())
    }
}
