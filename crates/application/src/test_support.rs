use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use hound_core::{AppError, AppResult};
use hound_domain::{Action, ActionId, ActionKind, ActionableRef, Changeset, NewAction};

use crate::ActionRepository;

#[derive(Default)]
pub(crate) struct FakeActionRepository {
    actions: Mutex<Vec<Action>>,
    fail_appends: AtomicBool,
    fail_deletes: AtomicBool,
    delete_calls: AtomicUsize,
}

impl FakeActionRepository {
    pub(crate) async fn seed(
        &self,
        actionable: &ActionableRef,
        kind: ActionKind,
        created_at: DateTime<Utc>,
    ) -> Action {
        let changeset = (kind == ActionKind::Update).then(Changeset::new);
        let draft = NewAction::new(actionable.clone(), kind, None, changeset)
            .unwrap_or_else(|_| unreachable!());

        let mut actions = self.actions.lock().await;
        let action = draft.persisted(next_id(&actions), created_at);
        actions.push(action.clone());
        action
    }

    pub(crate) async fn stored(&self) -> Vec<Action> {
        self.actions.lock().await.clone()
    }

    pub(crate) fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

fn next_id(actions: &[Action]) -> ActionId {
    let last = actions
        .iter()
        .map(|action| action.id().as_i64())
        .max()
        .unwrap_or(0);
    ActionId::new(last + 1)
}

fn history_of(actions: &[Action], actionable: &ActionableRef) -> Vec<Action> {
    let mut history: Vec<Action> = actions
        .iter()
        .filter(|action| action.actionable() == actionable)
        .cloned()
        .collect();
    history.sort_by_key(Action::recency_key);
    history
}

#[async_trait]
impl ActionRepository for FakeActionRepository {
    async fn append_action(&self, action: NewAction) -> AppResult<Action> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(AppError::Internal("action store unavailable".to_owned()));
        }

        let mut actions = self.actions.lock().await;
        let persisted = action.persisted(next_id(&actions), Utc::now());
        actions.push(persisted.clone());
        Ok(persisted)
    }

    async fn count_actions(&self, actionable: &ActionableRef) -> AppResult<u64> {
        let actions = self.actions.lock().await;
        Ok(history_of(&actions, actionable).len() as u64)
    }

    async fn list_recent_action_ids(
        &self,
        actionable: &ActionableRef,
        limit: u32,
    ) -> AppResult<Vec<ActionId>> {
        let actions = self.actions.lock().await;
        Ok(history_of(&actions, actionable)
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
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Internal("action store unavailable".to_owned()));
        }

        let mut actions = self.actions.lock().await;
        let before = actions.len();
        actions.retain(|action| action.actionable() != actionable || keep.contains(&action.id()));
        Ok((before - actions.len()) as u64)
    }

    async fn list_actions(&self, actionable: &ActionableRef) -> AppResult<Vec<Action>> {
        let actions = self.actions.lock().await;
        Ok(history_of(&actions, actionable))
    }

    async fn list_actions_between(
        &self,
        actionable: &ActionableRef,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Vec<Action>> {
        let actions = self.actions.lock().await;
        Ok(history_of(&actions, actionable)
            .into_iter()
            .filter(|action| action.created_at() >= from && action.created_at() < until)
            .collect())
    }

    async fn list_actionables_exceeding(&self, limit: u32) -> AppResult<Vec<ActionableRef>> {
        let actions = self.actions.lock().await;
        let mut actionables: Vec<ActionableRef> = actions
            .iter()
            .map(|action| action.actionable().clone())
            .collect();
        actionables.sort();
        actionables.dedup();
        actionables.retain(|actionable| history_of(&actions, actionable).len() > limit as usize);
        Ok(actionables)
    }
}
