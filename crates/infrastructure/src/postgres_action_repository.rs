use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use hound_application::ActionRepository;
use hound_core::{ActorId, AppError, AppResult};
use hound_domain::{Action, ActionId, ActionKind, ActionableRef, Changeset, NewAction};

/// PostgreSQL-backed action store over the shared `actions` table.
#[derive(Clone)]
pub struct PostgresActionRepository {
    pool: PgPool,
}

impl PostgresActionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ActionRow {
    id: i64,
    actionable_type: String,
    actionable_id: String,
    action: String,
    user_id: Option<String>,
    changeset: Option<Value>,
    created_at: DateTime<Utc>,
}

fn action_from_row(row: ActionRow) -> AppResult<Action> {
    let changeset = row
        .changeset
        .map(serde_json::from_value::<Changeset>)
        .transpose()
        .map_err(|error| {
            AppError::Internal(format!(
                "invalid changeset stored for action '{}': {error}",
                row.id
            ))
        })?;

    Action::from_parts(
        ActionId::new(row.id),
        ActionableRef::new(row.actionable_type, row.actionable_id)?,
        ActionKind::from_str(row.action.as_str())?,
        row.user_id.map(ActorId::new).transpose()?,
        changeset,
        row.created_at,
    )
}

#[async_trait]
impl ActionRepository for PostgresActionRepository {
    async fn append_action(&self, action: NewAction) -> AppResult<Action> {
        let changeset = action
            .changeset()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|error| AppError::Internal(format!("failed to encode changeset: {error}")))?;

        let row = sqlx::query_as::<_, ActionRow>(
            r#"
            INSERT INTO actions (
                actionable_type,
                actionable_id,
                action,
                user_id,
                changeset
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, actionable_type, actionable_id, action, user_id, changeset, created_at
            "#,
        )
        .bind(action.actionable().actionable_type())
        .bind(action.actionable().actionable_id())
        .bind(action.action().as_str())
        .bind(action.user_id().map(ActorId::as_str))
        .bind(changeset)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append action: {error}")))?;

        action_from_row(row)
    }

    async fn count_actions(&self, actionable: &ActionableRef) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM actions
            WHERE actionable_type = $1 AND actionable_id = $2
            "#,
        )
        .bind(actionable.actionable_type())
        .bind(actionable.actionable_id())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count actions for '{actionable}': {error}"))
        })?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn list_recent_action_ids(
        &self,
        actionable: &ActionableRef,
        limit: u32,
    ) -> AppResult<Vec<ActionId>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM actions
            WHERE actionable_type = $1 AND actionable_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(actionable.actionable_type())
        .bind(actionable.actionable_id())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list recent actions for '{actionable}': {error}"
            ))
        })?;

        Ok(ids.into_iter().map(ActionId::new).collect())
    }

    async fn delete_actions_except(
        &self,
        actionable: &ActionableRef,
        keep: &[ActionId],
    ) -> AppResult<u64> {
        let keep: Vec<i64> = keep.iter().map(ActionId::as_i64).collect();
        let result = sqlx::query(
            r#"
            DELETE FROM actions
            WHERE actionable_type = $1
                AND actionable_id = $2
                AND NOT (id = ANY($3))
            "#,
        )
        .bind(actionable.actionable_type())
        .bind(actionable.actionable_id())
        .bind(keep)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to delete actions for '{actionable}': {error}"
            ))
        })?;

        Ok(result.rows_affected())
    }

    async fn list_actions(&self, actionable: &ActionableRef) -> AppResult<Vec<Action>> {
        let rows = sqlx::query_as::<_, ActionRow>(
            r#"
            SELECT id, actionable_type, actionable_id, action, user_id, changeset, created_at
            FROM actions
            WHERE actionable_type = $1 AND actionable_id = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(actionable.actionable_type())
        .bind(actionable.actionable_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list actions for '{actionable}': {error}"))
        })?;

        rows.into_iter().map(action_from_row).collect()
    }

    async fn list_actions_between(
        &self,
        actionable: &ActionableRef,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<Vec<Action>> {
        let rows = sqlx::query_as::<_, ActionRow>(
            r#"
            SELECT id, actionable_type, actionable_id, action, user_id, changeset, created_at
            FROM actions
            WHERE actionable_type = $1
                AND actionable_id = $2
                AND created_at >= $3
                AND created_at < $4
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(actionable.actionable_type())
        .bind(actionable.actionable_id())
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list actions in range for '{actionable}': {error}"
            ))
        })?;

        rows.into_iter().map(action_from_row).collect()
    }

    async fn list_actionables_exceeding(&self, limit: u32) -> AppResult<Vec<ActionableRef>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT actionable_type, actionable_id
            FROM actions
            GROUP BY actionable_type, actionable_id
            HAVING COUNT(*) > $1
            ORDER BY actionable_type, actionable_id
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list actionables over retention limit: {error}"
            ))
        })?;

        rows.into_iter()
            .map(|(actionable_type, actionable_id)| {
                ActionableRef::new(actionable_type, actionable_id)
            })
            .collect()
    }
}
