use std::str::FromStr;

use chrono::{DateTime, Utc};
use hound_core::{ActorId, AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::Changeset;

/// Lifecycle event recorded by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Entity was persisted for the first time.
    Create,
    /// Entity had pending changes committed.
    Update,
    /// Entity was removed.
    Destroy,
}

impl ActionKind {
    /// Returns a stable storage value for this action kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
        }
    }

    /// Returns all known action kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ActionKind] = &[ActionKind::Create, ActionKind::Update, ActionKind::Destroy];

        ALL
    }
}

impl FromStr for ActionKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "destroy" => Ok(Self::Destroy),
            _ => Err(AppError::Validation(format!(
                "unknown action value '{value}'"
            ))),
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Store-assigned action identifier. Increases with insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(i64);

impl ActionId {
    /// Wraps a raw store identifier.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw store identifier.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Tagged reference to the entity that owns an action.
///
/// One action store is shared by every tracked entity type, so the owner is identified by
/// a type tag plus an identifier rather than a typed key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionableRef {
    actionable_type: NonEmptyString,
    actionable_id: NonEmptyString,
}

impl ActionableRef {
    /// Creates a validated actionable reference.
    pub fn new(
        actionable_type: impl Into<String>,
        actionable_id: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            actionable_type: NonEmptyString::new(actionable_type)?,
            actionable_id: NonEmptyString::new(actionable_id)?,
        })
    }

    /// Returns the owning entity type tag.
    #[must_use]
    pub fn actionable_type(&self) -> &str {
        self.actionable_type.as_str()
    }

    /// Returns the owning entity identifier.
    #[must_use]
    pub fn actionable_id(&self) -> &str {
        self.actionable_id.as_str()
    }
}

impl std::fmt::Display for ActionableRef {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}#{}",
            self.actionable_type, self.actionable_id
        )
    }
}

/// Action payload built by the recorder, before the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAction {
    actionable: ActionableRef,
    action: ActionKind,
    user_id: Option<ActorId>,
    changeset: Option<Changeset>,
}

impl NewAction {
    /// Creates a validated action payload.
    ///
    /// Update actions must carry a changeset; create and destroy actions must not.
    pub fn new(
        actionable: ActionableRef,
        action: ActionKind,
        user_id: Option<ActorId>,
        changeset: Option<Changeset>,
    ) -> AppResult<Self> {
        validate_changeset_presence(action, changeset.as_ref())?;

        Ok(Self {
            actionable,
            action,
            user_id,
            changeset,
        })
    }

    /// Returns the owning entity reference.
    #[must_use]
    pub fn actionable(&self) -> &ActionableRef {
        &self.actionable
    }

    /// Returns the recorded lifecycle event.
    #[must_use]
    pub fn action(&self) -> ActionKind {
        self.action
    }

    /// Returns the actor that triggered the event.
    #[must_use]
    pub fn user_id(&self) -> Option<&ActorId> {
        self.user_id.as_ref()
    }

    /// Returns the update changeset.
    #[must_use]
    pub fn changeset(&self) -> Option<&Changeset> {
        self.changeset.as_ref()
    }

    /// Completes the payload with store-assigned fields.
    #[must_use]
    pub fn persisted(self, id: ActionId, created_at: DateTime<Utc>) -> Action {
        Action {
            id,
            actionable: self.actionable,
            action: self.action,
            user_id: self.user_id,
            changeset: self.changeset,
            created_at,
        }
    }
}

/// Immutable persisted action record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredAction")]
pub struct Action {
    id: ActionId,
    actionable: ActionableRef,
    action: ActionKind,
    user_id: Option<ActorId>,
    changeset: Option<Changeset>,
    created_at: DateTime<Utc>,
}

impl Action {
    /// Rebuilds a persisted action from stored columns.
    pub fn from_parts(
        id: ActionId,
        actionable: ActionableRef,
        action: ActionKind,
        user_id: Option<ActorId>,
        changeset: Option<Changeset>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        validate_changeset_presence(action, changeset.as_ref())?;

        Ok(Self {
            id,
            actionable,
            action,
            user_id,
            changeset,
            created_at,
        })
    }

    /// Returns the store-assigned identifier.
    #[must_use]
    pub fn id(&self) -> ActionId {
        self.id
    }

    /// Returns the owning entity reference.
    #[must_use]
    pub fn actionable(&self) -> &ActionableRef {
        &self.actionable
    }

    /// Returns the recorded lifecycle event.
    #[must_use]
    pub fn action(&self) -> ActionKind {
        self.action
    }

    /// Returns the actor that triggered the event.
    #[must_use]
    pub fn user_id(&self) -> Option<&ActorId> {
        self.user_id.as_ref()
    }

    /// Returns the update changeset.
    #[must_use]
    pub fn changeset(&self) -> Option<&Changeset> {
        self.changeset.as_ref()
    }

    /// Returns the insertion timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Sort key giving the total order of one entity's history.
    #[must_use]
    pub fn recency_key(&self) -> (DateTime<Utc>, ActionId) {
        (self.created_at, self.id)
    }
}

#[derive(Deserialize)]
struct StoredAction {
    id: ActionId,
    actionable: ActionableRef,
    action: ActionKind,
    user_id: Option<ActorId>,
    changeset: Option<Changeset>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoredAction> for Action {
    type Error = AppError;

    fn try_from(stored: StoredAction) -> Result<Self, Self::Error> {
        Self::from_parts(
            stored.id,
            stored.actionable,
            stored.action,
            stored.user_id,
            stored.changeset,
            stored.created_at,
        )
    }
}

fn validate_changeset_presence(action: ActionKind, changeset: Option<&Changeset>) -> AppResult<()> {
    match (action, changeset) {
        (ActionKind::Update, None) => Err(AppError::Validation(
            "update actions require a changeset".to_owned(),
        )),
        (ActionKind::Create | ActionKind::Destroy, Some(_)) => Err(AppError::Validation(format!(
            "{action} actions must not carry a changeset"
        ))),
        _ => Ok(()),
    }
}
