use serde::Serialize;
use serde_json::Value;

use hound_core::{AppError, AppResult};
use hound_domain::{ActionableRef, Changeset};

/// Accessors the recorder needs from a tracked entity.
pub trait Trackable: Send + Sync {
    /// Stable type tag shared by every instance of the entity type.
    fn actionable_type(&self) -> &str;

    /// Identifier of this instance.
    fn actionable_id(&self) -> String;

    /// Per-instance tracking flag. `Some(false)` suppresses recording.
    fn tracking(&self) -> Option<bool>;

    /// Changes not yet committed to the entity store.
    fn pending_changes(&self) -> AppResult<Changeset>;

    /// Tagged reference used to key this instance's actions.
    fn actionable(&self) -> AppResult<ActionableRef> {
        ActionableRef::new(self.actionable_type(), self.actionable_id())
    }
}

/// Domain type that can be wrapped in [`Tracked`].
pub trait Entity: Serialize + Send + Sync {
    /// Type tag stored as `actionable_type`.
    const ACTIONABLE_TYPE: &'static str;

    /// Identifier stored as `actionable_id`.
    fn entity_id(&self) -> String;
}

/// Tracking wrapper around an entity.
///
/// Keeps a JSON snapshot of the last persisted state so pending changes can be
/// computed field by field, plus the per-instance tracking flag.
#[derive(Debug, Clone)]
pub struct Tracked<E> {
    entity: E,
    snapshot: Value,
    tracking: Option<bool>,
}

impl<E: Entity> Tracked<E> {
    /// Wraps an entity whose current state is the persisted baseline.
    pub fn new(entity: E) -> AppResult<Self> {
        let snapshot = snapshot_of(&entity)?;

        Ok(Self {
            entity,
            snapshot,
            tracking: None,
        })
    }

    /// Returns the wrapped entity.
    #[must_use]
    pub fn entity(&self) -> &E {
        &self.entity
    }

    /// Returns the wrapped entity for modification.
    pub fn entity_mut(&mut self) -> &mut E {
        &mut self.entity
    }

    /// Unwraps the entity, discarding tracking state.
    #[must_use]
    pub fn into_inner(self) -> E {
        self.entity
    }

    /// Sets the per-instance tracking flag.
    ///
    /// The flag stays in effect for later lifecycle events until changed again.
    pub fn set_tracking(&mut self, tracking: Option<bool>) {
        self.tracking = tracking;
    }

    /// Field changes between the persisted baseline and the current state.
    pub fn changes(&self) -> AppResult<Changeset> {
        Changeset::diff(&self.snapshot, &snapshot_of(&self.entity)?)
    }

    /// Makes the current state the persisted baseline.
    pub fn mark_persisted(&mut self) -> AppResult<()> {
        self.snapshot = snapshot_of(&self.entity)?;
        Ok(())
    }
}

impl<E: Entity> Trackable for Tracked<E> {
    fn actionable_type(&self) -> &str {
        E::ACTIONABLE_TYPE
    }

    fn actionable_id(&self) -> String {
        self.entity.entity_id()
    }

    fn tracking(&self) -> Option<bool> {
        self.tracking
    }

    fn pending_changes(&self) -> AppResult<Changeset> {
        self.changes()
    }
}

fn snapshot_of<E: Entity>(entity: &E) -> AppResult<Value> {
    let value = serde_json::to_value(entity).map_err(|error| {
        AppError::Validation(format!(
            "failed to snapshot '{}' entity: {error}",
            E::ACTIONABLE_TYPE
        ))
    })?;

    if !value.is_object() {
        return Err(AppError::Validation(format!(
            "'{}' entity must serialize to a JSON object",
            E::ACTIONABLE_TYPE
        )));
    }

    Ok(value)
}
