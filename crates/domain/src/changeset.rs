use std::collections::BTreeMap;

use hound_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Previous and new value of one changed field.
///
/// Serialized as a two-element array `[previous, current]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Value, Value)", into = "(Value, Value)")]
pub struct FieldChange {
    previous: Value,
    current: Value,
}

impl FieldChange {
    /// Creates a field change.
    #[must_use]
    pub fn new(previous: Value, current: Value) -> Self {
        Self { previous, current }
    }

    /// Returns the value before the change.
    #[must_use]
    pub fn previous(&self) -> &Value {
        &self.previous
    }

    /// Returns the value after the change.
    #[must_use]
    pub fn current(&self) -> &Value {
        &self.current
    }
}

impl From<(Value, Value)> for FieldChange {
    fn from((previous, current): (Value, Value)) -> Self {
        Self::new(previous, current)
    }
}

impl From<FieldChange> for (Value, Value) {
    fn from(change: FieldChange) -> Self {
        (change.previous, change.current)
    }
}

/// Changed field names mapped to their previous and new values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Changeset(BTreeMap<String, FieldChange>);

impl Changeset {
    /// Creates an empty changeset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the changeset between two JSON objects.
    ///
    /// A field present on only one side is compared against `null`. Fields with equal
    /// values on both sides are left out.
    pub fn diff(previous: &Value, current: &Value) -> AppResult<Self> {
        let previous = as_object(previous, "previous")?;
        let current = as_object(current, "current")?;

        let mut changes = BTreeMap::new();
        for field in previous.keys().chain(current.keys()) {
            if changes.contains_key(field) {
                continue;
            }

            let before = previous.get(field).unwrap_or(&Value::Null);
            let after = current.get(field).unwrap_or(&Value::Null);
            if before != after {
                changes.insert(
                    field.clone(),
                    FieldChange::new(before.clone(), after.clone()),
                );
            }
        }

        Ok(Self(changes))
    }

    /// Records a change for one field, replacing any earlier entry.
    pub fn insert(&mut self, field: impl Into<String>, change: FieldChange) {
        self.0.insert(field.into(), change);
    }

    /// Returns the change recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.get(field)
    }

    /// Iterates changed fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldChange)> {
        self.0.iter().map(|(field, change)| (field.as_str(), change))
    }

    /// Returns the number of changed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no field changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn as_object<'a>(value: &'a Value, side: &str) -> AppResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        AppError::Validation(format!(
            "{side} entity state must serialize to a JSON object"
        ))
    })
}
