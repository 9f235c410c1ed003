//! Tracking configuration: process-wide defaults, per-type options and the resolved
//! policy the recorder consults at runtime.

use std::collections::BTreeSet;
use std::str::FromStr;

use hound_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::ActionKind;

/// Maximum number of actions kept per entity instance. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RetentionLimit(u32);

impl RetentionLimit {
    /// Creates a validated retention limit.
    pub fn new(value: u32) -> AppResult<Self> {
        if value == 0 {
            return Err(AppError::Validation(
                "retention limit must be greater than zero".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the limit value.
    #[must_use]
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for RetentionLimit {
    type Error = AppError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RetentionLimit> for u32 {
    fn from(value: RetentionLimit) -> Self {
        value.0
    }
}

/// Process-wide tracking defaults applied when a type omits an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingDefaults {
    /// Events tracked when a type does not list its own.
    pub actions: BTreeSet<ActionKind>,
    /// Retention limit used when a type does not set its own.
    pub limit: Option<RetentionLimit>,
}

impl Default for TrackingDefaults {
    fn default() -> Self {
        Self {
            actions: ActionKind::all().iter().copied().collect(),
            limit: None,
        }
    }
}

impl TrackingDefaults {
    /// Parses defaults from configuration values.
    ///
    /// `actions` is a comma-separated list of action kinds and `limit` a positive
    /// integer. Absent or blank values keep the built-in defaults.
    pub fn parse(actions: Option<&str>, limit: Option<&str>) -> AppResult<Self> {
        let mut defaults = Self::default();

        if let Some(actions) = actions.map(str::trim).filter(|value| !value.is_empty()) {
            defaults.actions = actions
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ActionKind::from_str)
                .collect::<AppResult<_>>()?;
        }

        if let Some(limit) = limit.map(str::trim).filter(|value| !value.is_empty()) {
            let limit = limit.parse::<u32>().map_err(|error| {
                AppError::Validation(format!("invalid retention limit '{limit}': {error}"))
            })?;
            defaults.limit = Some(RetentionLimit::new(limit)?);
        }

        Ok(defaults)
    }
}

/// Per-type tracking declaration. Absent fields fall back to [`TrackingDefaults`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingOptions {
    /// Tracked events for the type.
    pub actions: Option<Vec<ActionKind>>,
    /// Retention limit for the type.
    pub limit: Option<u32>,
}

impl TrackingOptions {
    /// Restricts tracking to the given events.
    #[must_use]
    pub fn with_actions(mut self, actions: impl IntoIterator<Item = ActionKind>) -> Self {
        self.actions = Some(actions.into_iter().collect());
        self
    }

    /// Overrides the retention limit.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Resolves the declaration against process-wide defaults.
    pub fn resolve(&self, defaults: &TrackingDefaults) -> AppResult<TrackingPolicy> {
        let tracked = match &self.actions {
            Some(actions) => actions.iter().copied().collect(),
            None => defaults.actions.clone(),
        };
        let limit = match self.limit {
            Some(limit) => Some(RetentionLimit::new(limit)?),
            None => defaults.limit,
        };

        Ok(TrackingPolicy { tracked, limit })
    }
}

/// Immutable tracking policy resolved for one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingPolicy {
    tracked: BTreeSet<ActionKind>,
    limit: Option<RetentionLimit>,
}

impl TrackingPolicy {
    /// Returns whether the event produces action records for this type.
    #[must_use]
    pub fn tracks(&self, action: ActionKind) -> bool {
        self.tracked.contains(&action)
    }

    /// Returns the tracked events in storage order.
    pub fn tracked_actions(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.tracked.iter().copied()
    }

    /// Returns the retention limit, if any.
    #[must_use]
    pub fn limit(&self) -> Option<RetentionLimit> {
        self.limit
    }
}

/// Returns whether a per-instance tracking flag enables recording.
///
/// Unset and `true` both enable tracking; only an explicit `false` disables it.
#[must_use]
pub fn is_tracking_enabled(flag: Option<bool>) -> bool {
    flag != Some(false)
}
