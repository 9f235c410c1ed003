use serde::{Deserialize, Serialize};

use crate::{AppResult, NonEmptyString};

/// Identifier of the actor that triggered a lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(NonEmptyString);

impl ActorId {
    /// Creates a validated actor identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(NonEmptyString::new(value)?))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Request-scoped actor information passed into every recording call.
///
/// The request boundary creates one context when a request starts and drops it when the
/// request ends. Recording code only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorContext {
    user_id: Option<ActorId>,
}

impl ActorContext {
    /// Creates a context attributed to the given actor.
    #[must_use]
    pub fn for_user(user_id: ActorId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// Creates a context with no known actor (jobs, consoles, migrations).
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns the current actor, if one is known.
    #[must_use]
    pub fn user_id(&self) -> Option<&ActorId> {
        self.user_id.as_ref()
    }
}
