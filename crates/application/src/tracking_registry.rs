use std::collections::HashMap;

use hound_core::{AppError, AppResult};
use hound_domain::{TrackingDefaults, TrackingOptions, TrackingPolicy};

use crate::Entity;

/// Immutable map from entity type tag to its resolved tracking policy.
#[derive(Debug, Clone, Default)]
pub struct TrackingRegistry {
    policies: HashMap<String, TrackingPolicy>,
}

impl TrackingRegistry {
    /// Starts a registry resolved against the given defaults.
    #[must_use]
    pub fn builder(defaults: TrackingDefaults) -> TrackingRegistryBuilder {
        TrackingRegistryBuilder {
            defaults,
            policies: HashMap::new(),
        }
    }

    /// Returns the policy for a type tag, or `None` when the type did not opt in.
    #[must_use]
    pub fn policy_for(&self, actionable_type: &str) -> Option<&TrackingPolicy> {
        self.policies.get(actionable_type)
    }

    /// Returns the registered type tags in name order.
    #[must_use]
    pub fn registered_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

/// Collects per-type declarations at setup time.
#[derive(Debug)]
pub struct TrackingRegistryBuilder {
    defaults: TrackingDefaults,
    policies: HashMap<String, TrackingPolicy>,
}

impl TrackingRegistryBuilder {
    /// Registers an entity type under its [`Entity::ACTIONABLE_TYPE`] tag.
    pub fn register<E: Entity>(self, options: TrackingOptions) -> AppResult<Self> {
        self.register_type(E::ACTIONABLE_TYPE, options)
    }

    /// Registers a type tag directly.
    pub fn register_type(
        mut self,
        actionable_type: impl Into<String>,
        options: TrackingOptions,
    ) -> AppResult<Self> {
        let actionable_type = actionable_type.into();
        if actionable_type.trim().is_empty() {
            return Err(AppError::Validation(
                "actionable type must not be empty".to_owned(),
            ));
        }
        if self.policies.contains_key(&actionable_type) {
            return Err(AppError::Conflict(format!(
                "actionable type '{actionable_type}' is already registered"
            )));
        }

        let policy = options.resolve(&self.defaults)?;
        self.policies.insert(actionable_type, policy);
        Ok(self)
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> TrackingRegistry {
        TrackingRegistry {
            policies: self.policies,
        }
    }
}
