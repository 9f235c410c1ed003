//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod action;
mod changeset;
mod tracking;

pub use action::{Action, ActionId, ActionKind, ActionableRef, NewAction};
pub use changeset::{Changeset, FieldChange};
pub use tracking::{
    RetentionLimit, TrackingDefaults, TrackingOptions, TrackingPolicy, is_tracking_enabled,
};
