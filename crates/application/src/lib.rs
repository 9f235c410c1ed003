//! Application services and ports.

#![forbid(unsafe_code)]

mod action_ports;
mod action_recorder;
mod retention_enforcer;
mod trackable;
mod tracked_repository;
mod tracking_registry;

#[cfg(test)]
mod test_support;

pub use action_ports::{ActionRepository, EntityStore};
pub use action_recorder::ActionRecorder;
pub use retention_enforcer::{RetentionEnforcer, RetentionSweepSummary};
pub use trackable::{Entity, Trackable, Tracked};
pub use tracked_repository::TrackedRepository;
pub use tracking_registry::{TrackingRegistry, TrackingRegistryBuilder};
