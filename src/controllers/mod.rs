//! Controllers for the Shoot scheduler
//!
//! A single controller watches Shoots and assigns each unscheduled one to
//! a Seed cluster.

mod scheduler;

pub use scheduler::{
    SchedulerController, EVENT_SCHEDULING_FAILED, EVENT_SCHEDULING_SUCCESSFUL,
};

use crate::error::SchedulerError;
use kube::runtime::controller::Action;
use std::time::Duration;

/// Exponential backoff error policy for reconciliation failures.
/// Categorizes errors by severity to choose appropriate retry delays.
pub(crate) fn error_policy_backoff<K>(
    _object: std::sync::Arc<K>,
    error: &SchedulerError,
    _ctx: std::sync::Arc<impl std::any::Any + Send + Sync>,
) -> Action {
    let delay_secs = match error {
        // Transient K8s API errors — retry quickly
        SchedulerError::KubeApi(_) => 10,
        // Referenced resource not yet available — moderate wait
        SchedulerError::NotFound(_) => 15,
        // No candidate found; the inventory has to change first
        SchedulerError::Scheduling(_) => 30,
        // Config/serialization errors unlikely to self-heal — back off further
        SchedulerError::Configuration(_) | SchedulerError::Serialization(_) => 60,
    };

    Action::requeue(Duration::from_secs(delay_secs))
}
