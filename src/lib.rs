//! Shoot scheduler
//!
//! A Kubernetes controller that assigns each unscheduled Shoot (a tenant
//! cluster) to a Seed (a host cluster) from a pool of candidates, subject
//! to provider, region, network, capacity, topology and tolerance
//! constraints.
//!
//! ## Custom Resources
//!
//! - `Shoot`: the workload being scheduled; the controller writes exactly
//!   one field of it (`spec.seedName`) via the `binding` subresource
//! - `Seed`: a candidate host cluster
//! - `CloudProfile`: provider configuration referenced by Shoots
//!
//! ## Example
//!
//! ```yaml
//! apiVersion: garden.io/v1alpha1
//! kind: Shoot
//! metadata:
//!   name: my-cluster
//!   namespace: garden-team-a
//! spec:
//!   cloudProfileName: aws-profile
//!   region: eu-west-1
//!   provider:
//!     type: aws
//! ```

pub mod candidates;
pub mod conditions;
pub mod config;
pub mod controllers;
pub mod crd;
pub mod error;
pub mod leader_election;
pub mod network;
pub mod selector;

pub use candidates::{calculate_seed_usage, determine_seed, SchedulingError};
pub use config::{SchedulerConfig, Strategy};
pub use controllers::SchedulerController;
pub use crd::{CloudProfile, Seed, SeedSelector, Shoot};
pub use error::{Result, SchedulerError};
