//! Custom Resource Definitions for the Shoot scheduler
//!
//! The scheduler consumes three resource kinds:
//! - `Shoot`: a tenant cluster waiting for (or holding) a Seed binding
//! - `Seed`: a host cluster offering capacity for Shoot control planes
//! - `CloudProfile`: provider configuration referenced by Shoots

mod cloud_profile;
mod seed;
mod shoot;

pub use cloud_profile::{CloudProfile, CloudProfileSpec};
pub use seed::{
    Seed, SeedBackup, SeedCondition, SeedNetworks, SeedProvider, SeedSettingScheduling,
    SeedSettings, SeedSpec, SeedStatus, SeedTaint, ShootNetworkDefaults, RESOURCE_SHOOTS,
};
pub use shoot::{
    ControlPlane, FailureTolerance, HighAvailability, Shoot, ShootNetworking, ShootProvider,
    ShootSpec, Toleration, Worker, FAILURE_TOLERANCE_ZONE, PURPOSE_TESTING,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selector over Seeds, shared by Shoots and CloudProfiles.
///
/// The label part follows standard Kubernetes label-selector semantics
/// (see [`crate::selector`]). The `providerTypes` list is only consulted
/// when the selector sits on a CloudProfile.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeedSelector {
    /// Label keys and values a Seed must carry verbatim
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,

    /// Expression requirements a Seed's labels must satisfy
    #[serde(default)]
    pub match_expressions: Vec<SelectorRequirement>,

    /// Provider types admitted in addition to the Shoot's own; "*" admits all
    #[serde(default)]
    pub provider_types: Vec<String>,
}

/// A single label-selector requirement
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectorRequirement {
    /// Label key the requirement applies to
    pub key: String,

    /// Operator: In, NotIn, Exists or DoesNotExist
    pub operator: String,

    /// Values for In/NotIn; must be empty for Exists/DoesNotExist
    #[serde(default)]
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_selector_parsing() {
        let selector: SeedSelector = serde_json::from_str(
            r#"{
                "matchLabels": {"garden.io/role": "seed"},
                "matchExpressions": [
                    {"key": "environment", "operator": "In", "values": ["staging", "production"]},
                    {"key": "deprecated", "operator": "DoesNotExist"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(selector.match_labels.len(), 1);
        assert_eq!(selector.match_expressions.len(), 2);
        assert_eq!(selector.match_expressions[0].values.len(), 2);
        assert!(selector.match_expressions[1].values.is_empty());
        assert!(selector.provider_types.is_empty());
    }

    #[test]
    fn test_seed_selector_default_is_empty() {
        let selector = SeedSelector::default();
        assert!(selector.match_labels.is_empty());
        assert!(selector.match_expressions.is_empty());
        assert!(selector.provider_types.is_empty());
    }
}
