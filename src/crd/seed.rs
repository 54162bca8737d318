//! Seed Custom Resource Definition
//!
//! A Seed is a host cluster offering capacity to run Shoot control planes.
//! Seeds are cluster-scoped; the scheduler only reads them.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the shoot-capacity entry in `status.allocatable`.
pub const RESOURCE_SHOOTS: &str = "shoots";

/// Seed is the Schema for the seeds API
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "garden.io",
    version = "v1alpha1",
    kind = "Seed",
    status = "SeedStatus",
    printcolumn = r#"{"name":"Provider","type":"string","jsonPath":".spec.provider.type"}"#,
    printcolumn = r#"{"name":"Region","type":"string","jsonPath":".spec.provider.region"}"#,
    printcolumn = r#"{"name":"Visible","type":"boolean","jsonPath":".spec.settings.scheduling.visible"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SeedSpec {
    /// Provider type, region and zones of the Seed
    pub provider: SeedProvider,

    /// Seed settings
    #[serde(default)]
    pub settings: SeedSettings,

    /// Networking CIDRs of the Seed
    pub networks: SeedNetworks,

    /// Taints repelling Shoots that do not tolerate them
    #[serde(default)]
    pub taints: Vec<SeedTaint>,

    /// Backup bucket configuration; when set, the Seed must additionally
    /// report BackupBucketsReady before it is considered usable
    #[serde(default)]
    pub backup: Option<SeedBackup>,
}

/// Provider section of a Seed
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedProvider {
    /// Provider type (e.g. "aws", "gcp")
    pub r#type: String,

    /// Provider-specific region
    pub region: String,

    /// Availability zones of the Seed
    #[serde(default)]
    pub zones: Vec<String>,
}

/// Seed settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeedSettings {
    /// Scheduling-related settings
    #[serde(default)]
    pub scheduling: SeedSettingScheduling,
}

/// Controls whether the Seed is considered for scheduling at all
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedSettingScheduling {
    /// Invisible Seeds are skipped by the scheduler
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl Default for SeedSettingScheduling {
    fn default() -> Self {
        Self {
            visible: default_visible(),
        }
    }
}

/// Networking CIDRs of a Seed
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedNetworks {
    /// CIDR of the node network
    #[serde(default)]
    pub nodes: Option<String>,

    /// CIDR of the pod network
    pub pods: String,

    /// CIDR of the service network
    pub services: String,

    /// Default pod/service CIDRs handed to Shoots that omit their own
    #[serde(default)]
    pub shoot_defaults: Option<ShootNetworkDefaults>,
}

/// Fallback CIDRs for Shoots scheduled onto this Seed
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShootNetworkDefaults {
    /// Default pod network CIDR
    #[serde(default)]
    pub pods: Option<String>,

    /// Default service network CIDR
    #[serde(default)]
    pub services: Option<String>,
}

/// Taint repelling Shoots without a matching toleration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedTaint {
    /// Taint key
    pub key: String,

    /// Taint value
    #[serde(default)]
    pub value: Option<String>,
}

/// Backup configuration of a Seed
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedBackup {
    /// Provider type of the backup bucket
    pub provider: String,

    /// Region of the backup bucket
    #[serde(default)]
    pub region: Option<String>,
}

/// Status of a Seed
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeedStatus {
    /// Conditions reported by the Seed's agent
    #[serde(default)]
    pub conditions: Vec<SeedCondition>,

    /// Resource capacity still considered schedulable; the "shoots" key
    /// caps the number of hosted control planes
    #[serde(default)]
    pub allocatable: BTreeMap<String, i64>,
}

/// Condition of a Seed
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedCondition {
    /// Type of condition
    pub r#type: String,

    /// Status of the condition (True, False, Unknown)
    pub status: String,

    /// Last time the condition transitioned
    #[serde(default)]
    pub last_transition_time: Option<String>,

    /// Reason for the condition
    #[serde(default)]
    pub reason: Option<String>,

    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

fn default_visible() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_spec_defaults() {
        let spec: SeedSpec = serde_json::from_str(
            r#"{
                "provider": {"type": "aws", "region": "eu-west-1"},
                "networks": {"pods": "10.0.0.0/16", "services": "10.1.0.0/16"}
            }"#,
        )
        .unwrap();
        assert!(spec.settings.scheduling.visible);
        assert!(spec.taints.is_empty());
        assert!(spec.backup.is_none());
        assert!(spec.networks.nodes.is_none());
        assert!(spec.networks.shoot_defaults.is_none());
    }

    #[test]
    fn test_seed_visibility_explicit() {
        let spec: SeedSpec = serde_json::from_str(
            r#"{
                "provider": {"type": "aws", "region": "eu-west-1", "zones": ["a", "b", "c"]},
                "settings": {"scheduling": {"visible": false}},
                "networks": {"pods": "10.0.0.0/16", "services": "10.1.0.0/16"}
            }"#,
        )
        .unwrap();
        assert!(!spec.settings.scheduling.visible);
        assert_eq!(spec.provider.zones.len(), 3);
    }

    #[test]
    fn test_seed_status_allocatable() {
        let status: SeedStatus = serde_json::from_str(
            r#"{
                "conditions": [{"type": "GardenletReady", "status": "True"}],
                "allocatable": {"shoots": 250}
            }"#,
        )
        .unwrap();
        assert_eq!(status.allocatable.get(RESOURCE_SHOOTS), Some(&250));
        assert_eq!(status.conditions[0].r#type, "GardenletReady");
    }

    #[test]
    fn test_seed_status_uncapped() {
        let status: SeedStatus = serde_json::from_str("{}").unwrap();
        assert!(status.allocatable.get(RESOURCE_SHOOTS).is_none());
    }
}
