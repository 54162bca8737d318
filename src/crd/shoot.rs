//! Shoot Custom Resource Definition
//!
//! A Shoot is a tenant cluster whose control plane is hosted on a Seed
//! cluster. The scheduler only ever writes one field of it: `spec.seedName`.

use crate::crd::SeedSelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Shoot purpose value that relaxes region matching during scheduling.
pub const PURPOSE_TESTING: &str = "testing";

/// Failure tolerance type that requires a multi-zonal Seed.
pub const FAILURE_TOLERANCE_ZONE: &str = "zone";

/// Shoot is the Schema for the shoots API
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "garden.io",
    version = "v1alpha1",
    kind = "Shoot",
    namespaced,
    shortname = "sh",
    printcolumn = r#"{"name":"CloudProfile","type":"string","jsonPath":".spec.cloudProfileName"}"#,
    printcolumn = r#"{"name":"Provider","type":"string","jsonPath":".spec.provider.type"}"#,
    printcolumn = r#"{"name":"Region","type":"string","jsonPath":".spec.region"}"#,
    printcolumn = r#"{"name":"Seed","type":"string","jsonPath":".spec.seedName"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ShootSpec {
    /// Name of the CloudProfile providing provider configuration
    pub cloud_profile_name: String,

    /// Provider-specific region the cluster is created in
    pub region: String,

    /// Provider type and worker pools
    pub provider: ShootProvider,

    /// Networking CIDRs of the cluster
    #[serde(default)]
    pub networking: ShootNetworking,

    /// Tolerations for Seed taints
    #[serde(default)]
    pub tolerations: Vec<Toleration>,

    /// Constrains the Seeds this Shoot may be scheduled onto
    #[serde(default)]
    pub seed_selector: Option<SeedSelector>,

    /// Purpose of the cluster ("testing" relaxes region matching)
    #[serde(default)]
    pub purpose: Option<String>,

    /// Control plane configuration
    #[serde(default)]
    pub control_plane: Option<ControlPlane>,

    /// Name of the Seed hosting this Shoot's control plane; empty until scheduled
    #[serde(default)]
    pub seed_name: Option<String>,
}

/// Provider section of a Shoot
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShootProvider {
    /// Provider type (e.g. "aws", "gcp")
    pub r#type: String,

    /// Worker pools of the cluster
    #[serde(default)]
    pub workers: Vec<Worker>,
}

/// A worker pool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    /// Worker pool name
    pub name: String,

    /// Availability zones the pool spans
    #[serde(default)]
    pub zones: Vec<String>,
}

/// Networking CIDRs of a Shoot. Pods and services may be left empty, in
/// which case the Seed's shoot defaults apply.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShootNetworking {
    /// CIDR of the node network
    #[serde(default)]
    pub nodes: Option<String>,

    /// CIDR of the pod network
    #[serde(default)]
    pub pods: Option<String>,

    /// CIDR of the service network
    #[serde(default)]
    pub services: Option<String>,
}

/// Toleration of a Seed taint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
    /// Taint key to tolerate
    pub key: String,

    /// Taint value to tolerate; a missing value tolerates any value
    #[serde(default)]
    pub value: Option<String>,
}

/// Control plane configuration of a Shoot
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlane {
    /// High availability configuration
    #[serde(default)]
    pub high_availability: Option<HighAvailability>,
}

/// High availability configuration of a control plane
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HighAvailability {
    /// Declared failure tolerance
    pub failure_tolerance: FailureTolerance,
}

/// Failure tolerance of a highly available control plane
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailureTolerance {
    /// Tolerance type ("node" or "zone")
    pub r#type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shoot_spec_minimal() {
        let spec: ShootSpec = serde_json::from_str(
            r#"{
                "cloudProfileName": "aws-profile",
                "region": "eu-west-1",
                "provider": {"type": "aws"}
            }"#,
        )
        .unwrap();
        assert_eq!(spec.cloud_profile_name, "aws-profile");
        assert_eq!(spec.provider.r#type, "aws");
        assert!(spec.provider.workers.is_empty());
        assert!(spec.seed_name.is_none());
        assert!(spec.networking.nodes.is_none());
        assert!(spec.tolerations.is_empty());
    }

    #[test]
    fn test_shoot_spec_full() {
        let spec: ShootSpec = serde_json::from_str(
            r#"{
                "cloudProfileName": "aws-profile",
                "region": "eu-west-1",
                "provider": {
                    "type": "aws",
                    "workers": [{"name": "cpu-pool", "zones": ["eu-west-1a", "eu-west-1b"]}]
                },
                "networking": {"nodes": "10.250.0.0/16", "pods": "100.96.0.0/11"},
                "tolerations": [{"key": "quarantine"}],
                "purpose": "testing",
                "controlPlane": {
                    "highAvailability": {"failureTolerance": {"type": "zone"}}
                },
                "seedName": "seed-eu-1"
            }"#,
        )
        .unwrap();
        assert_eq!(spec.provider.workers[0].zones.len(), 2);
        assert_eq!(spec.purpose.as_deref(), Some(PURPOSE_TESTING));
        assert_eq!(
            spec.control_plane
                .unwrap()
                .high_availability
                .unwrap()
                .failure_tolerance
                .r#type,
            FAILURE_TOLERANCE_ZONE
        );
        assert_eq!(spec.seed_name.as_deref(), Some("seed-eu-1"));
        assert!(spec.tolerations[0].value.is_none());
    }
}
