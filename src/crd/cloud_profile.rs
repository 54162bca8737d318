//! CloudProfile Custom Resource Definition
//!
//! A CloudProfile bundles per-provider configuration referenced by Shoots.
//! The scheduler consults its seed selector to constrain and widen the set
//! of Seeds a Shoot may land on.

use crate::crd::SeedSelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// CloudProfile is the Schema for the cloudprofiles API
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "garden.io",
    version = "v1alpha1",
    kind = "CloudProfile",
    shortname = "cprofile",
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct CloudProfileSpec {
    /// Constrains the Seeds eligible for Shoots using this profile. Its
    /// providerTypes list additionally enables cross-provider scheduling
    /// ("*" admits every provider).
    #[serde(default)]
    pub seed_selector: Option<SeedSelector>,
}
