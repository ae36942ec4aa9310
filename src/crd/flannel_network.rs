//! FlannelNetwork Custom Resource Definition
//!
//! A FlannelNetwork describes one tenant cluster's network overlay: the
//! flannel daemon settings, the host bridge configuration, and the health
//! checker image. The operator watches instances of this resource and
//! derives every concrete identifier (namespaces, device names, ports,
//! file paths) from the spec.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Upper bound of the 24-bit VXLAN network identifier space
const VNI_MAX: i32 = 0xFF_FFFF;

/// Structured validation error for `FlannelNetworkSpec`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecValidationError {
    pub field: String,
    pub message: String,
    pub how_to_fix: String,
}

impl SpecValidationError {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        how_to_fix: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            how_to_fix: how_to_fix.into(),
        }
    }
}

#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "networking.flannel.dev",
    version = "v1alpha1",
    kind = "FlannelNetwork",
    namespaced,
    shortname = "fln",
    printcolumn = r#"{"name":"Cluster","type":"string","jsonPath":".spec.clusterId"}"#,
    printcolumn = r#"{"name":"Customer","type":"string","jsonPath":".spec.customer"}"#,
    printcolumn = r#"{"name":"VNI","type":"integer","jsonPath":".spec.flannel.vni"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase", default)]
pub struct FlannelNetworkSpec {
    /// Customer owning the tenant cluster
    pub customer: String,

    /// Canonical short identifier of the cluster; every derived name
    /// (bridge, tap, namespaces) embeds this value
    pub cluster_id: String,

    /// Namespace the tenant cluster's resources live in
    pub cluster_namespace: String,

    pub flannel: FlannelConfig,

    pub bridge: BridgeConfig,

    pub health: HealthConfig,
}

/// Flannel daemon settings for one overlay segment
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FlannelConfig {
    pub docker_image: String,

    /// Host directory flannel writes its runtime state into
    pub run_dir: String,

    /// Virtual network identifier distinguishing overlay segments
    pub vni: i32,
}

/// Host bridge settings connecting the overlay to the node
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    pub docker_image: String,

    pub private_network: String,

    /// Host interface the bridge attaches to
    pub interface_name: String,

    /// DNS server addresses, rendered into the bridge network config in order
    pub dns: Vec<String>,

    /// NTP server addresses, rendered into the bridge network config in order
    pub ntp: Vec<String>,
}

/// Health checker sidecar settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthConfig {
    pub docker_image: String,
}

impl FlannelNetworkSpec {
    /// Validate the spec
    ///
    /// Validation is advisory: a degenerate spec still produces well-defined
    /// derived names, so the dispatcher logs failures instead of rejecting
    /// events.
    pub fn validate(&self) -> Result<(), Vec<SpecValidationError>> {
        let mut errors: Vec<SpecValidationError> = Vec::new();

        if self.cluster_id.is_empty() {
            errors.push(SpecValidationError::new(
                "spec.clusterId",
                "Cluster ID must not be empty",
                "Set spec.clusterId to the cluster's canonical short identifier.",
            ));
        }

        if self.flannel.vni < 0 || self.flannel.vni > VNI_MAX {
            errors.push(SpecValidationError::new(
                "spec.flannel.vni",
                format!("VNI {} is outside the valid range 0-{}", self.flannel.vni, VNI_MAX),
                "Choose a VNI within the 24-bit VXLAN identifier space.",
            ));
        }

        if self.flannel.run_dir.is_empty() {
            errors.push(SpecValidationError::new(
                "spec.flannel.runDir",
                "Flannel run directory must not be empty",
                "Set spec.flannel.runDir to the host directory flannel uses, e.g. /run/flannel.",
            ));
        }

        for (i, addr) in self.bridge.dns.iter().enumerate() {
            if addr.parse::<std::net::IpAddr>().is_err() {
                errors.push(SpecValidationError::new(
                    format!("spec.bridge.dns[{}]", i),
                    format!("{:?} is not a valid IP address", addr),
                    "DNS servers must be given as plain IPv4 or IPv6 addresses.",
                ));
            }
        }

        for (i, addr) in self.bridge.ntp.iter().enumerate() {
            if addr.parse::<std::net::IpAddr>().is_err() {
                errors.push(SpecValidationError::new(
                    format!("spec.bridge.ntp[{}]", i),
                    format!("{:?} is not a valid IP address", addr),
                    "NTP servers must be given as plain IPv4 or IPv6 addresses.",
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
