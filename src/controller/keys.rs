//! Identifier derivation for overlay network resources
//!
//! Every concrete name the operator's resources use (namespaces, bridge and
//! tap devices, etcd keys, env file paths, probe addresses) is a pure
//! function of the FlannelNetworkSpec. Downstream manifest builders key on
//! these exact strings, so the formulas here are compatibility-sensitive.
//! Nothing in this module performs I/O or caches results.

use crate::crd::FlannelNetworkSpec;

/// App label for resources running flannel components
const NETWORK_APP: &str = "flannel-network";
/// App label for resources cleaning up flannel networks and bridges
const DESTROYER_APP: &str = "flannel-destroyer";

/// Base port for liveness probes; the VNI is added to it
pub const PORT_BASE: i32 = 21000;
/// Health endpoint served by the health checker
pub const HEALTH_ENDPOINT: &str = "/healthz";
/// Liveness probe host
pub const PROBE_HOST: &str = "127.0.0.1";
/// Liveness probe timing, reproduced verbatim by downstream pod templates
pub const INITIAL_DELAY_SECONDS: i32 = 10;
pub const TIMEOUT_SECONDS: i32 = 5;
pub const PERIOD_SECONDS: i32 = 10;
pub const FAILURE_THRESHOLD: i32 = 2;
pub const SUCCESS_THRESHOLD: i32 = 1;

/// Namespace the network components for this cluster run in
pub fn network_namespace(spec: &FlannelNetworkSpec) -> String {
    format!("{}-{}", NETWORK_APP, spec.cluster_id)
}

/// Namespace the cleanup components for this cluster run in
pub fn destroyer_namespace(spec: &FlannelNetworkSpec) -> String {
    format!("{}-{}", DESTROYER_APP, spec.cluster_id)
}

/// Name of the host bridge carrying this cluster's traffic
pub fn network_bridge_name(spec: &FlannelNetworkSpec) -> String {
    format!("br-{}", spec.cluster_id)
}

/// Name of the tap device attached to the bridge
pub fn network_tap_name(spec: &FlannelNetworkSpec) -> String {
    format!("tap-{}", spec.cluster_id)
}

/// Name of the flannel VXLAN device for this overlay segment
pub fn network_flannel_device(spec: &FlannelNetworkSpec) -> String {
    format!("flannel.{}", spec.flannel.vni)
}

/// Liveness probe port; offset by the VNI so probes of different overlays
/// on the same host never collide
pub fn liveness_port(spec: &FlannelNetworkSpec) -> i32 {
    PORT_BASE + spec.flannel.vni
}

/// Address the health checker listens on
pub fn health_listen_address(spec: &FlannelNetworkSpec) -> String {
    format!("http://{}:{}", PROBE_HOST, liveness_port(spec))
}

/// Etcd key prefix holding this network's flannel configuration
pub fn etcd_network_path(spec: &FlannelNetworkSpec) -> String {
    format!("coreos.com/network/{}", network_bridge_name(spec))
}

/// Etcd key holding the network config document
pub fn etcd_network_config_path(spec: &FlannelNetworkSpec) -> String {
    format!("{}/config", etcd_network_path(spec))
}

/// Path of the env file flannel writes for this network
pub fn network_env_file_path(spec: &FlannelNetworkSpec) -> String {
    format!(
        "{}/networks/{}.env",
        spec.flannel.run_dir,
        network_bridge_name(spec)
    )
}

/// `DNS=<addr>` lines for the bridge network config, in spec order
pub fn network_dns_block(spec: &FlannelNetworkSpec) -> String {
    spec.bridge
        .dns
        .iter()
        .map(|addr| format!("DNS={}", addr))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `NTP=<addr>` lines for the bridge network config, in spec order
pub fn network_ntp_block(spec: &FlannelNetworkSpec) -> String {
    spec.bridge
        .ntp
        .iter()
        .map(|addr| format!("NTP={}", addr))
        .collect::<Vec<_>>()
        .join("\n")
}
