//! Custom Resource Definitions for the flannel operator

mod flannel_network;


pub use flannel_network::{
    BridgeConfig, FlannelConfig, FlannelNetwork, FlannelNetworkSpec, HealthConfig,
    SpecValidationError,
};
