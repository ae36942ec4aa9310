//! Unit tests for identifier derivation

#[cfg(test)]
mod tests {
    use crate::controller::keys;
    use crate::crd::{BridgeConfig, FlannelConfig, FlannelNetworkSpec};

    /// Helper mirroring a typical tenant cluster spec
    fn sample_spec() -> FlannelNetworkSpec {
        FlannelNetworkSpec {
            customer: "acme".to_string(),
            cluster_id: "ab12".to_string(),
            cluster_namespace: "ab12".to_string(),
            flannel: FlannelConfig {
                docker_image: "quay.io/coreos/flannel:v0.10.0".to_string(),
                run_dir: "/run/flannel".to_string(),
                vni: 5,
            },
            bridge: BridgeConfig {
                docker_image: "alpine:3.18".to_string(),
                private_network: "10.1.0.0/16".to_string(),
                interface_name: "bond0".to_string(),
                dns: vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()],
                ntp: vec!["162.159.200.1".to_string()],
            },
            health: Default::default(),
        }
    }

    #[test]
    fn test_namespaces() {
        let spec = sample_spec();
        assert_eq!(keys::network_namespace(&spec), "flannel-network-ab12");
        assert_eq!(keys::destroyer_namespace(&spec), "flannel-destroyer-ab12");
    }

    #[test]
    fn test_device_names() {
        let spec = sample_spec();
        assert_eq!(keys::network_bridge_name(&spec), "br-ab12");
        assert_eq!(keys::network_tap_name(&spec), "tap-ab12");
        assert_eq!(keys::network_flannel_device(&spec), "flannel.5");
    }

    #[test]
    fn test_liveness_address() {
        let spec = sample_spec();
        assert_eq!(keys::liveness_port(&spec), 21005);
        assert_eq!(
            keys::health_listen_address(&spec),
            "http://127.0.0.1:21005"
        );
    }

    #[test]
    fn test_liveness_constants() {
        // Downstream pod templates depend on these exact values.
        assert_eq!(keys::PORT_BASE, 21000);
        assert_eq!(keys::HEALTH_ENDPOINT, "/healthz");
        assert_eq!(keys::PROBE_HOST, "127.0.0.1");
        assert_eq!(keys::INITIAL_DELAY_SECONDS, 10);
        assert_eq!(keys::TIMEOUT_SECONDS, 5);
        assert_eq!(keys::PERIOD_SECONDS, 10);
        assert_eq!(keys::FAILURE_THRESHOLD, 2);
        assert_eq!(keys::SUCCESS_THRESHOLD, 1);
    }

    #[test]
    fn test_etcd_paths() {
        let spec = sample_spec();
        assert_eq!(keys::etcd_network_path(&spec), "coreos.com/network/br-ab12");
        assert_eq!(
            keys::etcd_network_config_path(&spec),
            "coreos.com/network/br-ab12/config"
        );
    }

    #[test]
    fn test_env_file_path() {
        let spec = sample_spec();
        assert_eq!(
            keys::network_env_file_path(&spec),
            "/run/flannel/networks/br-ab12.env"
        );
    }

    #[test]
    fn test_dns_block_preserves_order() {
        let spec = sample_spec();
        assert_eq!(keys::network_dns_block(&spec), "DNS=8.8.8.8\nDNS=1.1.1.1");

        let mut reversed = spec.clone();
        reversed.bridge.dns.reverse();
        assert_eq!(
            keys::network_dns_block(&reversed),
            "DNS=1.1.1.1\nDNS=8.8.8.8"
        );
    }

    #[test]
    fn test_dns_block_empty_list() {
        let mut spec = sample_spec();
        spec.bridge.dns.clear();
        assert_eq!(keys::network_dns_block(&spec), "");
    }

    #[test]
    fn test_dns_block_line_count_matches_input() {
        let mut spec = sample_spec();
        spec.bridge.dns = (0..5).map(|i| format!("10.0.0.{}", i)).collect();

        let block = keys::network_dns_block(&spec);
        assert_eq!(block.lines().count(), 5);
    }

    #[test]
    fn test_ntp_block() {
        let spec = sample_spec();
        assert_eq!(keys::network_ntp_block(&spec), "NTP=162.159.200.1");

        let mut empty = spec;
        empty.bridge.ntp.clear();
        assert_eq!(keys::network_ntp_block(&empty), "");
    }

    #[test]
    fn test_degenerate_empty_spec() {
        // An empty spec yields degenerate but well-defined names; nothing
        // panics and nothing errors.
        let spec = FlannelNetworkSpec::default();
        assert_eq!(keys::network_bridge_name(&spec), "br-");
        assert_eq!(keys::network_tap_name(&spec), "tap-");
        assert_eq!(keys::network_flannel_device(&spec), "flannel.0");
        assert_eq!(keys::liveness_port(&spec), 21000);
        assert_eq!(keys::network_env_file_path(&spec), "/networks/br-.env");
    }

    #[test]
    fn test_derivations_are_referentially_transparent() {
        let spec = sample_spec();
        let other = sample_spec();

        assert_eq!(keys::network_namespace(&spec), keys::network_namespace(&other));
        assert_eq!(keys::etcd_network_config_path(&spec), keys::etcd_network_config_path(&other));
        assert_eq!(keys::network_dns_block(&spec), keys::network_dns_block(&other));
        assert_eq!(keys::health_listen_address(&spec), keys::health_listen_address(&other));
    }

    #[tokio::test]
    async fn test_concurrent_derivations_do_not_interfere() {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                tokio::spawn(async {
                    let spec = sample_spec();
                    (keys::network_bridge_name(&spec), keys::liveness_port(&spec))
                })
            })
            .collect();

        for handle in handles {
            let (bridge, port) = handle.await.expect("derivation task panicked");
            assert_eq!(bridge, "br-ab12");
            assert_eq!(port, 21005);
        }
    }
}
