//! Default event processor
//!
//! Consumes the three watch streams and surfaces each change with the
//! identifiers derived from its spec. The actual reconciliation engine
//! deciding what to create, update, or delete is a separate concern wired
//! in by replacing this `EventProcessor` implementation; the dispatcher is
//! what the operator runs when none is supplied.

use async_trait::async_trait;
use kube::ResourceExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::controller::keys;
use crate::crd::FlannelNetwork;
use crate::error::{Error, Result};
use crate::operator::{EventProcessor, WatchStreams};

#[derive(Debug, Default)]
pub struct Dispatcher;

impl Dispatcher {
    pub fn new() -> Self {
        Self
    }

    fn handle_update(&self, network: &FlannelNetwork) {
        let spec = &network.spec;

        if let Err(errors) = spec.validate() {
            for e in &errors {
                warn!(
                    object = %network.name_any(),
                    field = %e.field,
                    "spec validation: {}",
                    e.message
                );
            }
        }

        info!(
            object = %network.name_any(),
            cluster = %spec.cluster_id,
            namespace = %keys::network_namespace(spec),
            bridge = %keys::network_bridge_name(spec),
            device = %keys::network_flannel_device(spec),
            "dispatching network update"
        );
    }

    fn handle_delete(&self, network: &FlannelNetwork) {
        let spec = &network.spec;

        info!(
            object = %network.name_any(),
            cluster = %spec.cluster_id,
            namespace = %keys::destroyer_namespace(spec),
            bridge = %keys::network_bridge_name(spec),
            "dispatching network deletion"
        );
    }
}

#[async_trait]
impl EventProcessor for Dispatcher {
    /// Drain all three streams until the token fires
    ///
    /// A closed stream without cancellation means the watch plumbing is
    /// gone; that is reported as a transient error so the supervisor can
    /// rebuild the whole watch.
    async fn process(&self, mut streams: WatchStreams, shutdown: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("event dispatch cancelled");
                    return Ok(());
                }
                update = streams.updates.recv() => match update {
                    Some(network) => self.handle_update(&network),
                    None => return Err(Error::WatchError("update stream closed".to_string())),
                },
                delete = streams.deletes.recv() => match delete {
                    Some(network) => self.handle_delete(&network),
                    None => return Err(Error::WatchError("delete stream closed".to_string())),
                },
                stream_err = streams.errors.recv() => match stream_err {
                    Some(e) => warn!(error = %e, "watch stream reported an error"),
                    None => return Err(Error::WatchError("error stream closed".to_string())),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::crd::FlannelNetworkSpec;

    struct Channels {
        deletes: mpsc::Sender<FlannelNetwork>,
        updates: mpsc::Sender<FlannelNetwork>,
        errors: mpsc::Sender<Error>,
    }

    fn streams() -> (Channels, WatchStreams) {
        let (delete_tx, deletes) = mpsc::channel(8);
        let (update_tx, updates) = mpsc::channel(8);
        let (error_tx, errors) = mpsc::channel(8);
        (
            Channels {
                deletes: delete_tx,
                updates: update_tx,
                errors: error_tx,
            },
            WatchStreams {
                deletes,
                updates,
                errors,
            },
        )
    }

    fn network(cluster_id: &str) -> FlannelNetwork {
        FlannelNetwork::new(
            cluster_id,
            FlannelNetworkSpec {
                cluster_id: cluster_id.to_string(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_process_stops_on_cancellation() {
        let (channels, streams) = streams();
        let shutdown = CancellationToken::new();

        let dispatcher_shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            Dispatcher::new().process(streams, dispatcher_shutdown).await
        });

        channels
            .updates
            .send(network("ab12"))
            .await
            .expect("dispatcher is receiving");
        channels
            .deletes
            .send(network("cd34"))
            .await
            .expect("dispatcher is receiving");
        channels
            .errors
            .send(Error::WatchError("connection reset".to_string()))
            .await
            .expect("dispatcher is receiving");

        shutdown.cancel();

        handle
            .await
            .expect("dispatch task panicked")
            .expect("cancellation ends dispatch cleanly");
    }

    #[tokio::test]
    async fn test_closed_streams_are_a_transient_error() {
        let (channels, streams) = streams();
        drop(channels);

        let err = Dispatcher::new()
            .process(streams, CancellationToken::new())
            .await
            .expect_err("closed streams mean the watch is gone");

        assert!(matches!(err, Error::WatchError(_)));
    }
}
