//! Watch event streams and the processing contract
//!
//! The event source yields three independently ordered streams for the
//! FlannelNetwork type: deletes, updates, and stream-level errors. The
//! event processor consumes all three until its cancellation token fires.
//! The boot supervisor depends on both only through the traits here.

use async_trait::async_trait;
use futures::StreamExt;
use kube::api::Api;
use kube::runtime::{watcher, WatchStreamExt};
use kube::Client;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::crd::FlannelNetwork;
use crate::error::{Error, Result};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The three event streams produced by one watch
///
/// Streams are ordered individually; no ordering holds across them. The
/// `errors` stream carries watch-level failures (lost connections and the
/// like) separately from object payloads.
pub struct WatchStreams {
    pub deletes: mpsc::Receiver<FlannelNetwork>,
    pub updates: mpsc::Receiver<FlannelNetwork>,
    pub errors: mpsc::Receiver<Error>,
}

/// Capability producing watch event streams for FlannelNetwork objects
///
/// `namespace: None` watches all namespaces.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn watch(&self, namespace: Option<String>) -> Result<WatchStreams>;
}

/// Capability consuming the event streams for the rest of the process
/// lifetime, until the token is cancelled or a fatal error occurs
#[async_trait]
pub trait EventProcessor: Send + Sync {
    async fn process(&self, streams: WatchStreams, shutdown: CancellationToken) -> Result<()>;
}

/// Watches FlannelNetwork objects through the Kubernetes API
pub struct KubeEventSource {
    client: Client,
}

impl KubeEventSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventSource for KubeEventSource {
    async fn watch(&self, namespace: Option<String>) -> Result<WatchStreams> {
        let api: Api<FlannelNetwork> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), &ns),
            None => Api::all(self.client.clone()),
        };

        let (delete_tx, deletes) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (update_tx, updates) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (error_tx, errors) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        tokio::spawn(forward_events(api, delete_tx, update_tx, error_tx));

        Ok(WatchStreams {
            deletes,
            updates,
            errors,
        })
    }
}

/// Pump watcher events into the three channels until every receiver is gone
async fn forward_events(
    api: Api<FlannelNetwork>,
    delete_tx: mpsc::Sender<FlannelNetwork>,
    update_tx: mpsc::Sender<FlannelNetwork>,
    error_tx: mpsc::Sender<Error>,
) {
    let stream = watcher(api, watcher::Config::default()).default_backoff();
    tokio::pin!(stream);

    while let Some(event) = stream.next().await {
        let delivered = match event {
            Ok(watcher::Event::Apply(network)) | Ok(watcher::Event::InitApply(network)) => {
                update_tx.send(network).await.is_ok()
            }
            Ok(watcher::Event::Delete(network)) => delete_tx.send(network).await.is_ok(),
            // relist markers carry no object payload
            Ok(watcher::Event::Init) | Ok(watcher::Event::InitDone) => true,
            Err(e) => error_tx.send(Error::WatchError(e.to_string())).await.is_ok(),
        };

        if !delivered {
            break;
        }
    }

    debug!("watch event forwarding stopped");
}
