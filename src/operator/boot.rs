//! One-time boot supervision for the operator
//!
//! `Operator::boot` registers the FlannelNetwork resource type, opens the
//! watch, and hands the event streams to the processor. The whole sequence
//! is guarded so it physically runs at most once per process, no matter how
//! many tasks call `boot` concurrently; every caller observes the same
//! terminal outcome. Failed sequences are retried under the configured
//! backoff policy, and exhausting the policy yields a fatal error the
//! process entry point turns into a non-zero exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::operator::backoff::BackoffPolicy;
use crate::operator::events::{EventProcessor, EventSource};
use crate::operator::registrar::{RegistrationOutcome, ResourceRegistrar};

/// Callback fired once per failed boot attempt with the attempt error and
/// the delay before the next try
pub type RetryNotifier = Arc<dyn Fn(&Error, Duration) + Send + Sync>;

/// Shared terminal outcome of the single boot execution
type BootOutcome = std::result::Result<(), Arc<Error>>;

/// Configuration used to create a new operator
///
/// All dependency fields are mandatory; construction fails naming the first
/// missing one.
#[derive(Default)]
pub struct Config {
    // Dependencies.
    pub back_off: Option<Box<dyn BackoffPolicy>>,
    pub registrar: Option<Arc<dyn ResourceRegistrar>>,
    pub event_source: Option<Arc<dyn EventSource>>,
    pub event_processor: Option<Arc<dyn EventProcessor>>,

    // Settings.
    /// Namespace scope for the watch; `None` watches all namespaces
    pub watch_namespace: Option<String>,
    /// Optional observer of failed boot attempts; retries are logged
    /// regardless
    pub retry_notifier: Option<RetryNotifier>,
}

/// Supervises the startup and dispatch of the reconciliation machinery
pub struct Operator {
    // Dependencies.
    back_off: Box<dyn BackoffPolicy>,
    registrar: Arc<dyn ResourceRegistrar>,
    event_source: Arc<dyn EventSource>,
    event_processor: Arc<dyn EventProcessor>,

    // Settings.
    watch_namespace: Option<String>,
    retry_notifier: Option<RetryNotifier>,

    // Internals.
    boot_started: AtomicBool,
    boot_outcome: watch::Sender<Option<BootOutcome>>,
}

impl std::fmt::Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("watch_namespace", &self.watch_namespace)
            .field(
                "boot_started",
                &self.boot_started.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}

impl Operator {
    /// Create a new configured operator
    pub fn new(config: Config) -> Result<Self> {
        let back_off = config
            .back_off
            .ok_or_else(|| Error::ConfigError("config.back_off must not be empty".to_string()))?;
        let registrar = config
            .registrar
            .ok_or_else(|| Error::ConfigError("config.registrar must not be empty".to_string()))?;
        let event_source = config.event_source.ok_or_else(|| {
            Error::ConfigError("config.event_source must not be empty".to_string())
        })?;
        let event_processor = config.event_processor.ok_or_else(|| {
            Error::ConfigError("config.event_processor must not be empty".to_string())
        })?;

        let (boot_outcome, _) = watch::channel(None);

        Ok(Self {
            back_off,
            registrar,
            event_source,
            event_processor,
            watch_namespace: config.watch_namespace,
            retry_notifier: config.retry_notifier,
            boot_started: AtomicBool::new(false),
            boot_outcome,
        })
    }

    /// Run the boot sequence, or wait for the one already running
    ///
    /// Exactly one physical execution happens per process lifetime. The
    /// winning caller drives registration, watch setup, and event
    /// processing; every other caller parks until that execution reaches a
    /// terminal outcome and then observes the same result. Once started,
    /// the sequence itself is not cancellable; the token is handed through
    /// to the event processor so the dispatch loop can be shut down.
    pub async fn boot(&self, shutdown: CancellationToken) -> Result<()> {
        if self
            .boot_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let outcome: BootOutcome = self
                .boot_with_retries(shutdown)
                .await
                .map_err(Arc::new);
            // Receivers may or may not exist; the stored value is what
            // matters for late callers.
            let _ = self.boot_outcome.send(Some(outcome.clone()));
            outcome.map_err(Error::BootFailed)
        } else {
            let mut rx = self.boot_outcome.subscribe();
            let outcome = rx
                .wait_for(|outcome| outcome.is_some())
                .await
                .map_err(|_| Error::Internal("boot outcome channel closed".to_string()))?
                .clone()
                .ok_or_else(|| Error::Internal("boot outcome missing".to_string()))?;
            outcome.map_err(Error::BootFailed)
        }
    }

    async fn boot_with_retries(&self, shutdown: CancellationToken) -> Result<()> {
        let mut attempt: u32 = 0;

        loop {
            let err = match self.boot_sequence(shutdown.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };

            match self.back_off.delay_for(attempt) {
                Some(delay) => {
                    warn!(
                        error = %err,
                        delay_secs = delay.as_secs_f64(),
                        "retrying operator boot due to error"
                    );
                    if let Some(notifier) = &self.retry_notifier {
                        notifier(&err, delay);
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    error!(
                        error = %err,
                        attempts = attempt + 1,
                        "stopping operator boot retries due to too many errors"
                    );
                    return Err(err);
                }
            }
        }
    }

    /// One guarded boot attempt: register the type, open the watch, hand
    /// the streams off
    ///
    /// Each step is idempotent because a retry redoes the whole sequence.
    async fn boot_sequence(&self, shutdown: CancellationToken) -> Result<()> {
        match self.registrar.ensure_type().await? {
            RegistrationOutcome::Created => {
                debug!("custom resource type registered");
            }
            RegistrationOutcome::AlreadyExists => {
                debug!("custom resource type already exists");
            }
        }

        debug!("starting list/watch");
        let streams = self
            .event_source
            .watch(self.watch_namespace.clone())
            .await?;

        self.event_processor.process(streams, shutdown).await
    }
}
