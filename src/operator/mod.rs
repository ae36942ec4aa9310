//! Boot supervision and watch plumbing
//!
//! This module contains the one-time boot supervisor, the retry backoff
//! policies, and the capability contracts (plus Kubernetes-backed
//! implementations) for resource type registration and watch event streams.

mod backoff;
mod boot;
mod events;
mod registrar;

pub use backoff::{BackoffPolicy, ExponentialBackoff};
pub use boot::{Config, Operator, RetryNotifier};
pub use events::{EventProcessor, EventSource, KubeEventSource, WatchStreams};
pub use registrar::{CrdRegistrar, RegistrationOutcome, ResourceRegistrar};
