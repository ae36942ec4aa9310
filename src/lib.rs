//! Flannel operator: manages per-cluster network overlay resources
//!
//! This crate registers the FlannelNetwork custom resource type with the
//! cluster API, watches instances of it, and dispatches change events into
//! the reconciliation machinery. All concrete identifiers for a cluster's
//! network resources are derived deterministically from its spec.

pub mod controller;
pub mod crd;
pub mod error;
pub mod operator;

pub use crate::error::{Error, Result};
