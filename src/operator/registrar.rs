//! Custom resource type registration
//!
//! The boot supervisor depends on the `ResourceRegistrar` capability only;
//! the Kubernetes-backed implementation lives here as well.

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, PostParams};
use kube::{Client, CustomResourceExt};
use tracing::debug;

use crate::crd::FlannelNetwork;
use crate::error::{Error, Result};

/// How the registration call found the resource type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The resource type was newly registered
    Created,
    /// Another party registered the type first; an expected race
    AlreadyExists,
}

/// Idempotent "ensure the custom resource type exists" capability
#[async_trait]
pub trait ResourceRegistrar: Send + Sync {
    async fn ensure_type(&self) -> Result<RegistrationOutcome>;
}

const ESTABLISH_POLL_INTERVAL: Duration = Duration::from_secs(1);
const ESTABLISH_POLL_BUDGET: u32 = 60;

/// Registers the FlannelNetwork CRD with the cluster API
pub struct CrdRegistrar {
    client: Client,
}

impl CrdRegistrar {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Block until the apiserver reports the CRD as established, so the
    /// watch opened right after registration does not race the discovery
    /// cache.
    async fn wait_established(&self, api: &Api<CustomResourceDefinition>) -> Result<()> {
        for _ in 0..ESTABLISH_POLL_BUDGET {
            let crd = api
                .get(FlannelNetwork::crd_name())
                .await
                .map_err(Error::KubeError)?;
            if is_established(&crd) {
                return Ok(());
            }
            tokio::time::sleep(ESTABLISH_POLL_INTERVAL).await;
        }

        Err(Error::RegistrationError(format!(
            "custom resource definition {} was not established in time",
            FlannelNetwork::crd_name()
        )))
    }
}

#[async_trait]
impl ResourceRegistrar for CrdRegistrar {
    async fn ensure_type(&self) -> Result<RegistrationOutcome> {
        let api: Api<CustomResourceDefinition> = Api::all(self.client.clone());

        match api.create(&PostParams::default(), &FlannelNetwork::crd()).await {
            Ok(_) => {
                debug!(crd = FlannelNetwork::crd_name(), "created custom resource definition");
                self.wait_established(&api).await?;
                Ok(RegistrationOutcome::Created)
            }
            Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(RegistrationOutcome::AlreadyExists),
            Err(e) => Err(Error::KubeError(e)),
        }
    }
}

fn is_established(crd: &CustomResourceDefinition) -> bool {
    crd.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Established" && c.status == "True")
        })
        .unwrap_or(false)
}
