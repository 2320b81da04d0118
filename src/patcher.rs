use std::collections::BTreeSet;
use std::sync::Arc;

use k8s_openapi::api::core::v1::Service;
use kube::api::PatchParams;
use tracing::{event, Level};

use crate::client::ServiceApi;
use crate::config::PatcherConfig;
use crate::error::Result;
use crate::events::{EventSource, Hook, HookContext, LifecycleEvent};
use crate::manifest::{build_manifest, ManifestParams};
use crate::ports::{validate_ports, PortSpec};

const UNAUTHORIZED_MESSAGE: &str = "Kubernetes service patch failed: `juju trust` this application.";

/// The result of a single attempt to patch the Service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// This unit is not the leader; nothing was sent.
    Skipped,
    Patched,
    /// The cluster refused the patch with 403; the application needs to be
    /// trusted before it may modify its Service.
    Unauthorized,
    /// The patch failed for any other reason, with the server's message.
    Failed(String),
}

/// Keeps the application's Kubernetes Service exposing a fixed set of ports.
///
/// On `install` and `upgrade-charm` (plus any configured refresh events) the
/// leader unit merge-patches the Service with a manifest built from the
/// ports given at construction. Patch failures are logged and never fail the
/// hook; the next triggering event simply tries again.
pub struct ServicePatcher<C> {
    app: String,
    ports: Vec<PortSpec>,
    client: C,
    config: PatcherConfig,
}

impl<C> ServicePatcher<C>
where
    C: ServiceApi + 'static,
{
    /// Creates a patcher for the application owning `source` and subscribes
    /// it to the events that should trigger a patch.
    ///
    /// Fails if a port number is out of range or a port name repeats.
    pub fn new<S, I>(source: &mut S, client: C, ports: I, config: PatcherConfig) -> Result<Arc<Self>>
    where
        S: EventSource + ?Sized,
        I: IntoIterator,
        I::Item: Into<PortSpec>,
    {
        let ports = ports.into_iter().map(Into::into).collect::<Vec<_>>();
        validate_ports(&ports)?;

        let events = [LifecycleEvent::Install, LifecycleEvent::UpgradeCharm]
            .into_iter()
            .chain(config.refresh_events.iter().copied())
            .collect::<BTreeSet<_>>();

        let patcher = Arc::new(Self {
            app: source.app_name().to_string(),
            ports,
            client,
            config,
        });
        for event in events {
            let hook: Arc<dyn Hook> = Arc::<Self>::clone(&patcher);
            source.subscribe(event, hook);
        }
        Ok(patcher)
    }

    /// The name of the owning application.
    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn ports(&self) -> &[PortSpec] {
        &self.ports
    }

    /// The name of the Service being patched.
    pub fn service_name(&self) -> &str {
        self.config.service_name.as_deref().unwrap_or(&self.app)
    }

    /// Resolves the namespace the Service lives in. The service account file
    /// is read afresh on every call.
    pub fn namespace(&self) -> Result<String> {
        self.config.namespace.resolve()
    }

    /// The desired Service in the current namespace.
    pub fn service(&self) -> Result<Service> {
        let namespace = self.namespace()?;
        Ok(self.manifest(&namespace))
    }

    fn manifest(&self, namespace: &str) -> Service {
        let params = ManifestParams {
            app: &self.app,
            namespace,
            service_name: self.config.service_name.as_deref(),
            service_type: self.config.service_type.as_deref(),
            additional_labels: &self.config.additional_labels,
            additional_selectors: &self.config.additional_selectors,
            additional_annotations: &self.config.additional_annotations,
        };
        build_manifest(&params, &self.ports)
    }

    /// Patches the Service in `namespace` if `leader` is set.
    ///
    /// Sends at most one patch request. Failures are logged and reported in
    /// the returned [`PatchOutcome`], never as an error.
    pub async fn reconcile(&self, leader: bool, namespace: &str) -> PatchOutcome {
        if !leader {
            return PatchOutcome::Skipped;
        }

        let name = self.service_name();
        let service = self.manifest(namespace);
        let params = PatchParams {
            field_manager: self.config.field_manager.clone(),
            ..Default::default()
        };
        match self.client.patch(namespace, name, &service, &params).await {
            Ok(_) => {
                event!(
                    Level::INFO,
                    service = %name,
                    namespace = %namespace,
                    "Kubernetes service '{}' patched successfully",
                    name
                );
                PatchOutcome::Patched
            }
            Err(kube::Error::Api(err)) if err.code == 403 => {
                event!(
                    Level::ERROR,
                    service = %name,
                    namespace = %namespace,
                    "{}",
                    UNAUTHORIZED_MESSAGE
                );
                PatchOutcome::Unauthorized
            }
            Err(err) => {
                let message = match err {
                    kube::Error::Api(response) => response.message,
                    other => other.to_string(),
                };
                event!(
                    Level::ERROR,
                    service = %name,
                    namespace = %namespace,
                    "Kubernetes service patch failed: {}",
                    message
                );
                PatchOutcome::Failed(message)
            }
        }
    }

    /// Reports whether the live Service matches the desired one exactly.
    ///
    /// Any difference, not only in ports, yields `false`. Errors reading the
    /// Service are returned to the caller.
    pub async fn is_patched(&self) -> Result<bool> {
        let namespace = self.namespace()?;
        let live = self.client.get(&namespace, self.service_name()).await?;
        Ok(live == self.manifest(&namespace))
    }
}

#[async_trait::async_trait]
impl<C> Hook for ServicePatcher<C>
where
    C: ServiceApi + 'static,
{
    async fn handle(&self, ctx: &HookContext) -> Result<()> {
        if !ctx.leader {
            return Ok(());
        }
        let namespace = self.namespace()?;
        let outcome = self.reconcile(true, &namespace).await;
        event!(
            Level::DEBUG,
            event = %ctx.event,
            service = %self.service_name(),
            outcome = ?outcome,
            "Service patch hook finished."
        );
        Ok(())
    }
}
