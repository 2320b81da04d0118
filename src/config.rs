use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::events::LifecycleEvent;

/// Where the container runtime injects the pod's namespace.
pub const SERVICE_ACCOUNT_NAMESPACE_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// How a [`ServicePatcher`](crate::ServicePatcher) finds the namespace its
/// Service lives in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum NamespaceSource {
    /// Read the namespace from a file on every lookup. Defaults to the
    /// service account file mounted into every pod.
    ServiceAccount { path: PathBuf },
    /// Use a fixed namespace, for running outside of a pod.
    Fixed { namespace: String },
}

impl Default for NamespaceSource {
    fn default() -> Self {
        NamespaceSource::ServiceAccount {
            path: PathBuf::from(SERVICE_ACCOUNT_NAMESPACE_PATH),
        }
    }
}

impl NamespaceSource {
    /// Resolves the namespace. File-backed sources are re-read each call and
    /// surrounding whitespace is stripped.
    pub fn resolve(&self) -> Result<String> {
        match self {
            NamespaceSource::ServiceAccount { path } => std::fs::read_to_string(path)
                .map(|contents| contents.trim().to_string())
                .map_err(|source| Error::Namespace {
                    path: path.clone(),
                    source,
                }),
            NamespaceSource::Fixed { namespace } => Ok(namespace.clone()),
        }
    }
}

/// Optional settings for a [`ServicePatcher`](crate::ServicePatcher). The
/// default produces a Service named after the application, selecting pods by
/// the `app.kubernetes.io/name` label, in the pod's own namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatcherConfig {
    pub namespace: NamespaceSource,
    /// Name of the Service to patch, if it differs from the application name.
    pub service_name: Option<String>,
    /// `spec.type` of the Service. Left out of the manifest when unset.
    pub service_type: Option<String>,
    pub additional_labels: BTreeMap<String, String>,
    pub additional_selectors: BTreeMap<String, String>,
    pub additional_annotations: BTreeMap<String, String>,
    /// Events that re-apply the patch in addition to `install` and
    /// `upgrade-charm`.
    pub refresh_events: Vec<LifecycleEvent>,
    pub field_manager: Option<String>,
}
