use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Service, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::ports::PortSpec;

/// Label used both to tag the Service and to select the application's pods.
pub const APP_NAME_LABEL: &str = "app.kubernetes.io/name";

/// Everything other than the ports that goes into a Service manifest.
#[derive(Debug, Clone, Copy)]
pub struct ManifestParams<'a> {
    pub app: &'a str,
    pub namespace: &'a str,
    pub service_name: Option<&'a str>,
    pub service_type: Option<&'a str>,
    pub additional_labels: &'a BTreeMap<String, String>,
    pub additional_selectors: &'a BTreeMap<String, String>,
    pub additional_annotations: &'a BTreeMap<String, String>,
}

/// Builds the desired Service for `params` exposing `ports`, in order.
///
/// This performs no I/O; the same input always produces the same Service.
/// The application name label wins over an additional label or selector with
/// the same key.
pub fn build_manifest(params: &ManifestParams<'_>, ports: &[PortSpec]) -> Service {
    let app_label = (APP_NAME_LABEL.to_string(), params.app.to_string());

    let labels = params
        .additional_labels
        .clone()
        .into_iter()
        .chain([app_label.clone()])
        .collect::<BTreeMap<_, _>>();
    let selector = params
        .additional_selectors
        .clone()
        .into_iter()
        .chain([app_label])
        .collect::<BTreeMap<_, _>>();
    let annotations =
        (!params.additional_annotations.is_empty()).then(|| params.additional_annotations.clone());

    Service {
        metadata: ObjectMeta {
            name: Some(params.service_name.unwrap_or(params.app).to_string()),
            namespace: Some(params.namespace.to_string()),
            labels: Some(labels),
            annotations,
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(selector),
            ports: Some(ports.iter().map(PortSpec::to_service_port).collect()),
            type_: params.service_type.map(str::to_string),
            ..Default::default()
        }),
        ..Default::default()
    }
}
