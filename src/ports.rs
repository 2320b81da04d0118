use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::ServicePort;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::Deserialize;

use crate::error::{Error, Result};

/// A single port mapping exposed by the patched Service.
///
/// The target port defaults to `port` when it is not given. A `PortSpec` can
/// be built from a `(name, port)` or `(name, port, target_port)` tuple:
///
/// ```
/// # use k8s_service_patch::PortSpec;
/// let metrics = PortSpec::from(("metrics", 9090));
/// assert_eq!(metrics.target_port(), 9090);
///
/// let web = PortSpec::from(("web", 80, 8080));
/// assert_eq!(web.target_port(), 8080);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    name: String,
    port: u16,
    #[serde(default)]
    target_port: Option<u16>,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    node_port: Option<u16>,
}

impl PortSpec {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
            target_port: None,
            protocol: None,
            node_port: None,
        }
    }

    pub fn with_target_port(mut self, target_port: u16) -> Self {
        self.target_port = Some(target_port);
        self
    }

    /// Sets the IP protocol of the port (`TCP`, `UDP` or `SCTP`). Left
    /// unset, the cluster applies its own default.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Pins the node port used when the Service is of type `NodePort` or
    /// `LoadBalancer`.
    pub fn with_node_port(mut self, node_port: u16) -> Self {
        self.node_port = Some(node_port);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn target_port(&self) -> u16 {
        self.target_port.unwrap_or(self.port)
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn node_port(&self) -> Option<u16> {
        self.node_port
    }

    /// Renders this mapping as a [`ServicePort`].
    pub fn to_service_port(&self) -> ServicePort {
        ServicePort {
            name: Some(self.name.clone()),
            port: i32::from(self.port),
            target_port: Some(IntOrString::Int(i32::from(self.target_port()))),
            protocol: self.protocol.clone(),
            node_port: self.node_port.map(i32::from),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        let in_range = self.port != 0 && self.target_port() != 0 && self.node_port != Some(0);
        if in_range {
            Ok(())
        } else {
            Err(Error::InvalidPort {
                name: self.name.clone(),
            })
        }
    }
}

impl<S: Into<String>> From<(S, u16)> for PortSpec {
    fn from((name, port): (S, u16)) -> Self {
        PortSpec::new(name, port)
    }
}

impl<S: Into<String>> From<(S, u16, u16)> for PortSpec {
    fn from((name, port, target_port): (S, u16, u16)) -> Self {
        PortSpec::new(name, port).with_target_port(target_port)
    }
}

/// Checks that every port number is in range and that no name repeats.
pub(crate) fn validate_ports(ports: &[PortSpec]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for port in ports {
        port.validate()?;
        if !seen.insert(port.name.as_str()) {
            return Err(Error::DuplicatePortName {
                name: port.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_port_defaults_to_port() {
        let spec = PortSpec::from(("test-app", 8080));
        assert_eq!(spec.target_port(), 8080);

        let spec = PortSpec::from(("test-app", 8080, 9090));
        assert_eq!(spec.port(), 8080);
        assert_eq!(spec.target_port(), 9090);
    }

    #[test]
    fn service_port_omits_unset_fields() {
        let port = PortSpec::from(("svc1", 1234)).to_service_port();
        assert_eq!(
            port,
            ServicePort {
                name: Some("svc1".to_string()),
                port: 1234,
                target_port: Some(IntOrString::Int(1234)),
                ..Default::default()
            }
        );

        let port = PortSpec::new("dns", 53)
            .with_protocol("UDP")
            .with_node_port(30053)
            .to_service_port();
        assert_eq!(port.protocol.as_deref(), Some("UDP"));
        assert_eq!(port.node_port, Some(30053));
    }

    #[test]
    fn rejects_duplicate_names() {
        let ports = vec![
            PortSpec::from(("svc1", 1234)),
            PortSpec::from(("svc1", 1235)),
        ];
        match validate_ports(&ports) {
            Err(Error::DuplicatePortName { name }) => assert_eq!(name, "svc1"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_port_zero() {
        for spec in [
            PortSpec::from(("zero", 0)),
            PortSpec::from(("zero", 80, 0)),
            PortSpec::new("zero", 80).with_node_port(0),
        ] {
            assert!(matches!(
                validate_ports(&[spec]),
                Err(Error::InvalidPort { .. })
            ));
        }
    }

    #[test]
    fn deserializes_with_optional_target_port() {
        let ports: Vec<PortSpec> = serde_json::from_str(
            r#"[{"name": "web", "port": 80}, {"name": "api", "port": 443, "targetPort": 8443}]"#,
        )
        .unwrap();
        assert_eq!(
            ports,
            vec![
                PortSpec::from(("web", 80)),
                PortSpec::from(("api", 443, 8443)),
            ]
        );
        assert!(validate_ports(&ports).is_ok());
    }
}
