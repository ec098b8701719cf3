//! Conversion between manifest port specs and engine port bindings
//!
//! A port spec has one of the forms
//!
//! - `hostPort:containerPort[/udp]`
//! - `hostIp:hostPort:containerPort[/udp]`
//!
//! TCP is the default protocol and is never written in a spec, the
//! engine side always uses the protocol qualified port, e.g. `80/tcp`.
use thiserror::Error;

use crate::oci::{PortBinding, PortMap};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsePortError {
    #[error("invalid port format: {0}")]
    InvalidFormat(String),

    #[error("protocol must be udp if specified: {0}")]
    InvalidProtocol(String),
}

/// Parse a list of port specs into engine port bindings.
///
/// Specs targeting the same container port accumulate under the same key,
/// in the order they were given.
pub fn parse_ports<S: AsRef<str>>(specs: &[S]) -> Result<PortMap, ParsePortError> {
    let mut ports = PortMap::new();
    for spec in specs {
        let (container_port, binding) = parse_port(spec.as_ref())?;
        ports.entry(container_port).or_default().push(binding);
    }
    Ok(ports)
}

fn parse_port(spec: &str) -> Result<(String, PortBinding), ParsePortError> {
    let fields: Vec<&str> = spec.split(':').collect();
    let (host_ip, host_port, container_port) = match fields.as_slice() {
        [host_port, container_port] => (None, *host_port, *container_port),
        [host_ip, host_port, container_port] => {
            (Some((*host_ip).to_owned()), *host_port, *container_port)
        }
        _ => return Err(ParsePortError::InvalidFormat(spec.to_owned())),
    };

    let container_port = match container_port.split_once('/') {
        None => format!("{container_port}/tcp"),
        Some((_, "udp")) => container_port.to_owned(),
        Some(_) => return Err(ParsePortError::InvalidProtocol(spec.to_owned())),
    };

    Ok((
        container_port,
        PortBinding {
            host_ip,
            host_port: host_port.to_owned(),
        },
    ))
}

/// Render engine port bindings back into port specs.
///
/// Container ports are visited in key order, bindings for the same port
/// keep the engine order.
pub fn to_port_specs(ports: &PortMap) -> Vec<String> {
    ports
        .iter()
        .flat_map(|(container_port, bindings)| {
            // only udp is explicit on a spec
            let container_port = container_port
                .strip_suffix("/tcp")
                .unwrap_or(container_port);
            bindings.iter().map(move |binding| {
                let spec = format!("{}:{container_port}", binding.host_port);
                match &binding.host_ip {
                    Some(ip) if !ip.is_empty() => format!("{ip}:{spec}"),
                    _ => spec,
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn binding(host_ip: Option<&str>, host_port: &str) -> PortBinding {
        PortBinding {
            host_ip: host_ip.map(String::from),
            host_port: host_port.to_string(),
        }
    }

    #[test]
    fn test_parses_host_and_container_port() {
        let ports = parse_ports(&["8080:80"]).unwrap();
        assert_eq!(
            ports,
            PortMap::from([("80/tcp".to_string(), vec![binding(None, "8080")])])
        );
    }

    #[test]
    fn test_parses_host_ip() {
        let ports = parse_ports(&["1.2.3.4:8080:80"]).unwrap();
        assert_eq!(
            ports,
            PortMap::from([(
                "80/tcp".to_string(),
                vec![binding(Some("1.2.3.4"), "8080")]
            )])
        );
    }

    #[test]
    fn test_keeps_udp_ports() {
        let ports = parse_ports(&["53:53/udp"]).unwrap();
        assert_eq!(
            ports,
            PortMap::from([("53/udp".to_string(), vec![binding(None, "53")])])
        );
    }

    #[test]
    fn test_accumulates_bindings_for_the_same_port() {
        let ports = parse_ports(&["8080:80", "127.0.0.1:8081:80", "443:443"]).unwrap();
        assert_eq!(
            ports,
            PortMap::from([
                (
                    "80/tcp".to_string(),
                    vec![binding(None, "8080"), binding(Some("127.0.0.1"), "8081")]
                ),
                ("443/tcp".to_string(), vec![binding(None, "443")]),
            ])
        );
    }

    #[test]
    fn test_keeps_tcp_and_udp_bindings_apart() {
        let ports = parse_ports(&["53:53", "53:53/udp"]).unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports["53/tcp"], vec![binding(None, "53")]);
        assert_eq!(ports["53/udp"], vec![binding(None, "53")]);
    }

    #[test]
    fn test_rejects_invalid_arity() {
        for spec in ["80", "1.2.3.4:8080:80:90", "a:b:c:d:e"] {
            assert_eq!(
                parse_ports(&[spec]),
                Err(ParsePortError::InvalidFormat(spec.to_string()))
            );
        }
    }

    #[test]
    fn test_rejects_explicit_protocols_other_than_udp() {
        assert_eq!(
            parse_ports(&["80:80/tcp"]),
            Err(ParsePortError::InvalidProtocol("80:80/tcp".to_string()))
        );
        assert_eq!(
            parse_ports(&["80:80/sctp"]),
            Err(ParsePortError::InvalidProtocol("80:80/sctp".to_string()))
        );
        assert!(parse_ports(&["80:80/udp"]).is_ok());
    }

    #[test]
    fn test_fails_the_whole_list_on_a_single_bad_spec() {
        assert!(parse_ports(&["8080:80", "nope"]).is_err());
    }

    #[test]
    fn test_accepts_an_empty_list() {
        let ports = parse_ports::<&str>(&[]).unwrap();
        assert!(ports.is_empty());
    }

    #[test]
    fn test_renders_specs_from_bindings() {
        let ports = PortMap::from([
            (
                "80/tcp".to_string(),
                vec![binding(None, "8080"), binding(Some("1.2.3.4"), "8081")],
            ),
            ("53/udp".to_string(), vec![binding(Some(""), "53")]),
        ]);

        assert_eq!(
            to_port_specs(&ports),
            vec!["53:53/udp", "8080:80", "1.2.3.4:8081:80"]
        );
    }

    #[test]
    fn test_renders_specs_that_parse_back_to_the_same_bindings() {
        let specs = vec!["127.0.0.1:5432:5432", "53:53/udp", "8080:80"];
        let ports = parse_ports(&specs).unwrap();
        assert_eq!(parse_ports(&to_port_specs(&ports)).unwrap(), ports);
    }
}
