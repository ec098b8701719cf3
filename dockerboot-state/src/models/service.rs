use std::collections::BTreeMap;

use serde::Deserialize;

use crate::ports::parse_ports;

/// Services indexed by name
pub type Services = BTreeMap<String, Service>;

/// A container managed by dockerboot, either as declared in the
/// manifest or as found on the engine.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Service {
    /// Engine id of the service container.
    ///
    /// Empty until the container has been created
    #[serde(skip)]
    pub id: String,

    /// Service name, also used as the container name
    #[serde(skip)]
    pub name: String,

    /// Service image reference
    pub image: String,

    /// Command line to run in the container. Tokenized using shell
    /// quoting rules before being passed to the engine.
    #[serde(default)]
    pub command: String,

    /// Published ports, e.g. `8080:80` or `127.0.0.1:53:53/udp`
    #[serde(default)]
    pub ports: Vec<String>,

    /// Volume binds, passed as is to the engine
    #[serde(default)]
    pub volumes: Vec<String>,
}

impl Service {
    /// Returns true if both services describe the same container configuration.
    ///
    /// The engine id is not part of the comparison. Ports are compared as
    /// bindings per container port, so the order of specs only matters
    /// between specs for the same container port.
    pub fn is_equivalent(&self, other: &Service) -> bool {
        self.name == other.name
            && self.image == other.image
            && self.command == other.command
            && same_ports(&self.ports, &other.ports)
            && self.volumes == other.volumes
    }
}

fn same_ports(a: &[String], b: &[String]) -> bool {
    match (parse_ports(a), parse_ports(b)) {
        (Ok(a), Ok(b)) => a == b,
        // invalid specs can only match verbatim
        _ => a == b,
    }
}
