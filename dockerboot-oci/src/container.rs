use std::collections::{BTreeMap, HashMap};

use bollard::models::{
    ContainerCreateBody, ContainerInspectResponse, ContainerSummary, HostConfig as EngineHostConfig,
    PortBinding as EnginePortBinding,
};
use bollard::query_parameters::{
    CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use tracing::debug;

use super::{Client, Error, Result, WithContext};

#[derive(Debug, Clone)]
pub struct Container<'a>(&'a Client);

impl<'a> Container<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self(client)
    }
}

impl Container<'_> {
    /// Returns every container known to the engine, running or not.
    ///
    /// Note that it uses a different, smaller representation of a container than
    /// inspecting a single container.
    pub async fn list(&self) -> Result<Vec<LocalContainer>> {
        let opts = ListContainersOptions {
            all: true,
            ..Default::default()
        };

        let res = self.0.inner().list_containers(Some(opts)).await;
        let containers = res.map_err(Error::with_context("failed to list containers"))?;

        containers.into_iter().map(LocalContainer::try_from).collect()
    }

    /// Returns low-level information about a container.
    pub async fn inspect(&self, id: &str) -> Result<ContainerInfo> {
        let info = self
            .0
            .inner()
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(Error::from)
            .with_context(|| format!("failed to inspect container {id}"))?;

        Ok(info.into())
    }

    /// Create a container, returning the engine id
    pub async fn create(&self, config: ContainerConfig) -> Result<String> {
        let name = config.name.clone();
        let options = Some(CreateContainerOptions {
            name: Some(name.clone()),
            platform: String::from(""),
        });

        let res = self
            .0
            .inner()
            .create_container(options, config)
            .await
            .map_err(Error::from)
            .with_context(|| format!("failed to create container {name}"))?;

        for warning in res.warnings {
            debug!(container = %name, "{warning}");
        }

        Ok(res.id)
    }

    /// Start a created or stopped container
    pub async fn start(&self, id: &str) -> Result<()> {
        match self
            .0
            .inner()
            .start_container(id, None::<StartContainerOptions>)
            .await
        {
            Ok(_) => Ok(()),
            // the container is already running
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(()),
            Err(e) => {
                Err(Error::from(e)).with_context(|| format!("failed to start container {id}"))
            }
        }
    }

    /// Stop a container, killing it if it is still running after `grace_secs`
    pub async fn stop(&self, id: &str, grace_secs: u32) -> Result<()> {
        let opts = StopContainerOptions {
            t: Some(i32::try_from(grace_secs).unwrap_or(i32::MAX)),
            signal: None,
        };

        match self.0.inner().stop_container(id, Some(opts)).await {
            Ok(_) => Ok(()),
            // the container is not running
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(()),
            Err(e) => Err(Error::from(e)).with_context(|| format!("failed to stop container {id}")),
        }
    }

    /// Remove a container
    pub async fn remove(&self, id: &str, force: bool) -> Result<()> {
        let opts = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        match self.0.inner().remove_container(id, Some(opts)).await {
            Ok(_) => Ok(()),
            // do not fail if the container doesn't exist
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => {
                Err(Error::from(e)).with_context(|| format!("failed to remove container {id}"))
            }
        }
    }
}

/// A container as returned by the engine listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalContainer {
    /// The engine id of the container
    pub id: String,

    /// Names of the container, as reported by the engine (e.g. `/web`)
    pub names: Vec<String>,

    /// The command the container runs, as a single string
    pub command: String,
}

impl TryFrom<ContainerSummary> for LocalContainer {
    type Error = Error;

    fn try_from(value: ContainerSummary) -> Result<Self> {
        let id = value.id.ok_or("container ID should not be nil")?;

        Ok(Self {
            id,
            names: value.names.unwrap_or_default(),
            command: value.command.unwrap_or_default(),
        })
    }
}

/// A host port binding for a container port
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortBinding {
    pub host_ip: Option<String>,
    pub host_port: String,
}

/// Host bindings indexed by protocol qualified container port, e.g. `80/tcp`
pub type PortMap = BTreeMap<String, Vec<PortBinding>>;

/// Container details relevant to dockerboot, read from the container inspect endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerInfo {
    /// Image the container was created from
    pub image: String,

    /// Volume binds, as `host:container[:mode]`
    pub binds: Vec<String>,

    /// Published ports
    pub port_bindings: PortMap,
}

impl From<ContainerInspectResponse> for ContainerInfo {
    fn from(value: ContainerInspectResponse) -> Self {
        let image = value.config.and_then(|c| c.image).unwrap_or_default();

        let (binds, port_bindings) = value
            .host_config
            .map(|hc| {
                let port_bindings: PortMap = hc
                    .port_bindings
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(port, bindings)| {
                        let bindings = bindings
                            .unwrap_or_default()
                            .into_iter()
                            .map(|b| PortBinding {
                                // the engine reports an empty address for unbound ips
                                host_ip: b.host_ip.filter(|ip| !ip.is_empty()),
                                host_port: b.host_port.unwrap_or_default(),
                            })
                            .collect();
                        (port, bindings)
                    })
                    .collect();
                (hc.binds.unwrap_or_default(), port_bindings)
            })
            .unwrap_or_default();

        Self {
            image,
            binds,
            port_bindings,
        }
    }
}

/// Engine level configuration applied when the container starts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostConfig {
    pub binds: Vec<String>,
    pub port_bindings: PortMap,
}

impl From<HostConfig> for EngineHostConfig {
    fn from(value: HostConfig) -> Self {
        let HostConfig {
            binds,
            port_bindings,
        } = value;

        let port_bindings: HashMap<_, _> = port_bindings
            .into_iter()
            .map(|(port, bindings)| {
                let bindings = bindings
                    .into_iter()
                    .map(|b| EnginePortBinding {
                        host_ip: b.host_ip,
                        host_port: Some(b.host_port),
                    })
                    .collect();
                (port, Some(bindings))
            })
            .collect();

        Self {
            binds: (!binds.is_empty()).then_some(binds),
            port_bindings: (!port_bindings.is_empty()).then_some(port_bindings),
            ..Default::default()
        }
    }
}

/// Options to create a new container
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerConfig {
    /// Container name
    pub name: String,

    /// Image to create the container from
    pub image: String,

    /// Command to run specified as an array of strings. An empty
    /// command keeps the image default.
    pub cmd: Vec<String>,

    pub host_config: HostConfig,
}

impl From<ContainerConfig> for ContainerCreateBody {
    fn from(value: ContainerConfig) -> Self {
        let ContainerConfig {
            image,
            cmd,
            host_config,
            ..
        } = value;

        Self {
            image: Some(image),
            cmd: (!cmd.is_empty()).then_some(cmd),
            tty: Some(true),
            open_stdin: Some(true),
            host_config: Some(host_config.into()),
            ..Default::default()
        }
    }
}
