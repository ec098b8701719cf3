use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::oci::Error as DockerError;
use crate::ports::to_port_specs;
use crate::runtime::Runtime;

use super::models::{Service, Services};

#[derive(Debug, Error)]
pub enum ReadStateError {
    #[error("cannot list containers: {0}")]
    List(#[source] DockerError),
}

/// Read the services currently known to the engine.
///
/// Containers that cannot be inspected are left out of the result.
#[instrument(name = "read_state", skip_all, err)]
pub async fn read<R: Runtime>(runtime: &R) -> Result<Services, ReadStateError> {
    let containers = runtime
        .list_containers()
        .await
        .map_err(ReadStateError::List)?;

    let mut services = Services::new();
    for container in containers {
        // the engine reports names with a leading `/`
        let name = match container.names.first() {
            Some(name) => name.strip_prefix('/').unwrap_or(name).to_owned(),
            None => String::new(),
        };
        if name.is_empty() {
            warn!("container {} has no name, ignoring", container.id);
            continue;
        }

        let info = match runtime.inspect_container(&container.id).await {
            Ok(info) => info,
            Err(e) => {
                warn!("cannot inspect container {}, ignoring: {e}", container.id);
                continue;
            }
        };

        let service = Service {
            id: container.id,
            name: name.clone(),
            image: info.image,
            command: container.command,
            ports: to_port_specs(&info.port_bindings),
            volumes: info.binds,
        };
        services.insert(name, service);
    }

    let names: Vec<&str> = services.keys().map(String::as_str).collect();
    info!("discovered existing services: {}", names.join(", "));

    Ok(services)
}
