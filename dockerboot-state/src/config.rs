use std::path::PathBuf;

use thiserror::Error;
use tracing::instrument;

use crate::manifest::{self, ManifestError};
use crate::models::Services;
use crate::oci::{Client as Docker, Error as DockerError};
use crate::read::{ReadStateError, read};

pub struct StateConfig {
    /// Path of the service manifest
    pub manifest: PathBuf,

    /// Address of the engine daemon
    pub endpoint: String,
}

/// Everything needed to run a command
pub struct Resources {
    pub docker: Docker,

    /// Services declared in the manifest
    pub desired: Services,

    /// Services found on the engine
    pub observed: Services,
}

#[derive(Debug, Error)]
pub enum StatePrepareError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("cannot connect to the docker daemon at {0}: {1}")]
    Connect(String, #[source] DockerError),

    #[error(transparent)]
    ReadState(#[from] ReadStateError),
}

/// Load the manifest, connect to the engine and read the current state.
///
/// The manifest is read first so an invalid manifest fails before any
/// connection attempt.
#[instrument(skip_all, err)]
pub async fn prepare(config: StateConfig) -> Result<Resources, StatePrepareError> {
    let StateConfig { manifest, endpoint } = config;

    let desired = manifest::load(&manifest).await?;

    let docker = match Docker::connect(&endpoint).await {
        Ok(docker) => docker,
        Err(e) => return Err(StatePrepareError::Connect(endpoint, e)),
    };

    let observed = read(&docker).await?;

    Ok(Resources {
        docker,
        desired,
        observed,
    })
}
