//! Bring the engine state in line with the desired services
//!
//! Services are processed one at a time and independently of each other.
//! A failure on one service is recorded in the [Report] and never prevents
//! the remaining services from being processed.
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::{error, info, instrument};

use crate::oci::{ContainerConfig, Error as DockerError, HostConfig};
use crate::ports::{ParsePortError, parse_ports};
use crate::runtime::Runtime;

use super::models::{Service, Services};

/// Seconds a container has to exit before being replaced
pub const UPDATE_STOP_GRACE_SECS: u32 = 10;

/// Seconds a container has to exit when stopped by the user
pub const STOP_GRACE_SECS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create, update and start services as needed
    EnsureRunning,
    /// Stop the containers of the desired services
    StopOnly,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::EnsureRunning => "ensure running".fmt(f),
            Action::StopOnly => "stop".fmt(f),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid command: {0}")]
    Command(#[from] shell_words::ParseError),

    #[error(transparent)]
    Ports(#[from] ParsePortError),

    #[error(transparent)]
    Create(DockerError),

    #[error(transparent)]
    Start(DockerError),

    #[error(transparent)]
    Stop(DockerError),

    #[error(transparent)]
    Remove(DockerError),
}

/// Result of processing a single service
#[derive(Debug)]
pub enum Outcome {
    /// The configuration did not change, the existing container was started
    Unchanged,
    /// A new container was created and started
    Created { id: String },
    /// The existing container was replaced by a new one
    Updated { id: String },
    /// The service container was stopped
    Stopped,
    Failed(ServiceError),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Outcome of a reconciliation pass, by service name
#[derive(Debug)]
pub struct Report {
    action: Action,
    outcomes: BTreeMap<String, Outcome>,
}

impl Report {
    fn new(action: Action) -> Self {
        Self {
            action,
            outcomes: BTreeMap::new(),
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn get(&self, service_name: &str) -> Option<&Outcome> {
        self.outcomes.get(service_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.outcomes.iter().map(|(name, o)| (name.as_str(), o))
    }

    /// Services that could not be processed, with their error
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ServiceError)> {
        self.iter().filter_map(|(name, o)| match o {
            Outcome::Failed(err) => Some((name, err)),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.values().all(|o| !o.is_failure())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Run a single reconciliation pass.
///
/// `observed` is used as is for the whole pass, the engine is never
/// queried again. Services in `observed` that are not in `desired` are never
/// touched.
#[instrument(name = "reconcile", skip_all, fields(action = %action))]
pub async fn reconcile<R: Runtime>(
    action: Action,
    desired: &Services,
    observed: &Services,
    runtime: &R,
) -> Report {
    let mut report = Report::new(action);

    for (name, service) in desired {
        let current = observed.get(name);
        let outcome = match action {
            Action::EnsureRunning => ensure_running(service, current, runtime).await,
            Action::StopOnly => match current {
                Some(current) => stop(current, runtime).await,
                // nothing to stop
                None => continue,
            },
        };

        let outcome = outcome.unwrap_or_else(|err| {
            error!(service = %name, "{err}");
            Outcome::Failed(err)
        });
        report.outcomes.insert(name.clone(), outcome);
    }

    report
}

async fn ensure_running<R: Runtime>(
    desired: &Service,
    current: Option<&Service>,
    runtime: &R,
) -> Result<Outcome, ServiceError> {
    let mut svc = desired.clone();

    let update = if let Some(current) = current {
        svc.id.clone_from(&current.id);
        if svc.is_equivalent(current) {
            info!(service = %svc.name, "service unchanged, starting");
            runtime
                .start_container(&svc.id)
                .await
                .map_err(ServiceError::Start)?;
            return Ok(Outcome::Unchanged);
        }
        true
    } else {
        false
    };

    // fail on an invalid configuration before touching the existing container
    let config = container_config(&svc)?;

    if update {
        info!(service = %svc.name, "removing existing service (update)");
        runtime
            .stop_container(&svc.id, UPDATE_STOP_GRACE_SECS)
            .await
            .map_err(ServiceError::Stop)?;
        runtime
            .remove_container(&svc.id, true)
            .await
            .map_err(ServiceError::Remove)?;
    }

    info!(service = %svc.name, "creating service");
    svc.id = runtime
        .create_container(config)
        .await
        .map_err(ServiceError::Create)?;

    info!(service = %svc.name, "starting service");
    runtime
        .start_container(&svc.id)
        .await
        .map_err(ServiceError::Start)?;

    let id = svc.id;
    if update {
        Ok(Outcome::Updated { id })
    } else {
        Ok(Outcome::Created { id })
    }
}

async fn stop<R: Runtime>(current: &Service, runtime: &R) -> Result<Outcome, ServiceError> {
    info!(service = %current.name, "stopping service");
    runtime
        .stop_container(&current.id, STOP_GRACE_SECS)
        .await
        .map_err(ServiceError::Stop)?;
    Ok(Outcome::Stopped)
}

/// Convert a service into the options used to create its container
fn container_config(svc: &Service) -> Result<ContainerConfig, ServiceError> {
    let cmd = shell_words::split(&svc.command)?;
    let port_bindings = parse_ports(&svc.ports)?;

    Ok(ContainerConfig {
        name: svc.name.clone(),
        image: svc.image.clone(),
        cmd,
        host_config: HostConfig {
            binds: svc.volumes.clone(),
            port_bindings,
        },
    })
}
