use std::future::Future;

use crate::oci::{Client, ContainerConfig, ContainerInfo, LocalContainer, Result};

/// Container operations needed to read and reconcile the service state
pub trait Runtime {
    /// List all containers, including stopped ones
    fn list_containers(&self) -> impl Future<Output = Result<Vec<LocalContainer>>> + Send;

    fn inspect_container(&self, id: &str) -> impl Future<Output = Result<ContainerInfo>> + Send;

    /// Create a container, returning its engine id
    fn create_container(
        &self,
        config: ContainerConfig,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Start a container. Starting a running container succeeds.
    fn start_container(&self, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Stop a container, waiting at most `grace_secs` before killing it.
    /// Stopping a stopped container succeeds.
    fn stop_container(&self, id: &str, grace_secs: u32)
    -> impl Future<Output = Result<()>> + Send;

    fn remove_container(&self, id: &str, force: bool) -> impl Future<Output = Result<()>> + Send;
}

impl Runtime for Client {
    async fn list_containers(&self) -> Result<Vec<LocalContainer>> {
        self.container().list().await
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInfo> {
        self.container().inspect(id).await
    }

    async fn create_container(&self, config: ContainerConfig) -> Result<String> {
        self.container().create(config).await
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.container().start(id).await
    }

    async fn stop_container(&self, id: &str, grace_secs: u32) -> Result<()> {
        self.container().stop(id, grace_secs).await
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        self.container().remove(id, force).await
    }
}
