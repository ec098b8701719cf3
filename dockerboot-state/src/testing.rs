//! In-memory engine used by the unit tests
use std::sync::Mutex;

use crate::oci::{ContainerConfig, ContainerInfo, Error, LocalContainer, Result};
use crate::runtime::Runtime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Inspect(String),
    /// Create a container with the given name
    Create(String),
    Start(String),
    Stop(String, u32),
    Remove(String, bool),
}

/// Records every call and answers from a fixed list of containers.
///
/// Calls added with [FakeRuntime::failing] return an error, create calls
/// match on the container name.
#[derive(Default)]
pub struct FakeRuntime {
    containers: Vec<(LocalContainer, ContainerInfo)>,
    failing: Vec<Call>,
    calls: Mutex<Vec<Call>>,
    created: Mutex<Vec<ContainerConfig>>,
}

impl FakeRuntime {
    pub fn with_container(
        mut self,
        id: &str,
        name: &str,
        command: &str,
        info: ContainerInfo,
    ) -> Self {
        let names = if name.is_empty() {
            vec![]
        } else {
            vec![name.to_owned()]
        };
        self.containers.push((
            LocalContainer {
                id: id.to_owned(),
                names,
                command: command.to_owned(),
            },
            info,
        ));
        self
    }

    pub fn failing(mut self, call: Call) -> Self {
        self.failing.push(call);
        self
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Configurations of all create calls, in order
    pub fn created(&self) -> Vec<ContainerConfig> {
        self.created.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        let fails = self.failing.contains(&call);
        let msg = format!("fake failure on {call:?}");
        self.calls.lock().unwrap().push(call);
        if fails { Err(Error::from(msg)) } else { Ok(()) }
    }
}

impl Runtime for FakeRuntime {
    async fn list_containers(&self) -> Result<Vec<LocalContainer>> {
        self.record(Call::List)?;
        Ok(self.containers.iter().map(|(c, _)| c.clone()).collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInfo> {
        self.record(Call::Inspect(id.to_owned()))?;
        self.containers
            .iter()
            .find(|(c, _)| c.id == id)
            .map(|(_, info)| info.clone())
            .ok_or_else(|| Error::from(format!("no such container: {id}")))
    }

    async fn create_container(&self, config: ContainerConfig) -> Result<String> {
        self.record(Call::Create(config.name.clone()))?;
        let id = format!("{}-new", config.name);
        self.created.lock().unwrap().push(config);
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.record(Call::Start(id.to_owned()))
    }

    async fn stop_container(&self, id: &str, grace_secs: u32) -> Result<()> {
        self.record(Call::Stop(id.to_owned(), grace_secs))
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        self.record(Call::Remove(id.to_owned(), force))
    }
}
