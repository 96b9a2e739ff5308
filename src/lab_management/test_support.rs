//! In-memory fakes shared by the manager and web-layer tests.

use crate::container_runtime::runtime_trait::{
    ContainerRuntime, ContainerSpec, ContainerState, ContainerSummary,
};
use crate::error_handling::types::RuntimeError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct FakeContainer {
    name: String,
    labels: Vec<(String, String)>,
    running: bool,
    auto_remove: bool,
}

/// Scriptable [`ContainerRuntime`] standing in for a Docker daemon.
///
/// Containers live in a map keyed by minted ids; the `fail_*` switches
/// make individual operations refuse, mimicking an unhappy engine.
#[derive(Default)]
pub struct FakeRuntime {
    images: Mutex<Vec<String>>,
    containers: Mutex<HashMap<String, FakeContainer>>,
    pub ping_fails: AtomicBool,
    pub create_fails: AtomicBool,
    pub start_fails: AtomicBool,
    pub stop_fails: AtomicBool,
    pub remove_fails: AtomicBool,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runtime that already has both default lab images.
    pub fn with_default_images() -> Self {
        let runtime = Self::new();
        runtime.add_image("xss_lab");
        runtime.add_image("csrf_lab");
        runtime
    }

    pub fn add_image(&self, name: &str) {
        self.images.lock().unwrap().push(name.to_string());
    }

    /// Plants a container directly, bypassing create/start. Used to model
    /// containers left over from a previous process.
    pub fn plant_container(&self, id: &str, name: &str, running: bool) {
        self.containers.lock().unwrap().insert(
            id.to_string(),
            FakeContainer {
                name: name.to_string(),
                labels: vec![(
                    crate::lab_management::MANAGED_LABEL.to_string(),
                    "true".to_string(),
                )],
                running,
                auto_remove: false,
            },
        );
    }

    pub fn container_count(&self) -> usize {
        self.containers.lock().unwrap().len()
    }

    pub fn running_count(&self) -> usize {
        self.containers
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.running)
            .count()
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.containers
            .lock()
            .unwrap()
            .get(id)
            .map(|c| c.running)
            .unwrap_or(false)
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn ping(&self) -> Result<(), RuntimeError> {
        if self.ping_fails.load(Ordering::Relaxed) {
            Err(RuntimeError::Unreachable("fake daemon down".to_string()))
        } else {
            Ok(())
        }
    }

    async fn list_images(&self) -> Result<Vec<String>, RuntimeError> {
        Ok(self.images.lock().unwrap().clone())
    }

    async fn image_exists(&self, name: &str) -> Result<bool, RuntimeError> {
        Ok(self.images.lock().unwrap().iter().any(|i| i == name))
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        if self.create_fails.load(Ordering::Relaxed) {
            return Err(RuntimeError::CommandFailed(
                "simulated create failure".to_string(),
            ));
        }
        let id = format!("fake-{}", &Uuid::new_v4().to_string()[..8]);
        self.containers.lock().unwrap().insert(
            id.clone(),
            FakeContainer {
                name: spec.name.clone(),
                labels: spec.labels.clone(),
                running: false,
                auto_remove: spec.auto_remove,
            },
        );
        Ok(id)
    }

    async fn start_container(&self, container_id: &str) -> Result<(), RuntimeError> {
        if self.start_fails.load(Ordering::Relaxed) {
            return Err(RuntimeError::CommandFailed(
                "simulated start failure".to_string(),
            ));
        }
        let mut containers = self.containers.lock().unwrap();
        match containers.get_mut(container_id) {
            Some(container) => {
                container.running = true;
                Ok(())
            }
            None => Err(RuntimeError::CommandFailed(format!(
                "No such container: {}",
                container_id
            ))),
        }
    }

    async fn stop_container(&self, container_id: &str) -> Result<(), RuntimeError> {
        if self.stop_fails.load(Ordering::Relaxed) {
            return Err(RuntimeError::CommandFailed(
                "simulated stop failure".to_string(),
            ));
        }
        let mut containers = self.containers.lock().unwrap();
        let auto_remove = match containers.get_mut(container_id) {
            Some(container) => {
                container.running = false;
                container.auto_remove
            }
            None => {
                return Err(RuntimeError::CommandFailed(format!(
                    "No such container: {}",
                    container_id
                )))
            }
        };
        if auto_remove {
            containers.remove(container_id);
        }
        Ok(())
    }

    async fn remove_container(&self, container_id: &str) -> Result<(), RuntimeError> {
        if self.remove_fails.load(Ordering::Relaxed) {
            return Err(RuntimeError::CommandFailed(
                "simulated remove failure".to_string(),
            ));
        }
        self.containers.lock().unwrap().remove(container_id);
        Ok(())
    }

    async fn inspect_container(&self, container_id: &str) -> Result<ContainerState, RuntimeError> {
        let running = self.is_running(container_id);
        Ok(ContainerState { running })
    }

    async fn list_containers(
        &self,
        label_filter: &str,
    ) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let (key, value) = label_filter.split_once('=').unwrap_or((label_filter, ""));
        Ok(self
            .containers
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, c)| c.labels.iter().any(|(k, v)| k == key && v == value))
            .map(|(id, c)| ContainerSummary {
                id: id.clone(),
                name: c.name.clone(),
                running: c.running,
            })
            .collect())
    }
}
