use crate::error_handling::types::RuntimeError;
use async_trait::async_trait;

/// Creation parameters for a lab container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    /// Runtime-safe container name (see [`crate::container_runtime::naming`]).
    pub name: String,
    /// Image to run; always resolved through the lab catalog.
    pub image: String,
    /// Port the lab service listens on inside the container.
    pub container_port: u16,
    /// Host port bound to `container_port`.
    pub host_port: u16,
    /// Ask the runtime to delete the container when it stops, so the
    /// common stop path needs no separate removal call.
    pub auto_remove: bool,
    /// Labels attached for later discovery of managed containers.
    pub labels: Vec<(String, String)>,
}

/// Point-in-time state of one container as reported by the runtime.
#[derive(Debug, Clone, Copy)]
pub struct ContainerState {
    pub running: bool,
}

/// One row of a container listing.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub running: bool,
}

/// Narrow contract the lifecycle manager requires from a container engine.
///
/// The manager depends only on this trait; the Docker CLI adapter is one
/// implementation, the test fakes are another.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Health probe against the engine daemon.
    async fn ping(&self) -> Result<(), RuntimeError>;

    /// Names (`repository:tag`) of all locally present images.
    async fn list_images(&self) -> Result<Vec<String>, RuntimeError>;

    /// Whether `name` resolves to a locally present image.
    async fn image_exists(&self, name: &str) -> Result<bool, RuntimeError>;

    /// Creates a container from `spec` and returns its runtime-assigned id.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError>;

    async fn start_container(&self, container_id: &str) -> Result<(), RuntimeError>;

    async fn stop_container(&self, container_id: &str) -> Result<(), RuntimeError>;

    /// Force-removes a container. Removing an already-gone container is
    /// not an error.
    async fn remove_container(&self, container_id: &str) -> Result<(), RuntimeError>;

    /// Reports whether the container is currently running. A container
    /// unknown to the runtime reports as not running rather than erroring,
    /// so reconciliation can treat "missing" and "exited" alike.
    async fn inspect_container(&self, container_id: &str) -> Result<ContainerState, RuntimeError>;

    /// Lists containers (running or not) carrying the given `key=value`
    /// label.
    async fn list_containers(
        &self,
        label_filter: &str,
    ) -> Result<Vec<ContainerSummary>, RuntimeError>;
}
