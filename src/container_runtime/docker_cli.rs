use crate::container_runtime::runtime_trait::{
    ContainerRuntime, ContainerSpec, ContainerState, ContainerSummary,
};
use crate::error_handling::types::RuntimeError;
use async_trait::async_trait;
use log::debug;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

// Per-operation deadlines; a hung daemon call must not hang the request.
const PING_TIMEOUT: Duration = Duration::from_secs(5);
const CREATE_TIMEOUT: Duration = Duration::from_secs(30);
const START_TIMEOUT: Duration = Duration::from_secs(30);
const STOP_TIMEOUT: Duration = Duration::from_secs(10);
const REMOVE_TIMEOUT: Duration = Duration::from_secs(10);
const LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ContainerRuntime`] implementation driving the `docker` CLI.
///
/// Every operation is a `docker` subprocess bounded by a deadline. The
/// adapter never interprets lab semantics; it only translates the narrow
/// runtime contract into CLI invocations.
pub struct DockerCli;

impl DockerCli {
    pub fn new() -> Self {
        DockerCli
    }

    async fn run(&self, args: &[&str], deadline: Duration) -> Result<String, RuntimeError> {
        debug!("docker {}", args.join(" "));
        let output = timeout(deadline, Command::new("docker").args(args).output())
            .await
            .map_err(|_| {
                RuntimeError::Timeout(format!(
                    "docker {} exceeded {}s",
                    args.first().copied().unwrap_or(""),
                    deadline.as_secs()
                ))
            })??;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(RuntimeError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn ping(&self) -> Result<(), RuntimeError> {
        // Any failure here means the daemon is unreachable as far as the
        // manager is concerned, timeouts included.
        match self
            .run(&["version", "--format", "{{.Server.Version}}"], PING_TIMEOUT)
            .await
        {
            Ok(_) => Ok(()),
            Err(RuntimeError::IoError(e)) => Err(RuntimeError::Unreachable(e.to_string())),
            Err(RuntimeError::CommandFailed(msg)) | Err(RuntimeError::Timeout(msg)) => {
                Err(RuntimeError::Unreachable(msg))
            }
            Err(e) => Err(e),
        }
    }

    async fn list_images(&self) -> Result<Vec<String>, RuntimeError> {
        let stdout = self
            .run(
                &["images", "--format", "{{.Repository}}:{{.Tag}}"],
                LIST_TIMEOUT,
            )
            .await?;
        Ok(stdout.lines().map(str::to_string).collect())
    }

    async fn image_exists(&self, name: &str) -> Result<bool, RuntimeError> {
        match self.run(&["image", "inspect", name], LIST_TIMEOUT).await {
            Ok(_) => Ok(true),
            Err(RuntimeError::CommandFailed(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        let port_binding = format!("{}:{}", spec.host_port, spec.container_port);
        let mut args: Vec<String> = vec![
            "create".to_string(),
            "--name".to_string(),
            spec.name.clone(),
            "-p".to_string(),
            port_binding,
        ];
        if spec.auto_remove {
            args.push("--rm".to_string());
        }
        for (key, value) in &spec.labels {
            args.push("-l".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push(spec.image.clone());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let container_id = self.run(&arg_refs, CREATE_TIMEOUT).await?;
        if container_id.is_empty() {
            return Err(RuntimeError::CommandFailed(
                "docker create returned no container id".to_string(),
            ));
        }
        Ok(container_id)
    }

    async fn start_container(&self, container_id: &str) -> Result<(), RuntimeError> {
        self.run(&["start", container_id], START_TIMEOUT).await?;
        Ok(())
    }

    async fn stop_container(&self, container_id: &str) -> Result<(), RuntimeError> {
        self.run(&["stop", container_id], STOP_TIMEOUT).await?;
        Ok(())
    }

    async fn remove_container(&self, container_id: &str) -> Result<(), RuntimeError> {
        match self
            .run(&["rm", "-f", container_id], REMOVE_TIMEOUT)
            .await
        {
            Ok(_) => Ok(()),
            // Already gone counts as removed.
            Err(RuntimeError::CommandFailed(msg)) if msg.contains("No such container") => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn inspect_container(&self, container_id: &str) -> Result<ContainerState, RuntimeError> {
        match self
            .run(
                &["inspect", "--format", "{{.State.Running}}", container_id],
                LIST_TIMEOUT,
            )
            .await
        {
            Ok(stdout) => Ok(ContainerState {
                running: stdout == "true",
            }),
            // An id the runtime has never heard of is simply not running.
            Err(RuntimeError::CommandFailed(msg))
                if msg.contains("No such object") || msg.contains("No such container") =>
            {
                Ok(ContainerState { running: false })
            }
            Err(e) => Err(e),
        }
    }

    async fn list_containers(
        &self,
        label_filter: &str,
    ) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let filter = format!("label={}", label_filter);
        let stdout = self
            .run(
                &[
                    "ps",
                    "-a",
                    "--filter",
                    &filter,
                    "--format",
                    "{{.ID}}\t{{.Names}}\t{{.State}}",
                ],
                LIST_TIMEOUT,
            )
            .await?;

        let mut containers = Vec::new();
        for line in stdout.lines() {
            let mut fields = line.split('\t');
            let (Some(id), Some(name)) = (fields.next(), fields.next()) else {
                continue;
            };
            let state = fields.next().unwrap_or("");
            containers.push(ContainerSummary {
                id: id.to_string(),
                name: name.to_string(),
                running: state == "running",
            });
        }
        Ok(containers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docker_available() -> bool {
        std::process::Command::new("docker")
            .args(["version", "--format", "{{.Server.Version}}"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn ping_reaches_local_daemon() {
        if !docker_available() {
            return;
        }
        let runtime = DockerCli::new();
        runtime.ping().await.expect("daemon should answer ping");
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn bogus_image_reported_absent() {
        if !docker_available() {
            return;
        }
        let runtime = DockerCli::new();
        let exists = runtime
            .image_exists("labrange-no-such-image:latest")
            .await
            .expect("image inspection should not error");
        assert!(!exists);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn unknown_container_inspects_as_not_running() {
        if !docker_available() {
            return;
        }
        let runtime = DockerCli::new();
        let state = runtime
            .inspect_container("deadbeefdeadbeef")
            .await
            .expect("inspect of unknown id should not error");
        assert!(!state.running);
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn removing_unknown_container_is_ok() {
        if !docker_available() {
            return;
        }
        let runtime = DockerCli::new();
        runtime
            .remove_container("deadbeefdeadbeef")
            .await
            .expect("removing an unknown container should be a no-op");
    }
}
