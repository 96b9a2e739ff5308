//! Container runtime abstraction.
//!
//! The lifecycle manager talks to the engine exclusively through the
//! [`ContainerRuntime`] trait; [`DockerCli`] is the production adapter,
//! driving the `docker` CLI with per-operation deadlines.
//!
//! Re-exports:
//! - [`ContainerRuntime`]: the narrow engine contract.
//! - [`ContainerSpec`], [`ContainerState`], [`ContainerSummary`]: its types.
//! - [`DockerCli`]: the Docker CLI adapter.

pub mod docker_cli;
pub mod naming;
pub mod runtime_trait;

pub use docker_cli::DockerCli;
pub use runtime_trait::{ContainerRuntime, ContainerSpec, ContainerState, ContainerSummary};
