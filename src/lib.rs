//! labrange — per-user vulnerability-lab container orchestrator.
//!
//! The crate maps one logical lab session per authenticated user onto
//! exactly one live Docker container: it allocates host ports, enforces
//! the single-active-container rule, persists sessions to SQLite, and
//! reconciles persisted state against the runtime after a restart.
//!
//! Subsystems:
//! - [`lab_management`]: the lifecycle manager, registry and port allocator.
//! - [`container_runtime`]: the engine abstraction and Docker CLI adapter.
//! - [`storage`]: durable session persistence.
//! - [`web_interface`]: the HTTP API surface.
//! - [`configuration`]: runtime parameters and the lab-type catalog.

pub mod configuration;
pub mod container_runtime;
pub mod error_handling;
pub mod lab_management;
pub mod storage;
pub mod web_interface;

pub use configuration::{Config, LabCatalog, LabType};
pub use error_handling::ManagerError;
pub use lab_management::{LabManager, LabSession, SessionStatus, StartedLab};
