use std::fmt;

/// Errors surfaced by the container runtime adapter.
///
/// These stay inside the adapter/manager boundary; the manager converts
/// them into [`ManagerError`] kinds before anything reaches a caller.
#[derive(Debug)]
pub enum RuntimeError {
    /// The runtime daemon could not be reached at all.
    Unreachable(String),
    /// The runtime executed the operation and refused it.
    CommandFailed(String),
    /// The operation did not complete within its deadline.
    Timeout(String),
    /// Spawning the runtime client process failed.
    IoError(std::io::Error),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Unreachable(e) => write!(f, "Container runtime unreachable: {}", e),
            RuntimeError::CommandFailed(e) => write!(f, "Runtime command failed: {}", e),
            RuntimeError::Timeout(e) => write!(f, "Runtime command timed out: {}", e),
            RuntimeError::IoError(e) => write!(f, "Runtime IO error: {}", e),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::IoError(err)
    }
}

#[derive(Debug)]
pub enum StoreError {
    ConnectionFailed(String),
    WriteFailed(String),
    ReadFailed(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::ConnectionFailed(e) => write!(f, "Store connection failed: {}", e),
            StoreError::WriteFailed(e) => write!(f, "Store write failed: {}", e),
            StoreError::ReadFailed(e) => write!(f, "Store read failed: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Error taxonomy of the lab lifecycle manager.
///
/// Every runtime and store failure is caught at the manager boundary and
/// converted into one of these kinds with a human-readable message; raw
/// engine errors never propagate to callers.
#[derive(Debug)]
pub enum ManagerError {
    /// The container engine is unreachable. Recoverable; availability is
    /// re-checked on the next inquiry.
    RuntimeUnavailable,
    /// The image backing the requested lab type is not present in the
    /// runtime. Setup error, carries the image name; not retried.
    ImageNotFound(String),
    /// The port scan range is exhausted.
    NoPortAvailable,
    /// Container create/start failed; wraps the engine's message.
    ContainerStartFailed(String),
    /// Container stop/remove failed; bookkeeping is cleaned up regardless.
    ContainerStopFailed(String),
    /// A targeted stop named a session owned by another user.
    Forbidden,
    /// Session store failure.
    Store(StoreError),
}

impl fmt::Display for ManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerError::RuntimeUnavailable => write!(
                f,
                "Container runtime is not available. Please ensure the Docker daemon is running and try again."
            ),
            ManagerError::ImageNotFound(image) => write!(
                f,
                "Docker image '{}' not found. Please build the image first using: docker build -t {} <path-to-dockerfile>",
                image, image
            ),
            ManagerError::NoPortAvailable => write!(f, "No host port available for allocation"),
            ManagerError::ContainerStartFailed(e) => write!(f, "Container start failed: {}", e),
            ManagerError::ContainerStopFailed(e) => write!(f, "Container stop failed: {}", e),
            ManagerError::Forbidden => write!(f, "Container is owned by another user"),
            ManagerError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for ManagerError {}

impl From<StoreError> for ManagerError {
    fn from(err: StoreError) -> Self {
        ManagerError::Store(err)
    }
}
