use chrono::Utc;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::configuration::types::{LabCatalog, LabType};
use crate::container_runtime::runtime_trait::{ContainerRuntime, ContainerSpec};
use crate::container_runtime::naming;
use crate::error_handling::types::{ManagerError, RuntimeError};
use crate::lab_management::ports;
use crate::lab_management::registry::SessionRegistry;
use crate::lab_management::types::{LabSession, SessionStatus, StartedLab};
use crate::storage::store_trait::SessionStore;

/// Port the lab images serve on inside their containers.
const LAB_CONTAINER_PORT: u16 = 80;

/// Label marking containers under this orchestrator's management.
pub const MANAGED_LABEL: &str = "io.labrange.managed";
const USER_LABEL: &str = "io.labrange.user";
const LAB_LABEL: &str = "io.labrange.lab";

/// Orchestrates lab container lifecycle and bookkeeping.
///
/// The manager is the single entry point for starting, stopping, listing
/// and reconciling lab sessions. It owns the in-memory registry, enforces
/// the one-running-session-per-user rule, and keeps the durable store
/// trailing the registry.
///
/// Design notes:
/// - Start/stop operations for the same user are serialized through a
///   per-user mutex, so a stop-then-start sequence is atomic with respect
///   to other requests for that user; concurrent duplicate starts queue.
/// - Registry cleanliness wins over runtime truth: when a stop or remove
///   fails against the engine, the session is deregistered anyway and the
///   discrepancy is logged.
pub struct LabManager {
    runtime: Arc<dyn ContainerRuntime>,
    store: Arc<dyn SessionStore>,
    catalog: LabCatalog,
    base_port: u16,
    registry: RwLock<SessionRegistry>,
    // Last known engine availability; negative results are re-checked on
    // the next inquiry, positive ones are trusted until an operation fails.
    runtime_available: AtomicBool,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LabManager {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        store: Arc<dyn SessionStore>,
        catalog: LabCatalog,
        base_port: u16,
    ) -> Self {
        info!("Initializing LabManager (base port {})", base_port);
        LabManager {
            runtime,
            store,
            catalog,
            base_port,
            registry: RwLock::new(SessionRegistry::new()),
            runtime_available: AtomicBool::new(false),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the serialization lock for `user_id`, creating it on first
    /// use.
    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Pings the container engine, caching the result.
    ///
    /// A cached positive answer is returned without re-pinging; a cached
    /// negative answer triggers a fresh ping so a recovered engine is
    /// detected on the next inquiry rather than requiring a restart.
    pub async fn is_runtime_available(&self) -> bool {
        if self.runtime_available.load(Ordering::Relaxed) {
            return true;
        }
        match self.runtime.ping().await {
            Ok(()) => {
                info!("Container runtime connection established");
                self.runtime_available.store(true, Ordering::Relaxed);
                true
            }
            Err(e) => {
                warn!("Container runtime is not available: {}", e);
                false
            }
        }
    }

    fn mark_runtime_unavailable(&self) {
        self.runtime_available.store(false, Ordering::Relaxed);
    }

    /// A create/start deadline expiry means the engine is hanging, not
    /// that the container is bad; anything else wraps the engine message.
    fn classify_start_error(&self, err: RuntimeError) -> ManagerError {
        match err {
            RuntimeError::Timeout(msg) => {
                warn!("Runtime deadline expired during start: {}", msg);
                self.mark_runtime_unavailable();
                ManagerError::RuntimeUnavailable
            }
            other => ManagerError::ContainerStartFailed(other.to_string()),
        }
    }

    /// Starts a lab session for `user_id`, terminating any session the
    /// user already has.
    ///
    /// Returns the new container's id, host port and access URL. On any
    /// failure no session is registered.
    pub async fn start_session(
        &self,
        user_id: &str,
        lab_type: LabType,
    ) -> Result<StartedLab, ManagerError> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        if !self.is_runtime_available().await {
            return Err(ManagerError::RuntimeUnavailable);
        }

        // Single-active-container rule: supersede whatever the user has.
        self.stop_all_for_user(user_id).await;

        let image = self.catalog.image_for(lab_type).to_string();
        match self.runtime.image_exists(&image).await {
            Ok(true) => {}
            Ok(false) => return Err(ManagerError::ImageNotFound(image)),
            Err(e) => {
                warn!("Image check for '{}' failed: {}", image, e);
                self.mark_runtime_unavailable();
                return Err(ManagerError::RuntimeUnavailable);
            }
        }

        let port = {
            let registry = self.registry.read().await;
            ports::next_free_port(self.base_port, &registry.ports_in_use())?
        };

        let created_at = Utc::now();
        let name = naming::container_name(lab_type, user_id, created_at);
        let spec = ContainerSpec {
            name: name.clone(),
            image,
            container_port: LAB_CONTAINER_PORT,
            host_port: port,
            auto_remove: true,
            labels: vec![
                (MANAGED_LABEL.to_string(), "true".to_string()),
                (USER_LABEL.to_string(), user_id.to_string()),
                (LAB_LABEL.to_string(), lab_type.as_str().to_string()),
            ],
        };

        info!("Creating container {} for user {}", name, user_id);
        let container_id = match self.runtime.create_container(&spec).await {
            Ok(id) => id,
            Err(e) => return Err(self.classify_start_error(e)),
        };

        if let Err(e) = self.runtime.start_container(&container_id).await {
            // The created container must not linger.
            if let Err(rm_err) = self.runtime.remove_container(&container_id).await {
                warn!(
                    "Failed to remove container {} after start failure: {}",
                    container_id, rm_err
                );
            }
            return Err(self.classify_start_error(e));
        }

        let session = LabSession {
            container_id: container_id.clone(),
            user_id: user_id.to_string(),
            lab_type,
            port,
            status: SessionStatus::Running,
            created_at,
        };
        let url = session.url();

        self.registry.write().await.insert(session.clone());
        if let Err(e) = self.store.upsert(&session).await {
            // The registry stays authoritative; reconciliation repairs the
            // store on the next startup.
            error!("Failed to persist session {}: {}", container_id, e);
        }

        info!(
            "Started {} lab for user {} on port {} ({})",
            lab_type, user_id, port, container_id
        );
        Ok(StartedLab {
            container_id,
            port,
            url,
        })
    }

    /// Stops a lab session.
    ///
    /// With a `container_id`, stops exactly that container — refused with
    /// [`ManagerError::Forbidden`] when the id names a session tracked for
    /// another user. Without one, stops every session `user_id` owns.
    ///
    /// Registry and store entries for the targeted id are removed even
    /// when the engine refuses the stop; a targeted stop surfaces that
    /// refusal as [`ManagerError::ContainerStopFailed`] after cleanup.
    pub async fn stop_session(
        &self,
        user_id: &str,
        container_id: Option<&str>,
    ) -> Result<(), ManagerError> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        match container_id {
            Some(id) => {
                let owner = {
                    let registry = self.registry.read().await;
                    registry.get(id).map(|s| s.user_id.clone())
                };
                if let Some(owner) = owner {
                    if owner != user_id {
                        warn!(
                            "User {} attempted to stop container {} owned by {}",
                            user_id, id, owner
                        );
                        return Err(ManagerError::Forbidden);
                    }
                }
                self.terminate(id).await
            }
            None => {
                self.stop_all_for_user(user_id).await;
                if let Err(e) = self.store.delete_all_for_user(user_id).await {
                    error!("Failed to delete session rows for user {}: {}", user_id, e);
                }
                Ok(())
            }
        }
    }

    /// Sessions tracked for `user_id`, oldest first. Pure registry read —
    /// reflects bookkeeping at call time, not live runtime truth.
    pub async fn list_user_sessions(&self, user_id: &str) -> Vec<LabSession> {
        self.registry.read().await.sessions_for_user(user_id)
    }

    /// All tracked sessions, oldest first. Administrative read.
    pub async fn list_all_sessions(&self) -> Vec<LabSession> {
        self.registry.read().await.all_sessions()
    }

    /// Loads persisted sessions and resynchronizes them with the runtime.
    ///
    /// Rows backed by a running container enter the registry; rows whose
    /// container is gone or stopped are deleted from the store. Idempotent
    /// and safe to re-run; a per-row verification failure leaves that row
    /// in place and never aborts the rest of the pass.
    ///
    /// Returns the number of sessions restored into the registry.
    pub async fn reconcile_from_store(&self) -> Result<usize, ManagerError> {
        let rows = self.store.list_all().await?;
        debug!("Reconciling {} persisted session row(s)", rows.len());

        let mut restored = 0;
        for session in rows {
            let container_id = session.container_id.clone();
            match self.runtime.inspect_container(&container_id).await {
                Ok(state) if state.running => {
                    self.registry.write().await.insert(session);
                    restored += 1;
                }
                Ok(_) => {
                    debug!("Purging stale session row {}", container_id);
                    self.registry.write().await.remove(&container_id);
                    if let Err(e) = self.store.delete(&container_id).await {
                        error!("Failed to delete stale session row {}: {}", container_id, e);
                    }
                }
                Err(e) => {
                    // Verification failed, not the container: keep the row
                    // and let a later pass decide.
                    warn!("Could not verify container {}: {}", container_id, e);
                }
            }
        }

        info!(
            "Initialized lab manager with {} active session(s)",
            restored
        );
        Ok(restored)
    }

    /// Stops and removes every container carrying the managed label, then
    /// clears the registry and all persisted rows. Administrative one-shot
    /// used by `--purge`; per-container engine failures are logged, not
    /// fatal.
    ///
    /// Returns the number of containers removed.
    pub async fn purge_all(&self) -> Result<usize, ManagerError> {
        let filter = format!("{}=true", MANAGED_LABEL);
        let containers = self.runtime.list_containers(&filter).await.map_err(|e| {
            warn!("Could not list managed containers: {}", e);
            self.mark_runtime_unavailable();
            ManagerError::RuntimeUnavailable
        })?;

        info!("Found {} managed lab container(s)", containers.len());
        let mut removed = 0;
        for container in containers {
            if container.running {
                if let Err(e) = self.runtime.stop_container(&container.id).await {
                    warn!(
                        "Failed to stop container {} ({}): {}",
                        container.id, container.name, e
                    );
                }
            }
            match self.runtime.remove_container(&container.id).await {
                Ok(()) => {
                    removed += 1;
                    debug!("Removed container {} ({})", container.id, container.name);
                }
                Err(e) => warn!(
                    "Failed to remove container {} ({}): {}",
                    container.id, container.name, e
                ),
            }
        }

        self.registry.write().await.clear();
        if let Err(e) = self.store.delete_all().await {
            error!("Failed to clear session rows: {}", e);
        }

        info!("Purged {} managed container(s)", removed);
        Ok(removed)
    }

    /// Warns about catalog images missing from the runtime. Setup aid run
    /// at startup; never fails.
    pub async fn preflight_images(&self) {
        let images = match self.runtime.list_images().await {
            Ok(images) => images,
            Err(e) => {
                warn!("Could not list runtime images: {}", e);
                return;
            }
        };
        for (lab_type, image) in self.catalog.entries() {
            let tagged = format!("{}:", image);
            let present = images.iter().any(|i| i == image || i.starts_with(&tagged));
            if present {
                debug!("Image '{}' for {} lab is present", image, lab_type);
            } else {
                warn!(
                    "{} lab: {}",
                    lab_type,
                    ManagerError::ImageNotFound(image.to_string())
                );
            }
        }
    }

    /// Stops, removes and deregisters one container.
    ///
    /// Bookkeeping is cleaned up unconditionally — the registry must never
    /// retain a handle to a container the manager tried and failed to stop.
    /// Reports [`ManagerError::ContainerStopFailed`] when the engine
    /// refused the stop.
    async fn terminate(&self, container_id: &str) -> Result<(), ManagerError> {
        let stop_result = self.runtime.stop_container(container_id).await;
        if let Err(e) = &stop_result {
            warn!("Failed to stop container {}: {}", container_id, e);
        }
        // Auto-removal covers the common path; force-remove covers
        // containers that never ran. Already-gone is success.
        if let Err(e) = self.runtime.remove_container(container_id).await {
            warn!("Failed to remove container {}: {}", container_id, e);
        }

        let removed = self.registry.write().await.remove(container_id);
        if let Some(session) = &removed {
            info!(
                "Stopped and removed container {} for user {}",
                container_id, session.user_id
            );
        }
        if let Err(e) = self.store.delete(container_id).await {
            error!("Failed to delete session row {}: {}", container_id, e);
        }

        match stop_result {
            Ok(()) => Ok(()),
            Err(e) => Err(ManagerError::ContainerStopFailed(e.to_string())),
        }
    }

    /// Best-effort termination of every session `user_id` owns.
    async fn stop_all_for_user(&self, user_id: &str) {
        let ids: Vec<String> = {
            let registry = self.registry.read().await;
            registry
                .sessions_for_user(user_id)
                .into_iter()
                .map(|s| s.container_id)
                .collect()
        };
        for id in ids {
            if let Err(e) = self.terminate(&id).await {
                // Already logged and deregistered; nothing more to do here.
                debug!("Superseded session {} with error: {}", id, e);
            }
        }
    }
}

impl Drop for LabManager {
    fn drop(&mut self) {
        if let Ok(registry) = self.registry.try_read() {
            if !registry.is_empty() {
                warn!(
                    "LabManager dropped with {} tracked session(s); their containers keep running until reconciliation",
                    registry.len()
                );
            }
        }
    }
}
