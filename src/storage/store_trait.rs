//! Session store trait.
//!
//! Defines the durable-persistence interface the lifecycle manager
//! consumes. Each operation is independently atomic; there is no
//! cross-row transaction, and the manager tolerates that — registry and
//! store only need to agree eventually, with startup reconciliation
//! closing any gap left by a crash.

use crate::error_handling::types::StoreError;
use crate::lab_management::types::LabSession;
use async_trait::async_trait;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts or updates the row for `session.container_id`.
    async fn upsert(&self, session: &LabSession) -> Result<(), StoreError>;

    /// Deletes the row for `container_id`. Deleting an absent row is not
    /// an error.
    async fn delete(&self, container_id: &str) -> Result<(), StoreError>;

    /// Deletes every row owned by `user_id`.
    async fn delete_all_for_user(&self, user_id: &str) -> Result<(), StoreError>;

    /// Deletes every row. Used by the administrative purge.
    async fn delete_all(&self) -> Result<(), StoreError>;

    /// Returns all persisted sessions.
    async fn list_all(&self) -> Result<Vec<LabSession>, StoreError>;
}
