use std::path::Path;

use chrono::{DateTime, Utc};
use log::warn;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::error_handling::types::StoreError;
use crate::lab_management::types::{LabSession, SessionStatus};
use crate::storage::store_trait::SessionStore;
use async_trait::async_trait;

// Internal row mapping for sessions to avoid manual try_get
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    container_id: String,
    user_id: String,
    lab_type: String,
    port: i64,
    status: String,
    created_at: String,
}

impl SessionRow {
    fn into_session(self) -> Result<LabSession, StoreError> {
        let lab_type = self
            .lab_type
            .parse()
            .map_err(|e| StoreError::ReadFailed(format!("row {}: {}", self.container_id, e)))?;
        let port = u16::try_from(self.port).map_err(|_| {
            StoreError::ReadFailed(format!(
                "row {}: port {} out of range",
                self.container_id, self.port
            ))
        })?;
        let status = match self.status.as_str() {
            "running" => SessionStatus::Running,
            "stopped" => SessionStatus::Stopped,
            _ => SessionStatus::Error,
        };
        Ok(LabSession {
            container_id: self.container_id,
            user_id: self.user_id,
            lab_type,
            port,
            status,
            created_at: DateTime::parse_from_rfc3339(&self.created_at)
                .map_err(|e| StoreError::ReadFailed(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

/// SQLite-backed [`SessionStore`].
///
/// The schema is bootstrapped on connect (`CREATE TABLE IF NOT EXISTS`);
/// timestamps are stored as RFC3339 strings for portability.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `path` and ensures the
    /// `active_containers` table exists.
    pub async fn connect<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
            }
        }

        let opts = SqliteConnectOptions::new()
            .filename(path_ref)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS active_containers (
                container_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                lab_type TEXT NOT NULL,
                port INTEGER NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn upsert(&self, session: &LabSession) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO active_containers (container_id, user_id, lab_type, port, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(container_id) DO UPDATE SET
               status = excluded.status,
               port = excluded.port",
        )
        .bind(&session.container_id)
        .bind(&session.user_id)
        .bind(session.lab_type.as_str())
        .bind(session.port as i64)
        .bind(session.status.as_str())
        .bind(session.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, container_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM active_containers WHERE container_id = ?1")
            .bind(container_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM active_containers WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM active_containers")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<LabSession>, StoreError> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT container_id, user_id, lab_type, port, status, created_at
             FROM active_containers ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        // Malformed rows are skipped, not fatal: one bad record must not
        // block reconciliation of the rest.
        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            match row.into_session() {
                Ok(session) => sessions.push(session),
                Err(e) => warn!("Skipping malformed session row: {}", e),
            }
        }
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::LabType;
    use tempfile::TempDir;

    async fn temp_store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::connect(dir.path().join("test.sqlite3"))
            .await
            .unwrap();
        (dir, store)
    }

    fn session(container_id: &str, user_id: &str, port: u16) -> LabSession {
        LabSession {
            container_id: container_id.to_string(),
            user_id: user_id.to_string(),
            lab_type: LabType::Xss,
            port,
            status: SessionStatus::Running,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_and_list_roundtrip() {
        let (_dir, store) = temp_store().await;
        let s1 = session("c1", "alice", 3001);
        store.upsert(&s1).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].container_id, "c1");
        assert_eq!(all[0].user_id, "alice");
        assert_eq!(all[0].lab_type, LabType::Xss);
        assert_eq!(all[0].port, 3001);
        assert_eq!(all[0].status, SessionStatus::Running);
        assert_eq!(
            all[0].created_at.timestamp_millis(),
            s1.created_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn upsert_same_container_updates_in_place() {
        let (_dir, store) = temp_store().await;
        let mut s = session("c1", "alice", 3001);
        store.upsert(&s).await.unwrap();

        s.port = 3005;
        store.upsert(&s).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].port, 3005);
    }

    #[tokio::test]
    async fn delete_scopes() {
        let (_dir, store) = temp_store().await;
        store.upsert(&session("c1", "alice", 3001)).await.unwrap();
        store.upsert(&session("c2", "alice", 3002)).await.unwrap();
        store.upsert(&session("c3", "bob", 3003)).await.unwrap();

        store.delete("c1").await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 2);

        // absent row is not an error
        store.delete("c1").await.unwrap();

        store.delete_all_for_user("alice").await.unwrap();
        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user_id, "bob");

        store.delete_all().await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent_across_connects() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite3");

        let store = SqliteStore::connect(&path).await.unwrap();
        store.upsert(&session("c1", "alice", 3001)).await.unwrap();
        drop(store);

        let reopened = SqliteStore::connect(&path).await.unwrap();
        assert_eq!(reopened.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_row_is_skipped_not_fatal() {
        let (_dir, store) = temp_store().await;
        store.upsert(&session("good", "alice", 3001)).await.unwrap();
        sqlx::query(
            "INSERT INTO active_containers (container_id, user_id, lab_type, port, status, created_at)
             VALUES ('bad', 'bob', 'sql', 3002, 'running', 'not-a-timestamp')",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].container_id, "good");
    }
}
