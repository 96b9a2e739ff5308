use crate::configuration::types::LabType;
use crate::lab_management::registry::SessionRegistry;
use crate::lab_management::types::{LabSession, SessionStatus};
use chrono::{Duration, Utc};

// Helper to build a tracked session
fn session(container_id: &str, user_id: &str, lab_type: LabType, port: u16) -> LabSession {
    LabSession {
        container_id: container_id.to_string(),
        user_id: user_id.to_string(),
        lab_type,
        port,
        status: SessionStatus::Running,
        created_at: Utc::now(),
    }
}

#[test]
fn registry_insert_get_remove() {
    let mut registry = SessionRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.get("c1").is_none());

    registry.insert(session("c1", "alice", LabType::Xss, 3001));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("c1").unwrap().user_id, "alice");

    let removed = registry.remove("c1").unwrap();
    assert_eq!(removed.port, 3001);
    assert!(registry.is_empty());
    assert!(registry.remove("c1").is_none());
}

#[test]
fn registry_insert_replaces_same_container_id() {
    let mut registry = SessionRegistry::new();
    registry.insert(session("c1", "alice", LabType::Xss, 3001));
    registry.insert(session("c1", "alice", LabType::Csrf, 3002));

    assert_eq!(registry.len(), 1);
    let tracked = registry.get("c1").unwrap();
    assert_eq!(tracked.lab_type, LabType::Csrf);
    assert_eq!(tracked.port, 3002);
}

#[test]
fn registry_filters_by_user() {
    let mut registry = SessionRegistry::new();
    registry.insert(session("c1", "alice", LabType::Xss, 3001));
    registry.insert(session("c2", "bob", LabType::Csrf, 3002));
    registry.insert(session("c3", "alice", LabType::Csrf, 3003));

    let alice = registry.sessions_for_user("alice");
    assert_eq!(alice.len(), 2);
    assert!(alice.iter().all(|s| s.user_id == "alice"));

    assert!(registry.sessions_for_user("carol").is_empty());
    assert_eq!(registry.all_sessions().len(), 3);
}

#[test]
fn registry_orders_sessions_oldest_first() {
    let base = Utc::now();
    let mut newer = session("new", "alice", LabType::Xss, 3002);
    newer.created_at = base + Duration::seconds(10);
    let mut older = session("old", "alice", LabType::Xss, 3001);
    older.created_at = base;

    let mut registry = SessionRegistry::new();
    registry.insert(newer);
    registry.insert(older);

    let sessions = registry.sessions_for_user("alice");
    assert_eq!(sessions[0].container_id, "old");
    assert_eq!(sessions[1].container_id, "new");
}

#[test]
fn registry_tracks_ports_in_use() {
    let mut registry = SessionRegistry::new();
    assert!(registry.ports_in_use().is_empty());

    registry.insert(session("c1", "alice", LabType::Xss, 3001));
    registry.insert(session("c2", "bob", LabType::Csrf, 3004));

    let ports = registry.ports_in_use();
    assert_eq!(ports.len(), 2);
    assert!(ports.contains(&3001));
    assert!(ports.contains(&3004));

    registry.remove("c1");
    assert!(!registry.ports_in_use().contains(&3001));

    registry.clear();
    assert!(registry.ports_in_use().is_empty());
}

#[test]
fn session_url_points_at_local_port() {
    let s = session("c1", "alice", LabType::Xss, 3007);
    assert_eq!(s.url(), "http://localhost:3007");
}

#[test]
fn lab_type_parsing_is_closed() {
    assert_eq!("xss".parse::<LabType>().unwrap(), LabType::Xss);
    assert_eq!("csrf".parse::<LabType>().unwrap(), LabType::Csrf);

    for rejected in ["sql", "XSS", "", "xss "] {
        let err = rejected.parse::<LabType>().unwrap_err();
        assert!(err.to_string().contains("Invalid lab type"));
    }
}

#[test]
fn status_strings_roundtrip_with_store_representation() {
    assert_eq!(SessionStatus::Running.as_str(), "running");
    assert_eq!(SessionStatus::Stopped.as_str(), "stopped");
    assert_eq!(SessionStatus::Error.as_str(), "error");
}

#[test]
fn lab_session_serializes_wire_names() {
    let s = session("c1", "alice", LabType::Csrf, 3001);
    let json = serde_json::to_value(&s).unwrap();
    assert_eq!(json["lab_type"], "csrf");
    assert_eq!(json["status"], "running");
    assert_eq!(json["port"], 3001);
}
