//! Container name construction.
//!
//! Runtime container names must match `[a-zA-Z0-9][a-zA-Z0-9_.-]*`. User
//! identifiers come from the authentication layer and may contain anything
//! (email addresses being the common case), so the user component is
//! sanitized before it is embedded in a name.

use crate::configuration::types::LabType;
use chrono::{DateTime, Utc};

/// Upper bound on the sanitized user component, keeping full names well
/// under the runtime's 128-character limit.
const MAX_USER_COMPONENT_LEN: usize = 20;

/// Sanitizes a user identifier for use inside a container name.
///
/// Characters outside `[a-zA-Z0-9_.-]` become `_`, a non-alphanumeric
/// leading character becomes `u`, and the result is truncated to
/// [`MAX_USER_COMPONENT_LEN`] characters.
pub fn sanitize_user_component(user_id: &str) -> String {
    if user_id.is_empty() {
        return "u".to_string();
    }

    let mut sanitized: String = user_id
        .chars()
        .take(MAX_USER_COMPONENT_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Every char is ASCII after the map above, so byte-slicing at offset 1
    // is safe.
    if sanitized.starts_with(|c: char| !c.is_ascii_alphanumeric()) {
        sanitized = format!("u{}", &sanitized[1..]);
    }

    sanitized
}

/// Builds the container name `<labtype>_<user>_<unix-millis>`.
///
/// The millisecond suffix keeps names unique across repeated starts by the
/// same user; the lab-type prefix keeps the name starting alphanumeric
/// regardless of the user component.
pub fn container_name(lab_type: LabType, user_id: &str, created_at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        lab_type.as_str(),
        sanitize_user_component(user_id),
        created_at.timestamp_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_user_id_passes_through() {
        assert_eq!(sanitize_user_component("alice42"), "alice42");
        assert_eq!(sanitize_user_component("a-b.c_d"), "a-b.c_d");
    }

    #[test]
    fn invalid_chars_become_underscores() {
        assert_eq!(
            sanitize_user_component("alice@example.com"),
            "alice_example.com"
        );
        assert_eq!(sanitize_user_component("one two!"), "one_two_");
    }

    #[test]
    fn leading_char_forced_alphanumeric() {
        assert_eq!(sanitize_user_component("-alice"), "ualice");
        assert_eq!(sanitize_user_component("_alice"), "ualice");
        assert_eq!(sanitize_user_component("@alice"), "ualice");
    }

    #[test]
    fn long_user_id_truncated() {
        let long = "x".repeat(100);
        assert_eq!(sanitize_user_component(&long).len(), MAX_USER_COMPONENT_LEN);
    }

    #[test]
    fn empty_user_id_gets_placeholder() {
        assert_eq!(sanitize_user_component(""), "u");
    }

    #[test]
    fn name_layout_and_validity() {
        let when = Utc::now();
        let name = container_name(LabType::Xss, "bob@lab", when);
        assert!(name.starts_with("xss_bob_lab_"));
        assert!(name.ends_with(&when.timestamp_millis().to_string()));
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'));
    }

    #[test]
    fn repeated_starts_yield_distinct_names() {
        let t1 = Utc::now();
        let t2 = t1 + chrono::Duration::milliseconds(1);
        assert_ne!(
            container_name(LabType::Csrf, "alice", t1),
            container_name(LabType::Csrf, "alice", t2)
        );
    }
}
