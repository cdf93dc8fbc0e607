use std::sync::atomic::{AtomicU64, Ordering};

/// Generate a fresh v4 UUID string.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Source of opaque identifiers for remote sessions.
///
/// The manager never calls `uuid` directly; tests inject a deterministic
/// source so session ids are predictable.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Default id source backed by v4 UUIDs.
#[derive(Debug, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&self) -> String {
        new_id()
    }
}

/// Sequential id source for tests: `prefix-0`, `prefix-1`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: AtomicU64::new(0),
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_is_valid_uuid() {
        let id = new_id();
        let parsed = uuid::Uuid::parse_str(&id);
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap().get_version_num(), 4);
    }

    #[test]
    fn new_id_is_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
    }

    #[test]
    fn uuid_ids_produces_uuids() {
        let ids = UuidIds;
        let id = ids.next_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn sequential_ids_count_up() {
        let ids = SequentialIds::new("sess");
        assert_eq!(ids.next_id(), "sess-0");
        assert_eq!(ids.next_id(), "sess-1");
        assert_eq!(ids.next_id(), "sess-2");
    }
}
