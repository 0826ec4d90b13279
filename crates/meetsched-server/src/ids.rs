//! Conference request id generation.
//!
//! Google deduplicates conference creation by request id, so every insert
//! needs a fresh one.

use std::sync::atomic::{AtomicU64, Ordering};

/// Produces unique conference request ids.
pub trait RequestIdGenerator: Send + Sync {
    /// Returns a new id, never repeated for this generator.
    fn next_id(&self) -> String;
}

/// Random UUIDv4 ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidRequestIds;

impl RequestIdGenerator for UuidRequestIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Monotonic `prefix-N` ids, handy when the id must be predictable.
#[derive(Debug)]
pub struct SequentialRequestIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialRequestIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl RequestIdGenerator for SequentialRequestIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}
