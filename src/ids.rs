use crate::statics;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out identifiers for controls created without an explicit id.
///
/// Owned by whoever creates controls (typically one per process or per form) and passed
/// in at construction, so numbering is explicit and testable.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", statics::ID_PREFIX, n)
    }
}
