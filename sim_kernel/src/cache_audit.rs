//! Cache Maintenance Audit Trail
//!
//! Records every invalidate and flush the simulated kernel performs, in
//! order, so tests can check that buffer accesses are bracketed correctly.
//!
//! ## Philosophy
//!
//! - Test-only: This is NOT production logging, it's for test verification
//! - Deterministic: Events are recorded in order for reproducible tests
//! - Shareable: The log sits behind an `Rc` so a test double elsewhere
//!   (an engine wrapper, say) can drop markers into the same timeline
//!
//! ## Example
//!
//! ```
//! use sim_kernel::cache_audit::{CacheAuditLog, CacheEvent};
//!
//! let log = CacheAuditLog::new();
//! let buffer = [0u8; 16];
//! log.record_invalidate(&buffer);
//! log.record_marker("engine.stat");
//! log.record_flush(&buffer);
//!
//! assert_eq!(log.len(), 3);
//! assert!(matches!(log.events()[0], CacheEvent::Invalidate { len: 16, .. }));
//! ```

use std::cell::RefCell;

/// A single cache maintenance event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// CPU view invalidated before a read
    Invalidate { addr: usize, len: usize },
    /// CPU view written back after a write
    Flush { addr: usize, len: usize },
    /// Test-supplied checkpoint
    Marker(String),
}

impl CacheEvent {
    /// Returns true if this event covers the memory of `range`
    pub fn covers(&self, range: &[u8]) -> bool {
        match self {
            CacheEvent::Invalidate { addr, len } | CacheEvent::Flush { addr, len } => {
                *addr == range.as_ptr() as usize && *len == range.len()
            }
            CacheEvent::Marker(_) => false,
        }
    }
}

/// Audit log for cache maintenance
#[derive(Debug, Default)]
pub struct CacheAuditLog {
    /// Chronological list of events
    events: RefCell<Vec<CacheEvent>>,
}

impl CacheAuditLog {
    /// Creates a new empty audit log
    pub fn new() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
        }
    }

    pub fn record_invalidate(&self, range: &[u8]) {
        self.events.borrow_mut().push(CacheEvent::Invalidate {
            addr: range.as_ptr() as usize,
            len: range.len(),
        });
    }

    pub fn record_flush(&self, range: &[u8]) {
        self.events.borrow_mut().push(CacheEvent::Flush {
            addr: range.as_ptr() as usize,
            len: range.len(),
        });
    }

    pub fn record_marker(&self, label: impl Into<String>) {
        self.events
            .borrow_mut()
            .push(CacheEvent::Marker(label.into()));
    }

    /// Returns a snapshot of all recorded events
    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.borrow().clone()
    }

    /// Position of the first marker with `label`
    pub fn marker_position(&self, label: &str) -> Option<usize> {
        self.events
            .borrow()
            .iter()
            .position(|e| matches!(e, CacheEvent::Marker(l) if l == label))
    }

    /// Counts invalidate events
    pub fn invalidate_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, CacheEvent::Invalidate { .. }))
            .count()
    }

    /// Counts flush events
    pub fn flush_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, CacheEvent::Flush { .. }))
            .count()
    }

    /// Clears all events (useful for test reset)
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Returns the number of recorded events
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Checks if the audit log is empty
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}
