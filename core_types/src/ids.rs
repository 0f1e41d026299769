//! Handles for kernel and filesystem entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque file handle
///
/// Minted by the filesystem engine on open and merely passed through by
/// the driver. The control device itself is always addressed as
/// [`Fd::CONTROL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fd(i32);

impl Fd {
    /// Handle returned by opening the control device
    pub const CONTROL: Fd = Fd(0);

    /// Wraps a raw handle value
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value
    pub const fn as_raw(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fd({})", self.0)
    }
}

/// Kernel message queue handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueHandle(u32);

impl QueueHandle {
    /// Wraps a raw queue id
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw queue id
    pub const fn as_raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for QueueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Queue({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fd_round_trips_raw_value() {
        let fd = Fd::from_raw(7);
        assert_eq!(fd.as_raw(), 7);
        assert_ne!(fd, Fd::CONTROL);
    }

    #[test]
    fn test_fd_display() {
        assert_eq!(format!("{}", Fd::from_raw(3)), "Fd(3)");
    }

    #[test]
    fn test_queue_handle_display() {
        let queue = QueueHandle::from_raw(2);
        assert_eq!(queue.as_raw(), 2);
        assert!(format!("{}", queue).starts_with("Queue("));
    }

    #[test]
    fn test_fd_serializes_as_number() {
        let json = serde_json::to_string(&Fd::from_raw(5)).unwrap();
        assert_eq!(json, "5");
    }
}
