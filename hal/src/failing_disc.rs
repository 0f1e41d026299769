//! # Failing Disc
//!
//! A DiscInterface wrapper that can simulate backend failures for testing
//! the mount lifecycle without flaky hardware.

use crate::{DiscError, DiscInterface};

/// Which backend calls should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscFailure {
    /// Never fail (passthrough)
    Never,
    /// `startup` reports failure
    Startup,
    /// `shutdown` reports failure
    Shutdown,
    /// Every sector transfer fails
    Io,
}

/// Wrapper around a DiscInterface that can simulate failures
pub struct FailingDisc<D: DiscInterface> {
    inner: D,
    failure: DiscFailure,
}

impl<D: DiscInterface> FailingDisc<D> {
    /// Create a new failing disc with the given failure mode
    pub fn new(inner: D, failure: DiscFailure) -> Self {
        Self { inner, failure }
    }

    /// Get the underlying disc (for inspection)
    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Get mutable access to the underlying disc
    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.inner
    }

    /// Replace the failure mode
    pub fn set_failure(&mut self, failure: DiscFailure) {
        self.failure = failure;
    }
}

impl<D: DiscInterface> DiscInterface for FailingDisc<D> {
    fn io_type(&self) -> [u8; 4] {
        self.inner.io_type()
    }

    fn startup(&mut self) -> bool {
        if self.failure == DiscFailure::Startup {
            return false;
        }
        self.inner.startup()
    }

    fn shutdown(&mut self) -> bool {
        // The controller is still released; only the report fails.
        let released = self.inner.shutdown();
        released && self.failure != DiscFailure::Shutdown
    }

    fn is_inserted(&self) -> bool {
        self.inner.is_inserted()
    }

    fn sector_count(&self) -> u64 {
        self.inner.sector_count()
    }

    fn read_sectors(&mut self, sector: u64, buffer: &mut [u8]) -> Result<(), DiscError> {
        if self.failure == DiscFailure::Io {
            return Err(DiscError::IoError);
        }
        self.inner.read_sectors(sector, buffer)
    }

    fn write_sectors(&mut self, sector: u64, buffer: &[u8]) -> Result<(), DiscError> {
        if self.failure == DiscFailure::Io {
            return Err(DiscError::IoError);
        }
        self.inner.write_sectors(sector, buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RamDisc, SECTOR_SIZE};

    fn disc(failure: DiscFailure) -> FailingDisc<RamDisc> {
        FailingDisc::new(RamDisc::new(*b"USBS", 8), failure)
    }

    #[test]
    fn test_failing_disc_never() {
        let mut failing = disc(DiscFailure::Never);
        assert!(failing.startup());
        assert!(failing.write_sectors(0, &[1u8; SECTOR_SIZE]).is_ok());
        assert!(failing.shutdown());
    }

    #[test]
    fn test_startup_failure_leaves_inner_stopped() {
        let mut failing = disc(DiscFailure::Startup);
        assert!(!failing.startup());
        assert!(!failing.inner().is_running());
        assert_eq!(failing.inner().startup_calls(), 0);
    }

    #[test]
    fn test_shutdown_failure_still_releases() {
        let mut failing = disc(DiscFailure::Shutdown);
        assert!(failing.startup());
        assert!(!failing.shutdown());
        assert!(!failing.inner().is_running());
    }

    #[test]
    fn test_io_failure() {
        let mut failing = disc(DiscFailure::Io);
        assert!(failing.startup());
        let mut buffer = [0u8; SECTOR_SIZE];
        assert_eq!(failing.read_sectors(0, &mut buffer), Err(DiscError::IoError));

        failing.set_failure(DiscFailure::Never);
        assert!(failing.read_sectors(0, &mut buffer).is_ok());
    }
}
