//! Disc interface for removable block storage
//!
//! The surface a storage backend exposes to the FAT module and to the
//! filesystem engine mounted on top of it.

use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Sector size of every supported backend
pub const SECTOR_SIZE: usize = 512;

/// Disc errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiscError {
    /// Sector index out of bounds
    #[error("sector out of bounds")]
    OutOfBounds,
    /// I/O error (hardware failure, timeout, etc.)
    #[error("I/O error")]
    IoError,
    /// Backend not started or medium absent
    #[error("disc not ready")]
    NotReady,
    /// Buffer does not match the sector count
    #[error("invalid buffer size")]
    InvalidSize,
}

/// Storage backend trait
///
/// Implementers provide lifecycle control and sector-level transfers.
pub trait DiscInterface {
    /// Four-character backend identifier, e.g. `WISD`
    fn io_type(&self) -> [u8; 4];

    /// Powers up the controller and probes the medium
    ///
    /// Returns `true` on success. Calling it on a started backend is
    /// allowed.
    fn startup(&mut self) -> bool;

    /// Releases the controller
    ///
    /// Returns `true` on success.
    fn shutdown(&mut self) -> bool;

    /// Returns whether a medium is present
    fn is_inserted(&self) -> bool;

    /// Total number of sectors on the medium
    fn sector_count(&self) -> u64;

    /// Reads `buffer.len() / SECTOR_SIZE` sectors starting at `sector`
    ///
    /// # Errors
    /// Returns `DiscError::NotReady` before a successful startup
    /// Returns `DiscError::OutOfBounds` past the end of the medium
    /// Returns `DiscError::InvalidSize` if the buffer is not a whole
    /// number of sectors
    fn read_sectors(&mut self, sector: u64, buffer: &mut [u8]) -> Result<(), DiscError>;

    /// Writes `buffer.len() / SECTOR_SIZE` sectors starting at `sector`
    fn write_sectors(&mut self, sector: u64, buffer: &[u8]) -> Result<(), DiscError>;
}

/// Handle to a backend shared between the mount manager and the engine
///
/// The driver is single-threaded, so shared ownership is `Rc<RefCell<_>>`.
pub type SharedDisc = Rc<RefCell<dyn DiscInterface>>;

/// Wraps a backend into a [`SharedDisc`]
pub fn shared<D: DiscInterface + 'static>(disc: D) -> SharedDisc {
    Rc::new(RefCell::new(disc))
}

/// Validates a transfer and returns its sector count
pub(crate) fn sector_span(
    sector: u64,
    len: usize,
    sector_count: u64,
) -> Result<u64, DiscError> {
    if len == 0 || len % SECTOR_SIZE != 0 {
        return Err(DiscError::InvalidSize);
    }
    let count = (len / SECTOR_SIZE) as u64;
    match sector.checked_add(count) {
        Some(end) if end <= sector_count => Ok(count),
        _ => Err(DiscError::OutOfBounds),
    }
}
