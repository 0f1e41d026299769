//! RAM-backed storage backend

use crate::disc::{sector_span, DiscError, DiscInterface, SECTOR_SIZE};

/// RAM disc - an in-memory storage backend
///
/// Stands in for the SD and USB controllers in simulation and tests.
/// Data is lost when the disc is dropped.
pub struct RamDisc {
    io_type: [u8; 4],
    sectors: Vec<[u8; SECTOR_SIZE]>,
    inserted: bool,
    running: bool,
    startups: usize,
    shutdowns: usize,
}

impl RamDisc {
    /// Create a new RAM disc with the specified number of sectors
    pub fn new(io_type: [u8; 4], sector_count: usize) -> Self {
        Self {
            io_type,
            sectors: vec![[0u8; SECTOR_SIZE]; sector_count],
            inserted: true,
            running: false,
            startups: 0,
            shutdowns: 0,
        }
    }

    /// Create a RAM disc with a specific capacity in megabytes
    pub fn with_capacity_mb(io_type: [u8; 4], mb: usize) -> Self {
        Self::new(io_type, (mb * 1024 * 1024) / SECTOR_SIZE)
    }

    /// Simulates inserting or ejecting the medium
    pub fn set_inserted(&mut self, inserted: bool) {
        self.inserted = inserted;
        if !inserted {
            self.running = false;
        }
    }

    /// Returns whether the backend is started
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn startup_calls(&self) -> usize {
        self.startups
    }

    pub fn shutdown_calls(&self) -> usize {
        self.shutdowns
    }

    fn ready(&self) -> Result<(), DiscError> {
        if self.running && self.inserted {
            Ok(())
        } else {
            Err(DiscError::NotReady)
        }
    }
}

impl DiscInterface for RamDisc {
    fn io_type(&self) -> [u8; 4] {
        self.io_type
    }

    fn startup(&mut self) -> bool {
        self.startups += 1;
        self.running = self.inserted;
        self.running
    }

    fn shutdown(&mut self) -> bool {
        self.shutdowns += 1;
        self.running = false;
        true
    }

    fn is_inserted(&self) -> bool {
        self.inserted
    }

    fn sector_count(&self) -> u64 {
        self.sectors.len() as u64
    }

    fn read_sectors(&mut self, sector: u64, buffer: &mut [u8]) -> Result<(), DiscError> {
        self.ready()?;
        sector_span(sector, buffer.len(), self.sector_count())?;

        for (i, chunk) in buffer.chunks_exact_mut(SECTOR_SIZE).enumerate() {
            chunk.copy_from_slice(&self.sectors[sector as usize + i]);
        }
        Ok(())
    }

    fn write_sectors(&mut self, sector: u64, buffer: &[u8]) -> Result<(), DiscError> {
        self.ready()?;
        sector_span(sector, buffer.len(), self.sector_count())?;

        for (i, chunk) in buffer.chunks_exact(SECTOR_SIZE).enumerate() {
            self.sectors[sector as usize + i].copy_from_slice(chunk);
        }
        Ok(())
    }
}
