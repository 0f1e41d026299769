//! # Hardware Abstraction Layer (HAL)
//!
//! This crate defines the storage backend abstraction.
//!
//! ## Philosophy
//!
//! **Backends must be interchangeable.**
//!
//! The FAT module drives an SD-card interface and a USB mass-storage
//! interface through one trait. Nothing above this crate knows which
//! controller sits underneath.
//!
//! ## Design Principles
//!
//! 1. **Trait-based**: All backend operations go through [`DiscInterface`]
//! 2. **Lifecycle as booleans**: `startup`/`shutdown` report success or
//!    failure, the convention the driver's callers expect
//! 3. **Testable**: [`RamDisc`] and [`FailingDisc`] stand in for hardware

pub mod disc;
pub mod failing_disc;
pub mod ram_disc;

pub use disc::{shared, DiscError, DiscInterface, SharedDisc, SECTOR_SIZE};
pub use failing_disc::{DiscFailure, FailingDisc};
pub use ram_disc::RamDisc;
