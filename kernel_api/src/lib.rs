//! # Kernel API
//!
//! This crate defines the interface between the FAT module and the kernel
//! it runs on.
//!
//! ## Philosophy
//!
//! The kernel provides **mechanisms**, the module supplies behavior:
//! - Message queues with blocking receive and explicit acknowledge
//! - Device-name registration routing opens to a queue
//! - Cache maintenance for memory shared with DMA-capable hardware
//! - A small start-up heap
//!
//! ## Design Goals
//!
//! 1. **Testability**: Every trait can be implemented by a simulated kernel
//! 2. **Explicitness**: No global queue handle; the server owns what it uses
//! 3. **Narrow seams**: The server loop only needs [`MessageTransport`] and
//!    [`CacheCoherency`]; start-up additionally needs [`KernelApi`]

pub mod cache;
pub mod error;
pub mod kernel;
pub mod transport;

pub use cache::CacheCoherency;
pub use error::KernelError;
pub use kernel::{KernelApi, QUEUE_SLOT_SIZE};
pub use transport::MessageTransport;
