//! # FAT Module
//!
//! A resident driver exposing FAT volumes on SD and USB storage to other
//! processes through the kernel's message queues.
//!
//! ## Philosophy
//!
//! - **One request at a time**: the loop receives, dispatches and
//!   acknowledges a request before looking at the next, so the mount
//!   table needs no locking
//! - **Every request is acknowledged exactly once**: handler failures
//!   become result codes, never early exits
//! - **Caller buffers are untrusted**: descriptor vectors are
//!   bounds-checked once at decode time and rejected with
//!   invalid-argument when short
//! - **Caller memory is DMA-visible**: inputs are invalidated before a
//!   handler reads them and outputs flushed after it writes them
//!
//! ## Non-Responsibilities
//!
//! The module does NOT:
//! - Interpret paths or directory entries (the filesystem engine does)
//! - Drive storage controllers (the backends do)
//! - Retry failed operations

pub mod cache_guard;
pub mod codes;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ioctl;
pub mod ioctlv;
pub mod mount;
pub mod server;

pub use cache_guard::CacheSyncGuard;
pub use codes::{IoctlCode, IoctlvCode};
pub use config::{ConfigError, ModuleConfig};
pub use dispatcher::Dispatcher;
pub use error::FatError;
pub use mount::{Backend, MountLifecycleManager, MountOutcome, MountState};
pub use server::FatServer;
