//! # FAT Host Daemon
//!
//! Hosts the FAT module on the simulated kernel.
//!
//! ## Philosophy
//!
//! - **The module runs unmodified**: the same `FatServer` a real kernel
//!   would host, against simulated queues and RAM-backed discs
//! - **Requests are explicit steps**: not an interactive shell
//! - **Deterministic mode is first-class**: one request at a time, in
//!   script order
//!
//! ## Responsibilities
//!
//! The host daemon:
//! - Boots the module with an SD backend and, optionally, a USB backend
//! - Replays a request script through the device registry
//! - Reports each acknowledge value with any decoded output
//!
//! ## Non-Responsibilities
//!
//! The host does NOT:
//! - Talk to real storage hardware
//! - Keep disc contents beyond the life of the process
//! - Retry or reorder failed requests

pub mod request_script;
pub mod runtime;

pub use request_script::{HandleRef, RequestScript, RequestScriptError, Route, Step};
pub use runtime::{FatdConfig, FatdError, FatdRuntime, StepReport};
