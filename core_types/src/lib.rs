//! # Core Types
//!
//! This crate defines the fundamental types shared by the FAT module crates.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Handles are typed and cannot be confused
//!   with byte counts or result codes.
//! - **One result-code table**: Every crate maps its errors onto the same
//!   signed codes that travel back in an acknowledge.
//!
//! ## Key Types
//!
//! - [`Fd`]: An opaque per-open-file handle minted by the filesystem engine
//! - [`QueueHandle`]: Identifies a kernel message queue
//! - [`result_code`]: The signed result-code table

pub mod ids;
pub mod result_code;

pub use ids::{Fd, QueueHandle};
pub use result_code::ResultCode;
