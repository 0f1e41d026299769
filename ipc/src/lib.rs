//! # Inter-Process Communication (IPC)
//!
//! This crate defines the request model the FAT module receives from the
//! kernel's message queue.
//!
//! ## Philosophy
//!
//! - **Closed command set**: A request is a tagged enum; an unrecognized
//!   top-level command is its own variant, never a silent fallthrough
//! - **Borrowed, never retained**: Caller buffers travel inside the
//!   [`Message`] and go back to the caller with the acknowledge
//! - **Checked before touched**: Vectorized descriptors are only reachable
//!   through [`IoVector`], which validates the declared input/output
//!   partition before any descriptor is handed out
//!
//! ## Architecture
//!
//! A [`Message`] carries:
//! - A unique [`MessageId`] so the kernel can match the acknowledge
//! - The target handle (`fd`)
//! - A [`Request`] payload specific to the command

pub mod buffer;
pub mod message;
pub mod vector;

pub use buffer::IoBuffer;
pub use message::{Command, Message, MessageId, Request};
pub use vector::{IoVector, IpcError};
