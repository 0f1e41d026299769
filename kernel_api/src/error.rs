//! Kernel error types

use core_types::result_code::{self, ResultCode};
use thiserror::Error;

/// Errors that can occur when interacting with the kernel
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Heap allocation failed
    #[error("Out of memory allocating {0} bytes")]
    OutOfMemory(usize),

    /// Message queue creation failed
    #[error("Failed to create message queue: {0}")]
    QueueCreateFailed(String),

    /// Queue handle does not name a live queue
    #[error("Unknown message queue: {0}")]
    QueueNotFound(u32),

    /// Queue has no free slot
    #[error("Message queue {0} is full")]
    QueueFull(u32),

    /// Receive would block and the transport cannot suspend
    ///
    /// Real kernels never return this; simulated transports use it to
    /// hand control back to the test once their queue drains.
    #[error("Receive would block on queue {0}")]
    WouldBlock(u32),

    /// Device name registration failed
    #[error("Failed to register device {name}: {reason}")]
    RegisterFailed { name: String, reason: String },

    /// Argument rejected by the kernel
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl KernelError {
    /// Result code reported upward for this error
    pub fn code(&self) -> ResultCode {
        match self {
            KernelError::OutOfMemory(_) => result_code::IPC_ENOMEM,
            KernelError::QueueNotFound(_) => result_code::IPC_ENOENT,
            KernelError::QueueFull(_) => result_code::IPC_EQUEUEFULL,
            KernelError::RegisterFailed { .. } => result_code::IPC_EEXIST,
            KernelError::QueueCreateFailed(_)
            | KernelError::WouldBlock(_)
            | KernelError::InvalidArgument(_) => result_code::IPC_EINVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_memory_maps_to_enomem() {
        assert_eq!(
            KernelError::OutOfMemory(0x80).code(),
            result_code::IPC_ENOMEM
        );
    }

    #[test]
    fn test_codes_are_negative() {
        let errors = [
            KernelError::OutOfMemory(1),
            KernelError::QueueCreateFailed("x".to_string()),
            KernelError::QueueNotFound(1),
            KernelError::QueueFull(1),
            KernelError::WouldBlock(1),
            KernelError::RegisterFailed {
                name: "fat".to_string(),
                reason: "taken".to_string(),
            },
            KernelError::InvalidArgument("x".to_string()),
        ];
        for error in errors {
            assert!(error.code() < 0, "{error} should be negative");
        }
    }

    #[test]
    fn test_display() {
        let error = KernelError::QueueFull(3);
        assert_eq!(error.to_string(), "Message queue 3 is full");
    }
}
