//! Driver errors and their result codes

use crate::config::ConfigError;
use core_types::result_code::{ResultCode, IPC_EINVAL};
use fs_engine::FsError;
use ipc::IpcError;
use kernel_api::KernelError;
use thiserror::Error;

/// Errors a request handler or start-up can produce
#[derive(Debug, Error)]
pub enum FatError {
    /// Unrecognized command, code or argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed buffers or descriptor vector
    #[error("malformed request: {0}")]
    Ipc(#[from] IpcError),

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    /// Passed through to the caller verbatim
    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl FatError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        FatError::InvalidArgument(reason.into())
    }

    /// Result code placed in the acknowledge
    pub fn code(&self) -> ResultCode {
        match self {
            FatError::InvalidArgument(_) | FatError::Ipc(_) | FatError::Config(_) => IPC_EINVAL,
            FatError::Kernel(err) => err.code(),
            FatError::Filesystem(err) => err.code(),
        }
    }
}
