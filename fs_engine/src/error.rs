//! Filesystem engine errors

use core_types::result_code::{errno, ResultCode};
use thiserror::Error;

/// Errors reported by a filesystem engine
///
/// Each variant corresponds to one errno value; the driver passes the
/// negated value to the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("no such file or directory")]
    NotFound,
    #[error("I/O error")]
    Io,
    #[error("bad file handle")]
    BadHandle,
    #[error("permission denied")]
    AccessDenied,
    #[error("file exists")]
    AlreadyExists,
    #[error("cross-device link")]
    CrossDevice,
    #[error("no such device")]
    NoDevice,
    #[error("not a directory")]
    NotADirectory,
    #[error("is a directory")]
    IsADirectory,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("too many open files")]
    TooManyOpenFiles,
    #[error("no space left on device")]
    NoSpace,
    #[error("directory not empty")]
    NotEmpty,
    #[error("file name too long")]
    NameTooLong,
}

impl FsError {
    /// Positive errno value
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound => errno::ENOENT,
            FsError::Io => errno::EIO,
            FsError::BadHandle => errno::EBADF,
            FsError::AccessDenied => errno::EACCES,
            FsError::AlreadyExists => errno::EEXIST,
            FsError::CrossDevice => errno::EXDEV,
            FsError::NoDevice => errno::ENODEV,
            FsError::NotADirectory => errno::ENOTDIR,
            FsError::IsADirectory => errno::EISDIR,
            FsError::InvalidArgument => errno::EINVAL,
            FsError::TooManyOpenFiles => errno::EMFILE,
            FsError::NoSpace => errno::ENOSPC,
            FsError::NotEmpty => errno::ENOTEMPTY,
            FsError::NameTooLong => errno::ENAMETOOLONG,
        }
    }

    /// Result code carried back to the caller
    pub fn code(&self) -> ResultCode {
        -self.errno()
    }
}
