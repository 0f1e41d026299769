//! Result codes carried back to the caller in an acknowledge
//!
//! Zero or positive means success (often a byte count or a new file
//! position). Negative means failure. Two families share the negative
//! range: IPC-level codes produced by the driver and kernel, and negated
//! errno values passed through from the filesystem engine.

/// Signed acknowledge value
pub type ResultCode = i32;

/// Success
pub const IPC_OK: ResultCode = 0;
/// Permission denied
pub const IPC_EACCES: ResultCode = -1;
/// Object already exists
pub const IPC_EEXIST: ResultCode = -2;
/// Invalid argument, unknown command, or malformed descriptor
pub const IPC_EINVAL: ResultCode = -4;
/// Object not found
pub const IPC_ENOENT: ResultCode = -6;
/// Message queue full
pub const IPC_EQUEUEFULL: ResultCode = -8;
/// Out of memory
pub const IPC_ENOMEM: ResultCode = -22;

/// Positive errno values reported by the filesystem engine
pub mod errno {
    pub const ENOENT: i32 = 2;
    pub const EIO: i32 = 5;
    pub const EBADF: i32 = 9;
    pub const EACCES: i32 = 13;
    pub const EEXIST: i32 = 17;
    pub const EXDEV: i32 = 18;
    pub const ENODEV: i32 = 19;
    pub const ENOTDIR: i32 = 20;
    pub const EISDIR: i32 = 21;
    pub const EINVAL: i32 = 22;
    pub const EMFILE: i32 = 24;
    pub const ENOSPC: i32 = 28;
    pub const ENOTEMPTY: i32 = 90;
    pub const ENAMETOOLONG: i32 = 91;
}

/// Returns true for success values (zero or positive)
pub fn is_success(code: ResultCode) -> bool {
    code >= 0
}

/// Converts a transferred byte count into a result code
///
/// Counts beyond `i32::MAX` saturate; caller buffers are never that large.
pub fn from_byte_count(count: usize) -> ResultCode {
    ResultCode::try_from(count).unwrap_or(ResultCode::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_classification() {
        assert!(is_success(IPC_OK));
        assert!(is_success(512));
        assert!(!is_success(IPC_EINVAL));
        assert!(!is_success(-errno::ENOTDIR));
    }

    #[test]
    fn test_ipc_codes_distinct() {
        let codes = [
            IPC_EACCES,
            IPC_EEXIST,
            IPC_EINVAL,
            IPC_ENOENT,
            IPC_EQUEUEFULL,
            IPC_ENOMEM,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_byte_count_saturates() {
        assert_eq!(from_byte_count(16), 16);
        assert_eq!(from_byte_count(usize::MAX), i32::MAX);
    }
}
