//! Value types exchanged with a filesystem engine
//!
//! The statistics records have a fixed big-endian wire layout; the driver
//! copies the encoded bytes into the caller's output buffer.

use crate::FsError;
use serde::{Deserialize, Serialize};

/// Access mode of an open file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenMode {
    Read,
    Write,
    ReadWrite,
}

impl OpenMode {
    /// Decodes a caller-supplied mode (1 read, 2 write, 3 both)
    pub fn from_raw(raw: u32) -> Result<Self, FsError> {
        match raw {
            1 => Ok(OpenMode::Read),
            2 => Ok(OpenMode::Write),
            3 => Ok(OpenMode::ReadWrite),
            _ => Err(FsError::InvalidArgument),
        }
    }

    pub fn can_read(&self) -> bool {
        matches!(self, OpenMode::Read | OpenMode::ReadWrite)
    }

    pub fn can_write(&self) -> bool {
        matches!(self, OpenMode::Write | OpenMode::ReadWrite)
    }
}

/// Reference point of a seek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeekOrigin {
    Start,
    Current,
    End,
}

impl SeekOrigin {
    pub fn from_raw(raw: u32) -> Result<Self, FsError> {
        match raw {
            0 => Ok(SeekOrigin::Start),
            1 => Ok(SeekOrigin::Current),
            2 => Ok(SeekOrigin::End),
            _ => Err(FsError::InvalidArgument),
        }
    }
}

/// Length and position of an open file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileStats {
    pub length: u32,
    pub position: u32,
}

impl FileStats {
    pub const WIRE_SIZE: usize = 8;

    pub fn encode(&self) -> [u8; Self::WIRE_SIZE] {
        let mut out = [0u8; Self::WIRE_SIZE];
        out[0..4].copy_from_slice(&self.length.to_be_bytes());
        out[4..8].copy_from_slice(&self.position.to_be_bytes());
        out
    }
}

/// File mode bits reported by `stat`
pub mod mode {
    pub const S_IFDIR: u32 = 0o040000;
    pub const S_IFREG: u32 = 0o100000;
}

/// Metadata of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathStat {
    pub size: u64,
    pub mode: u32,
    pub nlink: u32,
    pub ino: u32,
}

impl PathStat {
    pub const WIRE_SIZE: usize = 20;

    pub fn is_dir(&self) -> bool {
        self.mode & mode::S_IFDIR != 0
    }

    pub fn encode(&self) -> [u8; Self::WIRE_SIZE] {
        let mut out = [0u8; Self::WIRE_SIZE];
        out[0..8].copy_from_slice(&self.size.to_be_bytes());
        out[8..12].copy_from_slice(&self.mode.to_be_bytes());
        out[12..16].copy_from_slice(&self.nlink.to_be_bytes());
        out[16..20].copy_from_slice(&self.ino.to_be_bytes());
        out
    }
}

/// Volume statistics in `statvfs` order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VfsStats {
    pub block_size: u32,
    pub fragment_size: u32,
    pub blocks: u32,
    pub blocks_free: u32,
    pub blocks_available: u32,
    pub files: u32,
    pub files_free: u32,
    pub files_available: u32,
    pub fsid: u32,
    pub flags: u32,
    pub name_max: u32,
}

impl VfsStats {
    pub const WIRE_SIZE: usize = 44;

    pub fn encode(&self) -> [u8; Self::WIRE_SIZE] {
        let fields = [
            self.block_size,
            self.fragment_size,
            self.blocks,
            self.blocks_free,
            self.blocks_available,
            self.files,
            self.files_free,
            self.files_available,
            self.fsid,
            self.flags,
            self.name_max,
        ];
        let mut out = [0u8; Self::WIRE_SIZE];
        for (slot, value) in out.chunks_exact_mut(4).zip(fields) {
            slot.copy_from_slice(&value.to_be_bytes());
        }
        out
    }
}

/// Space consumed beneath a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Total file bytes
    pub bytes: u64,
    /// Files and directories below the path
    pub inodes: u32,
}

/// Name format produced by a directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameFormat {
    /// 8.3 aliases in fixed 13-byte slots
    Short,
    /// Full names, NUL-terminated and packed
    Long,
}

/// Width of one slot in a short-name listing (8 + '.' + 3 + NUL)
pub const SHORT_NAME_SLOT: usize = 13;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_mode_from_raw() {
        assert_eq!(OpenMode::from_raw(1), Ok(OpenMode::Read));
        assert_eq!(OpenMode::from_raw(3), Ok(OpenMode::ReadWrite));
        assert_eq!(OpenMode::from_raw(0), Err(FsError::InvalidArgument));
        assert!(!OpenMode::Write.can_read());
        assert!(OpenMode::ReadWrite.can_write());
    }

    #[test]
    fn test_seek_origin_from_raw() {
        assert_eq!(SeekOrigin::from_raw(2), Ok(SeekOrigin::End));
        assert_eq!(SeekOrigin::from_raw(3), Err(FsError::InvalidArgument));
    }

    #[test]
    fn test_file_stats_layout() {
        let stats = FileStats {
            length: 0x0102_0304,
            position: 5,
        };
        assert_eq!(stats.encode(), [1, 2, 3, 4, 0, 0, 0, 5]);
    }

    #[test]
    fn test_path_stat_layout() {
        let stat = PathStat {
            size: 0x1_0000_0002,
            mode: mode::S_IFREG,
            nlink: 1,
            ino: 9,
        };
        let bytes = stat.encode();
        assert_eq!(&bytes[0..8], &[0, 0, 0, 1, 0, 0, 0, 2]);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 1]);
        assert_eq!(&bytes[16..20], &[0, 0, 0, 9]);
        assert!(!stat.is_dir());
    }

    #[test]
    fn test_vfs_stats_field_order() {
        let stats = VfsStats {
            block_size: 4096,
            name_max: 255,
            ..Default::default()
        };
        let bytes = stats.encode();
        assert_eq!(&bytes[0..4], &4096u32.to_be_bytes());
        assert_eq!(&bytes[40..44], &255u32.to_be_bytes());
    }
}
