//! Control codes
//!
//! The fixed-buffer and vectorized code spaces are separate; the mount
//! codes sit in a high sub-range of the vectorized space.

/// Fixed-buffer control codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoctlCode {
    /// Length and position of the open file
    FileStats,
}

impl IoctlCode {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            11 => Some(Self::FileStats),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> u32 {
        match self {
            Self::FileStats => 11,
        }
    }
}

/// Vectorized control codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoctlvCode {
    MakeDir,
    MakeFile,
    ReadDir,
    ReadDirLongNames,
    Delete,
    DeleteDir,
    Rename,
    Stat,
    VfsStats,
    GetUsage,
    MountSd,
    UnmountSd,
    MountUsb,
    UnmountUsb,
}

impl IoctlvCode {
    /// Every recognized code
    pub const ALL: [IoctlvCode; 14] = [
        Self::MakeDir,
        Self::MakeFile,
        Self::ReadDir,
        Self::ReadDirLongNames,
        Self::Delete,
        Self::DeleteDir,
        Self::Rename,
        Self::Stat,
        Self::VfsStats,
        Self::GetUsage,
        Self::MountSd,
        Self::UnmountSd,
        Self::MountUsb,
        Self::UnmountUsb,
    ];

    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|code| code.as_raw() == raw)
    }

    pub fn as_raw(&self) -> u32 {
        match self {
            Self::MakeDir => 0x01,
            Self::MakeFile => 0x02,
            Self::ReadDir => 0x03,
            Self::ReadDirLongNames => 0x04,
            Self::Delete => 0x05,
            Self::DeleteDir => 0x06,
            Self::Rename => 0x07,
            Self::Stat => 0x08,
            Self::VfsStats => 0x09,
            Self::GetUsage => 0x0A,
            Self::MountSd => 0xF0,
            Self::UnmountSd => 0xF1,
            Self::MountUsb => 0xF2,
            Self::UnmountUsb => 0xF3,
        }
    }
}
