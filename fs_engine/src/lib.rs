//! # Filesystem Engine
//!
//! The operation surface the FAT driver forwards requests to, plus an
//! in-memory reference engine.
//!
//! ## Philosophy
//!
//! - **The driver never interprets paths**: path resolution, directory
//!   layout and space accounting all live behind [`FilesystemEngine`]
//! - **Errors are errno values**: every failure is an [`FsError`] the
//!   driver hands back verbatim
//! - **Mounts bind a name to a backend**: `sd:/...` resolves on whatever
//!   disc was mounted as `sd`

pub mod error;
pub mod image;
pub mod memory;
pub mod path;
pub mod tree;
pub mod types;

pub use error::FsError;
pub use memory::MemoryFilesystem;
pub use types::{
    FileStats, NameFormat, OpenMode, PathStat, SeekOrigin, Usage, VfsStats, SHORT_NAME_SLOT,
};

use core_types::Fd;
use hal::SharedDisc;

/// Operations a filesystem engine exposes to the driver
///
/// Handles returned by [`open`](FilesystemEngine::open) are minted by the
/// engine and only passed through by the driver. They are always positive.
pub trait FilesystemEngine {
    /// Binds `disc` under `name`; the backend must already be started
    fn mount(&mut self, name: &str, disc: SharedDisc) -> Result<(), FsError>;

    /// Tears down the binding for `name`, closing its open files
    fn unmount(&mut self, name: &str) -> Result<(), FsError>;

    fn is_mounted(&self, name: &str) -> bool;

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Fd, FsError>;

    fn close(&mut self, fd: Fd) -> Result<(), FsError>;

    /// Reads at the current position; returns the byte count
    fn read(&mut self, fd: Fd, buffer: &mut [u8]) -> Result<usize, FsError>;

    /// Writes at the current position, growing the file as needed
    fn write(&mut self, fd: Fd, data: &[u8]) -> Result<usize, FsError>;

    /// Moves the position; returns the new absolute position
    fn seek(&mut self, fd: Fd, offset: i64, origin: SeekOrigin) -> Result<u64, FsError>;

    fn file_stats(&self, fd: Fd) -> Result<FileStats, FsError>;

    fn create_dir(&mut self, path: &str) -> Result<(), FsError>;

    fn create_file(&mut self, path: &str) -> Result<(), FsError>;

    /// Lists a directory
    ///
    /// Without an output buffer, returns the number of entries. With one,
    /// writes at most `limit` names in `format` and returns how many were
    /// written; a name that does not fit ends the listing.
    fn read_dir(
        &self,
        path: &str,
        format: NameFormat,
        output: Option<&mut [u8]>,
        limit: u32,
    ) -> Result<u32, FsError>;

    /// Removes a file or an empty directory
    fn delete(&mut self, path: &str) -> Result<(), FsError>;

    /// Removes a directory and everything below it
    fn delete_dir(&mut self, path: &str) -> Result<(), FsError>;

    fn rename(&mut self, from: &str, to: &str) -> Result<(), FsError>;

    fn stat(&self, path: &str) -> Result<PathStat, FsError>;

    fn vfs_stats(&self, path: &str) -> Result<VfsStats, FsError>;

    /// Space used below a directory
    ///
    /// # Errors
    /// Returns `FsError::NotADirectory` when `path` names a file
    fn usage(&self, path: &str) -> Result<Usage, FsError>;
}
