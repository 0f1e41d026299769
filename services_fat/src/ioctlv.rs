//! Vectorized control requests
//!
//! Descriptor layouts, inputs first:
//!
//! | Code | Inputs | Outputs |
//! |---|---|---|
//! | make-dir, make-file, delete, delete-dir | path | |
//! | read-dir (both name formats) | path, entry limit | entries, count |
//! | read-dir, count only | path | count |
//! | rename | old path, new path | |
//! | stat, vfs-stats | path | record |
//! | get-usage | path | blocks, inodes |
//! | mount/unmount SD and USB | | |

use crate::cache_guard::CacheSyncGuard;
use crate::codes::IoctlvCode;
use crate::dispatcher::Dispatcher;
use crate::error::FatError;
use crate::ioctl::put_record;
use crate::mount::Backend;
use core_types::result_code::ResultCode;
use fs_engine::{FilesystemEngine, FsError, NameFormat, PathStat, VfsStats};
use ipc::{IoBuffer, IoVector};
use kernel_api::CacheCoherency;

/// Record sizes written by stat and vfs-stats
pub const STAT_RECORD_SIZE: usize = PathStat::WIRE_SIZE;
pub const VFS_STATS_RECORD_SIZE: usize = VfsStats::WIRE_SIZE;

fn path_arg(vector: &IoVector<'_>, index: usize) -> Result<String, FatError> {
    Ok(vector.input(index)?.path()?.to_string())
}

impl<E: FilesystemEngine> Dispatcher<E> {
    /// Handles a vectorized control request
    ///
    /// A descriptor vector whose declared counts exceed the descriptors
    /// present is rejected before any buffer is touched. Otherwise every
    /// input is invalidated before the handler and every output flushed
    /// after it.
    pub(crate) fn ioctlv<C: CacheCoherency + ?Sized>(
        &mut self,
        cache: &C,
        command: u32,
        descriptors: &mut [IoBuffer],
        num_in: u32,
        num_io: u32,
    ) -> Result<ResultCode, FatError> {
        let mut vector = IoVector::new(descriptors, num_in, num_io)?;

        let guard = CacheSyncGuard::enter(cache, vector.inputs());
        let result = self.handle_ioctlv(command, &mut vector);
        guard.complete(vector.outputs());
        result
    }

    fn handle_ioctlv(
        &mut self,
        command: u32,
        vector: &mut IoVector<'_>,
    ) -> Result<ResultCode, FatError> {
        let code = IoctlvCode::from_raw(command)
            .ok_or_else(|| FatError::invalid(format!("ioctlv {:#x}", command)))?;

        match code {
            IoctlvCode::MakeDir => {
                self.engine.create_dir(&path_arg(vector, 0)?)?;
                Ok(0)
            }
            IoctlvCode::MakeFile => {
                self.engine.create_file(&path_arg(vector, 0)?)?;
                Ok(0)
            }
            IoctlvCode::ReadDir => self.read_dir(vector, NameFormat::Short),
            IoctlvCode::ReadDirLongNames => self.read_dir(vector, NameFormat::Long),
            IoctlvCode::Delete => {
                self.engine.delete(&path_arg(vector, 0)?)?;
                Ok(0)
            }
            IoctlvCode::DeleteDir => {
                self.engine.delete_dir(&path_arg(vector, 0)?)?;
                Ok(0)
            }
            IoctlvCode::Rename => {
                let from = path_arg(vector, 0)?;
                let to = path_arg(vector, 1)?;
                self.engine.rename(&from, &to)?;
                Ok(0)
            }
            IoctlvCode::Stat => {
                vector.require(1, 1)?;
                let stat = self.engine.stat(&path_arg(vector, 0)?)?;
                put_record(vector.output_mut(0)?, &stat.encode())?;
                Ok(0)
            }
            IoctlvCode::VfsStats => {
                vector.require(1, 1)?;
                let stats = self.engine.vfs_stats(&path_arg(vector, 0)?)?;
                put_record(vector.output_mut(0)?, &stats.encode())?;
                Ok(0)
            }
            IoctlvCode::GetUsage => self.get_usage(vector),
            IoctlvCode::MountSd => Ok(self.mounts.mount(Backend::Sd, &mut self.engine).code()),
            IoctlvCode::UnmountSd => Ok(self.mounts.unmount(Backend::Sd, &mut self.engine).code()),
            IoctlvCode::MountUsb => Ok(self.mounts.mount(Backend::Usb, &mut self.engine).code()),
            IoctlvCode::UnmountUsb => {
                Ok(self.mounts.unmount(Backend::Usb, &mut self.engine).code())
            }
        }
    }

    /// Lists a directory in one of two calling shapes
    ///
    /// With more than one output descriptor, input 1 carries the entry
    /// limit, output 0 receives the names (zero-filled first) and output 1
    /// the number written. Otherwise output 0 receives the entry count and
    /// no names are produced.
    fn read_dir(
        &mut self,
        vector: &mut IoVector<'_>,
        format: NameFormat,
    ) -> Result<ResultCode, FatError> {
        vector.require(1, 1)?;
        let path = path_arg(vector, 0)?;

        if vector.output_count() > 1 {
            let limit = vector.input(1)?.word()?;
            let entries = vector.output_mut(0)?;
            entries.clear();
            let count = self
                .engine
                .read_dir(&path, format, Some(entries.as_mut_slice()), limit)?;
            vector.output_mut(1)?.set_word(count)?;
        } else {
            let count = self.engine.read_dir(&path, format, None, 0)?;
            vector.output_mut(0)?.set_word(count)?;
        }
        Ok(0)
    }

    /// Reports the blocks and inodes used below a directory
    ///
    /// Both outputs are zeroed first. A path that is not a directory is
    /// reported as success with zero counts.
    fn get_usage(&mut self, vector: &mut IoVector<'_>) -> Result<ResultCode, FatError> {
        vector.require(1, 2)?;
        let path = path_arg(vector, 0)?;
        for output in vector.outputs_mut().iter_mut().take(2) {
            output.clear();
        }

        let usage = match self.engine.usage(&path) {
            Ok(usage) => usage,
            Err(FsError::NotADirectory) => return Ok(0),
            Err(err) => return Err(err.into()),
        };

        let blocks = usage
            .bytes
            .checked_div(self.config.usage_block_size)
            .unwrap_or(0);
        let blocks = u32::try_from(blocks).unwrap_or(u32::MAX);
        vector.output_mut(0)?.set_word(blocks)?;
        vector.output_mut(1)?.set_word(usage.inodes)?;
        Ok(0)
    }
}
