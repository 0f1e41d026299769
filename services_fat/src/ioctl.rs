//! Fixed-buffer control requests

use crate::cache_guard::CacheSyncGuard;
use crate::codes::IoctlCode;
use crate::dispatcher::Dispatcher;
use crate::error::FatError;
use core_types::result_code::ResultCode;
use core_types::Fd;
use fs_engine::{FileStats, FilesystemEngine};
use ipc::{IoBuffer, IpcError};
use kernel_api::CacheCoherency;

/// Copies an encoded record to the front of `output`
///
/// Fails without writing if the record does not fit.
pub(crate) fn put_record(output: &mut IoBuffer, record: &[u8]) -> Result<(), IpcError> {
    if output.len() < record.len() {
        return Err(IpcError::BufferTooSmall {
            needed: record.len(),
            len: output.len(),
        });
    }
    output.as_mut_slice()[..record.len()].copy_from_slice(record);
    Ok(())
}

impl<E: FilesystemEngine> Dispatcher<E> {
    /// Handles a fixed-buffer control request on `fd`
    ///
    /// The input buffer is invalidated and the output buffer flushed
    /// whether or not the code is recognized.
    pub(crate) fn ioctl<C: CacheCoherency + ?Sized>(
        &mut self,
        cache: &C,
        fd: Fd,
        command: u32,
        input: Option<&IoBuffer>,
        mut output: Option<&mut IoBuffer>,
    ) -> Result<ResultCode, FatError> {
        let guard = CacheSyncGuard::enter(cache, input);
        let result = self.handle_ioctl(fd, command, output.as_deref_mut());
        guard.complete(output.as_deref());
        result
    }

    fn handle_ioctl(
        &mut self,
        fd: Fd,
        command: u32,
        output: Option<&mut IoBuffer>,
    ) -> Result<ResultCode, FatError> {
        match IoctlCode::from_raw(command) {
            Some(IoctlCode::FileStats) => {
                let output = output.ok_or(IpcError::MissingOutput { index: 0 })?;
                if output.len() < FileStats::WIRE_SIZE {
                    return Err(IpcError::BufferTooSmall {
                        needed: FileStats::WIRE_SIZE,
                        len: output.len(),
                    }
                    .into());
                }
                let stats = self.engine.file_stats(fd)?;
                put_record(output, &stats.encode())?;
                Ok(0)
            }
            None => Err(FatError::invalid(format!("ioctl {:#x}", command))),
        }
    }
}
