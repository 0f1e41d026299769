//! Request dispatch
//!
//! Decodes one received message into a handler call and collapses the
//! handler's outcome into the acknowledge value. Nothing on this path
//! logs; every failure becomes the result code of its own request.

use crate::cache_guard::CacheSyncGuard;
use crate::config::ModuleConfig;
use crate::error::FatError;
use crate::mount::MountLifecycleManager;
use core_types::result_code::{from_byte_count, ResultCode};
use core_types::Fd;
use fs_engine::{FilesystemEngine, OpenMode, SeekOrigin};
use ipc::{IoBuffer, Message, Request};
use kernel_api::CacheCoherency;

/// Handler state threaded through every request
///
/// Owns the filesystem engine, the mount table and the configuration.
/// Exactly one request is handled at a time.
pub struct Dispatcher<E: FilesystemEngine> {
    pub(crate) engine: E,
    pub(crate) mounts: MountLifecycleManager,
    pub(crate) config: ModuleConfig,
}

impl<E: FilesystemEngine> Dispatcher<E> {
    pub fn new(engine: E, mounts: MountLifecycleManager, config: ModuleConfig) -> Self {
        Self {
            engine,
            mounts,
            config,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn mounts(&self) -> &MountLifecycleManager {
        &self.mounts
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Handles `message` and returns its acknowledge value
    ///
    /// Buffers inside the message are written in place; the caller hands
    /// the message back to the transport afterwards.
    pub fn dispatch<C: CacheCoherency + ?Sized>(
        &mut self,
        cache: &C,
        message: &mut Message,
    ) -> ResultCode {
        self.handle(cache, message)
            .unwrap_or_else(|err| err.code())
    }

    fn handle<C: CacheCoherency + ?Sized>(
        &mut self,
        cache: &C,
        message: &mut Message,
    ) -> Result<ResultCode, FatError> {
        let fd = message.fd;
        match &mut message.request {
            Request::Open { device, mode } => self.open(device, *mode),
            Request::Close => {
                self.engine.close(fd)?;
                Ok(0)
            }
            Request::Read { buffer } => self.read(cache, fd, buffer),
            Request::Write { buffer } => self.write(cache, fd, buffer),
            Request::Seek { offset, origin } => self.seek(fd, *offset, *origin),
            Request::Ioctl {
                command,
                input,
                output,
            } => self.ioctl(cache, fd, *command, input.as_ref(), output.as_mut()),
            Request::Ioctlv {
                command,
                vector,
                num_in,
                num_io,
            } => self.ioctlv(cache, *command, vector, *num_in, *num_io),
            Request::Unknown { command } => {
                Err(FatError::invalid(format!("unknown command {}", command)))
            }
        }
    }

    fn open(&mut self, device: &str, mode: u32) -> Result<ResultCode, FatError> {
        if device == self.config.control_device {
            return Ok(0);
        }
        let mode = OpenMode::from_raw(mode)
            .map_err(|_| FatError::invalid(format!("open mode {}", mode)))?;
        let fd = self.engine.open(device, mode)?;
        Ok(fd.as_raw())
    }

    fn read<C: CacheCoherency + ?Sized>(
        &mut self,
        cache: &C,
        fd: Fd,
        buffer: &mut IoBuffer,
    ) -> Result<ResultCode, FatError> {
        let guard = CacheSyncGuard::enter(cache, None::<&IoBuffer>);
        let count = self.engine.read(fd, buffer.as_mut_slice());
        guard.complete(Some(&*buffer));
        Ok(from_byte_count(count?))
    }

    fn write<C: CacheCoherency + ?Sized>(
        &mut self,
        cache: &C,
        fd: Fd,
        buffer: &IoBuffer,
    ) -> Result<ResultCode, FatError> {
        let guard = CacheSyncGuard::enter(cache, Some(buffer));
        let count = self.engine.write(fd, buffer.as_slice());
        guard.complete(None::<&IoBuffer>);
        Ok(from_byte_count(count?))
    }

    fn seek(&mut self, fd: Fd, offset: i32, origin: u32) -> Result<ResultCode, FatError> {
        let origin = SeekOrigin::from_raw(origin)
            .map_err(|_| FatError::invalid(format!("seek origin {}", origin)))?;
        let position = self.engine.seek(fd, i64::from(offset), origin)?;
        Ok(ResultCode::try_from(position).unwrap_or(ResultCode::MAX))
    }
}
