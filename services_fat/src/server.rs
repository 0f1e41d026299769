//! Module start-up and the request loop

use crate::config::ModuleConfig;
use crate::dispatcher::Dispatcher;
use crate::error::FatError;
use crate::mount::MountLifecycleManager;
use core_types::result_code::ResultCode;
use core_types::QueueHandle;
use fs_engine::FilesystemEngine;
use kernel_api::{KernelApi, KernelError};
use log::{debug, info, warn};
use std::convert::Infallible;

/// The FAT driver process
///
/// Holds the kernel surface, the request queue and all handler state.
/// Built once by [`FatServer::initialize`]; there is no other global
/// state.
pub struct FatServer<K: KernelApi, E: FilesystemEngine> {
    kernel: K,
    queue: QueueHandle,
    dispatcher: Dispatcher<E>,
}

impl<K: KernelApi, E: FilesystemEngine> FatServer<K, E> {
    /// Creates the request queue and registers the device names on it
    ///
    /// # Errors
    /// Fails with the kernel's error if the queue buffer cannot be
    /// allocated or the queue cannot be created. A device name that fails
    /// to register is logged and skipped.
    pub fn initialize(
        mut kernel: K,
        engine: E,
        mounts: MountLifecycleManager,
        config: ModuleConfig,
    ) -> Result<Self, FatError> {
        config.validate()?;
        info!("FAT module {}", env!("CARGO_PKG_VERSION"));

        let size = config.queue_buffer_size;
        let buffer = kernel
            .allocate(size)
            .map_err(|_| KernelError::OutOfMemory(size))?;
        let queue = kernel.create_message_queue(buffer, config.queue_capacity)?;
        debug!("request queue {} with {} slots", queue, config.queue_capacity);

        for device in config.device_names() {
            match kernel.register_device(device, queue) {
                Ok(()) => debug!("registered {} on {}", device, queue),
                Err(err) => warn!("could not register {}: {}", device, err),
            }
        }

        Ok(Self {
            kernel,
            queue,
            dispatcher: Dispatcher::new(engine, mounts, config),
        })
    }

    /// Receives, handles and acknowledges one request
    ///
    /// Returns the acknowledge value. Fails only if the receive itself
    /// fails, in which case nothing was acknowledged.
    pub fn serve_one(&mut self) -> Result<ResultCode, FatError> {
        let mut message = self.kernel.receive(self.queue)?;
        let result = self.dispatcher.dispatch(&self.kernel, &mut message);
        self.kernel.acknowledge(message, result);
        Ok(result)
    }

    /// Serves requests forever
    ///
    /// Returns only when the transport fails to deliver a request.
    pub fn run(&mut self) -> Result<Infallible, FatError> {
        info!("serving requests on {}", self.queue);
        loop {
            self.serve_one()?;
        }
    }

    /// Serves until the transport reports an empty queue
    ///
    /// Returns the number of requests served.
    pub fn serve_pending(&mut self) -> Result<usize, FatError> {
        let mut served = 0;
        loop {
            match self.serve_one() {
                Ok(_) => served += 1,
                Err(FatError::Kernel(KernelError::WouldBlock(_))) => return Ok(served),
                Err(err) => return Err(err),
            }
        }
    }

    pub fn queue(&self) -> QueueHandle {
        self.queue
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut K {
        &mut self.kernel
    }

    pub fn engine(&self) -> &E {
        self.dispatcher.engine()
    }

    pub fn mounts(&self) -> &MountLifecycleManager {
        self.dispatcher.mounts()
    }

    pub fn config(&self) -> &ModuleConfig {
        self.dispatcher.config()
    }
}
