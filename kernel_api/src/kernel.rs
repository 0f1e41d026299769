//! Kernel API trait used during module start-up

use crate::{CacheCoherency, KernelError, MessageTransport};
use core_types::QueueHandle;

/// Bytes of queue buffer needed per message slot
///
/// Each slot holds one 4-byte message reference.
pub const QUEUE_SLOT_SIZE: usize = 4;

/// The kernel API trait
///
/// Multiple implementations are possible:
/// - Simulated kernel (for testing)
/// - Real kernel (syscalls)
///
/// # Example
///
/// ```
/// use kernel_api::{KernelApi, KernelError};
/// use core_types::QueueHandle;
///
/// fn bring_up<K: KernelApi>(kernel: &mut K) -> Result<QueueHandle, KernelError> {
///     let buffer = kernel.allocate(0x80)?;
///     let queue = kernel.create_message_queue(buffer, 32)?;
///     kernel.register_device("fat", queue)?;
///     Ok(queue)
/// }
/// ```
pub trait KernelApi: MessageTransport + CacheCoherency {
    /// Allocates `size` bytes from the module heap
    fn allocate(&mut self, size: usize) -> Result<Vec<u8>, KernelError>;

    /// Creates a message queue backed by `buffer` with `capacity` slots
    ///
    /// `buffer` must hold at least `capacity * QUEUE_SLOT_SIZE` bytes.
    fn create_message_queue(
        &mut self,
        buffer: Vec<u8>,
        capacity: usize,
    ) -> Result<QueueHandle, KernelError>;

    /// Routes opens of `name` to `queue`
    fn register_device(&mut self, name: &str, queue: QueueHandle) -> Result<(), KernelError>;
}
