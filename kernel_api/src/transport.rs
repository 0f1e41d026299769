//! Message queue transport

use crate::KernelError;
use core_types::{QueueHandle, ResultCode};
use ipc::Message;

/// Blocking receive and completion acknowledge on a message queue
///
/// The transport owns each [`Message`] outside of one receive/acknowledge
/// cycle. Acknowledging consumes the message, so a server cannot keep
/// caller buffers past the reply.
pub trait MessageTransport {
    /// Waits for the next message on `queue`
    ///
    /// Blocks without timeout on a real kernel.
    fn receive(&mut self, queue: QueueHandle) -> Result<Message, KernelError>;

    /// Completes `message` with `result`, returning it to its caller
    fn acknowledge(&mut self, message: Message, result: ResultCode);
}
