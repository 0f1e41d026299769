//! Test utilities for driving a server through the simulated kernel
//!
//! Builders for the request shapes clients send, so tests read as the
//! calls a client would make.

use crate::{Completion, SimulatedKernel};
use core_types::{Fd, QueueHandle};
use ipc::{IoBuffer, Message, MessageId, Request};
use kernel_api::KernelError;

/// Builds an open request for `device` with `mode`
pub fn open(device: &str, mode: u32) -> Message {
    Message::new(
        Fd::CONTROL,
        Request::Open {
            device: device.to_string(),
            mode,
        },
    )
}

/// Builds a read request for `len` bytes
pub fn read(fd: Fd, len: usize) -> Message {
    Message::new(
        fd,
        Request::Read {
            buffer: IoBuffer::zeroed(len),
        },
    )
}

/// Builds a write request carrying `data`
pub fn write(fd: Fd, data: &[u8]) -> Message {
    Message::new(
        fd,
        Request::Write {
            buffer: IoBuffer::new(data.to_vec()),
        },
    )
}

/// Builds a fixed-buffer control request with an `output_len` output
pub fn ioctl(fd: Fd, command: u32, input: Option<IoBuffer>, output_len: Option<usize>) -> Message {
    Message::new(
        fd,
        Request::Ioctl {
            command,
            input,
            output: output_len.map(IoBuffer::zeroed),
        },
    )
}

/// Builds a vectorized control request from input and output descriptors
pub fn ioctlv(command: u32, inputs: Vec<IoBuffer>, outputs: Vec<IoBuffer>) -> Message {
    let num_in = inputs.len() as u32;
    let num_io = outputs.len() as u32;
    let mut vector = inputs;
    vector.extend(outputs);
    Message::new(
        Fd::CONTROL,
        Request::Ioctlv {
            command,
            vector,
            num_in,
            num_io,
        },
    )
}

/// Sends `message` and returns its id
pub fn submit(
    kernel: &mut SimulatedKernel,
    queue: QueueHandle,
    message: Message,
) -> Result<MessageId, KernelError> {
    kernel.send(queue, message)
}

/// Returns the output descriptors of a completed vectorized request
pub fn vector_outputs(completion: &Completion) -> &[IoBuffer] {
    match &completion.message.request {
        Request::Ioctlv {
            vector, num_in, ..
        } => vector.get(*num_in as usize..).unwrap_or(&[]),
        _ => &[],
    }
}

/// Returns the transfer buffer of a completed read, write or ioctl output
pub fn transfer_buffer(completion: &Completion) -> Option<&IoBuffer> {
    match &completion.message.request {
        Request::Read { buffer } | Request::Write { buffer } => Some(buffer),
        Request::Ioctl { output, .. } => output.as_ref(),
        _ => None,
    }
}
