//! Message types received from the kernel message queue

use crate::IoBuffer;
use core_types::Fd;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a message ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Msg({})", self.0)
    }
}

/// Top-level command selector
///
/// Raw values match the kernel's message layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Open,
    Close,
    Read,
    Write,
    Seek,
    Ioctl,
    Ioctlv,
}

impl Command {
    /// Decodes a raw command value
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::Open),
            2 => Some(Self::Close),
            3 => Some(Self::Read),
            4 => Some(Self::Write),
            5 => Some(Self::Seek),
            6 => Some(Self::Ioctl),
            7 => Some(Self::Ioctlv),
            _ => None,
        }
    }

    /// Returns the raw command value
    pub fn as_raw(&self) -> u32 {
        match self {
            Self::Open => 1,
            Self::Close => 2,
            Self::Read => 3,
            Self::Write => 4,
            Self::Seek => 5,
            Self::Ioctl => 6,
            Self::Ioctlv => 7,
        }
    }
}

/// Command-specific request payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Open a device path
    Open { device: String, mode: u32 },
    /// Close the target handle
    Close,
    /// Read into the caller's buffer; its length is the request length
    Read { buffer: IoBuffer },
    /// Write from the caller's buffer
    Write { buffer: IoBuffer },
    /// Reposition the target handle
    Seek { offset: i32, origin: u32 },
    /// Fixed-buffer device control
    Ioctl {
        command: u32,
        input: Option<IoBuffer>,
        output: Option<IoBuffer>,
    },
    /// Vectorized device control
    ///
    /// `vector` holds `num_in` input descriptors followed by `num_io`
    /// output descriptors. The counts are caller-supplied and untrusted.
    Ioctlv {
        command: u32,
        vector: Vec<IoBuffer>,
        num_in: u32,
        num_io: u32,
    },
    /// A top-level command this driver does not understand
    Unknown { command: u32 },
}

impl Request {
    /// Returns the decoded top-level command, if known
    pub fn command(&self) -> Option<Command> {
        match self {
            Request::Open { .. } => Some(Command::Open),
            Request::Close => Some(Command::Close),
            Request::Read { .. } => Some(Command::Read),
            Request::Write { .. } => Some(Command::Write),
            Request::Seek { .. } => Some(Command::Seek),
            Request::Ioctl { .. } => Some(Command::Ioctl),
            Request::Ioctlv { .. } => Some(Command::Ioctlv),
            Request::Unknown { .. } => None,
        }
    }
}

/// A request as delivered by the kernel
///
/// The message owns the caller's buffers for the duration of one
/// receive/acknowledge cycle. Acknowledging consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Unique identifier for this message
    pub id: MessageId,
    /// Target handle
    pub fd: Fd,
    /// Command payload
    pub request: Request,
}

impl Message {
    /// Creates a new message addressed to `fd`
    pub fn new(fd: Fd, request: Request) -> Self {
        Self {
            id: MessageId::new(),
            fd,
            request,
        }
    }
}
