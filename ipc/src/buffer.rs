//! Caller-supplied buffers
//!
//! An [`IoBuffer`] stands for a (pointer, length) descriptor into the
//! calling process's memory. Paths inside buffers are NUL-terminated;
//! words are big-endian `u32`, the platform byte order.

use crate::IpcError;

/// Size in bytes of a word field (entry limits, counts, block totals)
pub const WORD_SIZE: usize = 4;

/// One descriptor's worth of caller memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IoBuffer {
    data: Vec<u8>,
}

impl IoBuffer {
    /// Wraps existing bytes
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Creates a zero-filled buffer of `len` bytes
    pub fn zeroed(len: usize) -> Self {
        Self { data: vec![0; len] }
    }

    /// Creates a NUL-terminated path buffer
    pub fn from_path(path: &str) -> Self {
        let mut data = Vec::with_capacity(path.len() + 1);
        data.extend_from_slice(path.as_bytes());
        data.push(0);
        Self { data }
    }

    /// Creates a buffer holding a single word
    pub fn from_word(value: u32) -> Self {
        Self {
            data: value.to_be_bytes().to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns the underlying bytes to the caller
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Reads the buffer as a path
    ///
    /// The path ends at the first NUL; without one, the whole buffer is
    /// the path. Non-UTF-8 contents are rejected.
    pub fn path(&self) -> Result<&str, IpcError> {
        let end = self
            .data
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.data.len());
        core::str::from_utf8(&self.data[..end]).map_err(|_| IpcError::InvalidPath)
    }

    /// Reads the leading word
    pub fn word(&self) -> Result<u32, IpcError> {
        let bytes: [u8; WORD_SIZE] = self
            .data
            .get(..WORD_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(IpcError::BufferTooSmall {
                needed: WORD_SIZE,
                len: self.data.len(),
            })?;
        Ok(u32::from_be_bytes(bytes))
    }

    /// Overwrites the leading word
    pub fn set_word(&mut self, value: u32) -> Result<(), IpcError> {
        let len = self.data.len();
        let slot = self
            .data
            .get_mut(..WORD_SIZE)
            .ok_or(IpcError::BufferTooSmall {
                needed: WORD_SIZE,
                len,
            })?;
        slot.copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Zero-fills the whole buffer
    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

impl From<Vec<u8>> for IoBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}
