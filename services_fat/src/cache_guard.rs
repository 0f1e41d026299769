//! Cache coherency bracketing for caller buffers
//!
//! Caller memory may be the target or source of DMA by the storage
//! controller. Input buffers are invalidated before a handler reads them
//! and output buffers are flushed after a handler has written them.

use ipc::IoBuffer;
use kernel_api::CacheCoherency;

/// Brackets one handler invocation
///
/// Created with the buffers the handler will read, completed with the
/// buffers it has written. Completing consumes the guard so a request
/// cannot be flushed twice.
#[must_use = "a cache guard must be completed to flush output buffers"]
pub struct CacheSyncGuard<'c, C: CacheCoherency + ?Sized> {
    cache: &'c C,
}

impl<'c, C: CacheCoherency + ?Sized> CacheSyncGuard<'c, C> {
    /// Invalidates every buffer in `inputs`
    pub fn enter<'b>(cache: &'c C, inputs: impl IntoIterator<Item = &'b IoBuffer>) -> Self {
        for buffer in inputs {
            cache.invalidate(buffer.as_slice());
        }
        Self { cache }
    }

    /// Flushes every buffer in `outputs`
    pub fn complete<'b>(self, outputs: impl IntoIterator<Item = &'b IoBuffer>) {
        for buffer in outputs {
            self.cache.flush(buffer.as_slice());
        }
    }
}
