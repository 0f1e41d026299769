//! CPU/DMA cache maintenance

/// Cache coherency operations on caller memory
///
/// Storage controllers move data by DMA, so the CPU's cached view of a
/// caller buffer can be stale in either direction. Both operations are
/// side effects only.
pub trait CacheCoherency {
    /// Invalidates the CPU's view of `range` before the CPU reads it
    fn invalidate(&self, range: &[u8]);

    /// Writes back the CPU's view of `range` after the CPU wrote it
    fn flush(&self, range: &[u8]);
}
