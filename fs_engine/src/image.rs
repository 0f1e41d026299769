//! On-disc volume image
//!
//! Sector 0 holds a NUL-padded JSON superblock; the serialized directory
//! tree follows from sector 1. A medium without a valid superblock is
//! treated as freshly formatted.

use crate::tree::Node;
use crate::FsError;
use hal::{DiscInterface, SECTOR_SIZE};
use serde::{Deserialize, Serialize};
use std::io;

const IMAGE_MAGIC: u32 = 0x4641_5431; // "FAT1"
const IMAGE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Superblock {
    magic: u32,
    version: u32,
    tree_len: u64,
}

/// Bytes available to the tree image on a medium
pub fn capacity(sector_count: u64) -> u64 {
    sector_count.saturating_sub(1) * SECTOR_SIZE as u64
}

/// Counts the bytes written through it
struct ByteCounter(u64);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Size of the tree as `store` would write it
pub fn encoded_len(root: &Node) -> Result<u64, FsError> {
    let mut counter = ByteCounter(0);
    serde_json::to_writer(&mut counter, root).map_err(|_| FsError::Io)?;
    Ok(counter.0)
}

/// Loads the directory tree, or `None` for an unformatted medium
pub fn load(disc: &mut dyn DiscInterface) -> Result<Option<Node>, FsError> {
    if disc.sector_count() == 0 {
        return Ok(None);
    }

    let mut block = [0u8; SECTOR_SIZE];
    disc.read_sectors(0, &mut block).map_err(|_| FsError::Io)?;

    let json_end = block.iter().position(|&b| b == 0).unwrap_or(SECTOR_SIZE);
    let superblock: Superblock = match serde_json::from_slice(&block[..json_end]) {
        Ok(sb) => sb,
        Err(_) => return Ok(None),
    };
    if superblock.magic != IMAGE_MAGIC || superblock.version != IMAGE_VERSION {
        return Ok(None);
    }
    if superblock.tree_len > capacity(disc.sector_count()) {
        return Err(FsError::Io);
    }

    let tree_len = superblock.tree_len as usize;
    let mut data = vec![0u8; sectors_for(tree_len) * SECTOR_SIZE];
    if !data.is_empty() {
        disc.read_sectors(1, &mut data).map_err(|_| FsError::Io)?;
    }
    let root = serde_json::from_slice(&data[..tree_len]).map_err(|_| FsError::Io)?;
    Ok(Some(root))
}

/// Writes the directory tree back to the medium
pub fn store(disc: &mut dyn DiscInterface, root: &Node) -> Result<(), FsError> {
    let tree = serde_json::to_vec(root).map_err(|_| FsError::Io)?;
    if tree.len() as u64 > capacity(disc.sector_count()) {
        return Err(FsError::NoSpace);
    }

    let mut data = vec![0u8; sectors_for(tree.len()) * SECTOR_SIZE];
    data[..tree.len()].copy_from_slice(&tree);
    if !data.is_empty() {
        disc.write_sectors(1, &data).map_err(|_| FsError::Io)?;
    }

    let superblock = Superblock {
        magic: IMAGE_MAGIC,
        version: IMAGE_VERSION,
        tree_len: tree.len() as u64,
    };
    let sb_json = serde_json::to_vec(&superblock).map_err(|_| FsError::Io)?;
    if sb_json.len() >= SECTOR_SIZE {
        return Err(FsError::Io);
    }
    let mut block = [0u8; SECTOR_SIZE];
    block[..sb_json.len()].copy_from_slice(&sb_json);
    disc.write_sectors(0, &block).map_err(|_| FsError::Io)
}

fn sectors_for(len: usize) -> usize {
    len.div_ceil(SECTOR_SIZE)
}
