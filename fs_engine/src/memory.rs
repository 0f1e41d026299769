//! In-memory filesystem engine
//!
//! Keeps each mounted volume as a directory tree in memory. The tree is
//! loaded from the backend at mount time and written back at unmount, so
//! contents survive a remount of the same disc.

use crate::image;
use crate::path::{short_name, VolumePath, NAME_MAX};
use crate::tree::{Node, NodeKind};
use crate::types::{mode, SHORT_NAME_SLOT};
use crate::{
    FileStats, FilesystemEngine, FsError, NameFormat, OpenMode, PathStat, SeekOrigin, Usage,
    VfsStats,
};
use core_types::Fd;
use hal::SharedDisc;
use log::debug;
use std::collections::BTreeMap;

/// Open files allowed across all volumes
pub const MAX_OPEN_FILES: usize = 32;

/// Allocation unit reported by `vfs_stats`
pub const CLUSTER_SIZE: u32 = 4096;

/// Longest accepted mount name
pub const MAX_MOUNT_NAME: usize = 8;

const ROOT_INO: u32 = 1;

struct Volume {
    disc: SharedDisc,
    root: Node,
    next_ino: u32,
    /// Bytes available to the tree image
    capacity: u64,
    fsid: u32,
}

impl Volume {
    fn allocate_ino(&mut self) -> u32 {
        let ino = self.next_ino;
        self.next_ino = self.next_ino.wrapping_add(1).max(ROOT_INO + 1);
        ino
    }

    /// Whether the tree still fits on the medium once encoded
    fn fits(&self) -> Result<bool, FsError> {
        Ok(image::encoded_len(&self.root)? <= self.capacity)
    }
}

fn file_contents_mut(root: &mut Node, ino: u32) -> Result<&mut Vec<u8>, FsError> {
    match root.find_ino_mut(ino).map(|node| &mut node.kind) {
        Some(NodeKind::File { data }) => Ok(data),
        _ => Err(FsError::BadHandle),
    }
}

#[derive(Debug, Clone)]
struct OpenFile {
    volume: String,
    ino: u32,
    mode: OpenMode,
    position: u64,
}

/// In-memory reference implementation of [`FilesystemEngine`]
#[derive(Default)]
pub struct MemoryFilesystem {
    volumes: BTreeMap<String, Volume>,
    files: BTreeMap<i32, OpenFile>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the mounted volumes, sorted
    pub fn mounted_volumes(&self) -> Vec<String> {
        self.volumes.keys().cloned().collect()
    }

    pub fn open_file_count(&self) -> usize {
        self.files.len()
    }

    fn volume(&self, name: &str) -> Result<&Volume, FsError> {
        self.volumes.get(name).ok_or(FsError::NoDevice)
    }

    fn volume_mut(&mut self, name: &str) -> Result<&mut Volume, FsError> {
        self.volumes.get_mut(name).ok_or(FsError::NoDevice)
    }

    fn resolve(&self, path: &str) -> Result<(&Volume, &Node), FsError> {
        let path = VolumePath::parse(path)?;
        let volume = self.volume(&path.volume)?;
        let node = volume.root.lookup(&path.components)?;
        Ok((volume, node))
    }

    fn open_file(&self, fd: Fd) -> Result<&OpenFile, FsError> {
        self.files.get(&fd.as_raw()).ok_or(FsError::BadHandle)
    }

    fn next_fd(&self) -> Result<Fd, FsError> {
        (1..=MAX_OPEN_FILES as i32)
            .find(|raw| !self.files.contains_key(raw))
            .map(Fd::from_raw)
            .ok_or(FsError::TooManyOpenFiles)
    }

    /// Data of the file behind `fd`
    fn file_data(&self, file: &OpenFile) -> Result<&Vec<u8>, FsError> {
        let volume = self.volume(&file.volume).map_err(|_| FsError::BadHandle)?;
        match volume.root.find_ino(file.ino).map(|node| &node.kind) {
            Some(NodeKind::File { data }) => Ok(data),
            _ => Err(FsError::BadHandle),
        }
    }

    fn create_node(&mut self, path: &str, directory: bool) -> Result<(), FsError> {
        let path = VolumePath::parse(path)?;
        let (parent, name) = path.split_last().ok_or(FsError::AlreadyExists)?;
        let volume = self.volume_mut(&path.volume)?;

        // Fail on a missing parent before consuming an inode number
        let parent_node = volume.root.lookup(parent)?;
        if parent_node.find_key(name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }

        let ino = volume.allocate_ino();
        let node = if directory {
            Node::directory(ino)
        } else {
            Node::file(ino, Vec::new())
        };
        volume.root.lookup_mut(parent)?.insert(name, node)?;
        if !volume.fits()? {
            volume.root.lookup_mut(parent)?.remove(name)?;
            return Err(FsError::NoSpace);
        }
        Ok(())
    }

    fn remove_node(&mut self, path: &str, recursive: bool) -> Result<(), FsError> {
        let path = VolumePath::parse(path)?;
        let (parent, name) = path.split_last().ok_or(FsError::AccessDenied)?;
        let volume = self.volume_mut(&path.volume)?;

        let target = volume.root.lookup(&path.components)?;
        match &target.kind {
            NodeKind::File { .. } if recursive => return Err(FsError::NotADirectory),
            NodeKind::Directory { entries } if !recursive && !entries.is_empty() => {
                return Err(FsError::NotEmpty)
            }
            _ => {}
        }

        let removed = volume.root.lookup_mut(parent)?.remove(name)?;
        let volume_name = path.volume;
        self.files
            .retain(|_, file| file.volume != volume_name || !removed.contains_ino(file.ino));
        Ok(())
    }

    fn write_listing(
        entries: &BTreeMap<String, Node>,
        format: NameFormat,
        output: &mut [u8],
        limit: u32,
    ) -> u32 {
        let mut written = 0u32;
        let mut offset = 0usize;

        for name in entries.keys() {
            if written >= limit {
                break;
            }
            let (bytes, slot) = match format {
                NameFormat::Short => {
                    let alias = short_name(name).into_bytes();
                    (alias, SHORT_NAME_SLOT)
                }
                NameFormat::Long => {
                    let len = name.len() + 1;
                    (name.clone().into_bytes(), len)
                }
            };
            let end = offset + slot;
            if end > output.len() {
                break;
            }
            output[offset..offset + bytes.len()].copy_from_slice(&bytes);
            output[offset + bytes.len()..end].fill(0);
            offset = end;
            written += 1;
        }

        written
    }
}

impl FilesystemEngine for MemoryFilesystem {
    fn mount(&mut self, name: &str, disc: SharedDisc) -> Result<(), FsError> {
        if name.is_empty() || name.len() > MAX_MOUNT_NAME {
            return Err(FsError::InvalidArgument);
        }
        if self.volumes.contains_key(name) {
            return Err(FsError::AlreadyExists);
        }

        let (root, sector_count, io_type) = {
            let mut backend = disc.borrow_mut();
            if !backend.is_inserted() {
                return Err(FsError::NoDevice);
            }
            let root = image::load(&mut *backend)?;
            (root, backend.sector_count(), backend.io_type())
        };

        let root = match root {
            Some(root) => root,
            None => {
                debug!("volume {} has no image, starting empty", name);
                Node::directory(ROOT_INO)
            }
        };
        let next_ino = root.max_ino().saturating_add(1);

        debug!(
            "mounted {}: ({} sectors, {} entries)",
            name,
            sector_count,
            root.descendant_count()
        );
        self.volumes.insert(
            name.to_string(),
            Volume {
                disc,
                root,
                next_ino,
                capacity: image::capacity(sector_count),
                fsid: u32::from_be_bytes(io_type),
            },
        );
        Ok(())
    }

    fn unmount(&mut self, name: &str) -> Result<(), FsError> {
        let volume = self.volumes.remove(name).ok_or(FsError::NoDevice)?;
        self.files.retain(|_, file| file.volume != name);

        let mut backend = volume.disc.borrow_mut();
        match image::store(&mut *backend, &volume.root) {
            Ok(()) => {
                debug!("unmounted {}:", name);
                Ok(())
            }
            Err(err) => {
                debug!("unmounted {}: without writing its image: {}", name, err);
                Err(err)
            }
        }
    }

    fn is_mounted(&self, name: &str) -> bool {
        self.volumes.contains_key(name)
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Fd, FsError> {
        let parsed = VolumePath::parse(path)?;
        let (_, node) = self.resolve(path)?;
        if node.is_dir() {
            return Err(FsError::IsADirectory);
        }
        let ino = node.ino;
        let fd = self.next_fd()?;

        self.files.insert(
            fd.as_raw(),
            OpenFile {
                volume: parsed.volume,
                ino,
                mode,
                position: 0,
            },
        );
        Ok(fd)
    }

    fn close(&mut self, fd: Fd) -> Result<(), FsError> {
        self.files
            .remove(&fd.as_raw())
            .map(|_| ())
            .ok_or(FsError::BadHandle)
    }

    fn read(&mut self, fd: Fd, buffer: &mut [u8]) -> Result<usize, FsError> {
        let file = self.open_file(fd)?;
        if !file.mode.can_read() {
            return Err(FsError::BadHandle);
        }
        let data = self.file_data(file)?;

        let start = usize::try_from(file.position)
            .unwrap_or(usize::MAX)
            .min(data.len());
        let count = buffer.len().min(data.len() - start);
        buffer[..count].copy_from_slice(&data[start..start + count]);

        if let Some(file) = self.files.get_mut(&fd.as_raw()) {
            file.position = (start + count) as u64;
        }
        Ok(count)
    }

    fn write(&mut self, fd: Fd, data: &[u8]) -> Result<usize, FsError> {
        let file = self.open_file(fd)?.clone();
        if !file.mode.can_write() {
            return Err(FsError::BadHandle);
        }

        let volume = self
            .volumes
            .get_mut(&file.volume)
            .ok_or(FsError::BadHandle)?;

        let start = usize::try_from(file.position).map_err(|_| FsError::InvalidArgument)?;
        let end = start.checked_add(data.len()).ok_or(FsError::NoSpace)?;

        let contents = file_contents_mut(&mut volume.root, file.ino)?;
        let old_len = contents.len();
        let restore_at = start.min(old_len);
        let overwritten = contents[restore_at..end.min(old_len)].to_vec();
        if end > old_len {
            contents.resize(end, 0);
        }
        contents[start..end].copy_from_slice(data);

        if !volume.fits()? {
            let contents = file_contents_mut(&mut volume.root, file.ino)?;
            contents.truncate(old_len);
            contents[restore_at..restore_at + overwritten.len()].copy_from_slice(&overwritten);
            return Err(FsError::NoSpace);
        }

        if let Some(file) = self.files.get_mut(&fd.as_raw()) {
            file.position = end as u64;
        }
        Ok(data.len())
    }

    fn seek(&mut self, fd: Fd, offset: i64, origin: SeekOrigin) -> Result<u64, FsError> {
        let file = self.open_file(fd)?;
        let length = self.file_data(file)?.len() as i64;

        let base = match origin {
            SeekOrigin::Start => 0,
            SeekOrigin::Current => file.position as i64,
            SeekOrigin::End => length,
        };
        let position = base.checked_add(offset).ok_or(FsError::InvalidArgument)?;
        if position < 0 || position > length {
            return Err(FsError::InvalidArgument);
        }

        if let Some(file) = self.files.get_mut(&fd.as_raw()) {
            file.position = position as u64;
        }
        Ok(position as u64)
    }

    fn file_stats(&self, fd: Fd) -> Result<FileStats, FsError> {
        let file = self.open_file(fd)?;
        let data = self.file_data(file)?;
        Ok(FileStats {
            length: u32::try_from(data.len()).unwrap_or(u32::MAX),
            position: u32::try_from(file.position).unwrap_or(u32::MAX),
        })
    }

    fn create_dir(&mut self, path: &str) -> Result<(), FsError> {
        self.create_node(path, true)
    }

    fn create_file(&mut self, path: &str) -> Result<(), FsError> {
        self.create_node(path, false)
    }

    fn read_dir(
        &self,
        path: &str,
        format: NameFormat,
        output: Option<&mut [u8]>,
        limit: u32,
    ) -> Result<u32, FsError> {
        let (_, node) = self.resolve(path)?;
        let entries = node.entries()?;

        match output {
            None => Ok(u32::try_from(entries.len()).unwrap_or(u32::MAX)),
            Some(output) => Ok(Self::write_listing(entries, format, output, limit)),
        }
    }

    fn delete(&mut self, path: &str) -> Result<(), FsError> {
        self.remove_node(path, false)
    }

    fn delete_dir(&mut self, path: &str) -> Result<(), FsError> {
        self.remove_node(path, true)
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), FsError> {
        let source = VolumePath::parse(from)?;
        let target = VolumePath::parse(to)?;
        if source.volume != target.volume {
            return Err(FsError::CrossDevice);
        }
        let (source_parent, source_name) = source.split_last().ok_or(FsError::AccessDenied)?;
        let (target_parent, target_name) = target.split_last().ok_or(FsError::AlreadyExists)?;

        let volume = self.volume_mut(&source.volume)?;
        let moving = volume.root.lookup(&source.components)?;
        let destination = volume.root.lookup(target_parent)?;
        if moving.is_dir() && moving.contains_ino(destination.ino) {
            return Err(FsError::InvalidArgument);
        }
        if let Some(existing) = destination.find_key(target_name)? {
            // Changing only the case of a name is allowed
            let same_entry = destination.child(&existing)?.ino == moving.ino;
            if !same_entry {
                return Err(FsError::AlreadyExists);
            }
        }

        let source_key = volume
            .root
            .lookup(source_parent)?
            .find_key(source_name)?
            .ok_or(FsError::NotFound)?;

        let node = volume.root.lookup_mut(source_parent)?.remove(&source_key)?;
        volume.root.lookup_mut(target_parent)?.insert(target_name, node)?;
        if !volume.fits()? {
            let node = volume.root.lookup_mut(target_parent)?.remove(target_name)?;
            volume.root.lookup_mut(source_parent)?.insert(&source_key, node)?;
            return Err(FsError::NoSpace);
        }
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<PathStat, FsError> {
        let (_, node) = self.resolve(path)?;
        let stat = match &node.kind {
            NodeKind::File { data } => PathStat {
                size: data.len() as u64,
                mode: mode::S_IFREG | 0o666,
                nlink: 1,
                ino: node.ino,
            },
            NodeKind::Directory { .. } => PathStat {
                size: 0,
                mode: mode::S_IFDIR | 0o777,
                nlink: 1,
                ino: node.ino,
            },
        };
        Ok(stat)
    }

    fn vfs_stats(&self, path: &str) -> Result<VfsStats, FsError> {
        let (volume, _) = self.resolve(path)?;
        let cluster = CLUSTER_SIZE as u64;
        let used = image::encoded_len(&volume.root)?;
        // A partial cluster still counts toward the total
        let blocks = volume.capacity.div_ceil(cluster);
        let free = volume.capacity.saturating_sub(used) / cluster;
        let clamp = |value: u64| u32::try_from(value).unwrap_or(u32::MAX);

        Ok(VfsStats {
            block_size: CLUSTER_SIZE,
            fragment_size: CLUSTER_SIZE,
            blocks: clamp(blocks),
            blocks_free: clamp(free),
            blocks_available: clamp(free),
            files: clamp(blocks),
            files_free: clamp(free),
            files_available: clamp(free),
            fsid: volume.fsid,
            flags: 0,
            name_max: NAME_MAX as u32,
        })
    }

    fn usage(&self, path: &str) -> Result<Usage, FsError> {
        let (_, node) = self.resolve(path)?;
        if !node.is_dir() {
            return Err(FsError::NotADirectory);
        }
        Ok(Usage {
            bytes: node.total_bytes(),
            inodes: node.descendant_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::{shared, DiscInterface, RamDisc};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn started_disc(sectors: usize) -> Rc<RefCell<RamDisc>> {
        let mut disc = RamDisc::new(*b"WISD", sectors);
        assert!(disc.startup());
        Rc::new(RefCell::new(disc))
    }

    fn mounted() -> MemoryFilesystem {
        let mut fs = MemoryFilesystem::new();
        fs.mount("sd", started_disc(256)).unwrap();
        fs
    }

    fn write_file(fs: &mut MemoryFilesystem, path: &str, contents: &[u8]) {
        fs.create_file(path).unwrap();
        let fd = fs.open(path, OpenMode::Write).unwrap();
        assert_eq!(fs.write(fd, contents).unwrap(), contents.len());
        fs.close(fd).unwrap();
    }

    #[test]
    fn test_mount_requires_medium() {
        let mut fs = MemoryFilesystem::new();
        let mut disc = RamDisc::new(*b"WISD", 64);
        disc.set_inserted(false);
        assert_eq!(fs.mount("sd", shared(disc)), Err(FsError::NoDevice));
        assert!(!fs.is_mounted("sd"));
    }

    #[test]
    fn test_mount_twice() {
        let mut fs = mounted();
        assert_eq!(
            fs.mount("sd", started_disc(16)),
            Err(FsError::AlreadyExists)
        );
        assert_eq!(fs.mount("", started_disc(16)), Err(FsError::InvalidArgument));
    }

    #[test]
    fn test_unmount_unknown_volume() {
        let mut fs = MemoryFilesystem::new();
        assert_eq!(fs.unmount("usb"), Err(FsError::NoDevice));
    }

    #[test]
    fn test_file_descriptors_start_at_one() {
        let mut fs = mounted();
        fs.create_file("sd:/a").unwrap();
        let fd = fs.open("sd:/a", OpenMode::Read).unwrap();
        assert_eq!(fd.as_raw(), 1);
        let second = fs.open("sd:/a", OpenMode::Read).unwrap();
        assert_eq!(second.as_raw(), 2);
    }

    #[test]
    fn test_write_read_seek() {
        let mut fs = mounted();
        fs.create_file("sd:/data.bin").unwrap();
        let fd = fs.open("sd:/data.bin", OpenMode::ReadWrite).unwrap();

        assert_eq!(fs.write(fd, b"hello world").unwrap(), 11);
        assert_eq!(
            fs.file_stats(fd).unwrap(),
            FileStats {
                length: 11,
                position: 11
            }
        );

        assert_eq!(fs.seek(fd, 6, SeekOrigin::Start).unwrap(), 6);
        let mut buffer = [0u8; 16];
        assert_eq!(fs.read(fd, &mut buffer).unwrap(), 5);
        assert_eq!(&buffer[..5], b"world");

        assert_eq!(fs.seek(fd, -5, SeekOrigin::End).unwrap(), 6);
        assert_eq!(fs.seek(fd, -1, SeekOrigin::Current).unwrap(), 5);
        assert_eq!(fs.seek(fd, 1, SeekOrigin::End), Err(FsError::InvalidArgument));
        assert_eq!(
            fs.seek(fd, -1, SeekOrigin::Start),
            Err(FsError::InvalidArgument)
        );
    }

    #[test]
    fn test_access_mode_enforced() {
        let mut fs = mounted();
        fs.create_file("sd:/ro").unwrap();
        let fd = fs.open("sd:/ro", OpenMode::Read).unwrap();
        assert_eq!(fs.write(fd, b"x"), Err(FsError::BadHandle));

        let wr = fs.open("sd:/ro", OpenMode::Write).unwrap();
        let mut buffer = [0u8; 1];
        assert_eq!(fs.read(wr, &mut buffer), Err(FsError::BadHandle));
    }

    #[test]
    fn test_open_errors() {
        let mut fs = mounted();
        fs.create_dir("sd:/dir").unwrap();
        assert_eq!(fs.open("sd:/missing", OpenMode::Read), Err(FsError::NotFound));
        assert_eq!(fs.open("sd:/dir", OpenMode::Read), Err(FsError::IsADirectory));
        assert_eq!(fs.open("usb:/x", OpenMode::Read), Err(FsError::NoDevice));
        assert_eq!(fs.close(Fd::from_raw(7)), Err(FsError::BadHandle));
    }

    #[test]
    fn test_too_many_open_files() {
        let mut fs = mounted();
        fs.create_file("sd:/f").unwrap();
        for _ in 0..MAX_OPEN_FILES {
            fs.open("sd:/f", OpenMode::Read).unwrap();
        }
        assert_eq!(
            fs.open("sd:/f", OpenMode::Read),
            Err(FsError::TooManyOpenFiles)
        );
    }

    #[test]
    fn test_create_conflicts() {
        let mut fs = mounted();
        fs.create_dir("sd:/apps").unwrap();
        assert_eq!(fs.create_dir("sd:/APPS"), Err(FsError::AlreadyExists));
        assert_eq!(fs.create_file("sd:/apps"), Err(FsError::AlreadyExists));
        assert_eq!(fs.create_file("sd:/none/x"), Err(FsError::NotFound));
        assert_eq!(fs.create_dir("sd:/"), Err(FsError::AlreadyExists));
    }

    #[test]
    fn test_delete_semantics() {
        let mut fs = mounted();
        fs.create_dir("sd:/dir").unwrap();
        write_file(&mut fs, "sd:/dir/file", b"abc");

        assert_eq!(fs.delete("sd:/dir"), Err(FsError::NotEmpty));
        assert_eq!(fs.delete_dir("sd:/dir/file"), Err(FsError::NotADirectory));
        assert_eq!(fs.delete("sd:/"), Err(FsError::AccessDenied));

        fs.delete_dir("sd:/dir").unwrap();
        assert_eq!(fs.stat("sd:/dir"), Err(FsError::NotFound));
    }

    #[test]
    fn test_delete_closes_open_handles() {
        let mut fs = mounted();
        write_file(&mut fs, "sd:/gone", b"abc");
        let fd = fs.open("sd:/gone", OpenMode::Read).unwrap();
        fs.delete("sd:/gone").unwrap();
        assert_eq!(fs.file_stats(fd), Err(FsError::BadHandle));
        assert_eq!(fs.open_file_count(), 0);
    }

    #[test]
    fn test_rename() {
        let mut fs = mounted();
        fs.create_dir("sd:/a").unwrap();
        fs.create_dir("sd:/b").unwrap();
        write_file(&mut fs, "sd:/a/f.txt", b"data");
        let before = fs.stat("sd:/a/f.txt").unwrap();

        fs.rename("sd:/a/f.txt", "sd:/b/g.txt").unwrap();
        assert_eq!(fs.stat("sd:/a/f.txt"), Err(FsError::NotFound));
        assert_eq!(fs.stat("sd:/b/g.txt").unwrap().ino, before.ino);

        fs.rename("sd:/b/g.txt", "sd:/b/G.TXT").unwrap();
        assert_eq!(fs.rename("sd:/a", "sd:/b"), Err(FsError::AlreadyExists));
        assert_eq!(fs.rename("sd:/a", "sd:/a/sub"), Err(FsError::InvalidArgument));
        assert_eq!(fs.rename("sd:/a", "usb:/a"), Err(FsError::CrossDevice));
        assert_eq!(fs.rename("sd:/none", "sd:/x"), Err(FsError::NotFound));
    }

    #[test]
    fn test_stat_and_usage() {
        let mut fs = mounted();
        fs.create_dir("sd:/apps").unwrap();
        fs.create_dir("sd:/apps/hbc").unwrap();
        write_file(&mut fs, "sd:/apps/hbc/boot.dol", &[1u8; 100]);
        write_file(&mut fs, "sd:/apps/meta.xml", &[2u8; 20]);

        let stat = fs.stat("sd:/apps/hbc/boot.dol").unwrap();
        assert_eq!(stat.size, 100);
        assert!(!stat.is_dir());
        assert!(fs.stat("sd:/apps").unwrap().is_dir());

        assert_eq!(
            fs.usage("sd:/apps").unwrap(),
            Usage {
                bytes: 120,
                inodes: 3
            }
        );
        assert_eq!(fs.usage("sd:/apps/meta.xml"), Err(FsError::NotADirectory));
    }

    #[test]
    fn test_read_dir_count_and_listing() {
        let mut fs = mounted();
        fs.create_dir("sd:/d").unwrap();
        fs.create_file("sd:/d/alpha.txt").unwrap();
        fs.create_file("sd:/d/beta long name.bin").unwrap();
        fs.create_dir("sd:/d/gamma").unwrap();

        assert_eq!(fs.read_dir("sd:/d", NameFormat::Long, None, 0).unwrap(), 3);

        let mut long = [0xFFu8; 64];
        let count = fs
            .read_dir("sd:/d", NameFormat::Long, Some(&mut long), 2)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(&long[..10], b"alpha.txt\0");
        assert_eq!(&long[10..29], b"beta long name.bin\0");

        let mut short = [0u8; SHORT_NAME_SLOT * 3];
        let count = fs
            .read_dir("sd:/d", NameFormat::Short, Some(&mut short), 10)
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(&short[..10], b"ALPHA.TXT\0");
        assert_eq!(&short[13..26], b"BETALO~1.BIN\0");
        assert_eq!(&short[26..32], b"GAMMA\0");
    }

    #[test]
    fn test_read_dir_stops_when_buffer_full() {
        let mut fs = mounted();
        fs.create_file("sd:/one").unwrap();
        fs.create_file("sd:/two").unwrap();
        let mut buffer = [0u8; 6];
        let count = fs
            .read_dir("sd:/", NameFormat::Long, Some(&mut buffer), 10)
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(&buffer[..4], b"one\0");
    }

    #[test]
    fn test_read_dir_on_file() {
        let mut fs = mounted();
        fs.create_file("sd:/f").unwrap();
        assert_eq!(
            fs.read_dir("sd:/f", NameFormat::Long, None, 0),
            Err(FsError::NotADirectory)
        );
    }

    #[test]
    fn test_filled_volume_survives_remount() {
        let disc = started_disc(16);
        let mut fs = MemoryFilesystem::new();
        fs.mount("sd", disc.clone()).unwrap();
        fs.create_file("sd:/fill").unwrap();
        let fd = fs.open("sd:/fill", OpenMode::Write).unwrap();

        let mut written = 0usize;
        loop {
            match fs.write(fd, &[0xFF; 64]) {
                Ok(count) => written += count,
                Err(err) => {
                    assert_eq!(err, FsError::NoSpace);
                    break;
                }
            }
        }
        assert!(written > 0);
        assert_eq!(
            fs.file_stats(fd).unwrap(),
            FileStats {
                length: written as u32,
                position: written as u32
            }
        );

        fs.unmount("sd").unwrap();
        fs.mount("sd", disc).unwrap();
        assert_eq!(fs.stat("sd:/fill").unwrap().size, written as u64);
    }

    #[test]
    fn test_rejected_overwrite_is_rolled_back() {
        let mut fs = MemoryFilesystem::new();
        fs.mount("sd", started_disc(16)).unwrap();
        fs.create_file("sd:/zeros").unwrap();
        let fd = fs.open("sd:/zeros", OpenMode::ReadWrite).unwrap();
        while fs.write(fd, &[0u8; 256]).is_ok() {}
        let length = fs.file_stats(fd).unwrap().length as usize;
        assert!(length >= 2048);

        // Same length, but 0xFF takes more room in the image than 0
        fs.seek(fd, 0, SeekOrigin::Start).unwrap();
        assert_eq!(fs.write(fd, &[0xFF; 2048]), Err(FsError::NoSpace));
        assert_eq!(fs.file_stats(fd).unwrap().length as usize, length);

        fs.seek(fd, 0, SeekOrigin::Start).unwrap();
        let mut buffer = vec![0xAAu8; 2048];
        assert_eq!(fs.read(fd, &mut buffer).unwrap(), 2048);
        assert!(buffer.iter().all(|&byte| byte == 0));
    }

    #[test]
    fn test_names_count_toward_capacity() {
        let disc = started_disc(16);
        let mut fs = MemoryFilesystem::new();
        fs.mount("sd", disc.clone()).unwrap();

        let mut created = 0u32;
        for index in 0..400 {
            let path = format!("sd:/{:03} a rather long file name.txt", index);
            match fs.create_file(&path) {
                Ok(()) => created += 1,
                Err(err) => {
                    assert_eq!(err, FsError::NoSpace);
                    break;
                }
            }
        }
        assert!(created > 0 && created < 400);

        let long_name = format!("sd:/{}", "n".repeat(200));
        assert_eq!(
            fs.rename("sd:/000 a rather long file name.txt", &long_name),
            Err(FsError::NoSpace)
        );
        assert!(fs.stat("sd:/000 a rather long file name.txt").is_ok());

        fs.unmount("sd").unwrap();
        fs.mount("sd", disc).unwrap();
        assert_eq!(
            fs.read_dir("sd:/", NameFormat::Long, None, 0).unwrap(),
            created
        );
    }

    #[test]
    fn test_vfs_stats() {
        let fs = mounted();
        let stats = fs.vfs_stats("sd:/").unwrap();
        assert_eq!(stats.block_size, CLUSTER_SIZE);
        assert_eq!(stats.fsid, u32::from_be_bytes(*b"WISD"));
        // 255 image sectors round up to 32 clusters
        assert_eq!(stats.blocks, 32);
        assert!(stats.blocks_free < stats.blocks);
        assert_eq!(stats.name_max, 255);
    }

    #[test]
    fn test_vfs_stats_on_small_medium() {
        let mut fs = MemoryFilesystem::new();
        fs.mount("sd", started_disc(4)).unwrap();
        let stats = fs.vfs_stats("sd:/").unwrap();
        assert_eq!(stats.blocks, 1);
        assert_eq!(stats.blocks_free, 0);
    }

    #[test]
    fn test_contents_survive_remount() {
        let disc = started_disc(256);
        let mut fs = MemoryFilesystem::new();
        fs.mount("sd", disc.clone()).unwrap();
        fs.create_dir("sd:/apps").unwrap();
        write_file(&mut fs, "sd:/apps/boot.dol", b"payload");
        let fd = fs.open("sd:/apps/boot.dol", OpenMode::Read).unwrap();

        fs.unmount("sd").unwrap();
        assert!(!fs.is_mounted("sd"));
        assert_eq!(fs.file_stats(fd), Err(FsError::BadHandle));

        fs.mount("sd", disc).unwrap();
        let fd = fs.open("sd:/apps/boot.dol", OpenMode::Read).unwrap();
        let mut buffer = [0u8; 7];
        assert_eq!(fs.read(fd, &mut buffer).unwrap(), 7);
        assert_eq!(&buffer, b"payload");

        // New inodes never collide with loaded ones
        fs.create_file("sd:/new").unwrap();
        assert!(fs.stat("sd:/new").unwrap().ino > fs.stat("sd:/apps/boot.dol").unwrap().ino);
    }

    #[test]
    fn test_unmount_after_backend_stopped() {
        let disc = started_disc(64);
        let mut fs = MemoryFilesystem::new();
        fs.mount("sd", disc.clone()).unwrap();
        disc.borrow_mut().shutdown();
        assert_eq!(fs.unmount("sd"), Err(FsError::Io));
        assert!(!fs.is_mounted("sd"));
    }
}
