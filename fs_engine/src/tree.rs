//! In-memory directory tree

use crate::path::same_name;
use crate::FsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A file or directory with its inode number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub ino: u32,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    File { data: Vec<u8> },
    Directory { entries: BTreeMap<String, Node> },
}

impl Node {
    pub fn file(ino: u32, data: Vec<u8>) -> Self {
        Self {
            ino,
            kind: NodeKind::File { data },
        }
    }

    pub fn directory(ino: u32) -> Self {
        Self {
            ino,
            kind: NodeKind::Directory {
                entries: BTreeMap::new(),
            },
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn entries(&self) -> Result<&BTreeMap<String, Node>, FsError> {
        match &self.kind {
            NodeKind::Directory { entries } => Ok(entries),
            NodeKind::File { .. } => Err(FsError::NotADirectory),
        }
    }

    pub fn entries_mut(&mut self) -> Result<&mut BTreeMap<String, Node>, FsError> {
        match &mut self.kind {
            NodeKind::Directory { entries } => Ok(entries),
            NodeKind::File { .. } => Err(FsError::NotADirectory),
        }
    }

    /// Stored key of the entry matching `name`, if any
    pub fn find_key(&self, name: &str) -> Result<Option<String>, FsError> {
        Ok(self
            .entries()?
            .keys()
            .find(|key| same_name(key, name))
            .cloned())
    }

    pub fn child(&self, name: &str) -> Result<&Node, FsError> {
        let entries = self.entries()?;
        entries
            .iter()
            .find(|(key, _)| same_name(key, name))
            .map(|(_, node)| node)
            .ok_or(FsError::NotFound)
    }

    pub fn child_mut(&mut self, name: &str) -> Result<&mut Node, FsError> {
        let entries = self.entries_mut()?;
        entries
            .iter_mut()
            .find(|(key, _)| same_name(key, name))
            .map(|(_, node)| node)
            .ok_or(FsError::NotFound)
    }

    /// Adds a new entry; fails if the name is taken
    pub fn insert(&mut self, name: &str, node: Node) -> Result<(), FsError> {
        if self.find_key(name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }
        self.entries_mut()?.insert(name.to_string(), node);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Node, FsError> {
        let key = self.find_key(name)?.ok_or(FsError::NotFound)?;
        self.entries_mut()?.remove(&key).ok_or(FsError::NotFound)
    }

    pub fn lookup(&self, components: &[String]) -> Result<&Node, FsError> {
        components
            .iter()
            .try_fold(self, |node, name| node.child(name))
    }

    pub fn lookup_mut(&mut self, components: &[String]) -> Result<&mut Node, FsError> {
        let mut node = self;
        for name in components {
            node = node.child_mut(name)?;
        }
        Ok(node)
    }

    pub fn find_ino(&self, ino: u32) -> Option<&Node> {
        if self.ino == ino {
            return Some(self);
        }
        match &self.kind {
            NodeKind::Directory { entries } => {
                entries.values().find_map(|child| child.find_ino(ino))
            }
            NodeKind::File { .. } => None,
        }
    }

    pub fn find_ino_mut(&mut self, ino: u32) -> Option<&mut Node> {
        if self.ino == ino {
            return Some(self);
        }
        match &mut self.kind {
            NodeKind::Directory { entries } => entries
                .values_mut()
                .find_map(|child| child.find_ino_mut(ino)),
            NodeKind::File { .. } => None,
        }
    }

    /// Whether `ino` is this node or lies beneath it
    pub fn contains_ino(&self, ino: u32) -> bool {
        self.find_ino(ino).is_some()
    }

    /// Total file bytes at or below this node
    pub fn total_bytes(&self) -> u64 {
        match &self.kind {
            NodeKind::File { data } => data.len() as u64,
            NodeKind::Directory { entries } => entries.values().map(Node::total_bytes).sum(),
        }
    }

    /// Number of nodes strictly below this one
    pub fn descendant_count(&self) -> u32 {
        match &self.kind {
            NodeKind::File { .. } => 0,
            NodeKind::Directory { entries } => entries
                .values()
                .map(|child| 1 + child.descendant_count())
                .sum(),
        }
    }

    pub fn max_ino(&self) -> u32 {
        match &self.kind {
            NodeKind::File { .. } => self.ino,
            NodeKind::Directory { entries } => entries
                .values()
                .map(Node::max_ino)
                .fold(self.ino, u32::max),
        }
    }
}
