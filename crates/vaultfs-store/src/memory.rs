//! In-memory storage for testing and development

use crate::{join, parent, validate_path, DirEntry, Result, Storage, StoreError, SEPARATOR};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
enum Node {
    Dir,
    File(Bytes),
}

/// An in-memory directory tree
#[derive(Clone, Default)]
pub struct MemoryStorage {
    nodes: Arc<RwLock<BTreeMap<String, Node>>>,
}

impl MemoryStorage {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files stored
    pub fn file_count(&self) -> usize {
        self.nodes
            .read()
            .values()
            .filter(|n| matches!(n, Node::File(_)))
            .count()
    }

    /// Total size of all files
    pub fn total_size(&self) -> u64 {
        self.nodes
            .read()
            .values()
            .map(|n| match n {
                Node::File(data) => data.len() as u64,
                Node::Dir => 0,
            })
            .sum()
    }

    /// Every path currently stored, files and directories
    pub fn paths(&self) -> Vec<String> {
        self.nodes.read().keys().cloned().collect()
    }
}

fn is_dir_in(nodes: &BTreeMap<String, Node>, path: &str) -> bool {
    path.is_empty() || matches!(nodes.get(path), Some(Node::Dir))
}

/// Keys strictly below `path`
fn descendants<'a>(nodes: &'a BTreeMap<String, Node>, path: &str) -> impl Iterator<Item = &'a String> {
    let prefix = if path.is_empty() {
        String::new()
    } else {
        format!("{path}{SEPARATOR}")
    };
    nodes
        .range(prefix.clone()..)
        .take_while(move |(k, _)| k.starts_with(&prefix))
        .map(|(k, _)| k)
}

impl Storage for MemoryStorage {
    fn read(&self, path: &str) -> Result<Bytes> {
        validate_path(path)?;
        match self.nodes.read().get(path) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(Node::Dir) => Err(StoreError::IsADirectory(path.to_string())),
            None if path.is_empty() => Err(StoreError::IsADirectory(path.to_string())),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        validate_path(path)?;
        let parent = parent(path).ok_or_else(|| StoreError::IsADirectory(path.to_string()))?;
        let mut nodes = self.nodes.write();
        if !is_dir_in(&nodes, parent) {
            return Err(StoreError::NotFound(parent.to_string()));
        }
        if let Some(Node::Dir) = nodes.get(path) {
            return Err(StoreError::IsADirectory(path.to_string()));
        }
        nodes.insert(path.to_string(), Node::File(Bytes::copy_from_slice(data)));
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<bool> {
        validate_path(path)?;
        Ok(path.is_empty() || self.nodes.read().contains_key(path))
    }

    fn is_dir(&self, path: &str) -> Result<bool> {
        validate_path(path)?;
        Ok(is_dir_in(&self.nodes.read(), path))
    }

    fn create_dir_all(&self, path: &str) -> Result<()> {
        validate_path(path)?;
        if path.is_empty() {
            return Ok(());
        }
        let mut nodes = self.nodes.write();
        let mut current = String::new();
        for part in path.split(SEPARATOR) {
            current = join(&current, part);
            match nodes.get(&current) {
                Some(Node::Dir) => {}
                Some(Node::File(_)) => return Err(StoreError::NotADirectory(current)),
                None => {
                    nodes.insert(current.clone(), Node::Dir);
                }
            }
        }
        Ok(())
    }

    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        validate_path(path)?;
        let nodes = self.nodes.read();
        match nodes.get(path) {
            Some(Node::File(_)) => return Err(StoreError::NotADirectory(path.to_string())),
            None if !path.is_empty() => return Err(StoreError::NotFound(path.to_string())),
            _ => {}
        }
        let skip = if path.is_empty() { 0 } else { path.len() + 1 };
        let entries = descendants(&nodes, path)
            .filter(|k| !k[skip..].contains(SEPARATOR))
            .map(|k| DirEntry {
                name: k[skip..].to_string(),
                is_dir: matches!(nodes.get(k), Some(Node::Dir)),
            })
            .collect();
        Ok(entries)
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        validate_path(path)?;
        let mut nodes = self.nodes.write();
        match nodes.get(path) {
            Some(Node::File(_)) => {
                nodes.remove(path);
                Ok(())
            }
            Some(Node::Dir) => Err(StoreError::IsADirectory(path.to_string())),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    fn remove_dir(&self, path: &str) -> Result<()> {
        validate_path(path)?;
        if path.is_empty() {
            return Err(StoreError::InvalidPath("cannot remove the storage root".to_string()));
        }
        let mut nodes = self.nodes.write();
        match nodes.get(path) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => return Err(StoreError::NotADirectory(path.to_string())),
            None => return Err(StoreError::NotFound(path.to_string())),
        }
        if descendants(&nodes, path).next().is_some() {
            return Err(StoreError::DirectoryNotEmpty(path.to_string()));
        }
        nodes.remove(path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &str) -> Result<()> {
        validate_path(path)?;
        if path.is_empty() {
            return Err(StoreError::InvalidPath("cannot remove the storage root".to_string()));
        }
        let mut nodes = self.nodes.write();
        match nodes.get(path) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => return Err(StoreError::NotADirectory(path.to_string())),
            None => return Err(StoreError::NotFound(path.to_string())),
        }
        let doomed: Vec<String> = descendants(&nodes, path).cloned().collect();
        for key in doomed {
            nodes.remove(&key);
        }
        nodes.remove(path);
        Ok(())
    }
}
