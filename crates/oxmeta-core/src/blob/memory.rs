//! In-memory blob store.

use parking_lot::Mutex;
use std::collections::BTreeMap;

use super::{BlobPath, BlobStore, Node, NodeKind, StorageError, StorageResult};

#[derive(Debug, Clone)]
enum Entry {
    Folder,
    File(Vec<u8>),
}

impl Entry {
    fn kind(&self) -> NodeKind {
        match self {
            Entry::Folder => NodeKind::Folder,
            Entry::File(_) => NodeKind::File,
        }
    }
}

/// Blob store kept entirely in process memory.
///
/// All primitives run under a single mutex, so every call is trivially
/// atomic. The root folder always exists.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    nodes: Mutex<BTreeMap<BlobPath, Entry>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes (files and folders, excluding the root).
    pub fn node_count(&self) -> usize {
        self.nodes.lock().len()
    }

    fn kind_of(nodes: &BTreeMap<BlobPath, Entry>, path: &BlobPath) -> Option<NodeKind> {
        if path.is_root() {
            return Some(NodeKind::Folder);
        }
        nodes.get(path).map(Entry::kind)
    }

    fn require_parent(nodes: &BTreeMap<BlobPath, Entry>, path: &BlobPath) -> StorageResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidPath {
                path: path.clone(),
                reason: "the root is not a file".to_string(),
            })?;
        match Self::kind_of(nodes, &parent) {
            Some(NodeKind::Folder) => Ok(()),
            Some(NodeKind::File) => Err(StorageError::NotAFolder { path: parent }),
            None => Err(StorageError::NotFound { path: parent }),
        }
    }

    fn subtree(nodes: &BTreeMap<BlobPath, Entry>, path: &BlobPath) -> Vec<BlobPath> {
        nodes
            .keys()
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect()
    }
}

impl BlobStore for MemoryBlobStore {
    fn node_kind(&self, path: &BlobPath) -> StorageResult<Option<NodeKind>> {
        Ok(Self::kind_of(&self.nodes.lock(), path))
    }

    fn create_folder(&self, path: &BlobPath) -> StorageResult<()> {
        let mut nodes = self.nodes.lock();
        match Self::kind_of(&nodes, path) {
            Some(NodeKind::Folder) => return Err(StorageError::AlreadyExists { path: path.clone() }),
            Some(NodeKind::File) => return Err(StorageError::NotAFolder { path: path.clone() }),
            None => {}
        }

        // Validate every ancestor before touching anything.
        let mut missing = vec![path.clone()];
        let mut current = path.parent();
        while let Some(ancestor) = current {
            match Self::kind_of(&nodes, &ancestor) {
                Some(NodeKind::Folder) => break,
                Some(NodeKind::File) => return Err(StorageError::NotAFolder { path: ancestor }),
                None => {
                    current = ancestor.parent();
                    missing.push(ancestor);
                }
            }
        }
        for folder in missing {
            nodes.insert(folder, Entry::Folder);
        }
        Ok(())
    }

    fn list(&self, path: &BlobPath) -> StorageResult<Vec<Node>> {
        let nodes = self.nodes.lock();
        match Self::kind_of(&nodes, path) {
            Some(NodeKind::Folder) => {}
            Some(NodeKind::File) => return Err(StorageError::NotAFolder { path: path.clone() }),
            None => return Err(StorageError::NotFound { path: path.clone() }),
        }
        // BTreeMap order is path order, so children come out sorted by name.
        Ok(nodes
            .iter()
            .filter(|(p, _)| p.parent().as_ref() == Some(path))
            .map(|(p, e)| Node::new(p.clone(), e.kind()))
            .collect())
    }

    fn read(&self, path: &BlobPath) -> StorageResult<Vec<u8>> {
        let nodes = self.nodes.lock();
        match nodes.get(path) {
            Some(Entry::File(content)) => Ok(content.clone()),
            Some(Entry::Folder) => Err(StorageError::NotAFile { path: path.clone() }),
            None if path.is_root() => Err(StorageError::NotAFile { path: path.clone() }),
            None => Err(StorageError::NotFound { path: path.clone() }),
        }
    }

    fn create(&self, path: &BlobPath, content: &[u8]) -> StorageResult<()> {
        let mut nodes = self.nodes.lock();
        Self::require_parent(&nodes, path)?;
        if nodes.contains_key(path) {
            return Err(StorageError::AlreadyExists { path: path.clone() });
        }
        nodes.insert(path.clone(), Entry::File(content.to_vec()));
        Ok(())
    }

    fn write(&self, path: &BlobPath, content: &[u8]) -> StorageResult<()> {
        let mut nodes = self.nodes.lock();
        Self::require_parent(&nodes, path)?;
        if let Some(Entry::Folder) = nodes.get(path) {
            return Err(StorageError::NotAFile { path: path.clone() });
        }
        nodes.insert(path.clone(), Entry::File(content.to_vec()));
        Ok(())
    }

    fn rename(&self, from: &BlobPath, to: &BlobPath) -> StorageResult<()> {
        let mut nodes = self.nodes.lock();
        let Some(source_kind) = nodes.get(from).map(Entry::kind) else {
            return Err(StorageError::NotFound { path: from.clone() });
        };
        if from == to {
            return Ok(());
        }
        Self::require_parent(&nodes, to)?;
        match Self::kind_of(&nodes, to) {
            Some(NodeKind::Folder) => return Err(StorageError::AlreadyExists { path: to.clone() }),
            Some(NodeKind::File) if source_kind == NodeKind::Folder => {
                return Err(StorageError::AlreadyExists { path: to.clone() });
            }
            _ => {}
        }
        if to.starts_with(from) {
            return Err(StorageError::InvalidPath {
                path: to.clone(),
                reason: format!("cannot move '{from}' beneath itself"),
            });
        }

        for old in Self::subtree(&nodes, from) {
            if let Some(entry) = nodes.remove(&old) {
                let suffix = old.as_str()[from.as_str().len()..].trim_start_matches('/');
                let new = if suffix.is_empty() { to.clone() } else { to.join(suffix) };
                nodes.insert(new, entry);
            }
        }
        Ok(())
    }

    fn remove(&self, path: &BlobPath) -> StorageResult<()> {
        if path.is_root() {
            return Err(StorageError::InvalidPath {
                path: path.clone(),
                reason: "the root cannot be removed".to_string(),
            });
        }
        let mut nodes = self.nodes.lock();
        if !nodes.contains_key(path) {
            return Err(StorageError::NotFound { path: path.clone() });
        }
        for p in Self::subtree(&nodes, path) {
            nodes.remove(&p);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> BlobPath {
        BlobPath::new(s)
    }

    #[test]
    fn test_create_folder_creates_parents() {
        let store = MemoryBlobStore::new();
        store.create_folder(&p("meta-data/42")).unwrap();
        assert_eq!(store.node_kind(&p("meta-data")).unwrap(), Some(NodeKind::Folder));
        assert_eq!(store.node_kind(&p("meta-data/42")).unwrap(), Some(NodeKind::Folder));
        assert!(store.create_folder(&p("meta-data/42")).unwrap_err().is_already_exists());
    }

    #[test]
    fn test_create_requires_parent_folder() {
        let store = MemoryBlobStore::new();
        assert!(store.create(&p("missing/file"), b"x").unwrap_err().is_not_found());
        store.create(&p("top"), b"x").unwrap();
        assert!(matches!(
            store.create(&p("top/child"), b"y"),
            Err(StorageError::NotAFolder { .. })
        ));
    }

    #[test]
    fn test_create_is_exclusive_and_write_replaces() {
        let store = MemoryBlobStore::new();
        store.create(&p("f"), b"one").unwrap();
        assert!(store.create(&p("f"), b"two").unwrap_err().is_already_exists());
        assert_eq!(store.read(&p("f")).unwrap(), b"one");

        store.write(&p("f"), b"two").unwrap();
        assert_eq!(store.read(&p("f")).unwrap(), b"two");
    }

    #[test]
    fn test_list_returns_direct_children_sorted() {
        let store = MemoryBlobStore::new();
        store.create_folder(&p("d/sub")).unwrap();
        store.write(&p("d/b.txt"), b"").unwrap();
        store.write(&p("d/a.txt"), b"").unwrap();
        store.write(&p("d/sub/deep.txt"), b"").unwrap();

        let names: Vec<_> = store.list(&p("d")).unwrap().into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);

        let root: Vec<_> = store.list(&BlobPath::root()).unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].kind, NodeKind::Folder);
    }

    #[test]
    fn test_rename_file_replaces_target() {
        let store = MemoryBlobStore::new();
        store.write(&p("a.e2e-to-save"), b"new").unwrap();
        store.write(&p("a"), b"old").unwrap();
        store.rename(&p("a.e2e-to-save"), &p("a")).unwrap();
        assert_eq!(store.read(&p("a")).unwrap(), b"new");
        assert_eq!(store.node_kind(&p("a.e2e-to-save")).unwrap(), None);
    }

    #[test]
    fn test_rename_folder_moves_subtree() {
        let store = MemoryBlobStore::new();
        store.create_folder(&p("dir.e2e-to-delete/inner")).unwrap();
        store.write(&p("dir.e2e-to-delete/inner/f"), b"keep").unwrap();

        store.rename(&p("dir.e2e-to-delete"), &p("dir")).unwrap();
        assert_eq!(store.read(&p("dir/inner/f")).unwrap(), b"keep");
        assert_eq!(store.node_kind(&p("dir.e2e-to-delete")).unwrap(), None);
        assert_eq!(store.node_count(), 3);
    }

    #[test]
    fn test_rename_onto_folder_is_rejected() {
        let store = MemoryBlobStore::new();
        store.create_folder(&p("target")).unwrap();
        store.write(&p("source"), b"x").unwrap();
        assert!(store.rename(&p("source"), &p("target")).unwrap_err().is_already_exists());
    }

    #[test]
    fn test_remove_folder_removes_subtree_only() {
        let store = MemoryBlobStore::new();
        store.create_folder(&p("meta-data/1")).unwrap();
        store.create_folder(&p("meta-data/10")).unwrap();
        store.write(&p("meta-data/1/meta.data"), b"x").unwrap();

        store.remove(&p("meta-data/1")).unwrap();
        assert_eq!(store.node_kind(&p("meta-data/1/meta.data")).unwrap(), None);
        assert_eq!(store.node_kind(&p("meta-data/10")).unwrap(), Some(NodeKind::Folder));
        assert!(store.remove(&p("meta-data/1")).unwrap_err().is_not_found());
    }
}
