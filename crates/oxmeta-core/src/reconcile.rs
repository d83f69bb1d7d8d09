//! Reconciliation of tagged files in an end-to-end encrypted folder.
//!
//! While a folder is locked, clients upload new or replaced files under a
//! `.e2e-to-save` suffix and mark files for removal by renaming them with a
//! `.e2e-to-delete` suffix. When the lock is released the tags are resolved:
//!
//! | Tag              | finalize                  | revert                    |
//! |------------------|---------------------------|---------------------------|
//! | `.e2e-to-save`   | rename to the base name   | remove                    |
//! | `.e2e-to-delete` | remove                    | rename to the base name   |
//!
//! Only direct children are inspected.

use tracing::{debug, info, instrument};

use crate::blob::{BlobPath, BlobStore, Node, StorageError, StorageResult};

/// Suffix of files that become visible when changes are finalized.
pub const SAVE_SUFFIX: &str = ".e2e-to-save";
/// Suffix of files that are removed when changes are finalized.
pub const DELETE_SUFFIX: &str = ".e2e-to-delete";

/// Pending change encoded in a node's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingChange {
    Save,
    Delete,
}

/// Classify a node name, returning the pending change and the base name.
///
/// A name that consists only of a suffix has no base name and is not tagged.
pub fn classify(name: &str) -> Option<(PendingChange, &str)> {
    let tagged = name
        .strip_suffix(SAVE_SUFFIX)
        .map(|base| (PendingChange::Save, base))
        .or_else(|| {
            name.strip_suffix(DELETE_SUFFIX)
                .map(|base| (PendingChange::Delete, base))
        });
    tagged.filter(|(_, base)| !base.is_empty())
}

/// Tagged children of a folder, split by pending change.
#[derive(Debug, Default)]
pub struct IntermediateFiles<'a> {
    pub to_save: Vec<&'a Node>,
    pub to_delete: Vec<&'a Node>,
}

impl<'a> IntermediateFiles<'a> {
    pub fn partition(children: &'a [Node]) -> Self {
        let mut files = Self::default();
        for node in children {
            match classify(&node.name) {
                Some((PendingChange::Save, _)) => files.to_save.push(node),
                Some((PendingChange::Delete, _)) => files.to_delete.push(node),
                None => {}
            }
        }
        files
    }

    pub fn is_empty(&self) -> bool {
        self.to_save.is_empty() && self.to_delete.is_empty()
    }
}

/// Path of a tagged node with its tag stripped.
fn untagged_path(node: &Node) -> StorageResult<BlobPath> {
    let base = classify(&node.name).map_or(node.name.as_str(), |(_, base)| base);
    node.path
        .with_file_name(base)
        .ok_or_else(|| StorageError::InvalidPath {
            path: node.path.clone(),
            reason: "tagged node has no parent folder".to_string(),
        })
}

fn promote<S: BlobStore + ?Sized>(store: &S, node: &Node) -> StorageResult<()> {
    let target = untagged_path(node)?;
    store.rename(&node.path, &target)?;
    debug!(from = %node.path, to = %target, "Renamed tagged node");
    Ok(())
}

fn drop_node<S: BlobStore + ?Sized>(store: &S, node: &Node) -> StorageResult<()> {
    store.remove(&node.path)?;
    debug!(path = %node.path, "Removed tagged node");
    Ok(())
}

/// Apply pending changes: saves become visible, deletions happen.
///
/// Returns whether anything was changed.
pub fn finalize<S: BlobStore + ?Sized>(store: &S, children: &[Node]) -> StorageResult<bool> {
    let files = IntermediateFiles::partition(children);
    for node in &files.to_save {
        promote(store, node)?;
    }
    for node in &files.to_delete {
        drop_node(store, node)?;
    }
    Ok(!files.is_empty())
}

/// Abandon pending changes: saves are dropped, deletions are undone.
///
/// Returns whether anything was changed.
pub fn revert<S: BlobStore + ?Sized>(store: &S, children: &[Node]) -> StorageResult<bool> {
    let files = IntermediateFiles::partition(children);
    for node in &files.to_save {
        drop_node(store, node)?;
    }
    for node in &files.to_delete {
        promote(store, node)?;
    }
    Ok(!files.is_empty())
}

/// List `folder` and [`finalize`] its children.
#[instrument(level = "debug", skip(store), fields(folder = %folder))]
pub fn finalize_changes<S: BlobStore + ?Sized>(store: &S, folder: &BlobPath) -> StorageResult<bool> {
    let children = store.list(folder)?;
    let changed = finalize(store, &children)?;
    if changed {
        info!("Finalized pending changes");
    }
    Ok(changed)
}

/// List `folder` and [`revert`] its children.
#[instrument(level = "debug", skip(store), fields(folder = %folder))]
pub fn revert_changes<S: BlobStore + ?Sized>(store: &S, folder: &BlobPath) -> StorageResult<bool> {
    let children = store.list(folder)?;
    let changed = revert(store, &children)?;
    if changed {
        info!("Reverted pending changes");
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{MemoryBlobStore, NodeKind};
    use proptest::prelude::*;

    fn folder_with(names: &[&str]) -> (MemoryBlobStore, BlobPath) {
        let store = MemoryBlobStore::new();
        let folder = BlobPath::new("alice/files/secret");
        store.create_folder(&folder).unwrap();
        for name in names {
            store.write(&folder.join(name), name.as_bytes()).unwrap();
        }
        (store, folder)
    }

    fn names(store: &MemoryBlobStore, folder: &BlobPath) -> Vec<String> {
        store.list(folder).unwrap().into_iter().map(|n| n.name).collect()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("a.txt.e2e-to-save"), Some((PendingChange::Save, "a.txt")));
        assert_eq!(classify("b.e2e-to-delete"), Some((PendingChange::Delete, "b")));
        assert_eq!(classify("plain.txt"), None);
        assert_eq!(classify(".e2e-to-save"), None);
        assert_eq!(classify(".e2e-to-delete"), None);
        // Only the outermost tag counts.
        assert_eq!(
            classify("x.e2e-to-delete.e2e-to-save"),
            Some((PendingChange::Save, "x.e2e-to-delete"))
        );
    }

    #[test]
    fn test_finalize_and_revert_empty_input() {
        let store = MemoryBlobStore::new();
        assert!(!finalize(&store, &[]).unwrap());
        assert!(!revert(&store, &[]).unwrap());
    }

    #[test]
    fn test_finalize_untagged_only_changes_nothing() {
        let (store, folder) = folder_with(&["a", "b.txt"]);
        assert!(!finalize_changes(&store, &folder).unwrap());
        assert!(!revert_changes(&store, &folder).unwrap());
        assert_eq!(names(&store, &folder), vec!["a", "b.txt"]);
    }

    #[test]
    fn test_finalize_changes() {
        let (store, folder) = folder_with(&["a", "b.e2e-to-save", "c.e2e-to-delete", "d"]);

        assert!(finalize_changes(&store, &folder).unwrap());
        assert_eq!(names(&store, &folder), vec!["a", "b", "d"]);
        assert_eq!(store.read(&folder.join("b")).unwrap(), b"b.e2e-to-save");
    }

    #[test]
    fn test_finalize_replaces_existing_base_file() {
        let (store, folder) = folder_with(&["doc", "doc.e2e-to-save"]);
        assert!(finalize_changes(&store, &folder).unwrap());
        assert_eq!(names(&store, &folder), vec!["doc"]);
        assert_eq!(store.read(&folder.join("doc")).unwrap(), b"doc.e2e-to-save");
    }

    #[test]
    fn test_revert_changes() {
        let (store, folder) = folder_with(&["a", "b.e2e-to-save", "c.e2e-to-delete", "d"]);

        assert!(revert_changes(&store, &folder).unwrap());
        assert_eq!(names(&store, &folder), vec!["a", "c", "d"]);
        assert_eq!(store.read(&folder.join("c")).unwrap(), b"c.e2e-to-delete");
    }

    #[test]
    fn test_tagged_folders_move_with_contents() {
        let (store, folder) = folder_with(&[]);
        store.create_folder(&folder.join("photos.e2e-to-delete")).unwrap();
        store
            .write(&folder.join("photos.e2e-to-delete/1.jpg"), b"jpg")
            .unwrap();

        assert!(revert_changes(&store, &folder).unwrap());
        assert_eq!(store.node_kind(&folder.join("photos")).unwrap(), Some(NodeKind::Folder));
        assert_eq!(store.read(&folder.join("photos/1.jpg")).unwrap(), b"jpg");
    }

    #[test]
    fn test_missing_folder_is_not_found() {
        let store = MemoryBlobStore::new();
        let err = finalize_changes(&store, &BlobPath::new("nope")).unwrap_err();
        assert!(err.is_not_found());
    }

    proptest! {
        #[test]
        fn prop_partition_follows_suffix(
            bases in prop::collection::btree_set("[a-z0-9_]{1,12}", 0..12),
            tags in prop::collection::vec(0u8..3, 12),
        ) {
            let nodes: Vec<Node> = bases
                .iter()
                .zip(tags.iter().cycle())
                .map(|(base, tag)| {
                    let name = match tag {
                        0 => format!("{base}{SAVE_SUFFIX}"),
                        1 => format!("{base}{DELETE_SUFFIX}"),
                        _ => base.clone(),
                    };
                    Node::new(BlobPath::new("f").join(name), NodeKind::File)
                })
                .collect();

            let files = IntermediateFiles::partition(&nodes);
            for node in &files.to_save {
                prop_assert!(node.name.ends_with(SAVE_SUFFIX));
            }
            for node in &files.to_delete {
                prop_assert!(node.name.ends_with(DELETE_SUFFIX));
            }
            let untagged = nodes.len() - files.to_save.len() - files.to_delete.len();
            let plain = nodes
                .iter()
                .filter(|n| !n.name.ends_with(SAVE_SUFFIX) && !n.name.ends_with(DELETE_SUFFIX))
                .count();
            prop_assert_eq!(untagged, plain);
        }

        #[test]
        fn prop_untagged_names_are_never_touched(base in "[a-zA-Z0-9 _-]{1,20}") {
            let (store, folder) = folder_with(&[base.as_str()]);
            prop_assert!(!finalize_changes(&store, &folder).unwrap());
            prop_assert!(!revert_changes(&store, &folder).unwrap());
            prop_assert_eq!(names(&store, &folder), vec![base.clone()]);
        }
    }
}
