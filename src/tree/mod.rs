//! Tree arena and structural operations.
//!
//! The tree owns every node in a single arena indexed by `NodeId`. Parent
//! references are plain indices, so deleting a subtree can never leave a
//! dangling owning reference; a deleted node keeps its slot and turns inert.
//!
//! All child-collection mutation funnels through [`Tree::attach`] and the
//! internal detach, which together uphold the ownership invariant: a node's
//! logical parent always matches the directory portion of its path. A node
//! that arrives with a foreign path is physically moved into the folder
//! before it is accepted logically.

pub mod node;
mod reconcile;

use crate::error::{StorageError, TreeError};
use crate::events::{NodeChange, TreeObserver};
use crate::factory::NodeFactory;
use crate::storage::ProjectIo;
use crate::tree::node::Node;
use crate::types::NodeId;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Treat `./x` and `x` as the same path.
pub(crate) fn normalize(path: &Path) -> &Path {
    path.strip_prefix(".").unwrap_or(path)
}

/// Path identity with `./` tolerance.
pub(crate) fn same_path(a: &Path, b: &Path) -> bool {
    normalize(a) == normalize(b)
}

/// Directory portion of a path, `None` for a bare single segment.
fn dir_of(path: &Path) -> Option<&Path> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Some(dir),
        _ => None,
    }
}

fn leaf_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Whether `path` physically lives directly inside the given folder.
///
/// Direct children of the root additionally satisfy the invariant with a bare
/// single-segment path, which is what listings return for trees rooted at the
/// current directory.
fn belongs_to(folder_path: &Path, folder_is_root: bool, path: &Path) -> bool {
    if let Some(dir) = dir_of(path) {
        if same_path(dir, folder_path) {
            return true;
        }
    }
    folder_is_root && normalize(path).components().count() == 1
}

fn validate_name(name: &str) -> Result<(), TreeError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return Err(TreeError::InvalidRename(name.to_string()));
    }
    Ok(())
}

/// In-memory mirror of a directory subtree.
pub struct Tree<IO, F> {
    io: IO,
    factory: F,
    nodes: Vec<Node>,
    root: NodeId,
    observers: Vec<Box<dyn TreeObserver>>,
}

impl<IO: ProjectIo, F: NodeFactory> Tree<IO, F> {
    /// Open a tree rooted at `root_path`, reconciling the whole subtree
    /// against storage before returning.
    pub fn open(io: IO, factory: F, root_path: impl Into<PathBuf>) -> Result<Self, TreeError> {
        let root_path = root_path.into();
        let root_node = factory.folder_node(&root_path, true);
        let mut tree = Tree {
            io,
            factory,
            nodes: vec![root_node],
            root: NodeId(0),
            observers: Vec::new(),
        };
        tree.reconcile(tree.root)?;
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn add_observer(&mut self, observer: Box<dyn TreeObserver>) {
        self.observers.push(observer);
    }

    // ----- accessors -----

    pub fn path(&self, id: NodeId) -> Result<&Path, TreeError> {
        Ok(self.node(id)?.path())
    }

    /// Last path segment, or the storage-supplied display name for the root.
    pub fn name(&self, id: NodeId) -> Result<String, TreeError> {
        let node = self.node(id)?;
        if node.is_root() {
            Ok(self.io.root_name())
        } else {
            Ok(node.leaf_name())
        }
    }

    pub fn absolute_path(&self, id: NodeId) -> Result<PathBuf, TreeError> {
        let node = self.node(id)?;
        Ok(self.io.absolute_path(&node.path)?)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], TreeError> {
        let node = self.node(id)?;
        if !node.is_folder() {
            return Err(TreeError::NotAFolder(node.path.clone()));
        }
        Ok(node.children())
    }

    pub fn is_deleted(&self, id: NodeId) -> Result<bool, TreeError> {
        Ok(self.node(id)?.is_deleted())
    }

    pub fn is_folder(&self, id: NodeId) -> Result<bool, TreeError> {
        Ok(self.node(id)?.is_folder())
    }

    pub fn is_root(&self, id: NodeId) -> Result<bool, TreeError> {
        Ok(self.node(id)?.is_root())
    }

    pub fn open_in_explorer(&self, id: NodeId) -> Result<(), TreeError> {
        let node = self.node(id)?;
        Ok(self.io.open_in_explorer(&node.path)?)
    }

    // ----- file content -----

    pub fn data(&self, id: NodeId) -> Result<Vec<u8>, TreeError> {
        let node = self.file_node(id)?;
        Ok(self.io.read_raw(&node.path)?)
    }

    pub fn text(&self, id: NodeId) -> Result<String, TreeError> {
        let node = self.file_node(id)?;
        Ok(self.io.read_text(&node.path)?)
    }

    pub fn set_data(&mut self, id: NodeId, content: &[u8]) -> Result<(), TreeError> {
        let node = self.live(id)?;
        if node.is_folder() {
            return Err(TreeError::NotAFile(node.path.clone()));
        }
        let path = node.path.clone();
        let old = self.io.read_raw(&path)?;
        let change = NodeChange::Modified {
            path: path.clone(),
            old,
            new: content.to_vec(),
        };
        self.preview(&change)?;
        self.io.write_file(&path, content)?;
        self.commit(&change);
        Ok(())
    }

    pub fn set_text(&mut self, id: NodeId, content: &str) -> Result<(), TreeError> {
        self.set_data(id, content.as_bytes())
    }

    // ----- structural operations -----

    /// Create a subdirectory and register it as a child.
    ///
    /// Returns `Ok(None)` when the name collides with an existing sibling;
    /// nothing is touched, physically or logically.
    pub fn create_folder(&mut self, folder: NodeId, name: &str) -> Result<Option<NodeId>, TreeError> {
        validate_name(name)?;
        let parent = self.live_folder(folder)?;
        let path = parent.path.join(name);
        if self.find_child(folder, &path).is_some() || self.child_named(folder, name).is_some() {
            return Ok(None);
        }
        let change = NodeChange::Created { path: path.clone() };
        self.preview(&change)?;
        self.io.create_directory(&path)?;
        let created = self.insert_folder(folder, path)?;
        if created.is_some() {
            self.commit(&change);
        }
        Ok(created)
    }

    /// Create a file and register it as a child.
    ///
    /// `Ok(None)` when the name collides with an existing sibling (nothing is
    /// touched) or when the factory declines to model the file (the file is
    /// still created physically).
    pub fn create_file(
        &mut self,
        folder: NodeId,
        name: &str,
        content: &[u8],
    ) -> Result<Option<NodeId>, TreeError> {
        validate_name(name)?;
        let parent = self.live_folder(folder)?;
        let path = parent.path.join(name);
        if self.find_child(folder, &path).is_some() || self.child_named(folder, name).is_some() {
            return Ok(None);
        }
        let change = NodeChange::Created { path: path.clone() };
        self.preview(&change)?;
        self.io.create_file(&path, content)?;
        let created = self.insert_file(folder, path)?;
        if created.is_some() {
            self.commit(&change);
        }
        Ok(created)
    }

    /// Rename a node in place.
    ///
    /// Names are validated (non-empty, no separators); renaming to the
    /// current name is a no-op and renaming onto an existing sibling fails
    /// before any I/O. On success every descendant path follows the renamed
    /// prefix, since the physical move relocated the whole subtree.
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<(), TreeError> {
        let node = self.live(id)?;
        let is_folder = node.is_folder();
        validate_name(new_name)?;
        if new_name == self.name(id)? {
            return Ok(());
        }
        let from = self.node(id)?.path.clone();
        let to = match dir_of(&from) {
            Some(dir) => dir.join(new_name),
            None => PathBuf::from(new_name),
        };
        if let Some(parent) = self.nodes[id.0].parent {
            if self.child_named(parent, new_name).is_some() {
                return Err(TreeError::Move {
                    from,
                    to: to.clone(),
                    source: StorageError::AlreadyExists(to),
                });
            }
        }
        let change = NodeChange::Renamed {
            from: from.clone(),
            to: to.clone(),
        };
        self.preview(&change)?;
        self.io
            .move_path(&from, &to)
            .map_err(|source| TreeError::Move {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;
        self.apply_move(id, to);
        if is_folder {
            self.reassert_children(id)?;
        }
        self.commit(&change);
        Ok(())
    }

    /// Move a node into the directory at `new_dir`, keeping its leaf name.
    ///
    /// If a folder in this tree mirrors `new_dir`, the node is handed over to
    /// it (subject to the usual duplicate rejection); otherwise it is left
    /// unattached until a refresh picks it up.
    pub fn move_to(&mut self, id: NodeId, new_dir: &Path) -> Result<(), TreeError> {
        let node = self.live(id)?;
        if node.is_folder() && normalize(new_dir).starts_with(normalize(&node.path)) {
            return Err(TreeError::RecursiveFolder);
        }
        self.relocate(id, new_dir)?;
        if self.nodes[id.0].is_root() {
            return Ok(());
        }
        if let Some(parent) = self.nodes[id.0].parent {
            self.detach_from(parent, id);
        }
        if let Some(dest) = self.folder_at(new_dir) {
            if dest != id {
                self.attach(dest, id)?;
            }
        }
        Ok(())
    }

    /// Physically delete the node (for folders, the whole subtree) and mark
    /// it inert. A second delete fails with `DeletedNode`.
    pub fn delete(&mut self, id: NodeId) -> Result<(), TreeError> {
        let path = self.live(id)?.path.clone();
        let change = NodeChange::Deleted { path: path.clone() };
        self.preview(&change)?;
        self.io.delete(&path)?;
        self.nodes[id.0].deleted = true;
        if let Some(parent) = self.nodes[id.0].parent {
            self.detach_from(parent, id);
        }
        trace!(path = %path.display(), "deleted node");
        self.commit(&change);
        Ok(())
    }

    /// Reconcile the folder's children against the live storage listing,
    /// then notify observers. Idempotent when storage has not changed.
    pub fn refresh(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.live_folder(id)?;
        self.reconcile(id)?;
        let path = self.nodes[id.0].path.clone();
        for observer in &mut self.observers {
            observer.refreshed(&path);
        }
        Ok(())
    }

    // ----- child-collection choke point -----

    /// Insert `child` into `folder`'s child collection.
    ///
    /// Every insertion lands here, whether it comes from explicit creation,
    /// reconciliation, or external code handing a node over. Rejects a folder
    /// inserted into itself, the root, and unknown or deleted nodes. Returns
    /// `Ok(false)` on duplicate path or sibling name, leaving both sides
    /// untouched. Otherwise enforces the ownership invariant, moving the node
    /// physically into the folder first if its path disagrees.
    pub fn attach(&mut self, folder: NodeId, child: NodeId) -> Result<bool, TreeError> {
        self.live_folder(folder)?;
        if folder == child {
            return Err(TreeError::RecursiveFolder);
        }
        // Also reject attaching a folder anywhere beneath itself.
        let mut cursor = self.nodes[folder.0].parent;
        while let Some(ancestor) = cursor {
            if ancestor == child {
                return Err(TreeError::RecursiveFolder);
            }
            cursor = self.nodes[ancestor.0].parent;
        }
        let child_node = self.live(child)?;
        if child_node.is_root() {
            return Err(TreeError::RootAttach);
        }
        let child_path = child_node.path.clone();
        let child_name = child_node.leaf_name();
        if self.find_child(folder, &child_path).is_some()
            || self.child_named(folder, &child_name).is_some()
        {
            return Ok(false);
        }
        self.take_ownership(folder, child)?;
        if let Some(previous) = self.nodes[child.0].parent {
            self.detach_from(previous, child);
        }
        self.nodes[child.0].parent = Some(folder);
        if let Some(children) = self.nodes[folder.0].children_mut() {
            children.push(child);
        }
        Ok(true)
    }

    /// Remove `child` from `folder`'s collection directly, destroying it in
    /// memory (marked deleted, detached). No physical I/O happens.
    pub fn remove(&mut self, folder: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.live_folder(folder)?;
        self.node(child)?;
        if self.nodes[child.0].parent == Some(folder) {
            self.detach_from(folder, child);
            self.nodes[child.0].deleted = true;
        }
        Ok(())
    }

    // ----- internals -----

    fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.nodes.get(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn live(&self, id: NodeId) -> Result<&Node, TreeError> {
        let node = self.node(id)?;
        if node.deleted {
            return Err(TreeError::DeletedNode(node.path.clone()));
        }
        Ok(node)
    }

    fn live_folder(&self, id: NodeId) -> Result<&Node, TreeError> {
        let node = self.live(id)?;
        if !node.is_folder() {
            return Err(TreeError::NotAFolder(node.path.clone()));
        }
        Ok(node)
    }

    fn file_node(&self, id: NodeId) -> Result<&Node, TreeError> {
        let node = self.node(id)?;
        if node.is_folder() {
            return Err(TreeError::NotAFile(node.path.clone()));
        }
        Ok(node)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        trace!(path = %node.path.display(), folder = node.is_folder(), "created node");
        self.nodes.push(node);
        id
    }

    pub(crate) fn find_child(&self, folder: NodeId, path: &Path) -> Option<NodeId> {
        self.nodes[folder.0]
            .children()
            .iter()
            .copied()
            .find(|child| same_path(&self.nodes[child.0].path, path))
    }

    fn child_named(&self, folder: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[folder.0]
            .children()
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].leaf_name() == name)
    }

    pub(crate) fn kind_child_at(&self, folder: NodeId, path: &Path, folders: bool) -> Option<NodeId> {
        self.nodes[folder.0]
            .children()
            .iter()
            .copied()
            .find(|child| {
                self.nodes[child.0].is_folder() == folders
                    && same_path(&self.nodes[child.0].path, path)
            })
    }

    fn folder_at(&self, path: &Path) -> Option<NodeId> {
        self.nodes.iter().enumerate().find_map(|(index, node)| {
            (!node.deleted && node.is_folder() && same_path(&node.path, path))
                .then_some(NodeId(index))
        })
    }

    /// Register a folder for `path`: duplicate-rejecting, loads its subtree
    /// on construction, then attaches.
    pub(crate) fn insert_folder(
        &mut self,
        folder: NodeId,
        path: PathBuf,
    ) -> Result<Option<NodeId>, TreeError> {
        if self.find_child(folder, &path).is_some()
            || self.child_named(folder, &leaf_of(&path)).is_some()
        {
            return Ok(None);
        }
        let node = self.factory.folder_node(&path, false);
        let id = self.alloc(node);
        self.reconcile(id)?;
        if self.attach(folder, id)? {
            Ok(Some(id))
        } else {
            Ok(None)
        }
    }

    /// Register a file node for `path`: duplicate-rejecting, and the factory
    /// may decline the file entirely.
    pub(crate) fn insert_file(
        &mut self,
        folder: NodeId,
        path: PathBuf,
    ) -> Result<Option<NodeId>, TreeError> {
        if self.find_child(folder, &path).is_some()
            || self.child_named(folder, &leaf_of(&path)).is_some()
        {
            return Ok(None);
        }
        let node = match self.factory.file_node(&path) {
            Some(node) => node,
            None => return Ok(None),
        };
        let id = self.alloc(node);
        if self.attach(folder, id)? {
            Ok(Some(id))
        } else {
            Ok(None)
        }
    }

    /// Physically move the node into `folder` if its path says it lives
    /// elsewhere.
    fn take_ownership(&mut self, folder: NodeId, child: NodeId) -> Result<(), TreeError> {
        let (folder_path, folder_is_root) = {
            let node = &self.nodes[folder.0];
            (node.path.clone(), node.is_root())
        };
        let child_path = self.nodes[child.0].path.clone();
        if !belongs_to(&folder_path, folder_is_root, &child_path) {
            self.relocate(child, &folder_path)?;
        }
        Ok(())
    }

    /// Move the node (and physically its subtree) into `new_dir`, firing the
    /// moved preview/commit pair. Parent links are not touched here.
    fn relocate(&mut self, id: NodeId, new_dir: &Path) -> Result<(), TreeError> {
        let from = self.nodes[id.0].path.clone();
        if from.file_name().is_none() {
            return Err(TreeError::Storage(StorageError::InvalidPath {
                path: from,
                reason: "path has no leaf segment to relocate".to_string(),
            }));
        }
        let to = new_dir.join(leaf_of(&from));
        if let Some(dest) = self.folder_at(new_dir) {
            if let Some(existing) = self.find_child(dest, &to) {
                if existing != id {
                    return Err(TreeError::Move {
                        from,
                        to: to.clone(),
                        source: StorageError::AlreadyExists(to),
                    });
                }
            }
        }
        let change = NodeChange::Moved {
            from: from.clone(),
            to: to.clone(),
        };
        self.preview(&change)?;
        self.io
            .move_path(&from, &to)
            .map_err(|source| TreeError::Move {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;
        self.apply_move(id, to);
        self.commit(&change);
        Ok(())
    }

    /// Update the node's path and rewrite every descendant's path under the
    /// new prefix. The descendants moved physically together with their
    /// ancestor, so memory follows without further I/O.
    fn apply_move(&mut self, id: NodeId, to: PathBuf) {
        let from = std::mem::replace(&mut self.nodes[id.0].path, to.clone());
        self.rewrite_descendants(id, &from, &to);
    }

    fn rewrite_descendants(&mut self, id: NodeId, old_prefix: &Path, new_prefix: &Path) {
        let children: Vec<NodeId> = self.nodes[id.0].children().to_vec();
        for child in children {
            let rewritten = self.nodes[child.0]
                .path
                .strip_prefix(old_prefix)
                .ok()
                .map(|rest| new_prefix.join(rest));
            if let Some(path) = rewritten {
                self.nodes[child.0].path = path;
            }
            self.rewrite_descendants(child, old_prefix, new_prefix);
        }
    }

    /// Re-assert the ownership invariant for every direct child after this
    /// folder's path changed.
    fn reassert_children(&mut self, folder: NodeId) -> Result<(), TreeError> {
        let children: Vec<NodeId> = self.nodes[folder.0].children().to_vec();
        for child in children {
            self.take_ownership(folder, child)?;
        }
        Ok(())
    }

    pub(crate) fn detach_from(&mut self, folder: NodeId, child: NodeId) {
        if let Some(children) = self.nodes[folder.0].children_mut() {
            children.retain(|existing| *existing != child);
        }
        if self.nodes[child.0].parent == Some(folder) {
            self.nodes[child.0].parent = None;
        }
    }

    pub(crate) fn mark_stale(&mut self, folder: NodeId, child: NodeId) {
        self.nodes[child.0].deleted = true;
        self.detach_from(folder, child);
    }

    fn preview(&mut self, change: &NodeChange) -> Result<(), TreeError> {
        for observer in &mut self.observers {
            observer.preview(change).map_err(TreeError::Vetoed)?;
        }
        Ok(())
    }

    fn commit(&mut self, change: &NodeChange) {
        for observer in &mut self.observers {
            observer.committed(change);
        }
    }
}

impl<IO, F> std::fmt::Debug for Tree<IO, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .finish()
    }
}
