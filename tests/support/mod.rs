//! Shared fixtures for integration tests.
#![allow(dead_code)]

use arbor::events::{NodeChange, TreeObserver};
use arbor::factory::{DefaultFactory, NodeFactory};
use arbor::storage::mem::MemoryIo;
use arbor::storage::ProjectIo;
use arbor::tree::Tree;
use arbor::types::NodeId;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Storage seeded with the `/proj` layout used across the scenario tests:
/// one file `a.txt` and one subfolder `sub` containing `b.txt`.
pub fn seeded_io() -> MemoryIo {
    let io = MemoryIo::new("proj");
    io.add_dir("/proj");
    io.add_file("/proj/a.txt", "alpha");
    io.add_dir("/proj/sub");
    io.add_file("/proj/sub/b.txt", "beta");
    io
}

pub fn open_tree(io: &MemoryIo) -> Tree<MemoryIo, DefaultFactory> {
    Tree::open(io.clone(), DefaultFactory, "/proj").unwrap()
}

/// Child id matching the given leaf name, if any.
pub fn child_named<IO: ProjectIo, F: NodeFactory>(
    tree: &Tree<IO, F>,
    folder: NodeId,
    name: &str,
) -> Option<NodeId> {
    tree.children(folder)
        .unwrap()
        .iter()
        .copied()
        .find(|child| tree.name(*child).unwrap() == name)
}

/// Leaf names of a folder's children, sorted.
pub fn child_names<IO: ProjectIo, F: NodeFactory>(tree: &Tree<IO, F>, folder: NodeId) -> Vec<String> {
    let mut names: Vec<String> = tree
        .children(folder)
        .unwrap()
        .iter()
        .map(|child| tree.name(*child).unwrap())
        .collect();
    names.sort();
    names
}

/// Observer that records committed changes and refresh notifications.
/// Clones share the same logs, so a test keeps one copy for assertions.
#[derive(Clone, Default)]
pub struct Recorder {
    pub changes: Rc<RefCell<Vec<NodeChange>>>,
    pub refreshes: Rc<RefCell<Vec<PathBuf>>>,
}

impl TreeObserver for Recorder {
    fn committed(&mut self, change: &NodeChange) {
        self.changes.borrow_mut().push(change.clone());
    }

    fn refreshed(&mut self, folder: &Path) {
        self.refreshes.borrow_mut().push(folder.to_path_buf());
    }
}

/// Observer that vetoes every previewed change.
pub struct Veto(pub &'static str);

impl TreeObserver for Veto {
    fn preview(&mut self, _change: &NodeChange) -> Result<(), String> {
        Err(self.0.to_string())
    }
}
