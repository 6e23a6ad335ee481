//! Property tests: structural consistency under arbitrary operation sequences.

mod support;

use arbor::factory::DefaultFactory;
use arbor::storage::mem::MemoryIo;
use arbor::tree::Tree;
use arbor::types::NodeId;
use proptest::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;

type TestTree = Tree<MemoryIo, DefaultFactory>;

#[derive(Debug, Clone)]
enum Op {
    CreateFile { node: u8, name: u8 },
    CreateFolder { node: u8, name: u8 },
    Rename { node: u8, name: u8 },
    Move { node: u8, dest: u8 },
    Delete { node: u8 },
    Refresh { node: u8 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<u8>(), any::<u8>()).prop_map(|(node, name)| Op::CreateFile { node, name }),
        (any::<u8>(), any::<u8>()).prop_map(|(node, name)| Op::CreateFolder { node, name }),
        (any::<u8>(), any::<u8>()).prop_map(|(node, name)| Op::Rename { node, name }),
        (any::<u8>(), any::<u8>()).prop_map(|(node, dest)| Op::Move { node, dest }),
        any::<u8>().prop_map(|node| Op::Delete { node }),
        any::<u8>().prop_map(|node| Op::Refresh { node }),
    ]
}

/// Every node reachable from the root, breadth-first.
fn attached_ids(tree: &TestTree) -> Vec<NodeId> {
    let mut ids = vec![tree.root()];
    let mut index = 0;
    while index < ids.len() {
        let id = ids[index];
        index += 1;
        if tree.is_folder(id).unwrap() && !tree.is_deleted(id).unwrap() {
            ids.extend(tree.children(id).unwrap().iter().copied());
        }
    }
    ids
}

fn pick(ids: &[NodeId], selector: u8) -> NodeId {
    ids[selector as usize % ids.len()]
}

/// Operations are allowed to fail (deleted targets, collisions, vetoes by
/// storage); the property is about the state left behind, not about success.
fn apply(tree: &mut TestTree, op: Op) {
    let ids = attached_ids(tree);
    match op {
        Op::CreateFile { node, name } => {
            let _ = tree.create_file(pick(&ids, node), &format!("f{}.txt", name % 6), b"x");
        }
        Op::CreateFolder { node, name } => {
            let _ = tree.create_folder(pick(&ids, node), &format!("d{}", name % 6));
        }
        Op::Rename { node, name } => {
            let _ = tree.rename(pick(&ids, node), &format!("n{}", name % 6));
        }
        Op::Move { node, dest } => {
            let target = pick(&ids, dest);
            if tree.is_folder(target).unwrap() {
                let dir = tree.path(target).unwrap().to_path_buf();
                let _ = tree.move_to(pick(&ids, node), &dir);
            }
        }
        Op::Delete { node } => {
            let _ = tree.delete(pick(&ids, node));
        }
        Op::Refresh { node } => {
            let id = pick(&ids, node);
            if tree.is_folder(id).unwrap() {
                let _ = tree.refresh(id);
            }
        }
    }
}

/// The core correctness property: every attached child's path places it
/// physically inside its logical parent, parent back-links agree with the
/// child collections, and no folder holds two children with the same name.
fn assert_tree_consistent(tree: &TestTree) {
    let mut stack = vec![tree.root()];
    while let Some(folder) = stack.pop() {
        if !tree.is_folder(folder).unwrap() || tree.is_deleted(folder).unwrap() {
            continue;
        }
        let folder_path = tree.path(folder).unwrap().to_path_buf();
        let is_root = tree.is_root(folder).unwrap();
        let mut names: HashSet<String> = HashSet::new();
        for child in tree.children(folder).unwrap().to_vec() {
            let child_path = tree.path(child).unwrap().to_path_buf();
            let owned = child_path.parent() == Some(folder_path.as_path())
                || (is_root && child_path.components().count() == 1);
            assert!(
                owned,
                "child {} not physically inside folder {}",
                child_path.display(),
                folder_path.display()
            );
            assert_eq!(tree.parent(child).unwrap(), Some(folder));
            assert!(!tree.is_deleted(child).unwrap());
            assert!(
                names.insert(tree.name(child).unwrap()),
                "duplicate sibling name under {}",
                folder_path.display()
            );
            stack.push(child);
        }
    }
}

proptest! {
    #[test]
    fn ownership_invariant_survives_random_operations(
        ops in proptest::collection::vec(op_strategy(), 1..16)
    ) {
        let io = support::seeded_io();
        let mut tree = Tree::open(io, DefaultFactory, "/proj").unwrap();
        for op in ops {
            apply(&mut tree, op);
            assert_tree_consistent(&tree);
        }
    }

    #[test]
    fn refresh_converges_after_random_operations(
        ops in proptest::collection::vec(op_strategy(), 1..16)
    ) {
        let io = support::seeded_io();
        let mut tree = Tree::open(io, DefaultFactory, "/proj").unwrap();
        for op in ops {
            apply(&mut tree, op);
        }
        if !tree.is_deleted(tree.root()).unwrap() {
            tree.refresh(tree.root()).unwrap();
            let once: Vec<PathBuf> = attached_ids(&tree)
                .iter()
                .map(|id| tree.path(*id).unwrap().to_path_buf())
                .collect();
            tree.refresh(tree.root()).unwrap();
            let twice: Vec<PathBuf> = attached_ids(&tree)
                .iter()
                .map(|id| tree.path(*id).unwrap().to_path_buf())
                .collect();
            prop_assert_eq!(once, twice);
        }
    }
}
