//! Node construction policy.

use crate::tree::node::Node;
use std::path::Path;

/// Decides how (and whether) storage paths become nodes.
///
/// `file_node` may decline a path by returning `None`, e.g. an unsupported
/// file type the application does not want in the tree. The tree treats a
/// declined file as "no node created", never as an error.
pub trait NodeFactory {
    fn file_node(&self, path: &Path) -> Option<Node>;

    fn folder_node(&self, path: &Path, is_root: bool) -> Node;
}

/// Factory that models every listed path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactory;

impl NodeFactory for DefaultFactory {
    fn file_node(&self, path: &Path) -> Option<Node> {
        Some(Node::file(path.to_path_buf()))
    }

    fn folder_node(&self, path: &Path, is_root: bool) -> Node {
        Node::folder(path.to_path_buf(), is_root)
    }
}
