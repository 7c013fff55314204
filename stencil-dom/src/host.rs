use std::fmt::Debug;
use std::hash::Hash;

use stencil_core::Handler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(String),
    Text,
    Fragment,
    Placeholder,
}

/// Primitive tree operations the engine needs from a host tree.
///
/// Nodes are handles: cloning a `Node` never clones the tree it refers to.
/// Inserting a fragment moves its children; removing a detached node does
/// nothing.
pub trait Host {
    type Node: Clone + Eq + Hash + Debug;

    fn kind(&self, node: &Self::Node) -> NodeKind;

    /// Deep copy, structurally identical to `node`.
    fn clone_node(&mut self, node: &Self::Node) -> Self::Node;

    /// Deep copy of a template element's children, as a fragment.
    fn clone_content(&mut self, template: &Self::Node) -> Self::Node;

    fn create_fragment(&mut self) -> Self::Node;

    /// An anchor with no visible effect.
    fn create_placeholder(&mut self) -> Self::Node;

    fn child(&self, node: &Self::Node, index: usize) -> Option<Self::Node>;
    fn child_count(&self, node: &Self::Node) -> usize;
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    fn text(&self, node: &Self::Node) -> String;
    fn set_text(&mut self, node: &Self::Node, text: &str);

    fn attributes(&self, node: &Self::Node) -> Vec<(String, String)>;
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);
    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    fn add_listener(&mut self, node: &Self::Node, event: &str, handler: Handler);
    fn remove_listener(&mut self, node: &Self::Node, event: &str, handler: &Handler);

    /// Insert `node` as the previous sibling of `anchor`.
    fn insert_before(&mut self, anchor: &Self::Node, node: &Self::Node);
    fn remove(&mut self, node: &Self::Node);

    /// Serialized form of `node` itself, used to detect template changes.
    fn outer_markup(&self, node: &Self::Node) -> String;

    fn children(&self, node: &Self::Node) -> Vec<Self::Node> {
        (0..self.child_count(node))
            .filter_map(|i| self.child(node, i))
            .collect()
    }
}
