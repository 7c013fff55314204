use indexmap::IndexMap;
use stencil_core::{EvalError, Handler, Value};
use tracing::warn;

use crate::host::{Host, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attrs: IndexMap<String, String>,
    text: String,
    listeners: Vec<(String, Handler)>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attrs: IndexMap::new(),
            text: String::new(),
            listeners: Vec::new(),
        }
    }
}

/// One observable change applied to a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetText { node: NodeId, text: String },
    SetAttribute { node: NodeId, name: String, value: String },
    RemoveAttribute { node: NodeId, name: String },
    AddListener { node: NodeId, event: String },
    RemoveListener { node: NodeId, event: String },
    Insert { node: NodeId, parent: NodeId },
    Remove { node: NodeId },
}

/// In-memory host tree: an arena of nodes plus a journal of every mutation.
///
/// The arena only grows. Removing a node detaches it but never frees its
/// slot, so a [`NodeId`] stays valid for the life of the document and
/// [`Document::node_count`] counts every node ever created. Each clone of
/// template content allocates fresh nodes, so a document that re-creates
/// conditional or repeated content keeps growing. Use a new document per
/// session when that matters.
#[derive(Default)]
pub struct Document {
    nodes: Vec<NodeData>,
    journal: Vec<Mutation>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(data);
        NodeId(self.nodes.len() - 1)
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.alloc(NodeData::new(NodeKind::Element(tag.into())))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        let mut data = NodeData::new(NodeKind::Text);
        data.text = text.into();
        self.alloc(data)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_attached_to(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cur = self.parent(node);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.data(node)
            .listeners
            .iter()
            .filter(|(e, _)| e == event)
            .count()
    }

    /// Invoke every listener registered for `event` on `node`, in
    /// registration order. Returns how many ran.
    pub fn dispatch(&self, node: NodeId, event: &str, args: &[Value]) -> Result<usize, EvalError> {
        let handlers: Vec<Handler> = self
            .data(node)
            .listeners
            .iter()
            .filter(|(e, _)| e == event)
            .map(|(_, h)| h.clone())
            .collect();
        for h in &handlers {
            h.call(args)?;
        }
        Ok(handlers.len())
    }

    /// Drain the mutation journal.
    pub fn take_journal(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.journal)
    }

    pub fn journal(&self) -> &[Mutation] {
        &self.journal
    }

    pub(crate) fn truncate_journal(&mut self, len: usize) {
        self.journal.truncate(len);
    }

    fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.data(node).parent else {
            return false;
        };
        self.data_mut(parent).children.retain(|c| *c != node);
        self.data_mut(node).parent = None;
        true
    }

    /// Children to move for an insertion: a fragment contributes its
    /// children, anything else itself.
    fn moving(&self, node: NodeId) -> Vec<NodeId> {
        match self.data(node).kind {
            NodeKind::Fragment => self.data(node).children.clone(),
            _ => vec![node],
        }
    }

    fn place(&mut self, parent: NodeId, at: usize, nodes: Vec<NodeId>) {
        let mut at = at;
        for n in nodes {
            if let Some(old) = self.data(n).parent {
                // moving within the same parent shifts the insertion point
                if old == parent {
                    if let Some(pos) = self.data(parent).children.iter().position(|c| *c == n) {
                        if pos < at {
                            at -= 1;
                        }
                    }
                }
            }
            self.detach(n);
            self.data_mut(parent).children.insert(at, n);
            self.data_mut(n).parent = Some(parent);
            self.journal.push(Mutation::Insert { node: n, parent });
            at += 1;
        }
    }

    fn deep_clone(&mut self, node: NodeId) -> NodeId {
        let (kind, attrs, text, children) = {
            let d = self.data(node);
            (d.kind.clone(), d.attrs.clone(), d.text.clone(), d.children.clone())
        };
        let mut data = NodeData::new(kind);
        data.attrs = attrs;
        data.text = text;
        let copy = self.alloc(data);
        for child in children {
            let c = self.deep_clone(child);
            self.data_mut(copy).children.push(c);
            self.data_mut(c).parent = Some(copy);
        }
        copy
    }

    pub(crate) fn attrs(&self, node: NodeId) -> &IndexMap<String, String> {
        &self.data(node).attrs
    }

    pub(crate) fn raw_children(&self, node: NodeId) -> &[NodeId] {
        &self.data(node).children
    }

    pub(crate) fn raw_text(&self, node: NodeId) -> &str {
        &self.data(node).text
    }

    pub(crate) fn node_kind(&self, node: NodeId) -> &NodeKind {
        &self.data(node).kind
    }
}

impl Host for Document {
    type Node = NodeId;

    fn kind(&self, node: &NodeId) -> NodeKind {
        self.data(*node).kind.clone()
    }

    fn clone_node(&mut self, node: &NodeId) -> NodeId {
        self.deep_clone(*node)
    }

    fn clone_content(&mut self, template: &NodeId) -> NodeId {
        let frag = self.create_fragment();
        for child in self.data(*template).children.clone() {
            let c = self.deep_clone(child);
            self.data_mut(frag).children.push(c);
            self.data_mut(c).parent = Some(frag);
        }
        frag
    }

    fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::new(NodeKind::Fragment))
    }

    fn create_placeholder(&mut self) -> NodeId {
        self.alloc(NodeData::new(NodeKind::Placeholder))
    }

    fn child(&self, node: &NodeId, index: usize) -> Option<NodeId> {
        self.data(*node).children.get(index).copied()
    }

    fn child_count(&self, node: &NodeId) -> usize {
        self.data(*node).children.len()
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        let nodes = self.moving(*child);
        let at = self.data(*parent).children.len();
        self.place(*parent, at, nodes);
    }

    fn text(&self, node: &NodeId) -> String {
        let d = self.data(*node);
        match d.kind {
            NodeKind::Text => d.text.clone(),
            NodeKind::Placeholder => String::new(),
            _ => d.children.iter().map(|c| self.text(c)).collect(),
        }
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        if self.data(*node).kind == NodeKind::Text {
            self.data_mut(*node).text = text.to_string();
        } else {
            // elements take a single text child, as textContent does
            for c in self.data(*node).children.clone() {
                self.detach(c);
            }
            if !text.is_empty() {
                let t = self.create_text(text);
                self.data_mut(*node).children.push(t);
                self.data_mut(t).parent = Some(*node);
            }
        }
        self.journal.push(Mutation::SetText {
            node: *node,
            text: text.to_string(),
        });
    }

    fn attributes(&self, node: &NodeId) -> Vec<(String, String)> {
        self.data(*node)
            .attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.data(*node).attrs.get(name).cloned()
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        self.data_mut(*node)
            .attrs
            .insert(name.to_string(), value.to_string());
        self.journal.push(Mutation::SetAttribute {
            node: *node,
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        if self.data_mut(*node).attrs.shift_remove(name).is_some() {
            self.journal.push(Mutation::RemoveAttribute {
                node: *node,
                name: name.to_string(),
            });
        }
    }

    fn add_listener(&mut self, node: &NodeId, event: &str, handler: Handler) {
        self.data_mut(*node)
            .listeners
            .push((event.to_string(), handler));
        self.journal.push(Mutation::AddListener {
            node: *node,
            event: event.to_string(),
        });
    }

    fn remove_listener(&mut self, node: &NodeId, event: &str, handler: &Handler) {
        let listeners = &mut self.data_mut(*node).listeners;
        let before = listeners.len();
        listeners.retain(|(e, h)| !(e == event && h.ptr_eq(handler)));
        if listeners.len() != before {
            self.journal.push(Mutation::RemoveListener {
                node: *node,
                event: event.to_string(),
            });
        }
    }

    fn insert_before(&mut self, anchor: &NodeId, node: &NodeId) {
        let Some(parent) = self.data(*anchor).parent else {
            warn!(anchor = anchor.0, "insert_before on a detached anchor");
            return;
        };
        let nodes = self.moving(*node);
        let at = self
            .data(parent)
            .children
            .iter()
            .position(|c| c == anchor)
            .unwrap_or(self.data(parent).children.len());
        self.place(parent, at, nodes);
    }

    fn remove(&mut self, node: &NodeId) {
        if self.detach(*node) {
            self.journal.push(Mutation::Remove { node: *node });
        }
    }

    fn outer_markup(&self, node: &NodeId) -> String {
        crate::html::to_html(self, *node)
    }
}
