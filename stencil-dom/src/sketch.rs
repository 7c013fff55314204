//! Detached tree descriptions for building documents in code.

use crate::document::{Document, NodeId};
use crate::host::Host;

/// A subtree not yet in any document. Materialize it with [`Document::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sketch {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Sketch>,
    },
    Text(String),
    Placeholder,
}

pub fn el(tag: &str, attrs: &[(&str, &str)], children: Vec<Sketch>) -> Sketch {
    Sketch::Element {
        tag: tag.to_string(),
        attrs: attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children,
    }
}

pub fn txt(t: impl Into<String>) -> Sketch {
    Sketch::Text(t.into())
}

pub fn placeholder() -> Sketch {
    Sketch::Placeholder
}

/// A `<template>` element whose children are its content.
pub fn template(attrs: &[(&str, &str)], content: Vec<Sketch>) -> Sketch {
    el("template", attrs, content)
}

impl Document {
    /// Materialize `sketch` as a detached subtree. Building is not journaled.
    pub fn build(&mut self, sketch: &Sketch) -> NodeId {
        let mark = self.journal().len();
        let node = self.build_node(sketch);
        self.truncate_journal(mark);
        node
    }

    fn build_node(&mut self, sketch: &Sketch) -> NodeId {
        match sketch {
            Sketch::Text(t) => self.create_text(t.as_str()),
            Sketch::Placeholder => self.create_placeholder(),
            Sketch::Element {
                tag,
                attrs,
                children,
            } => {
                let node = self.create_element(tag.as_str());
                for (k, v) in attrs {
                    self.set_attribute(&node, k, v);
                }
                for child in children {
                    let c = self.build_node(child);
                    self.append_child(&node, &c);
                }
                node
            }
        }
    }
}
