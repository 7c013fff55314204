use std::fmt;

use stencil_dom::Host;

/// Position of a node inside a cloned template instance, as child-index
/// steps from the content root. Every child counts, text included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathAddress(Vec<usize>);

impl PathAddress {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(index);
        Self(steps)
    }

    pub fn steps(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Walk the steps from `root`. `None` means the tree no longer has the
    /// shape the path was computed on.
    pub fn resolve<H: Host>(&self, host: &H, root: &H::Node) -> Option<H::Node> {
        let mut node = root.clone();
        for &step in &self.0 {
            node = host.child(&node, step)?;
        }
        Some(node)
    }
}

impl From<Vec<usize>> for PathAddress {
    fn from(steps: Vec<usize>) -> Self {
        Self(steps)
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for step in &self.0 {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_dom::{Document, el, txt};

    #[test]
    fn resolves_child_steps() {
        let mut doc = Document::new();
        let root = doc.build(&el(
            "div",
            &[],
            vec![txt("a"), el("p", &[], vec![txt("b"), el("i", &[], vec![])])],
        ));
        let path = PathAddress::root().child(1).child(1);
        let node = path.resolve(&doc, &root).unwrap();
        assert_eq!(doc.tag(node), Some("i"));
        assert_eq!(PathAddress::root().resolve(&doc, &root), Some(root));
        assert_eq!(PathAddress::from(vec![3]).resolve(&doc, &root), None);
    }

    #[test]
    fn displays_as_slash_separated_steps() {
        assert_eq!(PathAddress::root().to_string(), "/");
        assert_eq!(PathAddress::from(vec![0, 2, 1]).to_string(), "/0/2/1");
    }
}
