use std::fmt;
use std::rc::Rc;

use stencil_core::Batch;

use crate::path::PathAddress;

/// What a binding drives on the node its path resolves to. The `slot`
/// indexes the owning template's [`Batch`].
#[derive(Debug)]
pub enum BindingKind<N> {
    Text { slot: usize },
    Attribute { name: String, slot: usize },
    Event { event: String, slot: usize },
    /// A nested template; its path points at the placeholder standing in
    /// for it in the clone source.
    Nested(Rc<CompiledTemplate<N>>),
}

#[derive(Debug)]
pub struct Binding<N> {
    pub path: PathAddress,
    pub kind: BindingKind<N>,
}

/// Position of a conditional template in an if / else-if / else chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    If { test: usize },
    ElseIf { test: usize },
    Else,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Plain,
    Conditional(Branch),
    Repeated { source: usize },
}

/// A template analysed once: a stripped clone source, its bindings and the
/// expressions they evaluate.
pub struct CompiledTemplate<N> {
    pub(crate) source: N,
    pub(crate) markup: String,
    pub(crate) bindings: Vec<Binding<N>>,
    pub(crate) batch: Batch,
    pub(crate) strategy: Strategy,
}

impl<N> CompiledTemplate<N> {
    /// Fragment holding the template content with dynamic text and
    /// attributes removed. Instances are deep copies of it.
    pub fn source(&self) -> &N {
        &self.source
    }

    /// Serialized template this was compiled from.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn bindings(&self) -> &[Binding<N>] {
        &self.bindings
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    fn expr_source(&self, slot: usize) -> String {
        self.batch
            .expr(slot)
            .map(|e| e.source())
            .unwrap_or_default()
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self.strategy {
            Strategy::Plain => writeln!(f, "{pad}plain")?,
            Strategy::Conditional(Branch::If { test }) => {
                writeln!(f, "{pad}if {}", self.expr_source(test))?
            }
            Strategy::Conditional(Branch::ElseIf { test }) => {
                writeln!(f, "{pad}else-if {}", self.expr_source(test))?
            }
            Strategy::Conditional(Branch::Else) => writeln!(f, "{pad}else")?,
            Strategy::Repeated { source } => {
                writeln!(f, "{pad}repeat {}", self.expr_source(source))?
            }
        }
        for b in &self.bindings {
            match &b.kind {
                BindingKind::Text { slot } => {
                    writeln!(f, "{pad}  {} text {}", b.path, self.expr_source(*slot))?
                }
                BindingKind::Attribute { name, slot } => writeln!(
                    f,
                    "{pad}  {} attr {name} {}",
                    b.path,
                    self.expr_source(*slot)
                )?,
                BindingKind::Event { event, slot } => writeln!(
                    f,
                    "{pad}  {} on {event} {}",
                    b.path,
                    self.expr_source(*slot)
                )?,
                BindingKind::Nested(nested) => {
                    writeln!(f, "{pad}  {} template", b.path)?;
                    nested.write_tree(f, depth + 2)?;
                }
            }
        }
        Ok(())
    }
}

/// Human-readable outline: strategy, selector and one line per binding.
impl<N> fmt::Display for CompiledTemplate<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

impl<N: fmt::Debug> fmt::Debug for CompiledTemplate<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("source", &self.source)
            .field("strategy", &self.strategy)
            .field("bindings", &self.bindings)
            .field("batch", &self.batch)
            .finish()
    }
}
