use std::rc::Rc;

use stencil_compiler::{Branch, CompiledTemplate, Strategy};
use stencil_core::{BindCache, Model, Value};
use stencil_dom::Host;
use tracing::{debug, trace, warn};

use crate::error::RenderError;
use crate::plain::PlainInstance;

enum State<H: Host> {
    Uninitialized,
    Plain(PlainInstance<H>),
    Conditional {
        output: H::Node,
        anchor: H::Node,
        child: Option<PlainInstance<H>>,
    },
    Repeated {
        output: H::Node,
        anchor: H::Node,
        children: Vec<PlainInstance<H>>,
    },
}

/// A live instantiation of a compiled template.
///
/// The strategy comes from the template's directives:
/// - plain: one copy of the content, rendered every pass
/// - conditional: zero or one copy, inserted before a placeholder anchor
/// - repeated: one copy per source element, reconciled by index
///
/// `render` returns the node to insert into the tree. After the first pass
/// it is an empty fragment, so inserting it again is harmless.
pub struct RenderInstance<H: Host> {
    template: Rc<CompiledTemplate<H::Node>>,
    state: State<H>,
    selectors: BindCache,
}

impl<H: Host> RenderInstance<H> {
    pub fn new(template: Rc<CompiledTemplate<H::Node>>) -> Self {
        Self {
            template,
            state: State::Uninitialized,
            selectors: BindCache::new(),
        }
    }

    pub fn template(&self) -> &Rc<CompiledTemplate<H::Node>> {
        &self.template
    }

    pub fn is_live(&self) -> bool {
        !matches!(self.state, State::Uninitialized)
    }

    /// Live content copies owned directly by this instance.
    pub fn instance_count(&self) -> usize {
        match &self.state {
            State::Uninitialized => 0,
            State::Plain(_) => 1,
            State::Conditional { child, .. } => usize::from(child.is_some()),
            State::Repeated { children, .. } => children.len(),
        }
    }

    /// Render and append to `parent` on the first pass; later passes update
    /// in place.
    pub fn mount(
        &mut self,
        host: &mut H,
        parent: &H::Node,
        model: &Model,
    ) -> Result<H::Node, RenderError> {
        let first = !self.is_live();
        let out = self.render(host, model)?;
        if first {
            host.append_child(parent, &out);
        }
        Ok(out)
    }

    pub fn render(&mut self, host: &mut H, model: &Model) -> Result<H::Node, RenderError> {
        if !self.is_live() {
            self.init(host)?;
        }
        match self.template.strategy() {
            Strategy::Plain => self.render_plain(host, model),
            Strategy::Conditional(branch) => self.render_conditional(host, model, branch),
            Strategy::Repeated { source } => self.render_repeated(host, model, source),
        }
    }

    /// Detach everything this instance created, recursively. Idempotent; the
    /// next `render` starts from scratch.
    pub fn remove(&mut self, host: &mut H) {
        match std::mem::replace(&mut self.state, State::Uninitialized) {
            State::Uninitialized => return,
            State::Plain(mut content) => content.remove(host),
            State::Conditional { anchor, child, .. } => {
                if let Some(mut child) = child {
                    child.remove(host);
                }
                host.remove(&anchor);
            }
            State::Repeated {
                anchor,
                mut children,
                ..
            } => {
                while let Some(mut child) = children.pop() {
                    child.remove(host);
                }
                host.remove(&anchor);
            }
        }
        self.selectors.clear();
        debug!("render instance removed");
    }

    fn init(&mut self, host: &mut H) -> Result<(), RenderError> {
        self.state = match self.template.strategy() {
            Strategy::Plain => State::Plain(PlainInstance::new(host, self.template.clone())?),
            Strategy::Conditional(_) => {
                let (output, anchor) = anchored(host);
                State::Conditional {
                    output,
                    anchor,
                    child: None,
                }
            }
            Strategy::Repeated { .. } => {
                let (output, anchor) = anchored(host);
                State::Repeated {
                    output,
                    anchor,
                    children: Vec::new(),
                }
            }
        };
        Ok(())
    }

    fn selector(&mut self, slot: usize, model: &Model) -> Value {
        let batch = self.template.batch();
        let scope = batch.scope(model);
        batch.evaluate(slot, &scope, &mut self.selectors)
    }

    fn render_plain(&mut self, host: &mut H, model: &Model) -> Result<H::Node, RenderError> {
        let State::Plain(content) = &mut self.state else {
            unreachable!("plain template without plain state");
        };
        content.render(host, model)?;
        Ok(content.root().clone())
    }

    fn render_conditional(
        &mut self,
        host: &mut H,
        model: &Model,
        branch: Branch,
    ) -> Result<H::Node, RenderError> {
        let taken = match branch {
            Branch::If { test } => {
                let taken = self.selector(test, model).truthy();
                model.set_chain(Some(taken));
                taken
            }
            Branch::ElseIf { test } => {
                let prior = model.chain().unwrap_or(false);
                let taken = !prior && self.selector(test, model).truthy();
                model.set_chain(Some(prior || taken));
                taken
            }
            Branch::Else => {
                let prior = model.chain().unwrap_or(false);
                model.set_chain(Some(true));
                !prior
            }
        };

        let template = self.template.clone();
        let State::Conditional {
            output,
            anchor,
            child,
        } = &mut self.state
        else {
            unreachable!("conditional template without conditional state");
        };

        match (taken, child.as_mut()) {
            (true, Some(content)) => content.render(host, model)?,
            (true, None) => {
                let mut content = PlainInstance::new(host, template)?;
                content.render(host, model)?;
                host.insert_before(anchor, content.root());
                *child = Some(content);
                trace!("conditional content created");
            }
            (false, Some(_)) => {
                if let Some(mut content) = child.take() {
                    content.remove(host);
                }
                trace!("conditional content removed");
            }
            (false, None) => {}
        }
        Ok(output.clone())
    }

    fn render_repeated(
        &mut self,
        host: &mut H,
        model: &Model,
        source: usize,
    ) -> Result<H::Node, RenderError> {
        let value = self.selector(source, model);
        let template = self.template.clone();
        let State::Repeated {
            output,
            anchor,
            children,
        } = &mut self.state
        else {
            unreachable!("repeated template without repeated state");
        };

        let item = model.item_scope();
        let items = repetitions(value, item.outer());
        let len = items.len();

        if children.len() > len {
            trace!(from = children.len(), to = len, "trimming list");
        }
        while children.len() > len {
            if let Some(mut content) = children.pop() {
                content.remove(host);
            }
        }

        for (i, content) in children.iter_mut().enumerate() {
            item.set(items.get(i));
            content.render(host, model)?;
        }

        let live = children.len();
        if live < len {
            trace!(from = live, to = len, "growing list");
        }
        for i in live..len {
            item.set(items.get(i));
            let mut content = PlainInstance::new(host, template.clone())?;
            content.render(host, model)?;
            host.insert_before(anchor, content.root());
            children.push(content);
        }

        Ok(output.clone())
    }
}

/// Fragment holding a fresh placeholder anchor.
fn anchored<H: Host>(host: &mut H) -> (H::Node, H::Node) {
    let output = host.create_fragment();
    let anchor = host.create_placeholder();
    host.append_child(&output, &anchor);
    (output, anchor)
}

/// Upper bound on the copies a numeric repeat source produces.
pub const MAX_REPETITIONS: usize = 10_000;

/// Sequence a repeat source stands for.
pub(crate) enum Repetitions {
    Items(Vec<Value>),
    /// `count` copies of the enclosing `item`.
    Times(usize, Value),
}

impl Repetitions {
    pub(crate) fn len(&self) -> usize {
        match self {
            Repetitions::Items(items) => items.len(),
            Repetitions::Times(count, _) => *count,
        }
    }

    pub(crate) fn get(&self, index: usize) -> Value {
        match self {
            Repetitions::Items(items) => items.get(index).cloned().unwrap_or_default(),
            Repetitions::Times(_, value) => value.clone(),
        }
    }
}

/// Coerce a repeat source. `current` is the enclosing `item`, repeated by
/// boolean and numeric sources. Numbers below one, NaN and infinities give
/// no copies; finite counts above [`MAX_REPETITIONS`] are clamped.
pub(crate) fn repetitions(source: Value, current: &Value) -> Repetitions {
    let times = |count| Repetitions::Times(count, current.clone());
    match source {
        Value::Array(items) => Repetitions::Items(items.to_vec()),
        Value::Object(map) => Repetitions::Items(
            map.iter()
                .map(|(k, v)| Value::object([("key", Value::str(k)), ("value", v.clone())]))
                .collect(),
        ),
        Value::Bool(b) => times(usize::from(b)),
        Value::Number(n) if !n.is_finite() || n < 1.0 => times(0),
        Value::Number(n) => {
            let n = n.trunc();
            if n > MAX_REPETITIONS as f64 {
                warn!(count = n, max = MAX_REPETITIONS, "repeat count clamped");
                times(MAX_REPETITIONS)
            } else {
                times(n as usize)
            }
        }
        Value::Undefined | Value::Null => times(0),
        other => {
            warn!(source = other.type_name(), "repeat source is not a list, rendering nothing");
            times(0)
        }
    }
}
