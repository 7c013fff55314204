use std::rc::Rc;

use stencil_compiler::{BindingKind, CompiledTemplate};
use stencil_core::{BindCache, Handler, Model, OutputKind, Value};
use stencil_dom::Host;
use tracing::{trace, warn};

use crate::error::RenderError;
use crate::instance::RenderInstance;

/// Resolved target of one binding in a live clone.
enum Target<H: Host> {
    Text {
        node: H::Node,
        slot: usize,
    },
    Attribute {
        node: H::Node,
        name: String,
        slot: usize,
    },
    Event {
        node: H::Node,
        event: String,
        slot: usize,
        attached: Option<Handler>,
    },
    Nested {
        /// Placeholder to replace on first render.
        anchor: Option<H::Node>,
        child: RenderInstance<H>,
    },
}

/// One live copy of a template's content, rendered with every binding.
pub(crate) struct PlainInstance<H: Host> {
    template: Rc<CompiledTemplate<H::Node>>,
    root: H::Node,
    top: Vec<H::Node>,
    targets: Vec<Target<H>>,
    cache: BindCache,
}

impl<H: Host> PlainInstance<H> {
    /// Clone the content and resolve every binding path before anything is
    /// spliced into the clone.
    pub(crate) fn new(
        host: &mut H,
        template: Rc<CompiledTemplate<H::Node>>,
    ) -> Result<Self, RenderError> {
        let root = host.clone_content(template.source());
        let top = host.children(&root);

        let mut targets = Vec::with_capacity(template.bindings().len());
        for binding in template.bindings() {
            let node = binding
                .path
                .resolve(host, &root)
                .ok_or_else(|| RenderError::Unresolved {
                    path: binding.path.clone(),
                })?;
            targets.push(match &binding.kind {
                BindingKind::Text { slot } => Target::Text { node, slot: *slot },
                BindingKind::Attribute { name, slot } => Target::Attribute {
                    node,
                    name: name.clone(),
                    slot: *slot,
                },
                BindingKind::Event { event, slot } => Target::Event {
                    node,
                    event: event.clone(),
                    slot: *slot,
                    attached: None,
                },
                BindingKind::Nested(nested) => Target::Nested {
                    anchor: Some(node),
                    child: RenderInstance::new(nested.clone()),
                },
            });
        }
        trace!(bindings = targets.len(), "instantiated template content");

        Ok(Self {
            template,
            root,
            top,
            targets,
            cache: BindCache::new(),
        })
    }

    /// Fragment holding the content until it is first inserted.
    pub(crate) fn root(&self) -> &H::Node {
        &self.root
    }

    /// Evaluate and apply each binding in order.
    pub(crate) fn render(&mut self, host: &mut H, model: &Model) -> Result<(), RenderError> {
        let _chain = ChainScope::enter(model);
        let template = self.template.clone();
        let batch = template.batch();
        let scope = batch.scope(model);

        for target in &mut self.targets {
            match target {
                Target::Text { node, slot } => {
                    let value = batch.evaluate(*slot, &scope, &mut self.cache);
                    let text = if value.truthy() {
                        value.to_text()
                    } else {
                        String::new()
                    };
                    if host.text(node) != text {
                        host.set_text(node, &text);
                    }
                }
                Target::Attribute { node, name, slot } => {
                    let value = batch.evaluate(*slot, &scope, &mut self.cache);
                    match attribute_text(&value, batch.output(*slot)) {
                        Some(text) => {
                            if host.attribute(node, name).as_deref() != Some(text.as_str()) {
                                host.set_attribute(node, name, &text);
                            }
                        }
                        None => {
                            if host.attribute(node, name).is_some() {
                                host.remove_attribute(node, name);
                            }
                        }
                    }
                }
                Target::Event {
                    node,
                    event,
                    slot,
                    attached,
                } => {
                    let value = batch.evaluate(*slot, &scope, &mut self.cache);
                    match value {
                        Value::Handler(handler) => {
                            if attached.as_ref().is_some_and(|h| h.ptr_eq(&handler)) {
                                continue;
                            }
                            if let Some(old) = attached.take() {
                                host.remove_listener(node, event, &old);
                            }
                            host.add_listener(node, event, handler.clone());
                            *attached = Some(handler);
                        }
                        other => {
                            if !other.is_nullish() {
                                warn!(
                                    event = event.as_str(),
                                    value = other.type_name(),
                                    "event binding did not produce a function"
                                );
                            }
                            if let Some(old) = attached.take() {
                                host.remove_listener(node, event, &old);
                            }
                        }
                    }
                }
                Target::Nested { anchor, child } => {
                    let out = child.render(host, model)?;
                    // placed once; later renders update in place
                    if let Some(anchor) = anchor.take() {
                        host.insert_before(&anchor, &out);
                        host.remove(&anchor);
                    }
                }
            }
        }
        Ok(())
    }

    /// Detach the content and release every nested instance.
    pub(crate) fn remove(&mut self, host: &mut H) {
        for target in &mut self.targets {
            match target {
                Target::Nested { child, .. } => child.remove(host),
                Target::Event { attached, .. } => *attached = None,
                _ => {}
            }
        }
        for node in &self.top {
            host.remove(node);
        }
        self.cache.clear();
    }
}

/// Attribute text for `value`, or `None` when the attribute should be absent.
fn attribute_text(value: &Value, output: OutputKind) -> Option<String> {
    match value {
        Value::Undefined
        | Value::Null
        | Value::Object(_)
        | Value::Function(_)
        | Value::Handler(_) => None,
        Value::Str(s) if s.is_empty() && output != OutputKind::Raw => None,
        other => Some(other.to_text()),
    }
}

/// Gives each content render a fresh if/else chain and restores the
/// enclosing one afterwards.
struct ChainScope<'a> {
    model: &'a Model,
    saved: Option<bool>,
}

impl<'a> ChainScope<'a> {
    fn enter(model: &'a Model) -> Self {
        let saved = model.set_chain(None);
        Self { model, saved }
    }
}

impl Drop for ChainScope<'_> {
    fn drop(&mut self) {
        self.model.set_chain(self.saved);
    }
}
