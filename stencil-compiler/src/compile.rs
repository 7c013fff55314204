use std::collections::VecDeque;

use stencil_core::{Batch, CompiledExpr, ExprCompiler, OutputKind, Value, is_dynamic};
use stencil_dom::{Host, NodeKind};
use tracing::{debug, warn};

use crate::error::CompileError;
use crate::options::CompileOptions;
use crate::path::PathAddress;
use crate::registry::TemplateRegistry;
use crate::template::{Binding, BindingKind, Branch, CompiledTemplate, Strategy};

/// Analyse `template` into bindings over a stripped copy of its content.
/// Nested templates are compiled through `registry` and replaced by
/// placeholders in the copy.
pub(crate) fn compile_template<H: Host>(
    registry: &mut TemplateRegistry<H::Node>,
    host: &mut H,
    template: &H::Node,
    markup: String,
) -> Result<CompiledTemplate<H::Node>, CompileError> {
    let opts = registry.options().clone();
    let exprs = registry.expr_compiler();

    let source = host.clone_content(template);
    let mut batch = Batch::new();
    let mut bindings = Vec::new();

    let mut queue = VecDeque::from([(source.clone(), PathAddress::root())]);
    while let Some((node, path)) = queue.pop_front() {
        match host.kind(&node) {
            NodeKind::Text => {
                let text = host.text(&node);
                if is_dynamic(&text) {
                    let expr = CompiledExpr::compile(&text, exprs.as_ref(), &opts.extract);
                    let slot = batch.push(expr, OutputKind::Raw);
                    bindings.push(Binding {
                        path,
                        kind: BindingKind::Text { slot },
                    });
                    host.set_text(&node, "");
                }
            }
            NodeKind::Element(tag) if tag == opts.template_tag => {
                let nested = registry.compile(host, &node)?;
                let anchor = host.create_placeholder();
                host.insert_before(&node, &anchor);
                host.remove(&node);
                bindings.push(Binding {
                    path,
                    kind: BindingKind::Nested(nested),
                });
            }
            NodeKind::Element(_) => {
                for (name, value) in host.attributes(&node) {
                    if !is_dynamic(&value) {
                        continue;
                    }
                    let kind = match opts.event_name(&name) {
                        Some(event) => {
                            let expr = CompiledExpr::compile(&value, exprs.as_ref(), &opts.extract);
                            BindingKind::Event {
                                event: event.to_string(),
                                slot: batch.push(expr, OutputKind::Raw),
                            }
                        }
                        None => {
                            let expr = CompiledExpr::compile(&value, exprs.as_ref(), &opts.extract);
                            BindingKind::Attribute {
                                slot: batch.push(expr, opts.output_kind(&name)),
                                name: name.clone(),
                            }
                        }
                    };
                    bindings.push(Binding {
                        path: path.clone(),
                        kind,
                    });
                    host.remove_attribute(&node, &name);
                }
                enqueue_children(host, &node, &path, &mut queue);
            }
            NodeKind::Fragment => enqueue_children(host, &node, &path, &mut queue),
            NodeKind::Placeholder => {}
        }
    }

    let strategy = select_strategy(host, template, &opts, exprs.as_ref(), &mut batch);
    debug!(
        bindings = bindings.len(),
        expressions = batch.len(),
        ?strategy,
        "compiled template"
    );

    Ok(CompiledTemplate {
        source,
        markup,
        bindings,
        batch,
        strategy,
    })
}

fn enqueue_children<H: Host>(
    host: &H,
    node: &H::Node,
    path: &PathAddress,
    queue: &mut VecDeque<(H::Node, PathAddress)>,
) {
    for (i, child) in host.children(node).into_iter().enumerate() {
        queue.push_back((child, path.child(i)));
    }
}

/// Directives on the template element pick the strategy. Precedence is
/// if/else, then repeat, then plain.
fn select_strategy<H: Host>(
    host: &H,
    template: &H::Node,
    opts: &CompileOptions,
    exprs: &dyn ExprCompiler,
    batch: &mut Batch,
) -> Strategy {
    let cond = host.attribute(template, &opts.if_attr);
    let is_else = host.attribute(template, &opts.else_attr).is_some();
    let repeat = host.attribute(template, &opts.repeat_attr);

    if (cond.is_some() || is_else) && repeat.is_some() {
        warn!(
            template = %host.outer_markup(template),
            "template has both a condition and a repeat source, ignoring the repeat"
        );
    }

    let mut selector = |text: &str| batch.push(directive(text, opts, exprs), OutputKind::Raw);
    match (cond, is_else, repeat) {
        (Some(c), false, _) => Strategy::Conditional(Branch::If { test: selector(&c) }),
        (Some(c), true, _) => Strategy::Conditional(Branch::ElseIf { test: selector(&c) }),
        (None, true, _) => Strategy::Conditional(Branch::Else),
        (None, false, Some(r)) => Strategy::Repeated {
            source: selector(&r),
        },
        (None, false, None) => Strategy::Plain,
    }
}

/// Directive values without a `${}` span are literals: `true`, `false` and
/// numbers parse as such, anything else is a string.
fn directive(text: &str, opts: &CompileOptions, exprs: &dyn ExprCompiler) -> CompiledExpr {
    if is_dynamic(text) {
        CompiledExpr::compile(text, exprs, &opts.extract)
    } else {
        CompiledExpr::Static(Value::from_literal_text(text))
    }
}
