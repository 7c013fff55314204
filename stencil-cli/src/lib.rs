use anyhow::{Context, Result, anyhow, bail};
use std::fs;
use std::path::Path;
use tracing::debug;

use stencil_compiler::{CompileOptions, TemplateRegistry};
use stencil_core::{Model, Value};
use stencil_dom::{Document, Host, NodeId, NodeKind, inner_html, parse_fragment};
use stencil_renderer::RenderInstance;

/// Read compiler options from a TOML file, or use the defaults.
pub fn load_options(config: Option<&Path>) -> Result<CompileOptions> {
    let Some(path) = config else {
        return Ok(CompileOptions::default());
    };
    let src =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&src).with_context(|| format!("invalid config {}", path.display()))
}

/// Read a JSON object into a data object.
pub fn load_model(data: Option<&Path>) -> Result<Model> {
    let Some(path) = data else {
        return Ok(Model::new());
    };
    let src =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&src).with_context(|| format!("invalid JSON in {}", path.display()))?;
    match Value::from(&json) {
        Value::Object(fields) => Ok(Model::from((*fields).clone())),
        other => bail!(
            "{} must hold a JSON object, found {}",
            path.display(),
            other.type_name()
        ),
    }
}

fn load_document(input: &Path) -> Result<(Document, NodeId)> {
    let src =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let mut doc = Document::new();
    let root = parse_fragment(&mut doc, &src)
        .with_context(|| format!("failed to parse {}", input.display()))?;
    Ok((doc, root))
}

/// Template elements in document order, not descending into templates.
fn templates(doc: &Document, node: NodeId, tag: &str, out: &mut Vec<NodeId>) {
    for child in doc.children(&node) {
        match doc.kind(&child) {
            NodeKind::Element(t) if t == tag => out.push(child),
            NodeKind::Element(_) | NodeKind::Fragment => templates(doc, child, tag, out),
            _ => {}
        }
    }
}

/// Render a template from `input` against `data` and return the HTML.
///
/// `template` selects a template by `id`; otherwise the first one is used.
/// Every pass after the first re-renders the same instance in place.
pub fn render_cmd(
    input: &Path,
    data: Option<&Path>,
    template: Option<&str>,
    config: Option<&Path>,
    passes: usize,
) -> Result<String> {
    let options = load_options(config)?;
    let model = load_model(data)?;
    let (mut doc, root) = load_document(input)?;

    let mut found = Vec::new();
    templates(&doc, root, &options.template_tag, &mut found);
    let tpl = match template {
        Some(id) => found
            .into_iter()
            .find(|t| doc.attribute(t, "id").as_deref() == Some(id))
            .ok_or_else(|| anyhow!("no template with id {id:?} in {}", input.display()))?,
        None => found
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no template in {}", input.display()))?,
    };

    let mut registry = TemplateRegistry::new(options);
    let handle = registry.handle(&mut doc, &tpl)?;
    let mut inst = RenderInstance::new(handle.compiled().clone());
    let mount = doc.create_element("body");
    for pass in 0..passes.max(1) {
        inst.mount(&mut doc, &mount, &model)?;
        debug!(pass, mutations = doc.take_journal().len(), "render pass");
    }
    Ok(inner_html(&doc, mount))
}

/// Outline of every template in `input`: strategy, selectors and bindings.
pub fn inspect_cmd(input: &Path, config: Option<&Path>) -> Result<String> {
    let options = load_options(config)?;
    let (mut doc, root) = load_document(input)?;

    let mut found = Vec::new();
    templates(&doc, root, &options.template_tag, &mut found);
    let mut registry = TemplateRegistry::new(options);
    let mut out = String::new();
    for (i, tpl) in found.iter().enumerate() {
        let compiled = registry.compile(&mut doc, tpl)?;
        let name = doc.attribute(tpl, "id").unwrap_or_else(|| format!("#{i}"));
        out.push_str(&format!("template {name}\n{compiled}"));
    }
    Ok(out)
}
