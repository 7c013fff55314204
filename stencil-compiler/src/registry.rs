use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::rc::Rc;

use stencil_core::{ExprCompiler, Parser};
use stencil_dom::{Host, NodeKind};
use tracing::{debug, trace};

use crate::compile::compile_template;
use crate::error::CompileError;
use crate::options::CompileOptions;
use crate::template::CompiledTemplate;

/// A template node paired with its current compiled form.
#[derive(Debug, Clone)]
pub struct TemplateHandle<N> {
    node: N,
    compiled: Rc<CompiledTemplate<N>>,
}

impl<N> TemplateHandle<N> {
    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn compiled(&self) -> &Rc<CompiledTemplate<N>> {
        &self.compiled
    }
}

/// Compiles templates at most once per distinct serialized content and
/// hands out per-node [`TemplateHandle`]s.
pub struct TemplateRegistry<N> {
    options: CompileOptions,
    exprs: Rc<dyn ExprCompiler>,
    // content hash -> templates with that hash; markup equality settles collisions
    cache: HashMap<u64, Vec<Rc<CompiledTemplate<N>>>>,
    handles: HashMap<N, TemplateHandle<N>>,
}

impl<N: Clone + Eq + Hash> Default for TemplateRegistry<N> {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

impl<N: Clone + Eq + Hash> TemplateRegistry<N> {
    pub fn new(options: CompileOptions) -> Self {
        Self::with_compiler(options, Rc::new(Parser::default()))
    }

    /// Use `exprs` to compile `${}` expressions instead of the built-in parser.
    pub fn with_compiler(options: CompileOptions, exprs: Rc<dyn ExprCompiler>) -> Self {
        Self {
            options,
            exprs,
            cache: HashMap::new(),
            handles: HashMap::new(),
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn expr_compiler(&self) -> Rc<dyn ExprCompiler> {
        self.exprs.clone()
    }

    /// Number of distinct compiled templates held, nested ones included.
    pub fn compiled_count(&self) -> usize {
        self.cache.values().map(Vec::len).sum()
    }

    /// Compiled form of `template`, reusing an earlier compile of identical
    /// content.
    pub fn compile<H: Host<Node = N>>(
        &mut self,
        host: &mut H,
        template: &N,
    ) -> Result<Rc<CompiledTemplate<N>>, CompileError> {
        match host.kind(template) {
            NodeKind::Element(tag) if tag == self.options.template_tag => {}
            other => {
                return Err(CompileError::NotATemplate {
                    expected: self.options.template_tag.clone(),
                    found: describe(&other),
                });
            }
        }

        let markup = host.outer_markup(template);
        let key = content_hash(&markup);
        if let Some(hit) = self
            .cache
            .get(&key)
            .and_then(|bucket| bucket.iter().find(|t| t.markup == markup))
        {
            trace!(key, "template cache hit");
            return Ok(hit.clone());
        }

        let compiled = Rc::new(compile_template(self, host, template, markup)?);
        self.cache.entry(key).or_default().push(compiled.clone());
        Ok(compiled)
    }

    /// Handle for `template`, recompiled only when its serialized content
    /// changed since the last call.
    pub fn handle<H: Host<Node = N>>(
        &mut self,
        host: &mut H,
        template: &N,
    ) -> Result<TemplateHandle<N>, CompileError> {
        if let Some(h) = self.handles.get(template) {
            if h.compiled.markup == host.outer_markup(template) {
                return Ok(h.clone());
            }
            debug!("template content changed, recompiling");
            self.invalidate(template);
        }
        let handle = TemplateHandle {
            node: template.clone(),
            compiled: self.compile(host, template)?,
        };
        self.handles.insert(template.clone(), handle.clone());
        Ok(handle)
    }

    /// Forget the handle for `template` and its cached compile.
    pub fn invalidate(&mut self, template: &N) -> bool {
        let Some(handle) = self.handles.remove(template) else {
            return false;
        };
        self.evict(&handle.compiled);
        true
    }

    fn evict(&mut self, compiled: &Rc<CompiledTemplate<N>>) {
        let key = content_hash(&compiled.markup);
        if let Some(bucket) = self.cache.get_mut(&key) {
            bucket.retain(|t| !Rc::ptr_eq(t, compiled));
            if bucket.is_empty() {
                self.cache.remove(&key);
            }
        }
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.handles.clear();
    }
}

fn content_hash(markup: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    markup.hash(&mut hasher);
    hasher.finish()
}

fn describe(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Element(tag) => format!("<{tag}>"),
        NodeKind::Text => "a text node".into(),
        NodeKind::Fragment => "a fragment".into(),
        NodeKind::Placeholder => "a placeholder".into(),
    }
}
