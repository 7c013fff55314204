//! Batch evaluation of a template's expressions against a data object.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexSet;
use tracing::{trace, warn};

use crate::error::{EvalError, ParseError};
use crate::extract::{ExtractOptions, Segment, free_variables, segments};
use crate::model::Model;
use crate::value::{Function, Handler, Value};

/// A compiled expression, evaluated against a [`Scope`].
pub trait Expression {
    fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, EvalError>;

    /// Source text, used when reporting failures.
    fn source(&self) -> &str;
}

/// The injected expression-compilation service.
pub trait ExprCompiler {
    fn compile(&self, source: &str, free_vars: &[String])
    -> Result<Rc<dyn Expression>, ParseError>;
}

/// Free variables destructured from the data object once per render pass.
pub struct Scope<'a> {
    model: &'a Model,
    vars: HashMap<&'a str, Value>,
}

impl<'a> Scope<'a> {
    pub fn bind(model: &'a Model, names: impl IntoIterator<Item = &'a str>) -> Self {
        let vars = names
            .into_iter()
            .map(|name| (name, model.get(name)))
            .collect();
        Self { model, vars }
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }
}

/// Stand-in for an expression that failed to parse; evaluates to `undefined`.
struct Broken(String);

impl Expression for Broken {
    fn evaluate(&self, _scope: &Scope<'_>) -> Result<Value, EvalError> {
        Ok(Value::Undefined)
    }

    fn source(&self) -> &str {
        &self.0
    }
}

enum Part {
    Literal(String),
    Expr(Rc<dyn Expression>),
}

/// Text with one or more `${}` spans.
pub struct Interpolation {
    source: String,
    free_vars: Vec<String>,
    parts: Vec<Part>,
    /// The only non-blank part is a single span: yield its raw value.
    single: Option<usize>,
}

impl Interpolation {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn free_vars(&self) -> &[String] {
        &self.free_vars
    }

    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, EvalError> {
        if let Some(i) = self.single {
            if let Part::Expr(e) = &self.parts[i] {
                return e.evaluate(scope);
            }
        }
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(s) => out.push_str(s),
                Part::Expr(e) => {
                    let v = e.evaluate(scope)?;
                    if !v.is_nullish() {
                        out.push_str(&v.to_text());
                    }
                }
            }
        }
        Ok(Value::from(out))
    }
}

impl fmt::Debug for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpolation")
            .field("source", &self.source)
            .field("free_vars", &self.free_vars)
            .finish()
    }
}

/// Either a constant or an interpolation compiled once per template.
#[derive(Debug)]
pub enum CompiledExpr {
    Static(Value),
    Dynamic(Interpolation),
}

impl CompiledExpr {
    /// Compile attribute or text content. Text without `${}` spans is static.
    pub fn compile(text: &str, compiler: &dyn ExprCompiler, opts: &ExtractOptions) -> Self {
        let segs = segments(text);
        if !segs.iter().any(|s| matches!(s, Segment::Expr(_))) {
            return CompiledExpr::Static(Value::str(text));
        }

        let mut free: IndexSet<String> = IndexSet::new();
        let mut parts = Vec::with_capacity(segs.len());
        for seg in segs {
            match seg {
                Segment::Literal(s) => parts.push(Part::Literal(s.to_string())),
                Segment::Expr(src) => {
                    let vars = free_variables(src, opts);
                    let expr = match compiler.compile(src, &vars) {
                        Ok(expr) => expr,
                        Err(err) => {
                            warn!(expr = src.trim(), error = %err, "expression does not compile");
                            Rc::new(Broken(src.trim().to_string())) as Rc<dyn Expression>
                        }
                    };
                    free.extend(vars);
                    parts.push(Part::Expr(expr));
                }
            }
        }

        let significant: Vec<usize> = parts
            .iter()
            .enumerate()
            .filter(|(_, p)| !matches!(p, Part::Literal(s) if s.trim().is_empty()))
            .map(|(i, _)| i)
            .collect();
        let single = match significant.as_slice() {
            [i] if matches!(parts[*i], Part::Expr(_)) => Some(*i),
            _ => None,
        };

        CompiledExpr::Dynamic(Interpolation {
            source: text.to_string(),
            free_vars: free.into_iter().collect(),
            parts,
            single,
        })
    }

    pub fn is_static(&self) -> bool {
        matches!(self, CompiledExpr::Static(_))
    }

    pub fn free_vars(&self) -> &[String] {
        match self {
            CompiledExpr::Static(_) => &[],
            CompiledExpr::Dynamic(i) => i.free_vars(),
        }
    }

    pub fn source(&self) -> String {
        match self {
            CompiledExpr::Static(v) => v.to_text(),
            CompiledExpr::Dynamic(i) => i.source().to_string(),
        }
    }
}

/// Post-processing applied to an expression's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    #[default]
    Raw,
    /// Set of active names, e.g. `class`.
    TokenList,
    /// Inline `key: value` pairs, e.g. `style`.
    KeyValue,
}

impl OutputKind {
    pub fn apply(self, v: Value) -> Value {
        match (self, &v) {
            (OutputKind::TokenList, Value::Array(items)) => Value::from(
                items
                    .iter()
                    .filter(|i| !i.is_nullish())
                    .map(Value::to_text)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            (OutputKind::TokenList, Value::Object(map)) => Value::from(
                map.iter()
                    .filter(|(_, on)| on.truthy())
                    .map(|(k, _)| k.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            (OutputKind::KeyValue, Value::Object(map)) => Value::from(
                map.iter()
                    .filter(|(_, val)| !val.is_nullish())
                    .map(|(k, val)| format!("{k}: {}", val.to_text()))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => v,
        }
    }
}

/// Handlers bound on previous renders, one slot per batch entry.
///
/// Kept per render instance so a handler keeps its identity across renders
/// as long as the function and receiver do not change.
#[derive(Debug, Default)]
pub struct BindCache {
    slots: Vec<Option<Handler>>,
}

impl BindCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, slot: usize, func: Function, receiver: &Model) -> Handler {
        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, None);
        }
        if let Some(h) = &self.slots[slot] {
            if h.binds(&func, receiver) {
                return h.clone();
            }
        }
        let h = Handler::bind(func, receiver.clone());
        self.slots[slot] = Some(h.clone());
        h
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

struct Entry {
    expr: CompiledExpr,
    output: OutputKind,
}

/// Every expression of one template, evaluated with a single destructuring
/// of the data object per pass.
#[derive(Default)]
pub struct Batch {
    entries: Vec<Entry>,
    free_vars: IndexSet<String>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expression, returning its slot.
    pub fn push(&mut self, expr: CompiledExpr, output: OutputKind) -> usize {
        self.free_vars.extend(expr.free_vars().iter().cloned());
        self.entries.push(Entry { expr, output });
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn expr(&self, slot: usize) -> Option<&CompiledExpr> {
        self.entries.get(slot).map(|e| &e.expr)
    }

    pub fn output(&self, slot: usize) -> OutputKind {
        self.entries.get(slot).map(|e| e.output).unwrap_or_default()
    }

    pub fn free_vars(&self) -> impl Iterator<Item = &str> {
        self.free_vars.iter().map(String::as_str)
    }

    pub fn scope<'a>(&'a self, model: &'a Model) -> Scope<'a> {
        Scope::bind(model, self.free_vars())
    }

    /// Evaluate one slot. Failures are logged and yield `undefined`;
    /// functions come back bound to the data object.
    pub fn evaluate(&self, slot: usize, scope: &Scope<'_>, cache: &mut BindCache) -> Value {
        let Some(entry) = self.entries.get(slot) else {
            return Value::Undefined;
        };
        let value = match &entry.expr {
            CompiledExpr::Static(v) => v.clone(),
            CompiledExpr::Dynamic(interp) => match interp.evaluate(scope) {
                Ok(v) => v,
                Err(err) => {
                    warn!(expr = interp.source(), error = %err, "expression failed, using undefined");
                    Value::Undefined
                }
            },
        };
        trace!(slot, ?value, "evaluated");
        let value = match value {
            Value::Function(f) => Value::Handler(cache.bind(slot, f, scope.model())),
            other => other,
        };
        entry.output.apply(value)
    }

    /// Evaluate every slot in order.
    pub fn evaluate_all(&self, model: &Model, cache: &mut BindCache) -> Vec<Value> {
        let scope = self.scope(model);
        (0..self.entries.len())
            .map(|slot| self.evaluate(slot, &scope, cache))
            .collect()
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (&e.expr, e.output)))
            .finish()
    }
}
