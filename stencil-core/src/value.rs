use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::EvalError;
use crate::model::Model;

pub type Object = IndexMap<String, Value>;

/// Dynamically typed value flowing between the data object, expressions and
/// the live tree.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(Rc<[Value]>),
    Object(Rc<Object>),
    Function(Function),
    Handler(Handler),
}

type NativeFn = dyn Fn(&Model, &[Value]) -> Result<Value, EvalError>;

/// A callable stored in the data object. Identity is pointer identity.
#[derive(Clone)]
pub struct Function(Rc<NativeFn>);

impl Function {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Model, &[Value]) -> Result<Value, EvalError> + 'static,
    {
        Function(Rc::new(f))
    }

    pub fn call(&self, this: &Model, args: &[Value]) -> Result<Value, EvalError> {
        (self.0)(this, args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

struct Bound {
    func: Function,
    receiver: Model,
}

/// A [`Function`] bound to the data object it was read from.
///
/// Two handlers are the same listener only if they are the same binding;
/// re-binding the same function to the same receiver produces a new identity,
/// which is why evaluators cache handlers between renders.
#[derive(Clone)]
pub struct Handler(Rc<Bound>);

impl Handler {
    pub fn bind(func: Function, receiver: Model) -> Self {
        Handler(Rc::new(Bound { func, receiver }))
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        self.0.func.call(&self.0.receiver, args)
    }

    pub fn function(&self) -> &Function {
        &self.0.func
    }

    pub fn receiver(&self) -> &Model {
        &self.0.receiver
    }

    /// Whether this handler binds `func` to `receiver`.
    pub fn binds(&self, func: &Function, receiver: &Model) -> bool {
        self.0.func.ptr_eq(func) && self.0.receiver.ptr_eq(receiver)
    }

    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(items.into_iter().collect())
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Rc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Model, &[Value]) -> Result<Value, EvalError> + 'static,
    {
        Value::Function(Function::new(f))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Handler(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) | Value::Object(_) => "object",
            Value::Function(_) | Value::Handler(_) => "function",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric coercion with the usual loose rules.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Str(s) => {
                let t = s.trim();
                if t.is_empty() {
                    0.0
                } else {
                    t.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Array(items) if items.is_empty() => 0.0,
            Value::Array(items) if items.len() == 1 => items[0].to_number(),
            _ => f64::NAN,
        }
    }

    /// String conversion used for attribute values and concatenation.
    pub fn to_text(&self) -> String {
        match self {
            Value::Undefined => "undefined".into(),
            Value::Null => "null".into(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.to_string(),
            Value::Array(items) => items
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_text() })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".into(),
            Value::Function(_) | Value::Handler(_) => "function".into(),
        }
    }

    /// Property read. `None` when the receiver cannot carry properties.
    pub fn property(&self, key: &str) -> Option<Value> {
        match self {
            Value::Undefined | Value::Null => None,
            Value::Str(s) if key == "length" => Some(Value::Number(s.chars().count() as f64)),
            Value::Array(items) if key == "length" => Some(Value::Number(items.len() as f64)),
            Value::Array(items) => Some(
                key.parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default(),
            ),
            Value::Object(map) => Some(map.get(key).cloned().unwrap_or_default()),
            _ => Some(Value::Undefined),
        }
    }

    /// Strict equality: structural for primitives, identity for the rest.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Handler(a), Value::Handler(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::Str(_))
            | (Value::Str(_), Value::Number(_))
            | (Value::Bool(_), _)
            | (_, Value::Bool(_)) => self.to_number() == other.to_number(),
            _ => self.strict_eq(other),
        }
    }

    /// Parse the text of a static directive attribute.
    pub fn from_literal_text(text: &str) -> Value {
        let t = text.trim();
        match t {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => t.parse::<f64>().map(Value::Number).unwrap_or_else(|_| Value::str(t)),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else if n == 0.0 {
        // covers negative zero
        "0".into()
    } else {
        n.to_string()
    }
}

/// Structural equality, with callables compared by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => self.strict_eq(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Function(_) => f.write_str("<function>"),
            Value::Handler(_) => f.write_str("<handler>"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v.into())
    }
}

impl From<Object> for Value {
    fn from(map: Object) -> Self {
        Value::Object(Rc::new(map))
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_print_like_integers_when_whole() {
        assert_eq!(Value::from(3.0).to_text(), "3");
        assert_eq!(Value::from(1.5).to_text(), "1.5");
        assert_eq!(Value::Number(f64::NAN).to_text(), "NaN");
        assert_eq!(Value::from(1e20).to_text(), "100000000000000000000");
        assert_eq!(Value::from(-4.0).to_text(), "-4");
        assert_eq!(Value::from(-0.0).to_text(), "0");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Undefined.truthy());
        assert!(!Value::from(0).truthy());
        assert!(!Value::from("").truthy());
        assert!(Value::from("0").truthy());
        assert!(Value::array([]).truthy());
    }

    #[test]
    fn object_text_is_opaque() {
        let v = Value::object([("a", Value::from(1))]);
        assert_eq!(v.to_text(), "[object Object]");
        assert_eq!(v.property("a"), Some(Value::from(1)));
        assert_eq!(v.property("b"), Some(Value::Undefined));
        assert_eq!(Value::Null.property("a"), None);
    }

    #[test]
    fn literal_text_parsing() {
        assert_eq!(Value::from_literal_text("true"), Value::Bool(true));
        assert_eq!(Value::from_literal_text(" 3 "), Value::from(3));
        assert_eq!(Value::from_literal_text("items"), Value::from("items"));
    }
}
