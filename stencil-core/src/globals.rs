use indexmap::IndexMap;

use crate::error::EvalError;
use crate::value::{Object, Value};

/// Ambient names every expression can read without binding them from the
/// data object.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    names: IndexMap<String, Value>,
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

fn math1(f: fn(f64) -> f64) -> Value {
    Value::function(move |_, args| Ok(Value::Number(f(arg(args, 0).to_number()))))
}

impl Globals {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut g = Globals::empty();

        let math: Object = [
            ("floor", math1(f64::floor)),
            ("ceil", math1(f64::ceil)),
            ("round", math1(|n| (n + 0.5).floor())),
            ("abs", math1(f64::abs)),
            (
                "min",
                Value::function(|_, args| {
                    Ok(Value::Number(
                        args.iter().map(Value::to_number).fold(f64::INFINITY, f64::min),
                    ))
                }),
            ),
            (
                "max",
                Value::function(|_, args| {
                    Ok(Value::Number(
                        args.iter().map(Value::to_number).fold(f64::NEG_INFINITY, f64::max),
                    ))
                }),
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        g.insert("Math", Value::from(math));

        g.insert(
            "String",
            Value::function(|_, args| Ok(Value::from(arg(args, 0).to_text()))),
        );
        g.insert(
            "Number",
            Value::function(|_, args| Ok(Value::Number(arg(args, 0).to_number()))),
        );
        g.insert(
            "Boolean",
            Value::function(|_, args| Ok(Value::Bool(arg(args, 0).truthy()))),
        );
        g.insert(
            "JSON",
            Value::object([(
                "stringify",
                Value::function(|_, args| {
                    Ok(arg(args, 0).to_json().map(Value::from).unwrap_or_default())
                }),
            )]),
        );
        g.insert(
            "Array",
            Value::object([(
                "isArray",
                Value::function(|_, args| Ok(Value::Bool(matches!(arg(args, 0), Value::Array(_))))),
            )]),
        );
        g.insert(
            "Object",
            Value::object([(
                "keys",
                Value::function(|_, args| match arg(args, 0) {
                    Value::Object(map) => Ok(Value::array(map.keys().map(Value::str))),
                    Value::Array(items) => {
                        Ok(Value::array((0..items.len()).map(|i| Value::from(i.to_string()))))
                    }
                    other if other.is_nullish() => Err(EvalError::Type(
                        "cannot convert undefined or null to object".into(),
                    )),
                    _ => Ok(Value::array([])),
                }),
            )]),
        );
        g.insert("NaN", Value::Number(f64::NAN));
        g.insert("Infinity", Value::Number(f64::INFINITY));
        g
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.names.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.names.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }
}
