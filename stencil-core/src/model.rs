use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::{Object, Value};

/// Name of the reserved field the repeat strategy uses for the current element.
pub const ITEM: &str = "item";

#[derive(Default)]
struct Record {
    fields: IndexMap<String, Value>,
    item: Value,
    /// Whether a branch of the current if / else chain was taken.
    chain: Option<bool>,
}

/// The data object a template renders against.
///
/// Cloning a `Model` shares the record: handlers keep a clone as their
/// receiver, and render passes mutate `item` in place.
#[derive(Clone, Default)]
pub struct Model(Rc<RefCell<Record>>);

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion.
    pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Value {
        let rec = self.0.borrow();
        if name == ITEM {
            return rec.item.clone();
        }
        rec.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        name == ITEM || self.0.borrow().fields.contains_key(name)
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        let mut rec = self.0.borrow_mut();
        if name == ITEM {
            rec.item = value;
        } else {
            rec.fields.insert(name, value);
        }
    }

    pub fn remove(&self, name: &str) -> Value {
        let mut rec = self.0.borrow_mut();
        if name == ITEM {
            return std::mem::take(&mut rec.item);
        }
        rec.fields.shift_remove(name).unwrap_or_default()
    }

    pub fn item(&self) -> Value {
        self.0.borrow().item.clone()
    }

    /// Replace `item`, returning the previous value.
    pub fn replace_item(&self, value: Value) -> Value {
        std::mem::replace(&mut self.0.borrow_mut().item, value)
    }

    /// Guard that restores the current `item` when dropped.
    pub fn item_scope(&self) -> ItemScope<'_> {
        ItemScope {
            model: self,
            saved: Some(self.item()),
        }
    }

    pub fn chain(&self) -> Option<bool> {
        self.0.borrow().chain
    }

    pub fn set_chain(&self, chain: Option<bool>) -> Option<bool> {
        std::mem::replace(&mut self.0.borrow_mut().chain, chain)
    }

    /// Object view of every field, `item` included when defined.
    pub fn snapshot(&self) -> Value {
        let rec = self.0.borrow();
        let mut map: Object = rec.fields.clone();
        if !rec.item.is_undefined() {
            map.insert(ITEM.to_string(), rec.item.clone());
        }
        Value::from(map)
    }

    pub fn ptr_eq(&self, other: &Model) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rec = self.0.borrow();
        f.debug_struct("Model")
            .field("fields", &rec.fields)
            .field("item", &rec.item)
            .finish()
    }
}

impl From<Object> for Model {
    fn from(fields: Object) -> Self {
        Model(Rc::new(RefCell::new(Record {
            fields,
            ..Record::default()
        })))
    }
}

/// Restores `item` on drop, including early returns out of a render pass.
pub struct ItemScope<'a> {
    model: &'a Model,
    saved: Option<Value>,
}

impl ItemScope<'_> {
    pub fn set(&self, value: Value) {
        self.model.replace_item(value);
    }

    /// The value `item` had when the scope was opened.
    pub fn outer(&self) -> &Value {
        self.saved.as_ref().unwrap_or(&Value::Undefined)
    }
}

impl Drop for ItemScope<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.model.replace_item(saved);
        }
    }
}
