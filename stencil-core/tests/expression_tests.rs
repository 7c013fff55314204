use std::cell::Cell;
use std::rc::Rc;

use stencil_core::{
    BindCache, Batch, CompiledExpr, ExtractOptions, Model, OutputKind, Parser, Value,
};

fn eval(text: &str, model: &Model) -> Value {
    let mut batch = Batch::new();
    let slot = batch.push(
        CompiledExpr::compile(text, &Parser::default(), &ExtractOptions::default()),
        OutputKind::Raw,
    );
    batch.evaluate_all(model, &mut BindCache::new()).remove(slot)
}

#[test]
fn arithmetic_and_concatenation() {
    let m = Model::new().with("a", 2).with("b", "x");
    assert_eq!(eval("${ a * 3 + 1 }", &m), Value::from(7));
    assert_eq!(eval("${ b + a }", &m), Value::from("x2"));
    assert_eq!(eval("${ (a + 1) % 2 }", &m), Value::from(1));
}

#[test]
fn logical_operators_return_operands() {
    let m = Model::new().with("name", "").with("fallback", "anon");
    assert_eq!(eval("${ name || fallback }", &m), Value::from("anon"));
    assert_eq!(eval("${ name ?? fallback }", &m), Value::from(""));
    assert_eq!(eval("${ missing ?? fallback }", &m), Value::from("anon"));
    assert_eq!(eval("${ !name && 'empty' }", &m), Value::from("empty"));
}

#[test]
fn member_access_and_length() {
    let user = Value::object([("tags", Value::array([Value::from("a"), Value::from("b")]))]);
    let m = Model::new().with("user", user);
    assert_eq!(eval("${ user.tags.length }", &m), Value::from(2));
    assert_eq!(eval("${ user.tags[1] }", &m), Value::from("b"));
    assert_eq!(eval("${ user['tags'][0] }", &m), Value::from("a"));
    assert_eq!(eval("${ 'abc'.length }", &m), Value::from(3));
}

#[test]
fn this_reads_the_data_object() {
    let m = Model::new().with("d", 5);
    assert_eq!(eval("${ this.d }", &m), Value::from(5));
}

#[test]
fn item_is_visible_as_a_free_variable() {
    let m = Model::new().with("item", Value::object([("label", Value::from("one"))]));
    assert_eq!(eval("${ item.label }", &m), Value::from("one"));
}

#[test]
fn comparison_and_ternary() {
    let m = Model::new().with("n", 3);
    assert_eq!(eval("${ n > 2 ? 'big' : 'small' }", &m), Value::from("big"));
    assert_eq!(eval("${ n === 3 }", &m), Value::Bool(true));
    assert_eq!(eval("${ n == '3' }", &m), Value::Bool(true));
    assert_eq!(eval("${ n === '3' }", &m), Value::Bool(false));
    assert_eq!(eval("${ typeof n }", &m), Value::from("number"));
}

#[test]
fn globals_are_available_without_binding() {
    let m = Model::new().with("xs", Value::array([Value::from(1), Value::from(4)]));
    assert_eq!(eval("${ Math.max(xs[0], xs[1]) }", &m), Value::from(4));
    assert_eq!(eval("${ Math.floor(7 / 2) }", &m), Value::from(3));
    assert_eq!(eval("${ JSON.stringify(xs) }", &m), Value::from("[1,4]"));
    assert_eq!(eval("${ Array.isArray(xs) }", &m), Value::Bool(true));
}

#[test]
fn calls_receive_the_data_object() {
    let m = Model::new().with("greeting", "hi").with(
        "greet",
        Value::function(|this, args| {
            let name = args.first().cloned().unwrap_or_default();
            Ok(Value::from(format!("{} {}", this.get("greeting"), name)))
        }),
    );
    assert_eq!(eval("${ greet('bob') }", &m), Value::from("hi bob"));
}

#[test]
fn mixed_text_drops_nullish_parts() {
    let m = Model::new().with("first", "Ada");
    assert_eq!(eval("Hello ${first} ${last}!", &m), Value::from("Hello Ada !"));
}

#[test]
fn throwing_function_yields_undefined() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let m = Model::new().with(
        "boom",
        Value::function(move |_, _| {
            counter.set(counter.get() + 1);
            Err(stencil_core::EvalError::Thrown("boom".into()))
        }),
    );
    assert_eq!(eval("${ boom() }", &m), Value::Undefined);
    assert_eq!(calls.get(), 1);
}

#[test]
fn calling_a_non_function_is_recovered() {
    let m = Model::new().with("n", 1);
    assert_eq!(eval("${ n() }", &m), Value::Undefined);
}
