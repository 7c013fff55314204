use stencil_compiler::TemplateRegistry;
use stencil_core::{Model, Value};
use stencil_dom::{Document, Host, Mutation, NodeId, inner_html, parse_fragment};
use stencil_renderer::{MAX_REPETITIONS, RenderInstance};

fn instance(doc: &mut Document, markup: &str) -> RenderInstance<Document> {
    let root = parse_fragment(doc, markup).unwrap();
    let tpl = doc.child(&root, 0).unwrap();
    let compiled = TemplateRegistry::default().compile(doc, &tpl).unwrap();
    RenderInstance::new(compiled)
}

fn setup(markup: &str) -> (Document, RenderInstance<Document>, NodeId) {
    let mut doc = Document::new();
    let inst = instance(&mut doc, markup);
    let main = doc.create_element("main");
    (doc, inst, main)
}

fn strs(items: &[&str]) -> Value {
    Value::array(items.iter().map(|s| Value::from(*s)))
}

#[test]
fn renders_text_and_attributes() {
    let (mut doc, mut inst, main) =
        setup(r#"<template><p class="${cls}" title="${title}">Hello ${name}!</p></template>"#);
    let model = Model::new().with("name", "Ann").with(
        "cls",
        Value::object([
            ("a", Value::Bool(true)),
            ("b", Value::Bool(false)),
            ("c", Value::Bool(true)),
        ]),
    );

    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(inner_html(&doc, main), r#"<p class="a c">Hello Ann!</p>"#);

    model.set("title", "greeting");
    model.set("cls", strs(&["x", "y"]));
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(
        inner_html(&doc, main),
        r#"<p class="x y" title="greeting">Hello Ann!</p>"#
    );

    model.remove("title");
    model.set("cls", Value::object([("a", Value::Bool(false))]));
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(inner_html(&doc, main), "<p>Hello Ann!</p>");
}

#[test]
fn renders_style_objects_as_declarations() {
    let (mut doc, mut inst, main) = setup(r#"<template><div style="${css}"></div></template>"#);
    let model = Model::new().with(
        "css",
        Value::object([("color", Value::from("red")), ("margin", Value::from("1px"))]),
    );
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(
        inner_html(&doc, main),
        r#"<div style="color: red; margin: 1px"></div>"#
    );
}

#[test]
fn falsy_text_renders_empty() {
    let (mut doc, mut inst, main) = setup("<template><b>${v}</b></template>");
    let model = Model::new().with("v", false);
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(inner_html(&doc, main), "<b></b>");
    model.set("v", "yes");
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(inner_html(&doc, main), "<b>yes</b>");
}

#[test]
fn unchanged_data_produces_no_mutations() {
    let (mut doc, mut inst, main) = setup(concat!(
        r#"<template><p class="${cls}" on-click="${pick}">${title}</p>"#,
        r#"<ul><template repeat="${items}"><li>${item}</li></template></ul>"#,
        r#"<template if="${open}"><i>${title}</i></template></template>"#,
    ));
    let model = Model::new()
        .with("title", "t")
        .with("cls", strs(&["a"]))
        .with("pick", Value::function(|_, _| Ok(Value::Undefined)))
        .with("items", strs(&["x", "y"]))
        .with("open", true);

    inst.mount(&mut doc, &main, &model).unwrap();
    assert!(!doc.take_journal().is_empty());

    inst.render(&mut doc, &model).unwrap();
    assert_eq!(doc.take_journal(), vec![]);
    assert_eq!(
        inner_html(&doc, main),
        r#"<p class="a">t</p><ul><li>x</li><li>y</li></ul><i>t</i>"#
    );
}

#[test]
fn lists_converge_to_the_source_length() {
    let (mut doc, mut inst, ul) = setup(r#"<template repeat="${items}"><li>${item}</li></template>"#);
    let model = Model::new().with("items", strs(&["a", "b", "c"]));

    inst.mount(&mut doc, &ul, &model).unwrap();
    assert_eq!(inst.instance_count(), 3);
    assert_eq!(inner_html(&doc, ul), "<li>a</li><li>b</li><li>c</li>");

    for (items, html) in [
        (&["a"][..], "<li>a</li>"),
        (&[][..], ""),
        (&["x", "y"][..], "<li>x</li><li>y</li>"),
    ] {
        model.set("items", strs(items));
        inst.render(&mut doc, &model).unwrap();
        assert_eq!(inst.instance_count(), items.len());
        assert_eq!(inner_html(&doc, ul), html);
    }
}

#[test]
fn list_instances_are_reused_by_position() {
    let (mut doc, mut inst, ul) = setup(r#"<template repeat="${items}"><li>${item}</li></template>"#);
    let model = Model::new().with("items", strs(&["a", "b"]));
    inst.mount(&mut doc, &ul, &model).unwrap();
    let before: Vec<NodeId> = doc.children(&ul);
    doc.take_journal();

    model.set("items", strs(&["b", "a"]));
    inst.render(&mut doc, &model).unwrap();

    // same nodes, new values: no keyed moves
    assert_eq!(doc.children(&ul), before);
    assert_eq!(inner_html(&doc, ul), "<li>b</li><li>a</li>");
    assert!(
        !doc.take_journal()
            .iter()
            .any(|m| matches!(m, Mutation::Insert { .. } | Mutation::Remove { .. }))
    );
}

#[test]
fn repeat_restores_item() {
    let (mut doc, mut inst, ul) = setup(r#"<template repeat="${items}"><li>${item}</li></template>"#);
    let model = Model::new()
        .with("items", strs(&["a", "b"]))
        .with("item", "outer");
    inst.mount(&mut doc, &ul, &model).unwrap();
    assert_eq!(model.item(), Value::from("outer"));

    model.remove("item");
    model.set("items", strs(&["c", "d", "e"]));
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(model.item(), Value::Undefined);
}

#[test]
fn repeat_coerces_numbers_booleans_and_objects() {
    let (mut doc, mut inst, main) = setup(r#"<template repeat="${src}"><i>${item}</i></template>"#);
    let model = Model::new().with("src", 3).with("item", "x");
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(inner_html(&doc, main), "<i>x</i><i>x</i><i>x</i>");

    model.set("src", true);
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(inner_html(&doc, main), "<i>x</i>");

    model.set("src", false);
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(inner_html(&doc, main), "");

    model.set("src", "not a list");
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(inst.instance_count(), 0);

    let (mut doc, mut inst, main) =
        setup(r#"<template repeat="${obj}"><i>${item.key}=${item.value}</i></template>"#);
    let model = Model::new().with(
        "obj",
        Value::object([("a", Value::from(1)), ("b", Value::from(2))]),
    );
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(inner_html(&doc, main), "<i>a=1</i><i>b=2</i>");
}

#[test]
fn conditional_keeps_state_while_true() {
    let (mut doc, mut inst, main) = setup(r#"<template if="${show}"><b>on</b></template>"#);
    let model = Model::new().with("show", true);

    inst.mount(&mut doc, &main, &model).unwrap();
    let b = doc.child(&main, 0).unwrap();
    doc.set_attribute(&b, "data-mark", "1");

    inst.render(&mut doc, &model).unwrap();
    assert_eq!(doc.child(&main, 0), Some(b));
    assert_eq!(doc.attribute(&b, "data-mark").as_deref(), Some("1"));

    model.set("show", false);
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(inner_html(&doc, main), "");
    assert_eq!(inst.instance_count(), 0);

    model.set("show", true);
    doc.take_journal();
    inst.render(&mut doc, &model).unwrap();
    let fresh = doc.child(&main, 0).unwrap();
    assert_ne!(fresh, b);
    assert_eq!(inner_html(&doc, main), "<b>on</b>");
    let inserts = doc
        .take_journal()
        .into_iter()
        .filter(|m| matches!(m, Mutation::Insert { parent, .. } if *parent == main))
        .count();
    assert_eq!(inserts, 1);
}

#[test]
fn else_chains_pick_the_first_true_branch() {
    let (mut doc, mut inst, main) = setup(concat!(
        r#"<template><template if="${a}">A</template>"#,
        r#"<template else if="${b}">B</template>"#,
        "<template else>C</template></template>",
    ));
    let model = Model::new().with("a", true).with("b", true);
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(doc.text(&main), "A");

    model.set("a", false);
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(doc.text(&main), "B");

    model.set("b", false);
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(doc.text(&main), "C");

    model.set("a", true);
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(doc.text(&main), "A");
}

#[test]
fn nested_conditionals_do_not_disturb_the_outer_chain() {
    let (mut doc, mut inst, main) = setup(concat!(
        r#"<template><template if="${a}">A<template if="${z}">Z</template></template>"#,
        "<template else>E</template></template>",
    ));
    let model = Model::new().with("a", true).with("z", false);
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(doc.text(&main), "A");
}

#[test]
fn handlers_attach_once_and_follow_identity() {
    let (mut doc, mut inst, main) =
        setup(r#"<template><button on-click="${inc}">+</button></template>"#);
    let model = Model::new().with("count", 0).with(
        "inc",
        Value::function(|this, _| {
            let n = this.get("count").to_number();
            this.set("count", n + 1.0);
            Ok(Value::Undefined)
        }),
    );
    inst.mount(&mut doc, &main, &model).unwrap();
    let button = doc.child(&main, 0).unwrap();

    assert_eq!(doc.dispatch(button, "click", &[]).unwrap(), 1);
    assert_eq!(model.get("count"), Value::from(1));

    doc.take_journal();
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(doc.take_journal(), vec![]);
    assert_eq!(doc.listener_count(button, "click"), 1);

    model.set("inc", Value::function(|_, _| Ok(Value::Undefined)));
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(
        doc.take_journal(),
        vec![
            Mutation::RemoveListener {
                node: button,
                event: "click".into()
            },
            Mutation::AddListener {
                node: button,
                event: "click".into()
            },
        ]
    );
    doc.dispatch(button, "click", &[]).unwrap();
    assert_eq!(model.get("count"), Value::from(1));

    model.remove("inc");
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(doc.listener_count(button, "click"), 0);
}

#[test]
fn nested_templates_are_spliced_once() {
    let (mut doc, mut inst, main) =
        setup("<template><div><template><span>${x}</span></template></div></template>");
    let model = Model::new().with("x", 1);
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(inner_html(&doc, main), "<div><span>1</span></div>");
    let div = doc.child(&main, 0).unwrap();
    let span = doc.child(&div, 0).unwrap();

    model.set("x", 2);
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(inner_html(&doc, main), "<div><span>2</span></div>");
    assert_eq!(doc.child(&div, 0), Some(span));
    assert_eq!(doc.child_count(&div), 1);
}

#[test]
fn nested_lists_see_the_current_item() {
    let (mut doc, mut inst, main) = setup(concat!(
        r#"<template repeat="${rows}"><tr><template repeat="${item.cells}">"#,
        "<td>${item}</td></template></tr></template>",
    ));
    let rows = Value::array([
        Value::object([("cells", strs(&["a", "b"]))]),
        Value::object([("cells", strs(&["c"]))]),
    ]);
    let model = Model::new().with("rows", rows);
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(
        inner_html(&doc, main),
        "<tr><td>a</td><td>b</td></tr><tr><td>c</td></tr>"
    );
    assert_eq!(model.item(), Value::Undefined);
}

#[test]
fn failing_expressions_render_as_undefined() {
    let (mut doc, mut inst, main) =
        setup(r#"<template><p>${missing.deep}</p><p title="${ok}">${ok}</p></template>"#);
    let model = Model::new().with("ok", "yes");
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(inner_html(&doc, main), r#"<p></p><p title="yes">yes</p>"#);
}

#[test]
fn self_reference_reads_the_data_object() {
    let (mut doc, mut inst, main) = setup("<template><b>${this.name}</b></template>");
    let model = Model::new().with("name", "me");
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(inner_html(&doc, main), "<b>me</b>");
}

#[test]
fn remove_is_recursive_and_idempotent() {
    let (mut doc, mut inst, main) = setup(concat!(
        r#"<template><h1>${title}</h1><template repeat="${items}"><p>${item}</p></template>"#,
        r#"<template if="${open}"><i>open</i></template></template>"#,
    ));
    let model = Model::new()
        .with("title", "T")
        .with("items", strs(&["a", "b"]))
        .with("open", true);
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(doc.child_count(&main), 6);

    inst.remove(&mut doc);
    assert_eq!(doc.child_count(&main), 0);
    assert!(!inst.is_live());
    inst.remove(&mut doc);

    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(
        inner_html(&doc, main),
        "<h1>T</h1><p>a</p><p>b</p><i>open</i>"
    );
}

#[test]
fn static_directives_render_without_data() {
    let (mut doc, mut inst, main) = setup(r#"<template repeat="2"><hr></template>"#);
    inst.mount(&mut doc, &main, &Model::new()).unwrap();
    assert_eq!(inner_html(&doc, main), "<hr><hr>");
}

#[test]
fn unbounded_repeat_counts_render_nothing() {
    let (mut doc, mut inst, main) = setup(r#"<template repeat="Infinity"><hr></template>"#);
    inst.mount(&mut doc, &main, &Model::new()).unwrap();
    assert_eq!(inst.instance_count(), 0);

    let (mut doc, mut inst, main) = setup(r#"<template repeat="${n / 0}"><hr></template>"#);
    let model = Model::new().with("n", 1);
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(inst.instance_count(), 0);

    model.set("n", 0);
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(inst.instance_count(), 0);
}

#[test]
fn huge_repeat_counts_are_clamped() {
    let (mut doc, mut inst, main) = setup(r#"<template repeat="${n}"><hr></template>"#);
    let model = Model::new().with("n", 1e12);
    inst.mount(&mut doc, &main, &model).unwrap();
    assert_eq!(inst.instance_count(), MAX_REPETITIONS);

    model.set("n", 3);
    inst.render(&mut doc, &model).unwrap();
    assert_eq!(inner_html(&doc, main), "<hr><hr><hr>");
}
