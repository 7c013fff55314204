use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use stencil_compiler::TemplateRegistry;
use stencil_core::{Model, Value};
use stencil_dom::{Document, Host, parse_fragment};
use stencil_renderer::RenderInstance;

const ROW: &str = concat!(
    r#"<template repeat="${rows}">"#,
    r#"<li class="${ item.n % 2 == 1 ? 'odd' : 'even' }" title="row ${item.n}">${item.label}</li>"#,
    "</template>",
);

fn rows(count: usize, tag: &str) -> Value {
    Value::array((0..count).map(|n| {
        Value::object([
            ("n", Value::from(n)),
            ("label", Value::from(format!("{tag} {n}"))),
        ])
    }))
}

fn bench_list_rerender(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_rerender");
    group.sample_size(20);
    for &count in &[50usize, 200usize, 1000usize] {
        let mut doc = Document::new();
        let root = parse_fragment(&mut doc, ROW).expect("markup");
        let tpl = doc.child(&root, 0).expect("template");
        let compiled = TemplateRegistry::default()
            .compile(&mut doc, &tpl)
            .expect("compile");
        let mut inst = RenderInstance::new(compiled);
        let ul = doc.create_element("ul");
        let model = Model::new().with("rows", rows(count, "a"));
        inst.mount(&mut doc, &ul, &model).expect("mount");

        let (a, b) = (rows(count, "a"), rows(count, "b"));
        let mut flip = false;
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bench, _| {
            bench.iter(|| {
                flip = !flip;
                model.set("rows", if flip { b.clone() } else { a.clone() });
                inst.render(&mut doc, &model).expect("render");
                doc.take_journal();
            });
        });
    }
    group.finish();
}

fn bench_unchanged_rerender(c: &mut Criterion) {
    let mut doc = Document::new();
    let root = parse_fragment(&mut doc, ROW).expect("markup");
    let tpl = doc.child(&root, 0).expect("template");
    let compiled = TemplateRegistry::default()
        .compile(&mut doc, &tpl)
        .expect("compile");
    let mut inst = RenderInstance::new(compiled);
    let ul = doc.create_element("ul");
    let model = Model::new().with("rows", rows(200, "a"));
    inst.mount(&mut doc, &ul, &model).expect("mount");

    c.bench_function("unchanged_rerender_200", |bench| {
        bench.iter(|| inst.render(&mut doc, &model).expect("render"));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().without_plots();
    targets = bench_list_rerender, bench_unchanged_rerender
}
criterion_main!(benches);
