use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn render_first_template_with_data() {
    let html = stencil_cli::render_cmd(
        &fixture("page.html"),
        Some(&fixture("data.json")),
        None,
        None,
        1,
    )
    .expect("render page");
    assert_eq!(
        html,
        r#"<h1 class="big">Todo</h1><ul><li>milk</li><li>eggs</li></ul><p>2 items</p>"#
    );
}

#[test]
fn render_takes_the_else_branch_for_empty_lists() {
    let html = stencil_cli::render_cmd(
        &fixture("page.html"),
        Some(&fixture("empty.json")),
        Some("page"),
        None,
        3,
    )
    .expect("render page");
    assert_eq!(html, r#"<h1 class="plain">Todo</h1><ul></ul><p>empty</p>"#);
}

#[test]
fn render_selects_template_by_id() {
    let html = stencil_cli::render_cmd(
        &fixture("page.html"),
        Some(&fixture("data.json")),
        Some("badge"),
        None,
        1,
    )
    .expect("render badge");
    assert_eq!(html, r#"<span style="color: red">new</span>"#);
}

#[test]
fn render_reports_missing_templates() {
    let err = stencil_cli::render_cmd(&fixture("page.html"), None, Some("nope"), None, 1)
        .expect_err("unknown id");
    assert!(err.to_string().contains("no template with id"));
}

#[test]
fn config_renames_directives() {
    let html = stencil_cli::render_cmd(
        &fixture("each.html"),
        Some(&fixture("rows.json")),
        None,
        Some(&fixture("each.toml")),
        2,
    )
    .expect("render rows");
    assert_eq!(html, "<b>a</b><b>b</b>");
}

#[test]
fn inspect_lists_every_template() {
    let out = stencil_cli::inspect_cmd(&fixture("page.html"), None).expect("inspect");
    assert!(out.contains("template page\nplain\n"));
    assert!(out.contains("repeat ${items}"));
    assert!(out.contains("if ${items.length == 0}"));
    assert!(out.contains("else\n"));
    assert!(out.contains("template badge\n"));
    assert!(out.contains("attr style ${css}"));
}
