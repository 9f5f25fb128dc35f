//! Output tests for the JSX transpiler.
//!
//! Most cases assert the complete generated code so that factory choice,
//! wrapping and import injection are all checked at once.

use jsx_transformer::{transpile, TransformErrorKind, TranspileOptions};
use pretty_assertions::assert_eq;

const JSX_IMPORT: &str = "import { jsx } from \"jsx-signals/runtime\";\n";

fn transpile_with(source: &str, options: &TranspileOptions) -> String {
    transpile(source, options)
        .unwrap_or_else(|err| panic!("transpile failed: {err}\n{source}"))
        .code
}

fn transpile_default(source: &str) -> String {
    transpile_with(source, &TranspileOptions::default())
}

/// Transpiles a file that only needs the `jsx` factory and strips the import.
fn jsx_body(source: &str) -> String {
    let code = transpile_default(source);
    code.strip_prefix(JSX_IMPORT)
        .unwrap_or_else(|| panic!("missing jsx import:\n{code}"))
        .to_string()
}

fn error_kind(source: &str, options: &TranspileOptions) -> TransformErrorKind {
    transpile(source, options)
        .err()
        .unwrap_or_else(|| panic!("expected an error for {source}"))
        .kind
}

// ============================================================================
// FRAGMENTS
// ============================================================================

#[test]
fn test_empty_fragment() {
    assert_eq!(
        transpile_default("<></>"),
        "import { jsx, Fragment } from \"jsx-signals/runtime\";\njsx(Fragment, {})"
    );
}

#[test]
fn test_fragment_with_text() {
    assert_eq!(
        transpile_default("<>text</>"),
        "import { jsx, Fragment } from \"jsx-signals/runtime\";\njsx(Fragment, { children: \"text\" })"
    );
}

#[test]
fn test_fragment_whitespace_only_child_is_dropped() {
    assert_eq!(
        transpile_default("<>\n\t</>"),
        "import { jsx, Fragment } from \"jsx-signals/runtime\";\njsx(Fragment, {})"
    );
}

#[test]
fn test_fragment_inherits_namespace() {
    insta::assert_snapshot!(
        transpile_default("<svg><>{shape}</></svg>"),
        @r#"
    import { svg, Fragment } from "jsx-signals/runtime";
    svg("svg", { children: svg(Fragment, { children: shape }) })
    "#
    );
}

// ============================================================================
// CHILDREN
// ============================================================================

#[test]
fn test_text_is_trimmed_and_collapsed() {
    assert_eq!(
        jsx_body("<p>\n    Hello,\n    world\n</p>"),
        "jsx(\"p\", { children: \"Hello, world\" })"
    );
}

#[test]
fn test_entities_are_decoded() {
    assert_eq!(
        jsx_body("<p>a &amp; b &lt; c</p>"),
        "jsx(\"p\", { children: \"a & b < c\" })"
    );
}

#[test]
fn test_reactive_spread_child_wraps_whole_array() {
    assert_eq!(
        jsx_body("<p>{0}{...fn()}{gn()}</p>"),
        "jsx(\"p\", { children: () => [0, ...fn(), gn()] })"
    );
}

#[test]
fn test_mixed_children_on_intrinsic_wrap_each_reactive_entry() {
    assert_eq!(
        jsx_body("<p>Hello {name.first}!</p>"),
        "jsx(\"p\", { children: [\"Hello \", () => name.first, \"!\"] })"
    );
}

#[test]
fn test_all_reactive_children_on_intrinsic_share_one_thunk() {
    assert_eq!(
        jsx_body("<p>{a.b}{c()}</p>"),
        "jsx(\"p\", { children: () => [a.b, c()] })"
    );
}

#[test]
fn test_static_children_stay_plain() {
    assert_eq!(
        jsx_body("<p>{count} items</p>"),
        "jsx(\"p\", { children: [count, \" items\"] })"
    );
}

#[test]
fn test_empty_expression_children_are_skipped() {
    assert_eq!(
        jsx_body("<p>{/* note */}{value}{}</p>"),
        "jsx(\"p\", { children: value })"
    );
}

#[test]
fn test_text_around_empty_expression_is_one_run() {
    assert_eq!(
        jsx_body("<p>a {} b</p>"),
        "jsx(\"p\", { children: \"a b\" })"
    );
}

#[test]
fn test_component_reactive_child_uses_getter() {
    assert_eq!(
        jsx_body("<FC>{['a', ...unknown.value]}</FC>"),
        "jsx(FC, { get children() { return ['a', ...unknown.value]; } })"
    );
}

#[test]
fn test_component_static_child_is_plain() {
    assert_eq!(
        jsx_body("<FC>{['a', ...unknown]}</FC>"),
        "jsx(FC, { children: ['a', ...unknown] })"
    );
}

#[test]
fn test_component_mixed_children() {
    assert_eq!(
        jsx_body("<Greet>Hi {user.name}</Greet>"),
        "jsx(Greet, { children: [\"Hi \", () => user.name] })"
    );
}

#[test]
fn test_nested_elements() {
    insta::assert_snapshot!(
        jsx_body("<ul>\n  <li>one</li>\n  <li class=\"x\">two</li>\n</ul>"),
        @r#"jsx("ul", { children: [jsx("li", { children: "one" }), " ", jsx("li", { class: "x", children: "two" })] })"#
    );
}

#[test]
fn test_jsx_inside_child_expression() {
    assert_eq!(
        jsx_body("<ul>{items.map(item => <li>{item}</li>)}</ul>"),
        "jsx(\"ul\", { children: () => items.map(item => jsx(\"li\", { children: item })) })"
    );
}

// ============================================================================
// ATTRIBUTES
// ============================================================================

#[test]
fn test_event_handlers_are_never_wrapped() {
    assert_eq!(
        jsx_body("<button onClick={handlers.get('save')} title={t.x} />"),
        "jsx(\"button\", { onClick: handlers.get('save'), title: () => t.x })"
    );
}

#[test]
fn test_component_reactive_attribute_uses_getter() {
    assert_eq!(
        jsx_body("<Card title={t.x} count={1} />"),
        "jsx(Card, { get title() { return t.x; }, count: 1 })"
    );
}

#[test]
fn test_directive_attribute_uses_getter() {
    assert_eq!(
        jsx_body("<div is:visible={shown.get()} />"),
        "jsx(\"div\", { get \"is:visible\"() { return shown.get(); } })"
    );
}

#[test]
fn test_object_literal_thunk_is_parenthesized() {
    assert_eq!(
        jsx_body("<div style={{ color: theme.color }} />"),
        "jsx(\"div\", { style: () => ({ color: theme.color }) })"
    );
}

#[test]
fn test_spread_boolean_and_string_attributes() {
    assert_eq!(
        jsx_body("<input {...props.rest} disabled data-id=\"a&quot;b\" />"),
        "jsx(\"input\", { ...props.rest, disabled: true, \"data-id\": \"a\\\"b\" })"
    );
}

#[test]
fn test_element_attribute_value() {
    assert_eq!(
        transpile_default("<Layout header={<h1>T</h1>} footer={<></>} />"),
        "import { jsx, Fragment } from \"jsx-signals/runtime\";\n\
         jsx(Layout, { header: jsx(\"h1\", { children: \"T\" }), footer: jsx(Fragment, {}) })"
    );
}

#[test]
fn test_key_is_third_argument() {
    assert_eq!(
        jsx_body("<li key={id} class=\"row\">x</li>"),
        "jsx(\"li\", { class: \"row\", children: \"x\" }, id)"
    );
}

#[test]
fn test_reactive_key_rejected_by_default() {
    assert_eq!(
        error_kind("<Item key={item.id} />", &TranspileOptions::default()),
        TransformErrorKind::ReactiveKey
    );
}

#[test]
fn test_reactive_key_passed_through_when_allowed() {
    let options = TranspileOptions::default().with_strict_keys(false);
    assert_eq!(
        transpile_with("<Item key={item.id} />", &options),
        format!("{JSX_IMPORT}jsx(Item, {{}}, item.id)")
    );
}

// ============================================================================
// TAGS
// ============================================================================

#[test]
fn test_tag_kinds() {
    assert_eq!(
        jsx_body("[<Menu.Item />, <my-widget />, <Button />, <foo:bar />]"),
        "[jsx(Menu.Item, {}), jsx(\"my-widget\", {}), jsx(Button, {}), jsx(\"foo:bar\", {})]"
    );
}

#[test]
fn test_svg_tag_switches_namespace() {
    assert_eq!(
        transpile_default("<svg><g /></svg>"),
        "import { svg } from \"jsx-signals/runtime\";\nsvg(\"svg\", { children: svg(\"g\", {}) })"
    );
}

#[test]
fn test_prefixed_tags_are_stripped() {
    assert_eq!(
        transpile_default("<div><svg:circle r={1} /><xhtml:span /></div>"),
        "import { jsx, svg, xhtml } from \"jsx-signals/runtime\";\n\
         jsx(\"div\", { children: [svg(\"circle\", { r: 1 }), xhtml(\"span\", {})] })"
    );
}

#[test]
fn test_xmlns_switches_and_nests() {
    let source = r#"<div xmlns="http://www.w3.org/2000/svg"><g><foreignObject><div xmlns="http://www.w3.org/1999/xhtml"><span /></div></foreignObject></g></div>"#;
    insta::assert_snapshot!(transpile_default(source), @r#"
    import { svg, xhtml } from "jsx-signals/runtime";
    svg("div", { xmlns: "http://www.w3.org/2000/svg", children: svg("g", { children: svg("foreignObject", { children: xhtml("div", { xmlns: "http://www.w3.org/1999/xhtml", children: xhtml("span", {}) }) }) }) })
    "#);
}

#[test]
fn test_xmlns_expression_string_literal() {
    assert_eq!(
        transpile_default("<g xmlns={\"http://www.w3.org/2000/svg\"} />"),
        "import { svg } from \"jsx-signals/runtime\";\n\
         svg(\"g\", { xmlns: \"http://www.w3.org/2000/svg\" })"
    );
}

#[test]
fn test_invalid_xmlns_is_an_error() {
    let err = transpile("let a;\n<div xmlns=\"urn:nope\" />", &TranspileOptions::default())
        .err()
        .expect("unknown namespace should fail");
    assert_eq!(
        err.kind,
        TransformErrorKind::InvalidXmlns {
            value: "urn:nope".to_string()
        }
    );
    assert_eq!(err.location.line, 2);
    assert_eq!(err.location.column, 6);
    assert!(err.to_string().contains("urn:nope"));
}

#[test]
fn test_non_string_xmlns_is_an_error() {
    let options = TranspileOptions::default();
    assert_eq!(
        error_kind("<div xmlns={ns} />", &options),
        TransformErrorKind::NonStringXmlns
    );
    assert_eq!(
        error_kind("<div xmlns />", &options),
        TransformErrorKind::NonStringXmlns
    );
}

#[test]
fn test_syntax_error_produces_no_output() {
    let options = TranspileOptions::default();
    assert!(matches!(
        error_kind("<div>", &options),
        TransformErrorKind::Parse { .. }
    ));
}

// ============================================================================
// MODULE HANDLING
// ============================================================================

#[test]
fn test_jsx_in_ordinary_code() {
    assert_eq!(
        jsx_body("const el = cond ? <a /> : <b />;\nexport default el;\n"),
        "const el = cond ? jsx(\"a\", {}) : jsx(\"b\", {});\nexport default el;\n"
    );
}

#[test]
fn test_merges_with_existing_runtime_import() {
    assert_eq!(
        transpile_default("import { signal } from \"jsx-signals/runtime\";\n<p />;\n"),
        "import { signal, jsx } from \"jsx-signals/runtime\";\njsx(\"p\", {});\n"
    );
}

#[test]
fn test_legacy_runtime_specifier_is_rewritten() {
    assert_eq!(
        transpile_default("import { Fragment } from 'jsx-signals/jsx-runtime';\n<></>;\n"),
        "import { Fragment, jsx } from 'jsx-signals/runtime';\njsx(Fragment, {});\n"
    );
}

#[test]
fn test_default_ext_appends_to_relative_specifiers() {
    let options = TranspileOptions::default().with_default_ext("js");
    assert_eq!(
        transpile_with(
            "import a from \"./a\";\nimport b from \"pkg\";\nconst m = import(\"../m\");\n<A />;\n",
            &options
        ),
        "import { jsx } from \"jsx-signals/runtime\";\n\
         import a from \"./a.js\";\nimport b from \"pkg\";\nconst m = import(\"../m.js\");\njsx(A, {});\n"
    );
}

#[test]
fn test_custom_runtime_module() {
    let options = TranspileOptions::default().with_runtime_module("@app/runtime");
    assert_eq!(
        transpile_with("<p />", &options),
        "import { jsx } from \"@app/runtime\";\njsx(\"p\", {})"
    );
}

#[test]
fn test_typescript_source() {
    let options = TranspileOptions::default().with_source_file_name("App.tsx");
    assert_eq!(
        transpile_with("const n: number = 1;\n<p>{n}</p>;\n", &options),
        format!("{JSX_IMPORT}const n: number = 1;\njsx(\"p\", {{ children: n }});\n")
    );
}

// ============================================================================
// FORMATTING
// ============================================================================

#[test]
fn test_compact_output() {
    let options = TranspileOptions::default().with_compact(true);
    assert_eq!(
        transpile_with("<Card title={t.x}>{a.b} c</Card>", &options),
        "import { jsx } from \"jsx-signals/runtime\";\n\
         jsx(Card,{get title(){return t.x;},children:[()=>a.b,\" c\"]})"
    );
}

#[test]
fn test_minified_output() {
    let options = TranspileOptions::default().with_minified(true);
    assert_eq!(
        transpile_with("<p title={a.b}>hi</p>", &options),
        "import{jsx}from\"jsx-signals/runtime\";jsx(\"p\",{title:()=>a.b,children:\"hi\"})"
    );
}
