//! End-to-end tests for the inlining pipeline.

use mordant_css::tokenize;
use mordant_dom::{DomTree, NodeId, serialize};
use mordant_html::parse_html;
use mordant_inliner::residual::insert_residual;
use mordant_inliner::{AttributeRule, InlinerConfig, InlinerError, MergePolicy, StylesInliner, inline};

/// Inline with the default configuration.
fn run(html: &str) -> String {
    StylesInliner::new(InlinerConfig::default())
        .unwrap()
        .inline(html)
        .unwrap()
}

fn run_with(config: InlinerConfig, html: &str) -> String {
    StylesInliner::new(config).unwrap().inline(html).unwrap()
}

fn first(tree: &DomTree, tag: &str) -> NodeId {
    tree.elements_by_tag_name(tag).next().unwrap()
}

/// Text of the `<style>` elements left in a serialized document.
fn residual_css(html: &str) -> Vec<String> {
    let tree = parse_html(html).unwrap();
    tree.elements_by_tag_name("style")
        .map(|id| tree.text_content(id))
        .collect()
}

#[test]
fn test_rules_move_into_style_attributes() {
    let output = run(
        "<html><head><style>p { color: red }</style></head><body><p>x</p></body></html>",
    );

    assert_eq!(
        output,
        r#"<html><head></head><body><p style="color: red;">x</p></body></html>"#
    );
}

#[test]
fn test_residual_rules_are_written_to_head() {
    let html = concat!(
        "<html><head><style>",
        "@media screen and (max-width:600px){ p{color:red;} a:hover{color:yellow;} }",
        "</style></head><body><p>x</p><a href=\"/\">y</a></body></html>"
    );
    let output = run(html);
    let tree = parse_html(&output).unwrap();

    let style = first(&tree, "style");
    assert_eq!(tree.parent(style), tree.head());
    assert_eq!(tree.attribute(style, "type"), Some("text/css"));
    assert_eq!(tree.attribute(first(&tree, "p"), "style"), None);
    assert_eq!(tree.attribute(first(&tree, "a"), "style"), None);
}

#[test]
fn test_residual_stylesheet_re_tokenizes_to_the_same_rules() {
    let css = concat!(
        "@media screen and (max-width:600px){ p{color:red;} a:hover{color:yellow;} }\n",
        ".missing { margin: 0 !important }\n",
        "td:first-child { padding: 0; font-family: \"Open Sans\" }\n",
        "@import url(print.css);"
    );
    let output = run(&format!("<style>{css}</style><p>x</p>"));
    let residual = residual_css(&output);

    assert_eq!(residual.len(), 1);
    let original = tokenize(css, &[]);
    let reparsed = tokenize(&residual[0], &[]);
    assert_eq!(original, reparsed);
    for (a, b) in original.iter().zip(&reparsed) {
        assert_eq!(a.properties, b.properties);
        assert_eq!(a.children, b.children);
    }
}

#[test]
fn test_no_residual_style_when_everything_is_inlined() {
    let output = run("<style>p { margin: 0 }</style><p>x</p>");

    assert!(residual_css(&output).is_empty());
}

#[test]
fn test_document_without_styles_is_unchanged() {
    let html = concat!(
        "<!DOCTYPE html><html><head><title>Hi</title></head>",
        "<body><!-- keep this comment --><p class=\"x\" style=\"color:blue\">a &amp; b</p></body></html>"
    );

    assert_eq!(run(html), html);
}

#[test]
fn test_unmatched_rules_only_leave_the_residual_block() {
    let html = concat!(
        "<!DOCTYPE html><html><head><style>.nothing { color: red }</style></head>",
        "<body><p>x</p></body></html>"
    );
    let output = run(html);

    assert_eq!(
        output,
        concat!(
            "<!DOCTYPE html><html><head><style type=\"text/css\">.nothing { color: red; }</style></head>",
            "<body><p>x</p></body></html>"
        )
    );
}

#[test]
fn test_attribute_rule_respects_override_flag() {
    let html = concat!(
        "<style>img.hero { width: 2500px; } img.logo { width: 300px; }</style>",
        "<img class=\"hero\" src=\"a.png\"><img class=\"logo\" width=\"10\" src=\"b.png\">"
    );
    let mut rule = AttributeRule::image_width();
    rule.override_if_already_existing = false;
    let config = InlinerConfig::default().with_attribute_rules(vec![rule]);

    let tree = parse_html(&run_with(config, html)).unwrap();
    let images: Vec<NodeId> = tree.elements_by_tag_name("img").collect();
    assert_eq!(tree.attribute(images[0], "width"), Some("2500"));
    assert_eq!(tree.attribute(images[1], "width"), Some("10"));

    // the built-in rule overrides
    let tree = parse_html(&run(html)).unwrap();
    let images: Vec<NodeId> = tree.elements_by_tag_name("img").collect();
    assert_eq!(tree.attribute(images[1], "width"), Some("300"));
}

#[test]
fn test_attribute_rules_see_existing_inline_styles() {
    let output = run(r#"<style>p { margin: 0 }</style><img style="width: 100%"><p>x</p>"#);
    let tree = parse_html(&output).unwrap();

    assert_eq!(tree.attribute(first(&tree, "img"), "width"), Some("100%"));
}

#[test]
fn test_free_function_uses_policy_and_rules() {
    let html = "<style>p { color: red } p { color: blue }</style><p>x</p>";

    let output = inline(html, MergePolicy::AlwaysAppend, &[]).unwrap();
    assert!(output.contains(r#"style="color: red; color: blue;""#));

    let output = inline(html, MergePolicy::ProcessSpecificity, &[]).unwrap();
    assert!(output.contains(r#"style="color: blue;""#));
}

#[test]
fn test_blank_input_is_rejected() {
    let inliner = StylesInliner::new(InlinerConfig::default()).unwrap();

    assert!(matches!(inliner.inline(""), Err(InlinerError::InvalidInput(_))));
    assert!(matches!(inliner.inline(" \n\t"), Err(InlinerError::InvalidInput(_))));
}

#[test]
fn test_comment_wrapped_style_content_is_inlined() {
    let output = run("<style><!-- p { color: red } --></style><p>x</p>");

    assert!(output.contains(r#"<p style="color: red;">x</p>"#));
    assert!(residual_css(&output).is_empty());
}

#[test]
fn test_malformed_css_is_kept_as_text() {
    let output = run("<style>p { color: red } div { color: blue;</style><p>x</p><div>y</div>");
    let tree = parse_html(&output).unwrap();

    assert_eq!(tree.attribute(first(&tree, "p"), "style"), Some("color: red;"));
    assert_eq!(tree.attribute(first(&tree, "div"), "style"), None);
    assert_eq!(residual_css(&output), vec!["div { color: blue;".to_string()]);
}

#[test]
fn test_all_style_elements_are_collected() {
    let html = concat!(
        "<html><head><style>p { color: red }</style><style type=\"text/less\">@x: 1;</style></head>",
        "<body><style type=\"TEXT/CSS\">p { margin: 0 }</style><p>x</p></body></html>"
    );
    let output = run(html);
    let tree = parse_html(&output).unwrap();

    assert_eq!(
        tree.attribute(first(&tree, "p"), "style"),
        Some("color: red; margin: 0;")
    );
    assert_eq!(residual_css(&output), vec!["@x: 1;".to_string()]);
}

#[test]
fn test_sanitize_removes_scripts_and_handlers() {
    let html = r#"<p onclick="steal()" class="a">x</p><script>alert(1)</script><img src="x" ONERROR="y">"#;

    let kept = run(html);
    assert!(kept.contains("<script>"));
    assert!(kept.contains("onclick"));

    let config = InlinerConfig {
        sanitize: true,
        ..InlinerConfig::default()
    };
    let cleaned = run_with(config, html);
    assert!(!cleaned.contains("script"));
    assert!(!cleaned.to_ascii_lowercase().contains("onclick"));
    assert!(!cleaned.to_ascii_lowercase().contains("onerror"));
    assert!(cleaned.contains(r#"<p class="a">x</p>"#));
}

#[test]
fn test_wrapper_divs_are_unwrapped_before_matching() {
    let html = concat!(
        "<style>body > p { margin: 0 }</style>",
        "<div class=\"aem-Grid aem-Grid--12\"><div class=\"aem-GridColumn\"><p>x</p></div></div>"
    );
    let config = InlinerConfig {
        wrapper_classes: vec!["aem-Grid".to_string()],
        ..InlinerConfig::default()
    };
    let tree = parse_html(&run_with(config, html)).unwrap();

    assert_eq!(tree.elements_by_tag_name("div").count(), 0);
    let p = first(&tree, "p");
    assert_eq!(tree.parent(p), tree.body());
    assert_eq!(tree.attribute(p, "style"), Some("margin: 0;"));
}

#[test]
fn test_preserved_selectors_from_config() {
    let html = concat!(
        "<style>.ExternalClass p { line-height: 100% } p { margin: 0 }</style>",
        "<div class=\"ExternalClass\"><p>x</p></div>"
    );
    let config = InlinerConfig {
        preserve_selectors: vec![r"\.ExternalClass\b".to_string()],
        ..InlinerConfig::default()
    };
    let output = run_with(config, html);

    assert_eq!(
        residual_css(&output),
        vec![".ExternalClass p { line-height: 100%; }".to_string()]
    );
    assert!(output.contains(r#"<p style="margin: 0;">"#));
}

#[test]
fn test_invalid_patterns_fail_construction() {
    let config = InlinerConfig {
        preserve_selectors: vec!["(".to_string()],
        ..InlinerConfig::default()
    };
    assert!(matches!(StylesInliner::new(config), Err(InlinerError::Config(_))));
}

#[test]
fn test_json_envelope() {
    let inliner = StylesInliner::new(InlinerConfig::default()).unwrap();
    let content = r#"{"id": 7, "html": "<style>p{color:red}</style><p>x</p>"}"#;

    let output: serde_json::Value = serde_json::from_str(&inliner.inline_json(content).unwrap()).unwrap();
    assert_eq!(output["id"], 7);
    assert!(
        output["html"]
            .as_str()
            .unwrap()
            .contains(r#"<p style="color: red;">x</p>"#)
    );

    assert!(matches!(
        inliner.inline_json(r#"{"html": 3}"#),
        Err(InlinerError::InvalidInput(_))
    ));
    assert!(matches!(
        inliner.inline_json("<p>not json</p>"),
        Err(InlinerError::Json(_))
    ));
}

#[test]
fn test_output_is_deterministic() {
    let html = concat!(
        "<style>td { padding: 0 } .a, .b { color: red } #c { color: blue !important } ",
        "@media print { td { padding: 1px } } a:hover { color: red }</style>",
        "<table><tr><td class=\"a\" id=\"c\" style=\"color: green\">x</td><td class=\"b\">y</td></tr></table>"
    );

    for policy in [
        MergePolicy::ProcessSpecificity,
        MergePolicy::IgnoreSpecificity,
        MergePolicy::AlwaysAppend,
    ] {
        let inliner = StylesInliner::new(InlinerConfig::default().with_policy(policy)).unwrap();
        assert_eq!(inliner.inline(html).unwrap(), inliner.inline(html).unwrap(), "{policy}");
    }
}

#[test]
fn test_head_is_created_for_residual_rules() {
    let mut tree = DomTree::new();
    let html = tree.create_element("html");
    let body = tree.create_element("body");
    tree.append_child(tree.root(), html);
    tree.append_child(html, body);

    let style = insert_residual(&mut tree, "a:hover { color: red; }").unwrap();

    let head = tree.head().unwrap();
    assert_eq!(tree.first_child(html), Some(head));
    assert_eq!(tree.parent(style), Some(head));
    assert_eq!(
        serialize(&tree),
        r#"<html><head><style type="text/css">a:hover { color: red; }</style></head><body></body></html>"#
    );
}

#[test]
fn test_engine_can_be_shared_between_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StylesInliner>();

    let inliner = StylesInliner::new(InlinerConfig::default()).unwrap();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let inliner = &inliner;
                scope.spawn(move || inliner.inline(&format!("<style>p {{ order: {i} }}</style><p>x</p>")))
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let output = handle.join().unwrap().unwrap();
            assert!(output.contains(&format!("order: {i};")));
        }
    });
}
