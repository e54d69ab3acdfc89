//! Integration tests for CSS selector parsing and matching.

use mordant_css::selector::{
    AttributeOperator, Combinator, SelectorError, SimpleSelector, parse_selector,
    query_selector_all, select,
};
use mordant_dom::{DomTree, NodeId};
use mordant_html::parse_html;

fn parse(html: &str) -> DomTree {
    parse_html(html).unwrap()
}

/// Tag names of the elements a selector list matches, in tree order.
fn matched_tags(tree: &DomTree, selectors: &str) -> Vec<String> {
    query_selector_all(tree, selectors)
        .unwrap()
        .into_iter()
        .map(|id| tree.as_element(id).unwrap().tag_name.clone())
        .collect()
}

fn first(tree: &DomTree, tag: &str) -> NodeId {
    tree.elements_by_tag_name(tag).next().unwrap()
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_parse_type_selector() {
    let selector = parse_selector("body").unwrap();
    assert!(selector.complex.combinators.is_empty());
    assert!(matches!(
        &selector.complex.subject.simple_selectors[0],
        SimpleSelector::Type(name) if name == "body"
    ));
}

#[test]
fn test_parse_compound_selector() {
    let selector = parse_selector("td.cell#main[align]").unwrap();
    assert_eq!(selector.complex.subject.simple_selectors.len(), 4);
    assert!(matches!(
        &selector.complex.subject.simple_selectors[1],
        SimpleSelector::Class(name) if name == "cell"
    ));
    assert!(matches!(
        &selector.complex.subject.simple_selectors[2],
        SimpleSelector::Id(name) if name == "main"
    ));
}

#[test]
fn test_parse_multiple_combinators() {
    // [§ 4.3](https://www.w3.org/TR/selectors-4/#complex)
    let selector = parse_selector("table > tr td+td ~ p").unwrap();
    let combinators: Vec<Combinator> = selector
        .complex
        .combinators
        .iter()
        .map(|(c, _)| *c)
        .collect();
    assert_eq!(
        combinators,
        vec![
            Combinator::SubsequentSibling,
            Combinator::NextSibling,
            Combinator::Descendant,
            Combinator::Child,
        ]
    );
    assert!(matches!(
        &selector.complex.combinators[3].1.simple_selectors[0],
        SimpleSelector::Type(name) if name == "table"
    ));
}

#[test]
fn test_parse_attribute_operators() {
    let cases = [
        ("[type=text]", AttributeOperator::Equals, "text"),
        ("[class~=\"a\"]", AttributeOperator::Includes, "a"),
        ("[lang|=en]", AttributeOperator::DashMatch, "en"),
        ("[href^='https']", AttributeOperator::Prefix, "https"),
        ("[src$=\".png\"]", AttributeOperator::Suffix, ".png"),
        ("[data-x *= dark ]", AttributeOperator::Substring, "dark"),
    ];
    for (text, operator, value) in cases {
        let selector = parse_selector(text).unwrap();
        let SimpleSelector::Attribute(attr) = &selector.complex.subject.simple_selectors[0] else {
            panic!("expected attribute selector for {text}");
        };
        assert_eq!(attr.matcher, Some((operator, value.to_string())), "{text}");
    }
}

#[test]
fn test_parse_pseudo_classes() {
    for text in ["li:first-child", "a:hover", "p::before", "p:before", "li:nth-child(2n+1)", "p:not(.x)"] {
        let selector = parse_selector(text).unwrap();
        assert_eq!(
            selector.complex.subject.simple_selectors[1],
            SimpleSelector::NeverMatch,
            "{text}"
        );
    }
}

#[test]
fn test_parse_errors() {
    assert_eq!(parse_selector("   "), Err(SelectorError::Empty));
    assert_eq!(parse_selector("> p"), Err(SelectorError::DanglingCombinator));
    assert_eq!(parse_selector("p >"), Err(SelectorError::DanglingCombinator));
    assert_eq!(parse_selector("p."), Err(SelectorError::MissingName('.')));
    assert_eq!(
        parse_selector("[href"),
        Err(SelectorError::Unterminated("attribute selector"))
    );
    assert!(matches!(
        parse_selector("p % q"),
        Err(SelectorError::UnexpectedChar { found: '%', .. })
    ));
    assert!(matches!(
        parse_selector("p:nth-child(2"),
        Err(SelectorError::Unterminated(_))
    ));
}

// =============================================================================
// Matching
// =============================================================================

#[test]
fn test_matches_type_class_and_id() {
    let tree = parse(r#"<h1 id="title" class="big red">x</h1><h2 class="big">y</h2>"#);

    assert_eq!(matched_tags(&tree, "h1"), vec!["h1"]);
    assert_eq!(matched_tags(&tree, ".big"), vec!["h1", "h2"]);
    assert_eq!(matched_tags(&tree, "#title.red"), vec!["h1"]);
    assert_eq!(matched_tags(&tree, "H2.big"), vec!["h2"]);
    assert!(matched_tags(&tree, ".bi").is_empty());
}

#[test]
fn test_matches_descendant_and_child() {
    let tree = parse("<table><tr><td><p>a</p></td></tr></table><p>b</p>");

    assert_eq!(query_selector_all(&tree, "table p").unwrap().len(), 1);
    assert_eq!(query_selector_all(&tree, "td > p").unwrap().len(), 1);
    // html5ever inserts the implied tbody
    assert!(query_selector_all(&tree, "table > tr").unwrap().is_empty());
    assert_eq!(query_selector_all(&tree, "tbody > tr").unwrap().len(), 1);
}

#[test]
fn test_descendant_combinator_tries_every_ancestor() {
    // The nearest div is not a child of section, the outer one is.
    let tree = parse("<section><div class=outer><div class=inner><p>x</p></div></div></section>");

    assert_eq!(query_selector_all(&tree, "section > div p").unwrap().len(), 1);
    assert_eq!(query_selector_all(&tree, "section > div.inner p").unwrap().len(), 0);
}

#[test]
fn test_long_descendant_chain_on_deep_tree() {
    let html = format!("{}x{}", "<div>".repeat(40), "</div>".repeat(40));
    let tree = parse(&html);
    let chain = vec!["div"; 14].join(" ");

    assert!(query_selector_all(&tree, &format!(".nomatch {chain}")).unwrap().is_empty());
    assert_eq!(query_selector_all(&tree, &format!("body {chain}")).unwrap().len(), 27);
}

#[test]
fn test_matches_sibling_combinators() {
    let tree = parse("<h1>t</h1> text <p id=a>a</p><div></div><p id=b>b</p>");

    let next: Vec<_> = query_selector_all(&tree, "h1 + p").unwrap();
    assert_eq!(next.len(), 1);
    assert_eq!(tree.attribute(next[0], "id"), Some("a"));

    assert_eq!(query_selector_all(&tree, "h1 ~ p").unwrap().len(), 2);
    assert!(query_selector_all(&tree, "div + h1").unwrap().is_empty());
}

#[test]
fn test_matches_attributes() {
    let tree = parse(
        r#"<a href="https://x.test/a.png" lang="en-US" data-theme="my-dark">l</a><a>n</a>"#,
    );

    for selector in [
        "a[href]",
        "[href^=https]",
        "[href$='.png']",
        "[data-theme*=dark]",
        "[lang|=en]",
        "a:link",
    ] {
        assert_eq!(query_selector_all(&tree, selector).unwrap().len(), 1, "{selector}");
    }
    assert!(query_selector_all(&tree, "[href^='']").unwrap().is_empty());
}

#[test]
fn test_pseudo_classes_never_match() {
    let tree = parse("<ul><li>a</li><li></li></ul>");

    assert!(matched_tags(&tree, "li:first-child").is_empty());
    assert!(matched_tags(&tree, ":root").is_empty());
    assert!(matched_tags(&tree, "li:hover").is_empty());
    assert_eq!(matched_tags(&tree, "ul, li:empty"), vec!["ul"]);
}

#[test]
fn test_select_is_in_tree_order() {
    let tree = parse("<div><p class=x>1</p></div><p class=x>2</p>");
    let selector = parse_selector(".x").unwrap();

    let matched = select(&tree, &selector);
    assert_eq!(matched.len(), 2);
    assert_eq!(tree.text_content(matched[0]), "1");
    assert_eq!(tree.text_content(matched[1]), "2");
}

#[test]
fn test_query_selector_all_deduplicates_branches() {
    let tree = parse("<p class=a>x</p>");
    let p = first(&tree, "p");

    assert_eq!(query_selector_all(&tree, "p, .a, p.a").unwrap(), vec![p]);
}
