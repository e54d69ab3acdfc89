//! Integration tests for selector specificity.
//!
//! [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)

use std::cmp::Ordering;
use std::collections::HashSet;

use mordant_css::{StyleSpecificity, specificity_of};

fn spec(inline: u32, ids: u32, classes: u32, elements: u32) -> StyleSpecificity {
    StyleSpecificity::new(inline, ids, classes, elements)
}

#[test]
fn test_simple_selectors() {
    assert_eq!(specificity_of("p"), spec(0, 0, 0, 1));
    assert_eq!(specificity_of(".button"), spec(0, 0, 1, 0));
    assert_eq!(specificity_of("#header"), spec(0, 1, 0, 0));
    assert_eq!(specificity_of("[align=center]"), spec(0, 0, 1, 0));
    assert_eq!(specificity_of("*"), spec(0, 0, 0, 0));
}

#[test]
fn test_combinators_contribute_nothing() {
    assert_eq!(specificity_of("table > tr td + td ~ p"), spec(0, 0, 0, 5));
    assert_eq!(specificity_of("* > *"), spec(0, 0, 0, 0));
}

#[test]
fn test_compound_and_complex() {
    assert_eq!(specificity_of("div.highlight#main"), spec(0, 1, 1, 1));
    assert_eq!(specificity_of("#nav ul li.active a"), spec(0, 1, 1, 3));
    assert_eq!(specificity_of("td.cell[valign=top]"), spec(0, 0, 2, 1));
}

#[test]
fn test_pseudo_classes_and_elements() {
    assert_eq!(specificity_of("a:hover"), spec(0, 0, 1, 1));
    assert_eq!(specificity_of("p::first-line"), spec(0, 0, 0, 2));
    // CSS2 single-colon pseudo-elements count as elements
    assert_eq!(specificity_of("p:before"), spec(0, 0, 0, 2));
    assert_eq!(specificity_of("li:nth-child(2n+1)"), spec(0, 0, 1, 1));
}

#[test]
fn test_functional_pseudo_classes() {
    // :not() and :is() take their most specific argument, :where() counts nothing
    assert_eq!(specificity_of("p:not(#a, .b)"), spec(0, 1, 0, 1));
    assert_eq!(specificity_of("p:is(.a, span)"), spec(0, 0, 1, 1));
    assert_eq!(specificity_of("p:where(#a)"), spec(0, 0, 0, 1));
}

#[test]
fn test_inline_component_is_zero_for_selectors() {
    for selector in ["#a #b #c", ".x.y.z", "html body table"] {
        assert_eq!(specificity_of(selector).inline, 0, "{selector}");
    }
    assert!(StyleSpecificity::INLINE > specificity_of("#a #b #c .x .y div"));
}

#[test]
fn test_ordering_by_component() {
    // An id outranks any number of classes, a class any number of elements.
    assert!(spec(0, 1, 0, 0) > spec(0, 0, 1, 0));
    assert!(spec(0, 0, 1, 0) > spec(0, 0, 0, 1));
    assert!(spec(0, 1, 0, 0) > spec(0, 0, 12, 30));
    assert!(specificity_of("#a") > specificity_of("body table.x td.y .z span"));
    assert_eq!(spec(0, 0, 1, 1).cmp(&spec(0, 0, 1, 1)), Ordering::Equal);
}

#[test]
fn test_compare_to_absent_is_always_greater() {
    let zero = StyleSpecificity::default();
    assert_eq!(zero.compare_to(None), Ordering::Greater);
    assert_eq!(spec(0, 1, 0, 0).compare_to(None), Ordering::Greater);
    assert_eq!(zero.compare_to(Some(&zero)), Ordering::Equal);
    assert_eq!(zero.compare_to(Some(&spec(0, 0, 0, 1))), Ordering::Less);
}

#[test]
fn test_equal_vectors_hash_identically() {
    let mut seen = HashSet::new();
    assert!(seen.insert(specificity_of("p.a")));
    assert!(!seen.insert(specificity_of("td.b")));
    assert!(seen.insert(specificity_of("p")));
    assert_eq!(seen.len(), 2);
}

#[test]
fn test_display() {
    assert_eq!(specificity_of("#a .b c").to_string(), "(0, 1, 1, 1)");
}
