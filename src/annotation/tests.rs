#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;

fn body_param() -> AnnotationElement {
    AnnotationElement::new("param")
        .with_attribute("name", "sample")
        .with_attribute("in", "body")
        .with_child(AnnotationElement::new("see").with_attribute("cref", "T:Contracts.Sample"))
        .with_child(
            AnnotationElement::new("para")
                .with_child(AnnotationElement::new("see").with_attribute("cref", "T:Contracts.Other")),
        )
        .with_text("\n    The sample\n\n    to create\n  ")
}

#[test]
fn test_trailing_text_is_last_descendant_node() {
    let param = body_param();
    assert_eq!(
        param.trailing_text(),
        Some("\n    The sample\n\n    to create\n  ")
    );

    let no_trailing = AnnotationElement::new("param")
        .with_text("leading")
        .with_child(AnnotationElement::new("see").with_attribute("cref", "T:X"));
    assert_eq!(no_trailing.trailing_text(), None);
}

#[test]
fn test_see_crefs_collects_nested_references_in_order() {
    let param = body_param();
    assert_eq!(
        param.see_crefs(),
        vec!["T:Contracts.Sample", "T:Contracts.Other"]
    );
}

#[test]
fn test_remove_blank_lines() {
    assert_eq!(
        remove_blank_lines("\n    The sample\n\n    to create\n  "),
        "The sample\nto create"
    );
    assert_eq!(remove_blank_lines("   \n\t\n"), "");
}

#[test]
fn test_set_attribute_replaces_in_place() {
    let mut el = AnnotationElement::new("param")
        .with_attribute("name", "id")
        .with_attribute("in", "query");
    el.set_attribute("in", "path");
    el.set_attribute("cref", "T:System.Int32");
    let attrs: Vec<_> = el.attributes().iter().collect();
    assert_eq!(
        attrs,
        vec![("name", "id"), ("in", "path"), ("cref", "T:System.Int32")]
    );
}

#[test]
fn test_diagnostic_location() {
    let el = AnnotationElement::new("member")
        .with_attribute("name", "M:Api.Get")
        .with_location(SourceLocation::new(Some("Api.xml".into()), 10, 3));
    assert_eq!(el.diagnostic_location(), "Api.xml:10:3 <member name=\"M:Api.Get\">");
    assert_eq!(AnnotationElement::new("doc").diagnostic_location(), "<doc>");
}

#[test]
fn test_tree_round_trips_through_json() {
    let param = body_param();
    let json = serde_json::to_string(&param).unwrap();
    let back: AnnotationElement = serde_json::from_str(&json).unwrap();
    assert_eq!(back, param);
}
