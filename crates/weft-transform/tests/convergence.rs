//! Convergence tests for the structure-preserving transformer.
//!
//! These tests verify the defining property of the transform: for two
//! operations authored concurrently against the same base document, the
//! transformed pair reaches the identical document and annotation state
//! under both application orders.

use proptest::prelude::*;
use weft_docop::{
    AnnotationBoundary, Attributes, AttributesUpdate, Document, DocOp, DocOpBuilder,
};
use weft_transform::{transform, TransformError};

fn styled(style: &str) -> Attributes {
    Attributes::from_pairs([("style", style)])
}

fn retain_op(n: usize) -> DocOp {
    let mut builder = DocOpBuilder::new();
    builder.retain(n);
    builder.finish()
}

/// Apply in both orders and assert the results agree; returns the
/// converged document.
fn assert_converges(base: &Document, client: &DocOp, server: &DocOp) -> Document {
    let pair = transform(client, server).expect("transform failed");
    let via_server = base
        .apply(server)
        .expect("server op failed on base")
        .apply(&pair.client)
        .expect("transformed client op failed after server");
    let via_client = base
        .apply(client)
        .expect("client op failed on base")
        .apply(&pair.server)
        .expect("transformed server op failed after client");
    assert_eq!(via_server, via_client, "application orders diverged");
    via_server
}

// ============================================================================
// Attribute Convergence Tests
// ============================================================================

#[test]
fn test_noop_idempotence() {
    let pair = transform(&retain_op(7), &retain_op(7)).unwrap();
    assert_eq!(pair.client, retain_op(7));
    assert_eq!(pair.server, retain_op(7));
}

#[test]
fn test_replace_replace_conflict_converges() {
    let base = Document::from_attributes([styled("plain")]);
    let mut client = DocOpBuilder::new();
    client.replace_attributes(styled("plain"), styled("bold"));
    let mut server = DocOpBuilder::new();
    server.replace_attributes(styled("plain"), styled("italic"));
    let converged = assert_converges(&base, &client.finish(), &server.finish());
    // The client authored first in transform order, so its replacement wins.
    assert_eq!(converged.items()[0].attributes, styled("bold"));
}

#[test]
fn test_update_update_conflict_converges() {
    let base = Document::from_attributes([Attributes::from_pairs([("a", "1")])]);
    let mut client = DocOpBuilder::new();
    client.update_attributes(AttributesUpdate::from_triples([("a", Some("1"), Some("2"))]));
    let mut server = DocOpBuilder::new();
    server.update_attributes(AttributesUpdate::from_triples([("a", Some("1"), Some("3"))]));
    let converged = assert_converges(&base, &client.finish(), &server.finish());
    assert_eq!(converged.items()[0].attributes.get("a"), Some("2"));
}

#[test]
fn test_conflict_determinism() {
    let delta = |new: &str| AttributesUpdate::from_triples([("a", Some("1"), Some(new))]);
    let mut client = DocOpBuilder::new();
    client.update_attributes(delta("2"));
    let mut server = DocOpBuilder::new();
    server.update_attributes(delta("3"));
    let client_op = client.finish();
    let server_op = server.finish();
    let first = transform(&client_op, &server_op).unwrap();
    // Exactly one side carries the folded change for the contested key.
    assert_eq!(first.server, retain_op(1));
    assert_ne!(first.client, retain_op(1));
    for _ in 0..3 {
        assert_eq!(transform(&client_op, &server_op).unwrap(), first);
    }
}

#[test]
fn test_disjoint_independence() {
    let base = Document::from_attributes([
        styled("plain"),
        styled("plain"),
        styled("plain"),
    ]);
    let mut client = DocOpBuilder::new();
    client.replace_attributes(styled("plain"), styled("bold"));
    client.retain(2);
    let mut server = DocOpBuilder::new();
    server.retain(2);
    server.update_attributes(AttributesUpdate::from_triples([(
        "size",
        None::<&str>,
        Some("12"),
    )]));
    let client_op = client.finish();
    let server_op = server.finish();
    let pair = transform(&client_op, &server_op).unwrap();
    assert_eq!(pair.client, client_op);
    assert_eq!(pair.server, server_op);
    assert_converges(&base, &client_op, &server_op);
}

#[test]
fn test_replace_update_cross_converges() {
    // Client updates, server replaces the same item, and the reverse.
    let base = Document::from_attributes([styled("plain"), styled("plain")]);
    let mut client = DocOpBuilder::new();
    client.update_attributes(AttributesUpdate::from_triples([(
        "size",
        None::<&str>,
        Some("12"),
    )]));
    client.replace_attributes(styled("plain"), styled("bold"));
    let mut server = DocOpBuilder::new();
    server.replace_attributes(styled("plain"), styled("mono"));
    server.update_attributes(AttributesUpdate::from_triples([(
        "style",
        Some("plain"),
        Some("serif"),
    )]));
    let converged = assert_converges(&base, &client.finish(), &server.finish());
    // Replacements trump concurrent updates on both items.
    assert_eq!(converged.items()[0].attributes, styled("mono"));
    assert_eq!(converged.items()[1].attributes, styled("bold"));
}

#[test]
fn test_span_preservation() {
    let mut client = DocOpBuilder::new();
    client.retain(1);
    client.replace_attributes(styled("plain"), styled("bold"));
    client.retain(3);
    let mut server = DocOpBuilder::new();
    server.retain(4);
    server.update_attributes(AttributesUpdate::from_triples([(
        "size",
        None::<&str>,
        Some("9"),
    )]));
    let client_op = client.finish();
    let server_op = server.finish();
    let pair = transform(&client_op, &server_op).unwrap();
    assert_eq!(pair.client.span(), server_op.span());
    assert_eq!(pair.server.span(), client_op.span());
}

// ============================================================================
// Annotation Convergence Tests
// ============================================================================

#[test]
fn test_annotation_fold_closure() {
    // Two concurrent declarations of the same key with different values fold
    // into a single deterministic old-to-new chain, carried once.
    let base = Document::with_len(2);
    let mut client = DocOpBuilder::new();
    client.annotation_boundary(AnnotationBoundary::new().with_change("note", None, Some("ours")));
    client.retain(2);
    client.annotation_boundary(AnnotationBoundary::new().with_end("note"));
    let mut server = DocOpBuilder::new();
    server.annotation_boundary(AnnotationBoundary::new().with_change("note", None, Some("theirs")));
    server.retain(2);
    server.annotation_boundary(AnnotationBoundary::new().with_end("note"));
    let converged = assert_converges(&base, &client.finish(), &server.finish());
    for item in converged.items() {
        assert_eq!(item.annotations.get("note"), Some(&Some("ours".to_string())));
    }
}

#[test]
fn test_overlapping_annotation_ranges_converge() {
    // Client annotates items [0,1), server annotates [0,2) with the same key.
    let base = Document::with_len(2);
    let mut client = DocOpBuilder::new();
    client.annotation_boundary(AnnotationBoundary::new().with_change("note", None, Some("a")));
    client.retain(1);
    client.annotation_boundary(AnnotationBoundary::new().with_end("note"));
    client.retain(1);
    let mut server = DocOpBuilder::new();
    server.annotation_boundary(AnnotationBoundary::new().with_change("note", None, Some("b")));
    server.retain(2);
    server.annotation_boundary(AnnotationBoundary::new().with_end("note"));
    let converged = assert_converges(&base, &client.finish(), &server.finish());
    assert_eq!(
        converged.items()[0].annotations.get("note"),
        Some(&Some("a".to_string()))
    );
    assert_eq!(
        converged.items()[1].annotations.get("note"),
        Some(&Some("b".to_string()))
    );
}

#[test]
fn test_annotation_against_attribute_edits() {
    let base = Document::from_attributes([styled("plain"), styled("plain")]);
    let mut client = DocOpBuilder::new();
    client.annotation_boundary(AnnotationBoundary::new().with_change("hl", None, Some("y")));
    client.retain(2);
    client.annotation_boundary(AnnotationBoundary::new().with_end("hl"));
    let mut server = DocOpBuilder::new();
    server.replace_attributes(styled("plain"), styled("bold"));
    server.retain(1);
    let converged = assert_converges(&base, &client.finish(), &server.finish());
    assert_eq!(converged.items()[0].attributes, styled("bold"));
    assert_eq!(
        converged.items()[0].annotations.get("hl"),
        Some(&Some("y".to_string()))
    );
}

// ============================================================================
// Fault Surfacing Tests
// ============================================================================

#[test]
fn test_fault_surfacing_structural_mismatch() {
    let err = transform(&retain_op(5), &retain_op(3)).unwrap_err();
    assert!(matches!(err, TransformError::StructuralMismatch { .. }));
}

#[test]
fn test_fault_surfacing_contract_violation() {
    let mut client = DocOpBuilder::new();
    client.retain(1);
    client.delete_characters("x");
    let err = transform(&client.finish(), &retain_op(2)).unwrap_err();
    assert_eq!(err, TransformError::ContractViolation("deleteCharacters"));
}

// ============================================================================
// Randomized Convergence (proptest)
// ============================================================================

const ATTR_KEYS: &[&str] = &["style", "size", "weight"];
const ATTR_VALUES: &[&str] = &["1", "2", "3"];
const ANN_KEYS: &[&str] = &["note", "hl"];

#[derive(Clone, Debug)]
enum ItemPlan {
    Retain,
    Replace(Attributes),
    Update(Vec<(String, Option<String>)>),
}

/// One side's planned edit: a per-item component choice plus at most one
/// annotation range per annotation key.
#[derive(Clone, Debug)]
struct SidePlan {
    items: Vec<ItemPlan>,
    ranges: Vec<(String, usize, usize, String)>,
}

fn attr_key() -> impl Strategy<Value = String> {
    prop::sample::select(ATTR_KEYS).prop_map(str::to_string)
}

fn attr_value() -> impl Strategy<Value = String> {
    prop::sample::select(ATTR_VALUES).prop_map(str::to_string)
}

fn attributes_strategy() -> impl Strategy<Value = Attributes> {
    prop::collection::btree_map(attr_key(), attr_value(), 0..3)
        .prop_map(Attributes::from_pairs)
}

fn item_plan() -> impl Strategy<Value = ItemPlan> {
    prop_oneof![
        2 => Just(ItemPlan::Retain),
        1 => attributes_strategy().prop_map(ItemPlan::Replace),
        1 => prop::collection::btree_map(attr_key(), prop::option::of(attr_value()), 1..3)
            .prop_map(|changes| ItemPlan::Update(changes.into_iter().collect())),
    ]
}

fn annotation_range(len: usize) -> impl Strategy<Value = (String, usize, usize, String)> {
    (
        prop::sample::select(ANN_KEYS),
        0..len,
        prop::sample::select(ATTR_VALUES),
    )
        .prop_flat_map(move |(key, start, value)| {
            ((start + 1)..=len).prop_map(move |end| {
                (key.to_string(), start, end, value.to_string())
            })
        })
}

fn side_plan(len: usize) -> impl Strategy<Value = SidePlan> {
    (
        prop::collection::vec(item_plan(), len),
        prop::option::of(annotation_range(len)),
        prop::option::of(annotation_range(len)),
    )
        .prop_map(|(items, first, second)| {
            let mut ranges: Vec<_> = [first, second].into_iter().flatten().collect();
            // Keep at most one range per annotation key.
            ranges.sort_by(|a, b| a.0.cmp(&b.0));
            ranges.dedup_by(|a, b| a.0 == b.0);
            SidePlan { items, ranges }
        })
}

fn build_op(base: &[Attributes], plan: &SidePlan) -> DocOp {
    let mut builder = DocOpBuilder::new();
    for pos in 0..=base.len() {
        let mut boundary = AnnotationBoundary::new();
        for (key, start, end, value) in &plan.ranges {
            if *end == pos {
                boundary = boundary.with_end(key.clone());
            }
            if *start == pos {
                boundary = boundary.with_change(key.clone(), None, Some(value.as_str()));
            }
        }
        builder.annotation_boundary(boundary);
        if pos < base.len() {
            match &plan.items[pos] {
                ItemPlan::Retain => builder.retain(1),
                ItemPlan::Replace(new) => {
                    builder.replace_attributes(base[pos].clone(), new.clone())
                }
                ItemPlan::Update(changes) => {
                    builder.update_attributes(AttributesUpdate::from_triples(
                        changes.iter().map(|(key, new)| {
                            (
                                key.clone(),
                                base[pos].get(key).map(str::to_string),
                                new.clone(),
                            )
                        }),
                    ))
                }
            }
        }
    }
    builder.finish()
}

fn scenario() -> impl Strategy<Value = (Document, DocOp, DocOp)> {
    prop::collection::vec(attributes_strategy(), 1..6).prop_flat_map(|base| {
        let len = base.len();
        (Just(base), side_plan(len), side_plan(len)).prop_map(|(base, client, server)| {
            let client_op = build_op(&base, &client);
            let server_op = build_op(&base, &server);
            (Document::from_attributes(base), client_op, server_op)
        })
    })
}

proptest! {
    #[test]
    fn prop_transformed_pairs_converge((base, client, server) in scenario()) {
        let pair = transform(&client, &server).unwrap();
        prop_assert_eq!(pair.client.span(), server.span());
        prop_assert_eq!(pair.server.span(), client.span());
        let via_server = base.apply(&server).unwrap().apply(&pair.client).unwrap();
        let via_client = base.apply(&client).unwrap().apply(&pair.server).unwrap();
        prop_assert_eq!(via_server, via_client);
    }
}
