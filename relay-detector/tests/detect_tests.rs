//! Parameterised change-detection tests for `relay-detector`.

use relay_detector::{detect, Decision, Snapshot};
use rstest::rstest;

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|t| t.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[rstest]
#[case("abc", &[])]
#[case("abc", &["v1.0"])]
#[case("ffffffffffffffffffffffffffffffffffffffff", &["v1.0", "v1.1", "v2.0-rc1"])]
fn unchanged_values_push_nothing(#[case] head: &str, #[case] tag_names: &[&str]) {
    let tag_list = tags(tag_names);
    let previous = Snapshot::observed(head, tag_list.clone());
    let decision = detect(&previous, head, &tag_list);
    assert!(decision.is_noop(), "identical inputs must be a no-op");
}

// ---------------------------------------------------------------------------
// Single-axis changes
// ---------------------------------------------------------------------------

#[test]
fn head_change_pushes_branches_only() {
    let previous = Snapshot::observed("abc", tags(&["v1.0"]));
    let decision = detect(&previous, "def", &tags(&["v1.0"]));
    assert_eq!(
        decision,
        Decision {
            push_branches: true,
            push_tags: false,
        }
    );
}

#[test]
fn tag_change_pushes_tags_only() {
    let previous = Snapshot::observed("abc", tags(&["v1.0"]));
    let decision = detect(&previous, "abc", &tags(&["v1.0", "v1.1"]));
    assert_eq!(
        decision,
        Decision {
            push_branches: false,
            push_tags: true,
        }
    );
}

#[test]
fn both_axes_change_pushes_both() {
    let previous = Snapshot::observed("abc", tags(&[]));
    let decision = detect(&previous, "def", &tags(&["v1.0"]));
    assert!(decision.push_branches);
    assert!(decision.push_tags);
}

// ---------------------------------------------------------------------------
// First iteration
// ---------------------------------------------------------------------------

#[test]
fn fresh_snapshot_marks_everything_changed() {
    let decision = detect(&Snapshot::default(), "abc", &tags(&[]));
    assert!(decision.push_branches, "head never observed");
    assert!(
        decision.push_tags,
        "an empty tag list still differs from never-observed"
    );
}

// ---------------------------------------------------------------------------
// Opaque comparison
// ---------------------------------------------------------------------------

#[test]
fn tag_order_is_significant() {
    // Values are opaque; reordering is a change, not an equivalence.
    let previous = Snapshot::observed("abc", tags(&["v1.0", "v1.1"]));
    let decision = detect(&previous, "abc", &tags(&["v1.1", "v1.0"]));
    assert!(decision.push_tags);
}

#[test]
fn whitespace_in_head_is_significant() {
    let previous = Snapshot::observed("abc", tags(&[]));
    let decision = detect(&previous, "abc\n", &tags(&[]));
    assert!(decision.push_branches);
}

#[test]
fn observed_snapshot_exposes_values() {
    let snapshot = Snapshot::observed("abc", tags(&["v1.0"]));
    assert_eq!(snapshot.head(), Some("abc"));
    assert_eq!(snapshot.tags(), Some(tags(&["v1.0"]).as_slice()));
    assert_eq!(Snapshot::default().head(), None);
}
