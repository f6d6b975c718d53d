use super::*;
use crate::fixtures::{groups, key, keys};

fn params<'a>(sort_first: &'a [GroupKey], cap: usize) -> Stage2Params<'a> {
    Stage2Params {
        sort_order: SortOrder::Span,
        sort_first,
        max_group_plot: cap,
    }
}

fn order_keys(order: &GroupOrder) -> Vec<&str> {
    order.keys().map(|k| k.as_str()).collect()
}

fn ten_groups() -> BTreeMap<GroupKey, TaxonomicGroup> {
    groups(&[
        ("g1", 1000, 10),
        ("g2", 900, 9),
        ("g3", 800, 8),
        ("g4", 700, 7),
        ("g5", 600, 6),
        ("g6", 500, 5),
        ("g7", 400, 4),
        ("g8", 300, 3),
        ("g9", 200, 2),
        ("no-hit", 100, 1),
    ])
}

#[test]
fn test_sorts_by_span_descending() {
    let order = run_stage2(
        groups(&[("a", 10, 5), ("b", 30, 1), ("c", 20, 2)]),
        &params(&[], 8),
    )
    .unwrap();
    assert_eq!(order_keys(&order), vec!["b", "c", "a"]);
    assert!(order.merged().is_empty());
}

#[test]
fn test_sorts_by_count_descending() {
    let p = Stage2Params {
        sort_order: SortOrder::Count,
        ..params(&[], 8)
    };
    let order = run_stage2(groups(&[("a", 10, 5), ("b", 30, 1), ("c", 20, 2)]), &p).unwrap();
    assert_eq!(order_keys(&order), vec!["a", "c", "b"]);
}

#[test]
fn test_ties_break_lexically() {
    let order = run_stage2(
        groups(&[("zeta", 50, 1), ("alpha", 50, 1), ("mid", 50, 1), ("big", 60, 1)]),
        &params(&[], 8),
    )
    .unwrap();
    assert_eq!(order_keys(&order), vec!["big", "alpha", "mid", "zeta"]);
}

#[test]
fn test_pinned_groups_lead_in_given_order() {
    let pinned = keys(&["undef", "no-hit", "absent"]);
    let order = run_stage2(
        groups(&[("a", 500, 1), ("no-hit", 1, 1), ("undef", 2, 1), ("b", 400, 1)]),
        &params(&pinned, 8),
    )
    .unwrap();
    assert_eq!(order_keys(&order), vec!["undef", "no-hit", "a", "b"]);
}

#[test]
fn test_cap_with_pinned_no_hit() {
    let pinned = keys(&["no-hit"]);
    let order = run_stage2(ten_groups(), &params(&pinned, 8)).unwrap();
    assert_eq!(
        order_keys(&order),
        vec!["no-hit", "g1", "g2", "g3", "g4", "g5", "g6", "g7", "other"]
    );
    assert_eq!(order.len(), 9);
    assert_eq!(order.merged(), keys(&["g8", "g9"]).as_slice());

    let other = order.get(&key("other")).unwrap();
    assert_eq!(other.span, 500);
    assert_eq!(other.count, 5);
    assert_eq!(other.members.len(), 5);
}

#[test]
fn test_cap_without_pinning() {
    let order = run_stage2(ten_groups(), &params(&[], 8)).unwrap();
    assert_eq!(order.len(), 9);
    assert_eq!(order_keys(&order)[8], "other");
    assert_eq!(order.merged(), keys(&["g9", "no-hit"]).as_slice());
    assert_eq!(order.get(&key("other")).unwrap().span, 300);
}

#[test]
fn test_no_overflow_when_cap_covers_groups() {
    let order = run_stage2(ten_groups(), &params(&[], 10)).unwrap();
    assert_eq!(order.len(), 10);
    assert!(order.get(&key("other")).is_none());
    assert!(order.merged().is_empty());
}

#[test]
fn test_overflow_sums_match_merged_groups() {
    let input = ten_groups();
    let order = run_stage2(input.clone(), &params(&[], 3)).unwrap();
    let other = order.get(&key("other")).unwrap();
    let merged_span: u64 = order.merged().iter().map(|k| input[k].span).sum();
    let merged_count: usize = order.merged().iter().map(|k| input[k].count).sum();
    assert_eq!(other.span, merged_span);
    assert_eq!(other.count, merged_count);
    assert_eq!(order.len(), 4);
}

#[test]
fn test_natural_other_folds_into_overflow() {
    let order = run_stage2(
        groups(&[("a", 500, 1), ("other", 450, 3), ("b", 400, 1), ("c", 10, 1)]),
        &params(&[], 2),
    )
    .unwrap();
    assert_eq!(order_keys(&order), vec!["a", "b", "other"]);
    let other = order.get(&key("other")).unwrap();
    assert_eq!(other.span, 460);
    assert_eq!(other.count, 4);
}

#[test]
fn test_natural_other_without_overflow_sorts_normally() {
    let order = run_stage2(
        groups(&[("a", 500, 1), ("other", 450, 3), ("b", 400, 1)]),
        &params(&[], 8),
    )
    .unwrap();
    assert_eq!(order_keys(&order), vec!["a", "other", "b"]);
}

#[test]
fn test_pinned_other_absorbs_overflow_in_place() {
    let pinned = keys(&["other"]);
    let order = run_stage2(
        groups(&[("a", 500, 1), ("other", 5, 1), ("b", 400, 1), ("c", 10, 1)]),
        &params(&pinned, 2),
    )
    .unwrap();
    assert_eq!(order_keys(&order), vec!["other", "a", "b"]);
    let other = order.get(&key("other")).unwrap();
    assert_eq!(other.span, 15);
    assert_eq!(other.count, 2);
    assert_eq!(order.merged(), keys(&["c"]).as_slice());
}

#[test]
fn test_pinned_other_does_not_count_against_cap() {
    let pinned = keys(&["no-hit", "other", "undef"]);
    let order = run_stage2(
        groups(&[
            ("a", 500, 1),
            ("no-hit", 5, 1),
            ("other", 7, 2),
            ("undef", 3, 1),
        ]),
        &params(&pinned, 2),
    )
    .unwrap();
    assert_eq!(order_keys(&order), vec!["no-hit", "other", "undef"]);
    assert_eq!(order.len(), 3);
    assert_eq!(order.merged(), keys(&["a"]).as_slice());
    assert_eq!(order.get(&key("other")).unwrap().span, 507);
}

#[test]
fn test_natural_other_beside_full_cap_is_kept_in_place() {
    let order = run_stage2(
        groups(&[("a", 500, 1), ("other", 450, 3), ("b", 400, 1)]),
        &params(&[], 2),
    )
    .unwrap();
    assert_eq!(order_keys(&order), vec!["a", "other", "b"]);
    assert!(order.merged().is_empty());
}

#[test]
fn test_too_many_pinned_groups_rejected() {
    let pinned = keys(&["g1", "g2", "g3"]);
    assert!(matches!(
        run_stage2(ten_groups(), &params(&pinned, 2)),
        Err(PipelineError::Configuration(_))
    ));
}

#[test]
fn test_zero_cap_rejected() {
    assert!(run_stage2(ten_groups(), &params(&[], 0)).is_err());
}

#[test]
fn test_rerun_is_identical() {
    let pinned = keys(&["no-hit"]);
    let a = run_stage2(ten_groups(), &params(&pinned, 5)).unwrap();
    let b = run_stage2(ten_groups(), &params(&pinned, 5)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_group_order_rejects_duplicates() {
    let g = groups(&[("a", 1, 1)]);
    let a = g[&key("a")].clone();
    assert!(GroupOrder::new(vec![a.clone(), a], Vec::new(), 8).is_err());
    let many: Vec<TaxonomicGroup> = ten_groups().into_values().collect();
    assert!(GroupOrder::new(many, Vec::new(), 3).is_err());
}
