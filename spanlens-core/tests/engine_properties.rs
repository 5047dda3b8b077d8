//! Cross-module properties of the hierarchy and analysis engine.
//!
//! Run with: cargo test -p spanlens-core --test engine_properties

use std::collections::HashSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use spanlens_core::hierarchy::{ancestor_ids, max_depth, sort_by_start_time, walk_preorder};
use spanlens_core::{
    analyze, build_hierarchy, build_tree_rows, compute_rollups, node_count, HierarchyNode,
    InteractionState, Span, SpanOperation, SpanStore, Trace, TraceStatus,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

fn span(id: &str, parent: Option<&str>, duration_ms: i64) -> Span {
    let span = Span::new(id, id, SpanOperation::Processing, t0()).completed(duration_ms);
    match parent {
        Some(parent) => span.with_parent(parent),
        None => span,
    }
}

/// Deterministic parent-pointer soup: some roots, some dangling parents,
/// plenty of cycles.
fn scrambled_spans(count: usize, seed: u64) -> Vec<Span> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) as usize
    };

    (0..count)
        .map(|i| {
            let id = format!("s{i}");
            let parent = match next() % 5 {
                0 => None,
                1 => Some("missing".to_string()),
                2 => Some(id.clone()),
                _ => Some(format!("s{}", next() % count)),
            };
            let duration = (next() % 500) as i64;
            let span = Span::new(id, "step", SpanOperation::Custom, t0() + Duration::milliseconds(i as i64))
                .completed(duration);
            match parent {
                Some(parent) => span.with_parent(parent),
                None => span,
            }
        })
        .collect()
}

fn visited_ids(forest: &[HierarchyNode]) -> Vec<String> {
    let mut ids = Vec::new();
    walk_preorder(forest, &mut |node, _depth| ids.push(node.span.span_id.clone()));
    ids
}

#[test]
fn test_build_is_idempotent() {
    let spans = scrambled_spans(64, 7);
    assert_eq!(build_hierarchy(&spans), build_hierarchy(&spans));
}

#[test]
fn test_build_is_total_even_with_cycles() {
    for seed in 0..25 {
        let spans = scrambled_spans(40, seed);
        let forest = build_hierarchy(&spans);
        assert_eq!(node_count(&forest), spans.len(), "seed {seed}");
    }
}

#[test]
fn test_every_node_reachable_exactly_once() {
    for seed in 0..25 {
        let spans = scrambled_spans(40, seed);
        let ids = visited_ids(&build_hierarchy(&spans));
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len(), "seed {seed}");
        assert_eq!(ids.len(), spans.len(), "seed {seed}");
    }
}

#[test]
fn test_mutual_cycle_keeps_both_spans() {
    let spans = vec![span("a", Some("b"), 10), span("b", Some("a"), 20)];
    let forest = build_hierarchy(&spans);
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].span_id(), "a");
    assert_eq!(forest[0].children[0].span_id(), "b");
}

#[test]
fn test_roots_are_parentless_or_dangling() {
    let spans = vec![
        span("a", None, 10),
        span("b", Some("a"), 10),
        span("c", Some("gone"), 10),
        span("d", Some(""), 10),
    ];
    let forest = build_hierarchy(&spans);
    let roots: Vec<&str> = forest.iter().map(|node| node.span_id()).collect();
    assert_eq!(roots, vec!["a", "c", "d"]);
}

#[test]
fn test_dangling_parent_alone_is_root() {
    let forest = build_hierarchy(&[span("D", Some("missing-id"), 5)]);
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].span_id(), "D");
    assert!(forest[0].children.is_empty());
}

#[test]
fn test_reference_trace_analysis() {
    let spans = vec![
        span("A", None, 100),
        span("B", Some("A"), 300),
        span("C", Some("A"), 50),
    ];
    let forest = build_hierarchy(&spans);
    assert_eq!(forest.len(), 1);
    let children: Vec<&str> = forest[0].children.iter().map(|n| n.span_id()).collect();
    assert_eq!(children, vec!["B", "C"]);

    let analysis = analyze(&forest);
    assert_eq!(analysis.critical_path, vec!["A", "B"]);
    assert_eq!(analysis.critical_path_duration_ms, 400);

    let ranked: Vec<(&str, i64, f64)> = analysis
        .bottlenecks
        .iter()
        .map(|b| (b.span_id.as_str(), b.duration_ms, b.percentage_of_total))
        .collect();
    assert_eq!(
        ranked,
        vec![("B", 300, 75.0), ("A", 100, 25.0), ("C", 50, 12.5)]
    );
}

#[test]
fn test_critical_path_tie_prefers_earlier_child() {
    let spans = vec![
        span("root", None, 10),
        span("first", Some("root"), 200),
        span("second", Some("root"), 200),
    ];
    for _ in 0..10 {
        let analysis = analyze(&build_hierarchy(&spans));
        assert_eq!(analysis.critical_path, vec!["root", "first"]);
    }
}

#[test]
fn test_running_span_never_wins_a_tie() {
    let running = Span::new("live", "live", SpanOperation::AiCall, t0()).with_parent("root");
    let spans = vec![span("root", None, 10), running, span("done", Some("root"), 0)];
    let analysis = analyze(&build_hierarchy(&spans));
    assert_eq!(analysis.critical_path, vec!["root", "done"]);
    assert!(analysis.bottlenecks.iter().all(|b| b.span_id != "live"));
}

#[test]
fn test_empty_trace_is_a_valid_state() {
    let forest = build_hierarchy(&[]);
    assert!(forest.is_empty());
    let analysis = analyze(&forest);
    assert!(analysis.critical_path.is_empty());
    assert!(analysis.bottlenecks.is_empty());
    assert!(build_tree_rows(&forest, &analysis, &InteractionState::new()).is_empty());
}

#[test]
fn test_expanded_state_survives_refresh() {
    let mut store = SpanStore::new("tr_1");
    let first = Trace {
        trace_id: "tr_1".to_string(),
        name: None,
        status: TraceStatus::Running,
        spans: vec![span("A", None, 100)],
        total_cost: 0.0,
        total_tokens: 0,
        call_count: 0,
        start_time: None,
        end_time: None,
    };
    store.merge_trace(&first).unwrap();

    let mut state = InteractionState::new();
    state.expand("A");
    state.select("A");

    let second = Trace {
        spans: vec![span("A", None, 100), span("B", Some("A"), 40)],
        ..first
    };
    let report = store.merge_trace(&second).unwrap();
    assert_eq!(report.appended, 1);

    let forest = build_hierarchy(store.spans());
    assert!(state.is_expanded("A"));
    assert_eq!(state.selected_node(&forest).map(|n| n.span_id()), Some("A"));

    let rows = build_tree_rows(&forest, &analyze(&forest), &state);
    let ids: Vec<&str> = rows.iter().map(|row| row.span_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
}

#[test]
fn test_refresh_with_same_spans_is_a_no_op() {
    let spans = vec![span("A", None, 100), span("B", Some("A"), 40)];
    let mut store = SpanStore::new("tr_1");
    store.merge_spans(&spans);
    let revision = store.revision();
    let forest = build_hierarchy(store.spans());

    let report = store.merge_spans(&spans);
    assert!(!report.changed());
    assert_eq!(store.revision(), revision);
    assert_eq!(build_hierarchy(store.spans()), forest);
}

#[test]
fn test_deep_parent_chain_does_not_overflow_the_stack() {
    const DEPTH: usize = 100_000;
    let spans: Vec<Span> = (0..DEPTH)
        .map(|i| {
            let parent = i.checked_sub(1).map(|p| format!("s{p}"));
            span(&format!("s{i}"), parent.as_deref(), 1)
        })
        .collect();

    let forest = build_hierarchy(&spans);
    assert_eq!(forest.len(), 1);
    assert_eq!(node_count(&forest), DEPTH);
    assert_eq!(max_depth(&forest), DEPTH);
    assert_eq!(ancestor_ids(&forest, "s99999").len(), DEPTH - 1);

    let analysis = analyze(&forest);
    assert_eq!(analysis.critical_path.len(), DEPTH);
    assert_eq!(analysis.critical_path_duration_ms, DEPTH as i64);
    assert_eq!(analysis.critical_path.last().map(String::as_str), Some("s99999"));

    let rollups = compute_rollups(&forest);
    assert_eq!(rollups["s0"].descendant_count, DEPTH - 1);

    let mut interaction = InteractionState::new();
    interaction.expand_all(&forest);
    let rows = build_tree_rows(&forest, &analysis, &interaction);
    assert_eq!(rows.len(), DEPTH);
    assert_eq!(rows[DEPTH - 1].depth, DEPTH - 1);

    let copy = forest.clone();
    assert!(copy == forest);
    assert!(sort_by_start_time(&forest) == forest);
    // Both forests are dropped here, which must not recurse either.
}
