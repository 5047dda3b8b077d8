//! Renderer view model
//!
//! Flattens the forest into the rows a tree renderer draws, merging in the
//! analysis and the interaction state. Both the web dashboard and the
//! terminal inspector render from these rows.

use crate::hierarchy::HierarchyNode;
use crate::interaction::InteractionState;
use crate::types::{SpanOperation, SpanStatus, TraceAnalysis};

// ── Load state ──────────────────────────────────────────────────────────────

/// What the trace view is showing. A failed fetch is never confused with
/// "still loading" or "no spans".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceLoadState {
    Loading,
    Empty,
    Ready,
    Failed(String),
}

impl TraceLoadState {
    /// State after a successful fetch that left `span_count` spans in the store.
    pub fn after_fetch(span_count: usize) -> Self {
        if span_count == 0 {
            TraceLoadState::Empty
        } else {
            TraceLoadState::Ready
        }
    }

    /// A failed refresh only replaces the view when nothing was shown yet.
    pub fn after_error(&self, message: impl Into<String>) -> Self {
        match self {
            TraceLoadState::Ready => TraceLoadState::Ready,
            _ => TraceLoadState::Failed(message.into()),
        }
    }
}

// ── Rows ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub span_id: String,
    pub depth: usize,
    pub name: String,
    pub operation: SpanOperation,
    pub glyph: &'static str,
    pub status: SpanStatus,
    /// `None` while running
    pub duration_ms: Option<i64>,
    pub cost: Option<f64>,
    pub tokens: Option<i64>,
    pub has_children: bool,
    pub expanded: bool,
    pub selected: bool,
    pub on_critical_path: bool,
}

impl TreeRow {
    /// Only nodes with children can be toggled.
    pub fn can_toggle(&self) -> bool {
        self.has_children
    }
}

/// Visible rows: every root, plus the children of expanded nodes.
pub fn build_tree_rows(
    forest: &[HierarchyNode],
    analysis: &TraceAnalysis,
    interaction: &InteractionState,
) -> Vec<TreeRow> {
    let critical = analysis.critical_path_set();
    let mut rows = Vec::new();
    let mut stack: Vec<(&HierarchyNode, usize)> =
        forest.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        let span = &node.span;
        let expanded = node.has_children() && interaction.is_expanded(&span.span_id);
        rows.push(TreeRow {
            span_id: span.span_id.clone(),
            depth,
            name: span.label().to_string(),
            operation: span.operation,
            glyph: operation_glyph(span.operation),
            status: span.status,
            duration_ms: span.measured_duration_ms(),
            cost: span.cost(),
            tokens: span.tokens(),
            has_children: node.has_children(),
            expanded,
            selected: interaction.is_selected(&span.span_id),
            on_critical_path: critical.contains(span.span_id.as_str()),
        });
        if expanded {
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }
    rows
}

// ── Labels & formatting ─────────────────────────────────────────────────────

pub fn operation_glyph(operation: SpanOperation) -> &'static str {
    match operation {
        SpanOperation::AiCall => "◆",
        SpanOperation::Processing => "⚙",
        SpanOperation::Database => "⛁",
        SpanOperation::HttpRequest => "⇄",
        SpanOperation::Custom => "•",
    }
}

pub fn operation_label(operation: SpanOperation) -> &'static str {
    match operation {
        SpanOperation::AiCall => "AI call",
        SpanOperation::Processing => "Processing",
        SpanOperation::Database => "Database",
        SpanOperation::HttpRequest => "HTTP request",
        SpanOperation::Custom => "Custom",
    }
}

pub fn status_label(status: SpanStatus) -> &'static str {
    status.as_str()
}

pub fn format_duration_short(ms: i64) -> String {
    if ms >= 60_000 {
        format!("{:.1}m", ms as f64 / 60_000.0)
    } else if ms >= 1_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        format!("{ms}ms")
    }
}

pub fn format_tokens_short(tokens: i64) -> String {
    if tokens >= 1_000_000 {
        format!("{:.1}M", tokens as f64 / 1_000_000.0)
    } else if tokens >= 1_000 {
        format!("{:.1}K", tokens as f64 / 1_000.0)
    } else {
        tokens.to_string()
    }
}

pub fn format_cost_short(cost: f64) -> String {
    if cost > 0.0 && cost < 0.01 {
        format!("${cost:.4}")
    } else {
        format!("${cost:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::hierarchy::build_hierarchy;
    use crate::types::{AiCall, Span};
    use chrono::{TimeZone, Utc};

    fn forest() -> Vec<HierarchyNode> {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        build_hierarchy(&[
            Span::new("A", "agent", SpanOperation::Processing, start).completed(100),
            Span::new("B", "", SpanOperation::AiCall, start)
                .with_parent("A")
                .completed(300)
                .with_ai_call(AiCall {
                    provider: "anthropic".to_string(),
                    model: "claude".to_string(),
                    total_tokens: 1_500,
                    cost: 0.02,
                    ..AiCall::default()
                }),
            Span::new("C", "lookup", SpanOperation::Database, start)
                .with_parent("A")
                .completed(50),
            Span::new("D", "pending", SpanOperation::HttpRequest, start).with_parent("B"),
        ])
    }

    #[test]
    fn test_collapsed_forest_shows_roots_only() {
        let forest = forest();
        let rows = build_tree_rows(&forest, &analyze(&forest), &InteractionState::new());
        assert_eq!(rows.len(), 1);
        assert!(rows[0].can_toggle());
        assert!(!rows[0].expanded);
        assert!(rows[0].on_critical_path);
    }

    #[test]
    fn test_expanded_rows_carry_markers() {
        let forest = forest();
        let analysis = analyze(&forest);
        let mut state = InteractionState::new();
        state.expand("A");
        state.select("C");

        let rows = build_tree_rows(&forest, &analysis, &state);
        let ids: Vec<&str> = rows.iter().map(|row| row.span_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);

        let b = &rows[1];
        assert_eq!(b.depth, 1);
        assert_eq!(b.name, "ai_call");
        assert_eq!(b.glyph, "◆");
        assert!(b.on_critical_path);
        assert!(b.has_children);
        assert!(!b.expanded);
        assert_eq!(b.tokens, Some(1_500));

        let c = &rows[2];
        assert!(c.selected);
        assert!(!c.on_critical_path);
        assert!(!c.can_toggle());
    }

    #[test]
    fn test_running_row_has_no_duration() {
        let forest = forest();
        let mut state = InteractionState::new();
        state.expand("A");
        state.expand("B");
        let rows = build_tree_rows(&forest, &analyze(&forest), &state);
        let d = rows.iter().find(|row| row.span_id == "D").unwrap();
        assert_eq!(d.status, SpanStatus::Running);
        assert_eq!(d.duration_ms, None);
        assert_eq!(d.depth, 2);
    }

    #[test]
    fn test_expanding_leaf_is_ignored() {
        let forest = forest();
        let mut state = InteractionState::new();
        state.expand("A");
        state.expand("C");
        let rows = build_tree_rows(&forest, &analyze(&forest), &state);
        assert!(!rows.iter().any(|row| row.span_id == "C" && row.expanded));
    }

    #[test]
    fn test_status_labels_match_wire_names() {
        for status in [SpanStatus::Running, SpanStatus::Completed, SpanStatus::Failed] {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, status_label(status));
        }
    }

    #[test]
    fn test_load_state_transitions() {
        assert_eq!(TraceLoadState::after_fetch(0), TraceLoadState::Empty);
        assert_eq!(TraceLoadState::after_fetch(3), TraceLoadState::Ready);
        assert_eq!(
            TraceLoadState::Loading.after_error("HTTP error: 500"),
            TraceLoadState::Failed("HTTP error: 500".to_string())
        );
        assert_eq!(
            TraceLoadState::Ready.after_error("HTTP error: 500"),
            TraceLoadState::Ready
        );
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_duration_short(420), "420ms");
        assert_eq!(format_duration_short(1_500), "1.5s");
        assert_eq!(format_duration_short(90_000), "1.5m");
        assert_eq!(format_tokens_short(1_500), "1.5K");
        assert_eq!(format_tokens_short(2_000_000), "2.0M");
        assert_eq!(format_cost_short(0.0042), "$0.0042");
        assert_eq!(format_cost_short(1.5), "$1.50");
    }
}
