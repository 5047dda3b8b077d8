use spanlens_core::{Bottleneck, HierarchyNode, SpanStatus, TraceLoadState, TraceStatus};

// ── Constants ────────────────────────────────────────────────────────────────

/// Refresh cadence while the trace is still running
pub const TRACE_POLL_INTERVAL_MS: u32 = 2_000;
/// Bottlenecks listed in the side panel
pub const TRACE_MAX_BOTTLENECKS: usize = 8;
pub const TRACE_PREVIEW_CHARS: usize = 600;

/// Whether the poll loop should issue another fetch. A failed fetch is not
/// retried on a timer; the Refresh button resumes polling.
pub fn keep_polling(
    load_state: &TraceLoadState,
    refresh_failed: bool,
    status: TraceStatus,
) -> bool {
    match load_state {
        TraceLoadState::Failed(_) => false,
        _ if refresh_failed => false,
        TraceLoadState::Loading => true,
        TraceLoadState::Empty | TraceLoadState::Ready => !status.is_terminal(),
    }
}

// ── CSS classes ──────────────────────────────────────────────────────────────

pub fn span_status_class(status: SpanStatus) -> &'static str {
    match status {
        SpanStatus::Running => "span-status span-status--running",
        SpanStatus::Completed => "span-status span-status--completed",
        SpanStatus::Failed => "span-status span-status--failed",
    }
}

pub fn trace_status_class(status: TraceStatus) -> &'static str {
    match status {
        TraceStatus::Running => "trace-pill trace-pill--running",
        TraceStatus::Completed => "trace-pill trace-pill--completed",
        TraceStatus::Failed => "trace-pill trace-pill--failed",
    }
}

pub fn tree_row_class(selected: bool, on_critical_path: bool) -> String {
    let mut class = String::from("span-row");
    if on_critical_path {
        class.push_str(" span-row--critical");
    }
    if selected {
        class.push_str(" span-row--selected");
    }
    class
}

// ── Bottleneck rows ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct BottleneckEntry {
    pub span_id: String,
    pub label: String,
    pub duration_ms: i64,
    pub percentage_of_total: f64,
    pub on_critical_path: bool,
}

/// Pair bottlenecks with their span labels. Ids the forest doesn't know
/// (server analysis ahead of the spans) fall back to the raw id.
pub fn bottleneck_entries(
    bottlenecks: &[Bottleneck],
    forest: &[HierarchyNode],
    critical_path: &[String],
    limit: usize,
) -> Vec<BottleneckEntry> {
    bottlenecks
        .iter()
        .take(limit)
        .map(|bottleneck| {
            let label = spanlens_core::find_node(forest, &bottleneck.span_id)
                .map(|node| node.span.label().to_string())
                .unwrap_or_else(|| bottleneck.span_id.clone());
            BottleneckEntry {
                span_id: bottleneck.span_id.clone(),
                label,
                duration_ms: bottleneck.duration_ms,
                percentage_of_total: bottleneck.percentage_of_total,
                on_critical_path: critical_path.iter().any(|id| id == &bottleneck.span_id),
            }
        })
        .collect()
}

/// Clip long prompt/completion text for the detail panel.
pub fn preview_text(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let clipped: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{clipped}…")
    } else {
        clipped
    }
}
