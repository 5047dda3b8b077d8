//! Plain-text rendering of trees, analyses and span details.
//!
//! Tree lines start with two marker columns: `>` for the selected span and
//! `*` for spans on the critical path.

use spanlens_core::hierarchy::ancestor_ids;
use spanlens_core::view::{
    format_cost_short, format_duration_short, format_tokens_short, operation_label, status_label,
};
use spanlens_core::{
    find_node, format_percentage, AnalysisSource, HierarchyNode, Span, SpanRollup, TraceAnalysis,
    TraceHeader, TreeRow,
};

pub fn render_header(header: &TraceHeader, span_count: usize) -> String {
    let title = header.name.as_deref().unwrap_or(&header.trace_id);
    format!(
        "{title} [{}] {} · {span_count} spans · {} calls · {} tokens · {}",
        header.trace_id,
        header.status.as_str(),
        header.call_count,
        format_tokens_short(header.total_tokens),
        format_cost_short(header.total_cost),
    )
}

fn render_row(row: &TreeRow) -> String {
    let selected = if row.selected { '>' } else { ' ' };
    let critical = if row.on_critical_path { '*' } else { ' ' };
    let toggle = match (row.can_toggle(), row.expanded) {
        (false, _) => ' ',
        (true, true) => '▾',
        (true, false) => '▸',
    };
    let indent = "  ".repeat(row.depth);

    let mut line = format!("{selected}{critical} {indent}{toggle} {} {}", row.glyph, row.name);
    let duration = row
        .duration_ms
        .map(format_duration_short)
        .unwrap_or_else(|| "…".to_string());
    line.push_str(&format!("  {duration}"));
    if let Some(tokens) = row.tokens {
        line.push_str(&format!("  {} tok", format_tokens_short(tokens)));
    }
    if let Some(cost) = row.cost {
        line.push_str(&format!("  {}", format_cost_short(cost)));
    }
    line.push_str(&format!("  [{}]", status_label(row.status)));
    line
}

pub fn render_tree(rows: &[TreeRow]) -> String {
    if rows.is_empty() {
        return "(no spans)".to_string();
    }
    rows.iter().map(render_row).collect::<Vec<_>>().join("\n")
}

fn span_label<'a>(forest: &'a [HierarchyNode], span_id: &'a str) -> &'a str {
    find_node(forest, span_id)
        .map(|node| node.span.label())
        .unwrap_or(span_id)
}

pub fn render_analysis(
    analysis: &TraceAnalysis,
    source: AnalysisSource,
    forest: &[HierarchyNode],
    max_bottlenecks: usize,
) -> String {
    let mut lines = Vec::new();
    if analysis.critical_path.is_empty() {
        lines.push(format!(
            "Critical path ({} analysis): none, no completed spans",
            source.label()
        ));
    } else {
        let path: Vec<&str> = analysis
            .critical_path
            .iter()
            .map(|id| span_label(forest, id))
            .collect();
        lines.push(format!(
            "Critical path ({} analysis): {}",
            source.label(),
            format_duration_short(analysis.critical_path_duration_ms)
        ));
        lines.push(format!("  {}", path.join(" → ")));
    }

    if !analysis.bottlenecks.is_empty() {
        lines.push("Bottlenecks:".to_string());
        for (rank, bottleneck) in analysis.bottlenecks.iter().take(max_bottlenecks).enumerate() {
            let marker = if analysis.is_on_critical_path(&bottleneck.span_id) {
                '*'
            } else {
                ' '
            };
            lines.push(format!(
                "  {:>2}. {marker} {:<32} {:>8} {:>7}",
                rank + 1,
                span_label(forest, &bottleneck.span_id),
                format_duration_short(bottleneck.duration_ms),
                format_percentage(bottleneck.percentage_of_total),
            ));
        }
        let hidden = analysis.bottlenecks.len().saturating_sub(max_bottlenecks);
        if hidden > 0 {
            lines.push(format!("  … {hidden} more"));
        }
    }
    lines.join("\n")
}

pub fn render_detail(
    forest: &[HierarchyNode],
    span: &Span,
    rollup: Option<&SpanRollup>,
    on_critical_path: bool,
) -> String {
    let mut lines = vec![
        format!("Span {} ({})", span.label(), span.span_id),
        format!("  operation  {}", operation_label(span.operation)),
        format!("  status     {}", status_label(span.status)),
        format!("  started    {}", span.start_time.to_rfc3339()),
    ];
    if let Some(end) = span.end_time {
        lines.push(format!("  ended      {}", end.to_rfc3339()));
    }
    lines.push(format!(
        "  duration   {}",
        span.measured_duration_ms()
            .map(format_duration_short)
            .unwrap_or_else(|| "still running".to_string())
    ));
    let ancestors = ancestor_ids(forest, &span.span_id);
    if !ancestors.is_empty() {
        let path: Vec<&str> = ancestors.iter().map(|id| span_label(forest, id)).collect();
        lines.push(format!("  ancestors  {}", path.join(" → ")));
    }
    lines.push(format!(
        "  critical   {}",
        if on_critical_path { "yes" } else { "no" }
    ));

    if let Some(call) = &span.ai_call {
        lines.push(format!("  model      {} / {}", call.provider, call.model));
        lines.push(format!(
            "  tokens     {} in · {} out · {} total",
            call.prompt_tokens,
            call.completion_tokens,
            call.tokens()
        ));
        lines.push(format!("  cost       {}", format_cost_short(call.cost)));
    }
    if let Some(error) = &span.error {
        let code = error.code.as_deref().unwrap_or("-");
        lines.push(format!(
            "  error      {} (code {code}, recoverable: {})",
            error.message, error.recoverable
        ));
    }
    if let Some(rollup) = rollup {
        lines.push(format!(
            "  subtree    {} descendants · {} model calls · {} tokens · {}",
            rollup.descendant_count,
            rollup.ai_call_count,
            format_tokens_short(rollup.subtree_tokens),
            format_cost_short(rollup.subtree_cost),
        ));
        if rollup.failed_descendants > 0 {
            lines.push(format!("  failed     {} below", rollup.failed_descendants));
        }
    }
    lines.join("\n")
}
