use dioxus::prelude::*;
use spanlens_core::format_percentage;
use spanlens_core::view::{
    format_cost_short, format_duration_short, format_tokens_short, operation_label, status_label,
};
use spanlens_core::{Span, SpanRollup};

use super::types::{preview_text, span_status_class, BottleneckEntry, TRACE_PREVIEW_CHARS};

fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

// ── Span detail ──────────────────────────────────────────────────────────────

#[component]
pub fn SpanDetailPanel(span: Span, rollup: Option<SpanRollup>, on_critical_path: bool) -> Element {
    let status_class = span_status_class(span.status);
    let status_text = status_label(span.status);
    let operation = operation_label(span.operation);
    let started = format_timestamp(&span.start_time);
    let ended = span
        .end_time
        .as_ref()
        .map(format_timestamp)
        .unwrap_or_else(|| "—".to_string());
    let duration = span
        .measured_duration_ms()
        .map(format_duration_short)
        .unwrap_or_else(|| "still running".to_string());
    let parent = span.parent_id().unwrap_or("(root)").to_string();
    let metadata = span
        .metadata
        .as_ref()
        .filter(|value| !value.is_null())
        .and_then(|value| serde_json::to_string_pretty(value).ok());

    rsx! {
        div {
            class: "trace-card",
            h3 { "{span.label()}" }
            dl {
                class: "trace-kv",
                dt { "Span" }
                dd { "{span.span_id}" }
                dt { "Parent" }
                dd { "{parent}" }
                dt { "Status" }
                dd { span { class: "{status_class}", "{status_text}" } }
                dt { "Operation" }
                dd { "{operation}" }
                dt { "Started" }
                dd { "{started}" }
                dt { "Ended" }
                dd { "{ended}" }
                dt { "Duration" }
                dd { "{duration}" }
                dt { "Critical path" }
                dd { if on_critical_path { "yes" } else { "no" } }
            }

            if let Some(call) = span.ai_call.clone() {
                h3 { style: "margin-top: 0.7rem;", "Model call" }
                dl {
                    class: "trace-kv",
                    dt { "Model" }
                    dd { "{call.provider} / {call.model}" }
                    dt { "Tokens" }
                    dd { "{call.prompt_tokens} in · {call.completion_tokens} out · {format_tokens_short(call.tokens())} total" }
                    dt { "Cost" }
                    dd { "{format_cost_short(call.cost)}" }
                }
                if let Some(prompt) = call.prompt.as_deref() {
                    div { class: "trace-subtitle", "Prompt" }
                    pre { class: "trace-pre", "{preview_text(prompt, TRACE_PREVIEW_CHARS)}" }
                }
                if let Some(completion) = call.completion.as_deref() {
                    div { class: "trace-subtitle", "Completion" }
                    pre { class: "trace-pre", "{preview_text(completion, TRACE_PREVIEW_CHARS)}" }
                }
            }

            if let Some(error) = span.error.clone() {
                h3 { style: "margin-top: 0.7rem; color: #ef4444;", "Error" }
                dl {
                    class: "trace-kv",
                    dt { "Message" }
                    dd { "{error.message}" }
                    if let Some(code) = error.code.clone() {
                        dt { "Code" }
                        dd { "{code}" }
                    }
                    dt { "Recoverable" }
                    dd { if error.recoverable { "yes" } else { "no" } }
                }
            }

            if let Some(rollup) = rollup {
                h3 { style: "margin-top: 0.7rem;", "Subtree" }
                dl {
                    class: "trace-kv",
                    dt { "Cost" }
                    dd { "{format_cost_short(rollup.subtree_cost)}" }
                    dt { "Tokens" }
                    dd { "{format_tokens_short(rollup.subtree_tokens)}" }
                    dt { "Model calls" }
                    dd { "{rollup.ai_call_count}" }
                    dt { "Descendants" }
                    dd { "{rollup.descendant_count}" }
                    if rollup.failed_descendants > 0 {
                        dt { "Failed below" }
                        dd { style: "color: #ef4444;", "{rollup.failed_descendants}" }
                    }
                }
            }

            if let Some(metadata) = metadata {
                div { class: "trace-subtitle", style: "margin-top: 0.7rem;", "Metadata" }
                pre { class: "trace-pre", "{metadata}" }
            }
        }
    }
}

// ── Bottlenecks ──────────────────────────────────────────────────────────────

#[component]
pub fn BottleneckList(
    entries: Vec<BottleneckEntry>,
    critical_path_ms: i64,
    source_label: String,
    on_select: EventHandler<String>,
) -> Element {
    let total = format_duration_short(critical_path_ms);

    rsx! {
        div {
            class: "trace-card",
            h3 { "Bottlenecks" }
            div {
                class: "trace-subtitle",
                style: "margin-bottom: 0.4rem;",
                "Critical path {total} · {source_label} analysis"
            }
            if entries.is_empty() {
                div { class: "trace-subtitle", "No completed spans yet." }
            }
            for entry in entries.iter() {
                {
                    let span_id = entry.span_id.clone();
                    let row_class = if entry.on_critical_path {
                        "bottleneck-row bottleneck-row--critical"
                    } else {
                        "bottleneck-row"
                    };
                    let bar_style =
                        format!("width: {:.1}%;", entry.percentage_of_total.clamp(0.0, 100.0));
                    let share = format_percentage(entry.percentage_of_total);
                    let duration = format_duration_short(entry.duration_ms);
                    rsx! {
                        div {
                            key: "{entry.span_id}",
                            class: "{row_class}",
                            title: "{entry.span_id}",
                            onclick: move |_| on_select.call(span_id.clone()),
                            span { "{entry.label}" }
                            span { class: "span-metric", "{duration}" }
                            span { class: "span-metric", "{share}" }
                            div { class: "bottleneck-bar", style: "{bar_style}" }
                        }
                    }
                }
            }
        }
    }
}
