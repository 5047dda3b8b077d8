use dioxus::prelude::*;
use spanlens_core::view::{format_cost_short, format_duration_short, format_tokens_short, status_label};
use spanlens_core::TreeRow;

use super::types::{span_status_class, tree_row_class};

const INDENT_REM: f64 = 1.1;

#[component]
pub fn TraceTreeRow(
    row: TreeRow,
    on_toggle: EventHandler<String>,
    on_select: EventHandler<String>,
) -> Element {
    let class = tree_row_class(row.selected, row.on_critical_path);
    let indent = format!("padding-left: {:.2}rem;", 0.5 + row.depth as f64 * INDENT_REM);
    let toggle_label = if row.expanded { "▾" } else { "▸" };
    let toggle_class = if row.can_toggle() {
        "span-toggle"
    } else {
        "span-toggle span-toggle--leaf"
    };
    let duration = row
        .duration_ms
        .map(format_duration_short)
        .unwrap_or_else(|| "…".to_string());
    let tokens = row.tokens.map(format_tokens_short);
    let cost = row.cost.map(format_cost_short);
    let status_class = span_status_class(row.status);
    let status_text = status_label(row.status);
    let span_id_for_toggle = row.span_id.clone();
    let span_id_for_select = row.span_id.clone();
    let can_toggle = row.can_toggle();

    rsx! {
        div {
            class: "{class}",
            style: "{indent}",
            title: "{row.span_id}",
            onclick: move |_| on_select.call(span_id_for_select.clone()),
            button {
                class: "{toggle_class}",
                disabled: !can_toggle,
                onclick: move |evt| {
                    evt.stop_propagation();
                    if can_toggle {
                        on_toggle.call(span_id_for_toggle.clone());
                    }
                },
                "{toggle_label}"
            }
            span { class: "span-glyph", "{row.glyph}" }
            span { class: "span-name", "{row.name}" }
            if let Some(tokens) = tokens {
                span { class: "span-metric", "{tokens} tok" }
            }
            if let Some(cost) = cost {
                span { class: "span-metric", "{cost}" }
            }
            span { class: "span-metric", "{duration}" }
            span { class: "{status_class}", "{status_text}" }
        }
    }
}
