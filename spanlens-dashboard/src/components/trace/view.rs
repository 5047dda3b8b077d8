use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_logger::tracing::warn;
use spanlens_core::view::{format_cost_short, format_tokens_short};
use spanlens_core::{
    analyze, build_hierarchy, build_tree_rows, compute_rollups, select_analysis, ExportFormat,
    InteractionState, RefreshGate, ServerAnalysis, SpanStore, TraceLoadState,
};

use crate::api::fetch_trace_export;
use crate::interop::download_bytes;

use super::detail::{BottleneckList, SpanDetailPanel};
use super::live::LiveTrace;
use super::styles::TRACE_VIEW_STYLES;
use super::tree::TraceTreeRow;
use super::types::{bottleneck_entries, trace_status_class, TRACE_MAX_BOTTLENECKS};

fn start_export(
    trace_id: String,
    format: ExportFormat,
    mut exporting: Signal<Option<ExportFormat>>,
    mut export_error: Signal<Option<String>>,
) {
    if exporting.peek().is_some() {
        return;
    }
    exporting.set(Some(format));
    export_error.set(None);
    spawn(async move {
        let result = fetch_trace_export(&trace_id, format).await.and_then(|bytes| {
            download_bytes(
                &format.download_filename(&trace_id),
                format.mime_type(),
                &bytes,
            )
        });
        if let Err(message) = result {
            warn!(trace_id = %trace_id, format = format.as_str(), "export failed: {message}");
            export_error.set(Some(message));
        }
        exporting.set(None);
    });
}

// ── TraceView component ──────────────────────────────────────────────────────

/// Live span tree for one trace. Keyed on `trace_id` by the caller, so the
/// store, interaction state and refresh gate all start fresh per trace.
#[component]
pub fn TraceView(trace_id: String) -> Element {
    let store = use_signal({
        let trace_id = trace_id.clone();
        move || SpanStore::new(trace_id)
    });
    let load_state = use_signal(|| TraceLoadState::Loading);
    let mut interaction = use_signal(InteractionState::new);
    let server_analysis = use_signal(|| None::<ServerAnalysis>);
    let refresh_error = use_signal(|| None::<String>);
    let exporting = use_signal(|| None::<ExportFormat>);
    let export_error = use_signal(|| None::<String>);
    let mut poll_started = use_signal(|| false);
    let gate = use_hook(|| Rc::new(RefCell::new(RefreshGate::new())));
    let analysis_gate = use_hook(|| Rc::new(RefCell::new(RefreshGate::new())));
    let polling = use_hook(|| Rc::new(Cell::new(false)));

    let live = LiveTrace {
        trace_id: trace_id.clone(),
        gate: gate.clone(),
        analysis_gate: analysis_gate.clone(),
        polling,
        store,
        load_state,
        interaction,
        server_analysis,
        refresh_error,
    };

    {
        let gate = gate.clone();
        let analysis_gate = analysis_gate.clone();
        use_drop(move || {
            // In-flight results land after this and are discarded.
            gate.borrow_mut().close();
            analysis_gate.borrow_mut().close();
        });
    }

    {
        let live = live.clone();
        use_effect(move || {
            if poll_started() {
                return;
            }
            poll_started.set(true);
            spawn(live.clone().poll());
        });
    }

    // ── Derived view state ──
    let store_read = store.read();
    let header = store_read.header().clone();
    let revision = store_read.revision();
    let forest = build_hierarchy(store_read.spans());
    drop(store_read);

    let client_analysis = analyze(&forest);
    let server_snapshot = server_analysis();
    let (analysis, source) =
        select_analysis(server_snapshot.as_ref(), &client_analysis, revision);
    let analysis = analysis.clone();
    let rollups = compute_rollups(&forest);
    let rows = build_tree_rows(&forest, &analysis, &interaction.read());
    let bottlenecks = bottleneck_entries(
        &analysis.bottlenecks,
        &forest,
        &analysis.critical_path,
        TRACE_MAX_BOTTLENECKS,
    );
    let selected = interaction
        .read()
        .selected_node(&forest)
        .map(|node| node.span.clone());
    let selected_rollup = selected
        .as_ref()
        .and_then(|span| rollups.get(&span.span_id).cloned());
    let selected_on_path = selected
        .as_ref()
        .map(|span| analysis.is_on_critical_path(&span.span_id))
        .unwrap_or(false);

    let title = header.name.clone().unwrap_or_else(|| header.trace_id.clone());
    let status_class = trace_status_class(header.status);
    let status_text = header.status.as_str();
    let total_cost = format_cost_short(header.total_cost);
    let total_tokens = format_tokens_short(header.total_tokens);
    let call_count = header.call_count;
    let span_count = spanlens_core::node_count(&forest);
    let source_label = source.label().to_string();
    let export_busy = exporting().is_some();

    rsx! {
        style { {TRACE_VIEW_STYLES} }
        div {
            class: "trace-view",
            div {
                class: "trace-header",
                div {
                    h2 { class: "trace-title", "{title}" }
                    span { class: "trace-subtitle", "{header.trace_id}" }
                }
                div {
                    class: "trace-header-actions",
                    button {
                        class: "trace-btn",
                        onclick: {
                            let live = live.clone();
                            move |_| live.refresh_now()
                        },
                        "Refresh"
                    }
                    button {
                        class: "trace-btn",
                        onclick: move |_| {
                            let forest = build_hierarchy(store.read().spans());
                            interaction.write().expand_all(&forest);
                        },
                        "Expand all"
                    }
                    button {
                        class: "trace-btn",
                        onclick: move |_| interaction.write().collapse_all(),
                        "Collapse all"
                    }
                    button {
                        class: "trace-btn",
                        disabled: export_busy,
                        onclick: {
                            let trace_id = trace_id.clone();
                            move |_| start_export(trace_id.clone(), ExportFormat::Json, exporting, export_error)
                        },
                        "Export JSON"
                    }
                    button {
                        class: "trace-btn",
                        disabled: export_busy,
                        onclick: {
                            let trace_id = trace_id.clone();
                            move |_| start_export(trace_id.clone(), ExportFormat::Csv, exporting, export_error)
                        },
                        "Export CSV"
                    }
                }
            }

            div {
                class: "trace-metrics",
                span { class: "{status_class}", "{status_text}" }
                span { class: "trace-pill", "{span_count} spans" }
                span { class: "trace-pill", "{call_count} calls" }
                span { class: "trace-pill", "{total_tokens} tokens" }
                span { class: "trace-pill", "{total_cost}" }
            }

            if let Some(message) = refresh_error() {
                if load_state() == TraceLoadState::Ready {
                    div { class: "trace-banner", "Refresh failed, showing last data. Live updates paused until you refresh: {message}" }
                }
            }
            if let Some(message) = export_error() {
                div { class: "trace-banner", "Export failed: {message}" }
            }

            match load_state() {
                TraceLoadState::Loading => rsx! {
                    div { class: "empty-state", "Loading trace…" }
                },
                TraceLoadState::Failed(message) => rsx! {
                    div {
                        class: "empty-state",
                        p { style: "color: #ef4444;", "Could not load trace" }
                        span { "{message}" }
                    }
                },
                TraceLoadState::Empty => rsx! {
                    div {
                        class: "empty-state",
                        p { "This trace has no spans yet." }
                        span { "New spans appear here while the trace is running." }
                    }
                },
                TraceLoadState::Ready => rsx! {
                    div {
                        class: "trace-body",
                        div {
                            class: "trace-tree",
                            for row in rows {
                                TraceTreeRow {
                                    key: "{row.span_id}",
                                    row: row.clone(),
                                    on_toggle: move |span_id: String| {
                                        interaction.write().toggle_expand(&span_id);
                                    },
                                    on_select: move |span_id: String| {
                                        interaction.write().select(&span_id);
                                    },
                                }
                            }
                        }
                        div {
                            class: "trace-side",
                            match selected.clone() {
                                Some(span) => rsx! {
                                    SpanDetailPanel {
                                        span,
                                        rollup: selected_rollup.clone(),
                                        on_critical_path: selected_on_path,
                                    }
                                },
                                None => rsx! {
                                    div {
                                        class: "trace-card trace-subtitle",
                                        "Select a span to see its details."
                                    }
                                },
                            }
                            BottleneckList {
                                entries: bottlenecks.clone(),
                                critical_path_ms: analysis.critical_path_duration_ms,
                                source_label: source_label.clone(),
                                on_select: move |span_id: String| {
                                    let forest = build_hierarchy(store.read().spans());
                                    let mut state = interaction.write();
                                    state.reveal(&forest, &span_id);
                                    state.select(&span_id);
                                },
                            }
                        }
                    }
                },
            }
        }
    }
}
