use std::path::{Path, PathBuf};

use anyhow::Context;
use spanlens_core::hierarchy::sort_by_start_time;
use spanlens_core::{
    analyze_with_limit, build_hierarchy, build_tree_rows, compute_rollups, find_node,
    AnalysisSource, ExportFormat, InteractionState, SpanStore, Trace,
};

use crate::client::TraceClient;
use crate::render::{render_analysis, render_detail, render_header, render_tree};

/// Options for `show`
#[derive(Debug, Clone, Default)]
pub struct ShowOptions {
    pub expand_all: bool,
    pub select: Option<String>,
    pub sort_by_start: bool,
    pub max_bottlenecks: usize,
}

pub fn read_trace_file(path: &Path) -> anyhow::Result<Trace> {
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// From a file when given, otherwise from the service.
pub async fn load_trace(
    client: &TraceClient,
    trace_id: &str,
    file: Option<&Path>,
) -> anyhow::Result<Trace> {
    let trace = match file {
        Some(path) => read_trace_file(path)?,
        None => client
            .fetch_trace(trace_id)
            .await
            .with_context(|| format!("fetching trace {trace_id}"))?,
    };
    if trace.trace_id != trace_id {
        tracing::warn!(
            requested = trace_id,
            found = %trace.trace_id,
            "trace id in payload differs from the one requested"
        );
    }
    Ok(trace)
}

pub fn show_trace(trace: &Trace, options: &ShowOptions) -> String {
    let store = SpanStore::from_trace(trace);
    let mut forest = build_hierarchy(store.spans());
    if options.sort_by_start {
        forest = sort_by_start_time(&forest);
    }
    let analysis = analyze_with_limit(&forest, options.max_bottlenecks);

    let mut interaction = InteractionState::new();
    for root in &forest {
        interaction.expand(root.span_id());
    }
    if options.expand_all {
        interaction.expand_all(&forest);
    }
    if let Some(span_id) = options.select.as_deref() {
        interaction.reveal(&forest, span_id);
        interaction.select(span_id);
    }

    let rows = build_tree_rows(&forest, &analysis, &interaction);
    let mut out = vec![
        render_header(store.header(), store.len()),
        render_tree(&rows),
        String::new(),
        render_analysis(&analysis, AnalysisSource::Client, &forest, options.max_bottlenecks),
    ];

    if let Some(span_id) = options.select.as_deref() {
        out.push(String::new());
        match interaction.selected_node(&forest) {
            Some(node) => {
                let rollups = compute_rollups(&forest);
                out.push(render_detail(
                    &forest,
                    &node.span,
                    rollups.get(span_id),
                    analysis.is_on_critical_path(span_id),
                ));
            }
            None => out.push(format!("Span {span_id} is not in this trace")),
        }
    }
    out.join("\n")
}

/// Local or server analysis, rendered.
pub async fn analyze_trace(
    client: &TraceClient,
    trace_id: &str,
    file: Option<&Path>,
    use_server: bool,
    max_bottlenecks: usize,
) -> anyhow::Result<String> {
    let trace = load_trace(client, trace_id, file).await?;
    let forest = build_hierarchy(&trace.spans);
    let (analysis, source) = if use_server {
        let analysis = client
            .fetch_analysis(trace_id)
            .await
            .with_context(|| format!("fetching analysis for {trace_id}"))?;
        (analysis, AnalysisSource::Server)
    } else {
        (
            analyze_with_limit(&forest, max_bottlenecks),
            AnalysisSource::Client,
        )
    };
    // Guard against ids the forest doesn't hold; render falls back to raw ids.
    if let Some(missing) = analysis
        .critical_path
        .iter()
        .find(|id| find_node(&forest, id).is_none())
    {
        tracing::debug!(span_id = %missing, "analysis references a span not in the trace");
    }
    Ok(render_analysis(&analysis, source, &forest, max_bottlenecks))
}

/// Download the export and write it verbatim. Returns the path written.
pub async fn export_trace(
    client: &TraceClient,
    trace_id: &str,
    format: ExportFormat,
    out: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    let bytes = client
        .fetch_export(trace_id, format)
        .await
        .with_context(|| format!("exporting {trace_id} as {format}"))?;
    let path = out.unwrap_or_else(|| PathBuf::from(format.download_filename(trace_id)));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "export written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use spanlens_core::{Span, SpanOperation, TraceStatus};

    fn trace() -> Trace {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        Trace {
            trace_id: "tr_1".to_string(),
            name: Some("support-agent".to_string()),
            status: TraceStatus::Completed,
            spans: vec![
                Span::new("A", "agent", SpanOperation::Processing, start).completed(100),
                Span::new("B", "plan", SpanOperation::AiCall, start)
                    .with_parent("A")
                    .completed(300),
                Span::new("D", "deep", SpanOperation::Custom, start)
                    .with_parent("B")
                    .completed(5),
                Span::new("C", "lookup", SpanOperation::Database, start)
                    .with_parent("A")
                    .completed(50),
            ],
            total_cost: 0.0,
            total_tokens: 0,
            call_count: 1,
            start_time: Some(start),
            end_time: None,
        }
    }

    fn options() -> ShowOptions {
        ShowOptions {
            max_bottlenecks: 5,
            ..ShowOptions::default()
        }
    }

    #[test]
    fn test_show_opens_roots_only() {
        let text = show_trace(&trace(), &options());
        assert!(text.starts_with("support-agent [tr_1] completed"));
        let tree: Vec<&str> = text
            .lines()
            .skip(1)
            .take_while(|line| !line.is_empty())
            .collect();
        assert_eq!(tree.len(), 3);
        assert!(tree[1].contains("plan"));
        assert!(!tree.iter().any(|line| line.contains("deep")));
    }

    #[test]
    fn test_show_select_reveals_and_describes() {
        let text = show_trace(
            &trace(),
            &ShowOptions {
                select: Some("D".to_string()),
                ..options()
            },
        );
        assert!(text.lines().any(|line| line.starts_with(">*") && line.contains("deep")));
        assert!(text.contains("Span deep (D)"));
        assert!(text.contains("ancestors  agent → plan"));
    }

    #[test]
    fn test_show_unknown_selection() {
        let text = show_trace(
            &trace(),
            &ShowOptions {
                select: Some("zz".to_string()),
                ..options()
            },
        );
        assert!(text.contains("Span zz is not in this trace"));
    }

    #[test]
    fn test_read_trace_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = read_trace_file(&path).unwrap_err().to_string();
        assert!(err.contains("trace.json"), "{err}");
    }
}
