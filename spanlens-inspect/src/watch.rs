//! Follow a running trace.
//!
//! One fetch at a time: ticks that arrive while a fetch is outstanding are
//! folded into a single follow-up by the [`RefreshGate`]. A frame is emitted
//! whenever the store revision moves. A failed fetch ends the watch; it is
//! not retried.

use std::future::Future;

use spanlens_core::{
    analyze, build_hierarchy, build_tree_rows, AnalysisSource, Completion, InteractionState,
    RefreshDecision, RefreshGate, RefreshTicket, SpanStore, StoreError, Trace, TraceStatus,
};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::client::{ClientError, TraceClient};
use crate::config::Config;
use crate::render::{render_analysis, render_header, render_tree};

#[derive(Debug)]
pub enum WatchOutcome {
    /// The trace reached a terminal status
    Finished(TraceStatus),
    /// Stopped from outside (Ctrl-C)
    Interrupted,
    /// A fetch failed
    Failed(ClientError),
    /// The service answered with a different trace
    Rejected(StoreError),
}

type FetchResult = (RefreshTicket, Result<Trace, ClientError>);

fn spawn_fetch(
    client: &TraceClient,
    trace_id: &str,
    ticket: RefreshTicket,
    tx: &mpsc::UnboundedSender<FetchResult>,
) {
    let client = client.clone();
    let trace_id = trace_id.to_string();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.fetch_trace(&trace_id).await;
        // Receiver is gone once the watch has ended.
        let _ = tx.send((ticket, result));
    });
}

/// Full tree plus analysis for the current store contents.
pub fn render_frame(store: &SpanStore, max_bottlenecks: usize) -> String {
    let forest = build_hierarchy(store.spans());
    let analysis = analyze(&forest);
    let mut interaction = InteractionState::new();
    interaction.expand_all(&forest);
    let rows = build_tree_rows(&forest, &analysis, &interaction);

    format!(
        "{}\n{}\n\n{}",
        render_header(store.header(), store.len()),
        render_tree(&rows),
        render_analysis(&analysis, AnalysisSource::Client, &forest, max_bottlenecks)
    )
}

pub async fn watch_trace<S, F>(
    client: &TraceClient,
    trace_id: &str,
    config: &Config,
    shutdown: S,
    mut on_frame: F,
) -> WatchOutcome
where
    S: Future<Output = ()>,
    F: FnMut(String),
{
    let mut gate = RefreshGate::new();
    let mut store = SpanStore::new(trace_id);
    let mut rendered_revision = None;

    let (tx, mut rx) = mpsc::unbounded_channel::<FetchResult>();
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                gate.close();
                tracing::info!(trace_id, "watch interrupted");
                return WatchOutcome::Interrupted;
            }
            _ = ticker.tick() => {
                match gate.request() {
                    RefreshDecision::Start(ticket) => spawn_fetch(client, trace_id, ticket, &tx),
                    RefreshDecision::Coalesced => {
                        tracing::debug!(trace_id, "fetch still in flight, tick coalesced");
                    }
                    RefreshDecision::Closed => return WatchOutcome::Interrupted,
                }
            }
            Some((ticket, result)) = rx.recv() => {
                let follow_up = match gate.complete(ticket) {
                    Completion::Discard => continue,
                    Completion::Apply { follow_up } => follow_up,
                };

                let trace = match result {
                    Ok(trace) => trace,
                    Err(err) => {
                        gate.close();
                        tracing::warn!(trace_id, "refresh failed: {err}");
                        return WatchOutcome::Failed(err);
                    }
                };
                match store.merge_trace(&trace) {
                    Ok(report) => {
                        tracing::debug!(
                            trace_id,
                            appended = report.appended,
                            updated = report.updated,
                            "trace refreshed"
                        );
                    }
                    Err(err) => {
                        gate.close();
                        tracing::warn!(trace_id, "rejected payload: {err}");
                        return WatchOutcome::Rejected(err);
                    }
                }

                if rendered_revision != Some(store.revision()) && store.revision() > 0 {
                    rendered_revision = Some(store.revision());
                    on_frame(render_frame(&store, config.max_bottlenecks));
                }

                if store.revision() > 0 && store.status().is_terminal() {
                    gate.close();
                    return WatchOutcome::Finished(store.status());
                }
                if let Some(next) = follow_up {
                    spawn_fetch(client, trace_id, next, &tx);
                }
            }
        }
    }
}
