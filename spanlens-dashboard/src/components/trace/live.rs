use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_logger::tracing::{debug, warn};
use gloo_timers::future::TimeoutFuture;
use spanlens_core::{
    build_hierarchy, Completion, InteractionState, RefreshDecision, RefreshGate, RefreshTicket,
    ServerAnalysis, SpanStore, Trace, TraceLoadState,
};

use crate::api::{fetch_trace, fetch_trace_analysis};

use super::types::{keep_polling, TRACE_POLL_INTERVAL_MS};

// ── Shared handles ───────────────────────────────────────────────────────────

/// Everything a background fetch may touch. Signals are `Copy`; the gates
/// are shared with `use_drop` so unmounting closes them.
#[derive(Clone)]
pub struct LiveTrace {
    pub trace_id: String,
    pub gate: Rc<RefCell<RefreshGate>>,
    /// Separate gate so `/analysis` calls never overlap either
    pub analysis_gate: Rc<RefCell<RefreshGate>>,
    pub polling: Rc<Cell<bool>>,
    pub store: Signal<SpanStore>,
    pub load_state: Signal<TraceLoadState>,
    pub interaction: Signal<InteractionState>,
    pub server_analysis: Signal<Option<ServerAnalysis>>,
    pub refresh_error: Signal<Option<String>>,
}

impl LiveTrace {
    /// Refresh button: fetch now, and pick polling back up if a failure
    /// stopped it.
    pub fn refresh_now(&self) {
        if self.polling.get() {
            self.request_refresh();
        } else {
            spawn(self.clone().poll());
        }
    }

    /// Ask for a refresh. Coalesces with a fetch already in flight.
    fn request_refresh(&self) {
        let decision = self.gate.borrow_mut().request();
        match decision {
            RefreshDecision::Start(ticket) => {
                spawn(self.clone().run_fetches(ticket));
            }
            RefreshDecision::Coalesced => {
                debug!(trace_id = %self.trace_id, "refresh coalesced into in-flight fetch");
            }
            RefreshDecision::Closed => {}
        }
    }

    /// Poll while the trace is running. Stops for good on a terminal status
    /// or when the view goes away, and pauses on a failed fetch until the
    /// next manual refresh.
    pub async fn poll(self) {
        if self.polling.replace(true) {
            return;
        }
        loop {
            if self.gate.borrow().is_closed() {
                break;
            }
            // A slow fetch just delays the next one; ticks are not queued.
            if !self.gate.borrow().is_in_flight() {
                let keep = keep_polling(
                    &self.load_state.peek(),
                    self.refresh_error.peek().is_some(),
                    self.store.peek().status(),
                );
                if !keep {
                    debug!(trace_id = %self.trace_id, "polling stopped");
                    break;
                }
                self.request_refresh();
            }
            TimeoutFuture::new(TRACE_POLL_INTERVAL_MS).await;
        }
        self.polling.set(false);
    }

    async fn run_fetches(self, first: RefreshTicket) {
        let mut ticket = first;
        loop {
            let result = fetch_trace(&self.trace_id).await;
            let completion = self.gate.borrow_mut().complete(ticket);
            match completion {
                Completion::Discard => return,
                Completion::Apply { follow_up } => {
                    self.clone().apply(result);
                    match follow_up {
                        Some(next) => ticket = next,
                        None => return,
                    }
                }
            }
        }
    }

    fn apply(mut self, result: Result<Trace, String>) {
        let trace = match result {
            Ok(trace) => trace,
            Err(message) => {
                warn!(trace_id = %self.trace_id, "trace refresh failed: {message}");
                let next = self.load_state.peek().after_error(message.clone());
                self.load_state.set(next);
                self.refresh_error.set(Some(message));
                return;
            }
        };

        let merged = self.store.write().merge_trace(&trace);
        let report = match merged {
            Ok(report) => report,
            Err(err) => {
                warn!(trace_id = %self.trace_id, "rejected trace payload: {err}");
                self.refresh_error.set(Some(err.to_string()));
                return;
            }
        };

        let span_count = self.store.peek().len();
        let previous = self.load_state.peek().clone();
        let next = TraceLoadState::after_fetch(span_count);

        if previous != TraceLoadState::Ready && next == TraceLoadState::Ready {
            // First time there is something to show: open the top level.
            let forest = build_hierarchy(self.store.peek().spans());
            let mut interaction = self.interaction.write();
            for root in forest.iter().filter(|root| root.has_children()) {
                interaction.expand(root.span_id());
            }
        }
        if previous != next {
            self.load_state.set(next);
        }
        if self.refresh_error.peek().is_some() {
            self.refresh_error.set(None);
        }

        if report.changed() {
            self.request_analysis();
        }
    }

    fn request_analysis(&self) {
        let decision = self.analysis_gate.borrow_mut().request();
        if let RefreshDecision::Start(ticket) = decision {
            spawn(self.clone().run_analysis_fetches(ticket));
        }
    }

    /// Each pass is tagged with the revision it started at, so a result that
    /// no longer describes the spans on screen is never selected.
    async fn run_analysis_fetches(mut self, first: RefreshTicket) {
        let mut ticket = first;
        loop {
            let revision = self.store.peek().revision();
            let result = fetch_trace_analysis(&self.trace_id).await;
            let completion = self.analysis_gate.borrow_mut().complete(ticket);
            let follow_up = match completion {
                Completion::Discard => return,
                Completion::Apply { follow_up } => follow_up,
            };

            match result {
                Ok(analysis) if self.store.peek().revision() == revision => {
                    self.server_analysis
                        .set(Some(ServerAnalysis { revision, analysis }));
                }
                Ok(_) => {
                    debug!(trace_id = %self.trace_id, revision, "server analysis outdated on arrival");
                }
                Err(message) => {
                    debug!(trace_id = %self.trace_id, "server analysis unavailable: {message}");
                }
            }

            match follow_up {
                Some(next) => ticket = next,
                None => return,
            }
        }
    }
}
