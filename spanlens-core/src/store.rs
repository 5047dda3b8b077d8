//! Span Store
//!
//! The flat, authoritative span list for a single trace. Spans are only ever
//! appended; a span already present is updated in place as it moves from
//! `running` to `completed` or `failed`. Everything derived from the store
//! (forest, analysis, rows) is recomputed whenever [`SpanStore::revision`]
//! changes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::types::{AiCall, Span, SpanError, SpanStatus, Trace, TraceStatus};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("trace '{incoming}' cannot be merged into store for trace '{expected}'")]
    TraceMismatch { expected: String, incoming: String },

    #[error("span '{0}' is not in the store")]
    UnknownSpan(String),

    #[error("span '{span_id}' is already {status} and cannot return to running")]
    TerminalRegression { span_id: String, status: &'static str },
}

/// Backend summary fields carried alongside the spans
#[derive(Debug, Clone, PartialEq)]
pub struct TraceHeader {
    pub trace_id: String,
    pub name: Option<String>,
    pub status: TraceStatus,
    pub total_cost: f64,
    pub total_tokens: i64,
    pub call_count: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl TraceHeader {
    fn new(trace_id: String) -> Self {
        Self {
            trace_id,
            name: None,
            status: TraceStatus::Running,
            total_cost: 0.0,
            total_tokens: 0,
            call_count: 0,
            start_time: None,
            end_time: None,
        }
    }
}

/// In-place completion of a running span
#[derive(Debug, Clone, PartialEq)]
pub struct SpanUpdate {
    pub status: SpanStatus,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub ai_call: Option<AiCall>,
    pub error: Option<SpanError>,
}

/// What a merge did to the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub appended: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Updates that tried to move a terminal span back to running
    pub rejected: usize,
    pub header_changed: bool,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        self.appended > 0 || self.updated > 0 || self.header_changed
    }
}

#[derive(Debug, Clone)]
pub struct SpanStore {
    header: TraceHeader,
    spans: Vec<Span>,
    index: HashMap<String, usize>,
    revision: u64,
}

impl SpanStore {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            header: TraceHeader::new(trace_id.into()),
            spans: Vec::new(),
            index: HashMap::new(),
            revision: 0,
        }
    }

    pub fn from_trace(trace: &Trace) -> Self {
        let mut store = Self::new(trace.trace_id.clone());
        store.apply_trace(trace);
        store
    }

    pub fn trace_id(&self) -> &str {
        &self.header.trace_id
    }

    pub fn header(&self) -> &TraceHeader {
        &self.header
    }

    pub fn status(&self) -> TraceStatus {
        self.header.status
    }

    /// Spans in arrival order
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn get(&self, span_id: &str) -> Option<&Span> {
        self.index.get(span_id).map(|&idx| &self.spans[idx])
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Bumped on every mutation that changed something.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Merge a freshly fetched trace: header first, then every span.
    pub fn merge_trace(&mut self, trace: &Trace) -> Result<MergeReport, StoreError> {
        if trace.trace_id != self.header.trace_id {
            return Err(StoreError::TraceMismatch {
                expected: self.header.trace_id.clone(),
                incoming: trace.trace_id.clone(),
            });
        }

        Ok(self.apply_trace(trace))
    }

    /// Header plus spans, without the trace id check.
    fn apply_trace(&mut self, trace: &Trace) -> MergeReport {
        let header = TraceHeader {
            trace_id: trace.trace_id.clone(),
            name: trace.name.clone(),
            status: trace.status,
            total_cost: trace.total_cost,
            total_tokens: trace.total_tokens,
            call_count: trace.call_count,
            start_time: trace.start_time,
            end_time: trace.end_time,
        };
        let header_changed = header != self.header;
        if header_changed {
            self.header = header;
        }

        let mut report = self.merge_spans_inner(&trace.spans);
        report.header_changed = header_changed;
        if report.changed() {
            self.revision += 1;
        }
        report
    }

    /// Merge a batch of spans. Unknown ids are appended, known ids updated.
    pub fn merge_spans(&mut self, spans: &[Span]) -> MergeReport {
        let report = self.merge_spans_inner(spans);
        if report.changed() {
            self.revision += 1;
        }
        report
    }

    fn merge_spans_inner(&mut self, spans: &[Span]) -> MergeReport {
        let mut report = MergeReport::default();
        for span in spans {
            match self.index.get(&span.span_id).copied() {
                None => {
                    self.index.insert(span.span_id.clone(), self.spans.len());
                    self.spans.push(span.clone());
                    report.appended += 1;
                }
                Some(idx) => {
                    let current = &mut self.spans[idx];
                    if current.status.is_terminal() && span.status == SpanStatus::Running {
                        tracing::warn!(
                            span_id = %span.span_id,
                            status = current.status.as_str(),
                            "ignoring running update for terminal span"
                        );
                        report.rejected += 1;
                    } else if current == span {
                        report.unchanged += 1;
                    } else {
                        *current = span.clone();
                        report.updated += 1;
                    }
                }
            }
        }
        tracing::debug!(
            trace_id = %self.header.trace_id,
            appended = report.appended,
            updated = report.updated,
            rejected = report.rejected,
            "merged spans"
        );
        report
    }

    /// Apply a single status update to a span already in the store.
    pub fn apply_update(&mut self, span_id: &str, update: SpanUpdate) -> Result<bool, StoreError> {
        let idx = *self
            .index
            .get(span_id)
            .ok_or_else(|| StoreError::UnknownSpan(span_id.to_string()))?;
        let span = &mut self.spans[idx];

        if span.status.is_terminal() && update.status == SpanStatus::Running {
            return Err(StoreError::TerminalRegression {
                span_id: span_id.to_string(),
                status: span.status.as_str(),
            });
        }

        let mut next = span.clone();
        next.status = update.status;
        if update.end_time.is_some() {
            next.end_time = update.end_time;
        }
        if update.duration_ms.is_some() {
            next.duration_ms = update.duration_ms;
        }
        if update.ai_call.is_some() {
            next.ai_call = update.ai_call;
        }
        if update.error.is_some() {
            next.error = update.error;
        }

        if next == *span {
            return Ok(false);
        }
        *span = next;
        self.revision += 1;
        Ok(true)
    }
}
