//! Wire types for traces and spans
//!
//! These mirror the JSON served by the trace service (`GET /traces/:id`,
//! `GET /traces/:id/analysis`). Field names are camelCase on the wire.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Span
// ============================================================================

/// Kind of work a span represents
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "trace.ts")]
pub enum SpanOperation {
    AiCall,
    Processing,
    Database,
    HttpRequest,
    /// Also absorbs operation names this build does not know about
    #[default]
    #[serde(other)]
    Custom,
}

impl SpanOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanOperation::AiCall => "ai_call",
            SpanOperation::Processing => "processing",
            SpanOperation::Database => "database",
            SpanOperation::HttpRequest => "http_request",
            SpanOperation::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "trace.ts")]
pub enum SpanStatus {
    Running,
    Completed,
    Failed,
}

impl SpanStatus {
    /// Completed and failed spans never go back to running.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SpanStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpanStatus::Running => "running",
            SpanStatus::Completed => "completed",
            SpanStatus::Failed => "failed",
        }
    }
}

/// Model call payload, present only on `ai_call` spans
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "trace.ts")]
pub struct AiCall {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub prompt_tokens: i64,
    #[serde(default)]
    pub completion_tokens: i64,
    #[serde(default)]
    pub total_tokens: i64,
    /// USD, computed by the backend
    #[serde(default)]
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<String>,
}

impl AiCall {
    /// Backend total when present, otherwise prompt + completion.
    pub fn tokens(&self) -> i64 {
        if self.total_tokens > 0 {
            self.total_tokens
        } else {
            self.prompt_tokens.saturating_add(self.completion_tokens)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "trace.ts")]
pub struct SpanError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub recoverable: bool,
}

/// One timed unit of work inside a trace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "trace.ts")]
pub struct Span {
    pub span_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub operation: SpanOperation,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Milliseconds; absent while running
    #[serde(default, rename = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    pub status: SpanStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_call: Option<AiCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SpanError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "unknown")]
    pub metadata: Option<serde_json::Value>,
}

impl Span {
    /// A running span with no parent. Use the `with_*` helpers to fill in the rest.
    pub fn new(
        span_id: impl Into<String>,
        name: impl Into<String>,
        operation: SpanOperation,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            span_id: span_id.into(),
            parent_span_id: None,
            trace_id: None,
            name: name.into(),
            operation,
            start_time,
            end_time: None,
            duration_ms: None,
            status: SpanStatus::Running,
            ai_call: None,
            error: None,
            metadata: None,
        }
    }

    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }

    pub fn completed(mut self, duration_ms: i64) -> Self {
        self.status = SpanStatus::Completed;
        self.duration_ms = Some(duration_ms);
        self.end_time = Some(self.start_time + chrono::Duration::milliseconds(duration_ms));
        self
    }

    pub fn failed(mut self, duration_ms: i64, error: SpanError) -> Self {
        self.status = SpanStatus::Failed;
        self.duration_ms = Some(duration_ms);
        self.end_time = Some(self.start_time + chrono::Duration::milliseconds(duration_ms));
        self.error = Some(error);
        self
    }

    pub fn with_ai_call(mut self, ai_call: AiCall) -> Self {
        self.ai_call = Some(ai_call);
        self
    }

    /// Parent reference, treating an empty string as no parent.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_span_id
            .as_deref()
            .filter(|parent| !parent.is_empty())
    }

    /// Duration used for all critical-path and bottleneck arithmetic.
    ///
    /// Always `None` while the span is running, even if the backend sent a
    /// provisional value. Falls back to `end_time - start_time`.
    pub fn measured_duration_ms(&self) -> Option<i64> {
        if self.status == SpanStatus::Running {
            return None;
        }
        self.duration_ms
            .or_else(|| {
                self.end_time
                    .map(|end| (end - self.start_time).num_milliseconds())
            })
            .map(|ms| ms.max(0))
    }

    pub fn cost(&self) -> Option<f64> {
        self.ai_call.as_ref().map(|call| call.cost)
    }

    pub fn tokens(&self) -> Option<i64> {
        self.ai_call.as_ref().map(AiCall::tokens)
    }

    /// Display label; falls back to the operation name.
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            self.operation.as_str()
        } else {
            &self.name
        }
    }
}

// ============================================================================
// Trace
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "trace.ts")]
pub enum TraceStatus {
    Running,
    Completed,
    Failed,
}

impl TraceStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TraceStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TraceStatus::Running => "running",
            TraceStatus::Completed => "completed",
            TraceStatus::Failed => "failed",
        }
    }
}

/// Full trace as returned by `GET /traces/:id`
///
/// The totals are backend-supplied and are displayed as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "trace.ts")]
pub struct Trace {
    pub trace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: TraceStatus,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub total_tokens: i64,
    #[serde(default)]
    pub call_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

// ============================================================================
// Analysis
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "trace.ts")]
pub struct Bottleneck {
    pub span_id: String,
    #[serde(rename = "duration")]
    pub duration_ms: i64,
    /// Percent of the critical-path total, unrounded. Spans off the path can
    /// exceed 100.
    pub percentage_of_total: f64,
}

/// Critical path and bottleneck ranking for one trace
///
/// Same shape whether computed here or by `GET /traces/:id/analysis`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "trace.ts")]
pub struct TraceAnalysis {
    #[serde(default)]
    pub critical_path: Vec<String>,
    #[serde(default)]
    pub critical_path_duration_ms: i64,
    #[serde(default)]
    pub bottlenecks: Vec<Bottleneck>,
}

// ============================================================================
// Export
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "trace.ts")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Value of the `format` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }

    pub fn download_filename(&self, trace_id: &str) -> String {
        format!("trace-{}.{}", trace_id, self.as_str())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown export format '{0}', expected 'json' or 'csv'")]
pub struct UnknownExportFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownExportFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(UnknownExportFormat(value.to_string())),
        }
    }
}
