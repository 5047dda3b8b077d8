use gloo_net::http::Request;
use spanlens_core::{ExportFormat, Trace, TraceAnalysis};
use std::sync::OnceLock;

/// Get the API base URL based on current environment
/// - In development (localhost): use http://localhost:8080
/// - In production: use same origin (API serves static files)
fn get_api_base() -> String {
    let hostname = web_sys::window()
        .and_then(|w| w.location().hostname().ok())
        .unwrap_or_default();

    if hostname == "localhost" || hostname == "127.0.0.1" {
        "http://localhost:8080".to_string()
    } else {
        "".to_string()
    }
}

static API_BASE_CACHE: OnceLock<String> = OnceLock::new();

/// Get the cached API base URL
pub fn api_base() -> &'static str {
    API_BASE_CACHE.get_or_init(get_api_base).as_str()
}

fn encode_path_segment(value: &str) -> String {
    js_sys::encode_uri_component(value)
        .as_string()
        .unwrap_or_else(|| value.to_string())
}

async fn describe_http_error(response: gloo_net::http::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.trim().is_empty() {
        return format!("HTTP error: {status}");
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(error) = json.get("error").and_then(|v| v.as_str()) {
            return format!("HTTP error: {status} ({error})");
        }
        if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
            return format!("HTTP error: {status} ({message})");
        }
    }

    format!("HTTP error: {status} ({body})")
}

// ============================================================================
// Trace API Functions
// ============================================================================

/// `GET /traces/:id`
pub async fn fetch_trace(trace_id: &str) -> Result<Trace, String> {
    let url = format!("{}/traces/{}", api_base(), encode_path_segment(trace_id));

    let response = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("Request failed: {e}"))?;
    if !response.ok() {
        return Err(describe_http_error(response).await);
    }
    response
        .json::<Trace>()
        .await
        .map_err(|e| format!("Failed to parse JSON: {e}"))
}

/// `GET /traces/:id/analysis`
pub async fn fetch_trace_analysis(trace_id: &str) -> Result<TraceAnalysis, String> {
    let url = format!(
        "{}/traces/{}/analysis",
        api_base(),
        encode_path_segment(trace_id)
    );

    let response = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("Request failed: {e}"))?;
    if !response.ok() {
        return Err(describe_http_error(response).await);
    }
    response
        .json::<TraceAnalysis>()
        .await
        .map_err(|e| format!("Failed to parse JSON: {e}"))
}

/// `GET /traces/:id/export?format=json|csv`, body returned untouched.
pub async fn fetch_trace_export(trace_id: &str, format: ExportFormat) -> Result<Vec<u8>, String> {
    let url = format!(
        "{}/traces/{}/export?format={}",
        api_base(),
        encode_path_segment(trace_id),
        format.as_str()
    );

    let response = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("Request failed: {e}"))?;
    if !response.ok() {
        return Err(describe_http_error(response).await);
    }
    response
        .binary()
        .await
        .map_err(|e| format!("Failed to read export body: {e}"))
}
