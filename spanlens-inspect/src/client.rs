use reqwest::{Client, Url};
use spanlens_core::{ExportFormat, Trace, TraceAnalysis};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid trace service URL '{0}'")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error: {status} ({message})")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// REST client for the trace service
#[derive(Debug, Clone)]
pub struct TraceClient {
    http: Client,
    base: Url,
}

impl TraceClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let base = Url::parse(&config.api_base)
            .map_err(|_| ClientError::InvalidUrl(config.api_base.clone()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.api_base.clone()));
        }
        let http = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `GET /traces/:id`
    pub async fn fetch_trace(&self, trace_id: &str) -> Result<Trace, ClientError> {
        let body = self.get(self.trace_url(trace_id, None)?).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `GET /traces/:id/analysis`
    pub async fn fetch_analysis(&self, trace_id: &str) -> Result<TraceAnalysis, ClientError> {
        let body = self.get(self.trace_url(trace_id, Some("analysis"))?).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `GET /traces/:id/export?format=…`, body returned as-is.
    pub async fn fetch_export(
        &self,
        trace_id: &str,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ClientError> {
        let mut url = self.trace_url(trace_id, Some("export"))?;
        url.query_pairs_mut().append_pair("format", format.as_str());
        self.get(url).await
    }

    fn trace_url(&self, trace_id: &str, tail: Option<&str>) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?;
            segments.pop_if_empty().push("traces").push(trace_id);
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Vec<u8>, ClientError> {
        tracing::debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: describe_error_body(&body),
            });
        }
        Ok(body.to_vec())
    }
}

/// Backend `error`/`message` field when present, otherwise the raw body.
fn describe_error_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
        for key in ["error", "message"] {
            if let Some(message) = json.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        "empty body".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> TraceClient {
        TraceClient::new(&Config::default().with_api_base(Some(base))).unwrap()
    }

    #[test]
    fn test_trace_urls() {
        let client = client("http://localhost:8080");
        assert_eq!(
            client.trace_url("tr_1", None).unwrap().as_str(),
            "http://localhost:8080/traces/tr_1"
        );
        assert_eq!(
            client.trace_url("tr_1", Some("analysis")).unwrap().as_str(),
            "http://localhost:8080/traces/tr_1/analysis"
        );
    }

    #[test]
    fn test_trace_id_is_escaped_and_prefix_kept() {
        let client = client("http://localhost:8080/api");
        assert_eq!(
            client.trace_url("a/b c", None).unwrap().as_str(),
            "http://localhost:8080/api/traces/a%2Fb%20c"
        );
    }

    #[test]
    fn test_invalid_base_rejected() {
        let config = Config::default().with_api_base(Some("not a url"));
        assert!(matches!(
            TraceClient::new(&config),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_error_body_description() {
        assert_eq!(describe_error_body(br#"{"error":"trace not found"}"#), "trace not found");
        assert_eq!(describe_error_body(br#"{"message":"slow down"}"#), "slow down");
        assert_eq!(describe_error_body(b"  gateway timeout \n"), "gateway timeout");
        assert_eq!(describe_error_body(b""), "empty body");
    }
}
