use std::time::Duration;

const DEFAULT_API_BASE: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Trace service base URL, no trailing slash
    pub api_base: String,
    /// Per-request timeout for the trace service
    pub http_timeout: Duration,
    /// Tick for `watch`
    pub poll_interval: Duration,
    /// Bottlenecks printed by `show` and `analyze`
    pub max_bottlenecks: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            http_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(1_000),
            max_bottlenecks: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let poll_interval_ms: u64 = env_parse(&lookup, "SPANLENS_POLL_INTERVAL_MS", 1_000)?;
        if poll_interval_ms == 0 {
            anyhow::bail!("SPANLENS_POLL_INTERVAL_MS must be greater than zero");
        }

        Ok(Self {
            api_base: normalize_base(&env_str(&lookup, "SPANLENS_API_BASE", &defaults.api_base)),
            http_timeout: Duration::from_secs(env_parse(
                &lookup,
                "SPANLENS_HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )?),
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_bottlenecks: env_parse(
                &lookup,
                "SPANLENS_MAX_BOTTLENECKS",
                defaults.max_bottlenecks,
            )?,
        })
    }

    /// `--api-base` wins over the environment.
    pub fn with_api_base(mut self, api_base: Option<&str>) -> Self {
        if let Some(base) = api_base {
            self.api_base = normalize_base(base);
        }
        self
    }
}

fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

fn env_str(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        None => Ok(default),
    }
}
