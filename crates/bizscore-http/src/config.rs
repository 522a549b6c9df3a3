use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_MODEL_PATH: &str = "model/business_score_model.json";
pub const DEFAULT_SCORE_PATH: &str = "/api/predict";
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub model_path: PathBuf,
    pub score_path: String,
    pub max_body_bytes: usize,
    // Deadline for receiving the whole request, head and body.
    pub read_timeout: Duration,
    pub max_connections: usize,
    pub expose_internal_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_HTTP_ADDR.to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            score_path: DEFAULT_SCORE_PATH.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            expose_internal_errors: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            addr: var("BIZSCORE_HTTP_ADDR").unwrap_or(defaults.addr),
            model_path: var("BIZSCORE_MODEL_PATH").map_or(defaults.model_path, PathBuf::from),
            score_path: var("BIZSCORE_SCORE_PATH").map_or(defaults.score_path, normalize_path),
            max_body_bytes: parse_clamped(
                var("BIZSCORE_MAX_BODY_BYTES").as_deref(),
                DEFAULT_MAX_BODY_BYTES,
                1024,
                16 * 1024 * 1024,
            ),
            read_timeout: Duration::from_millis(parse_clamped(
                var("BIZSCORE_READ_TIMEOUT_MS").as_deref(),
                DEFAULT_READ_TIMEOUT_MS,
                100,
                120_000,
            )),
            max_connections: parse_clamped(
                var("BIZSCORE_MAX_CONNECTIONS").as_deref(),
                DEFAULT_MAX_CONNECTIONS,
                1,
                4096,
            ),
            expose_internal_errors: parse_bool(
                var("BIZSCORE_EXPOSE_INTERNAL_ERRORS").as_deref(),
                false,
            ),
        }
    }
}

fn normalize_path(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

fn parse_clamped<T>(raw: Option<&str>, default: T, min: T, max: T) -> T
where
    T: FromStr + Ord,
{
    raw.and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
