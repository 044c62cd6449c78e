use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Key identifier published in the JWKS and stamped into every assertion
/// header when `ES256_KEY_ID` is unset or empty.
pub const DEFAULT_KEY_ID: &str = "default-key";

/// Default listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default per-window subject capacity of the assertion cache.
pub const DEFAULT_ASSERTION_CACHE_CAPACITY: usize = 10_000;

/// Default `Cache-Control: max-age` for the JWKS endpoints (1 hour).
pub const DEFAULT_JWKS_MAX_AGE_SECONDS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    /// PKCS#8 PEM of the ES256 signing key, possibly with literal `\n` escapes.
    pub signing_key_pem: SecretString,
    pub key_id: String,
    pub bind_address: String,
    pub assertion_cache_capacity: usize,
    pub jwks_max_age_seconds: u64,
    pub csp: CspConfig,
}

/// Content-Security-Policy options.
///
/// The base directive set is fixed; these only extend it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspConfig {
    pub additional_connect_src: Vec<String>,
    pub additional_script_src: Vec<String>,
    pub additional_style_src: Vec<String>,
    pub additional_img_src: Vec<String>,
    pub additional_font_src: Vec<String>,
    /// Emit `Content-Security-Policy-Report-Only` instead of enforcing.
    pub report_only: bool,
    pub report_uri: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let signing_key_pem = vars
            .get("ES256_PRIVATE_KEY")
            .filter(|v| !v.trim().is_empty())
            .map(|v| SecretString::from(v.as_str()))
            .ok_or_else(|| ConfigError::MissingEnvVar("ES256_PRIVATE_KEY".to_string()))?;

        let key_id = vars
            .get("ES256_KEY_ID")
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_KEY_ID)
            .to_string();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let assertion_cache_capacity = match vars.get("ASSERTION_CACHE_CAPACITY") {
            Some(raw) => {
                let capacity: usize = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                    name: "ASSERTION_CACHE_CAPACITY".to_string(),
                    reason: format!("{e}"),
                })?;
                if capacity == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: "ASSERTION_CACHE_CAPACITY".to_string(),
                        reason: "must be at least 1".to_string(),
                    });
                }
                capacity
            }
            None => DEFAULT_ASSERTION_CACHE_CAPACITY,
        };

        let jwks_max_age_seconds = match vars.get("JWKS_MAX_AGE_SECONDS") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                name: "JWKS_MAX_AGE_SECONDS".to_string(),
                reason: format!("{e}"),
            })?,
            None => DEFAULT_JWKS_MAX_AGE_SECONDS,
        };

        let report_only = match vars.get("CSP_REPORT_ONLY") {
            Some(raw) => parse_bool("CSP_REPORT_ONLY", raw)?,
            None => false,
        };

        let csp = CspConfig {
            additional_connect_src: parse_sources(vars.get("CSP_ADDITIONAL_CONNECT_SRC")),
            additional_script_src: parse_sources(vars.get("CSP_ADDITIONAL_SCRIPT_SRC")),
            additional_style_src: parse_sources(vars.get("CSP_ADDITIONAL_STYLE_SRC")),
            additional_img_src: parse_sources(vars.get("CSP_ADDITIONAL_IMG_SRC")),
            additional_font_src: parse_sources(vars.get("CSP_ADDITIONAL_FONT_SRC")),
            report_only,
            report_uri: vars
                .get("CSP_REPORT_URI")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        };

        Ok(Config {
            signing_key_pem,
            key_id,
            bind_address,
            assertion_cache_capacity,
            jwks_max_age_seconds,
            csp,
        })
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!("expected true/false, got '{other}'"),
        }),
    }
}

/// Split a source list on whitespace and commas.
fn parse_sources(raw: Option<&String>) -> Vec<String> {
    raw.map(|v| {
        v.split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    })
    .unwrap_or_default()
}
