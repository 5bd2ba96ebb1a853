//! Application configuration loaded from environment variables.

use crate::errors::{ApiError, Result};

/// Where the settled fare comes from when a ride completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FarePolicy {
    /// The quote given at request time is the final fare.
    FixedQuote,
    /// The completion call may carry a metered final fare; falls back to the
    /// quote when none is supplied.
    Metered,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// How often (in seconds) the background task scans for expired proposals
    pub resolve_interval_secs: u64,
    /// Final-fare source at ride completion
    pub fare_policy: FarePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./marketplace.db".to_string()),
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid API_PORT".to_string()))?,
            resolve_interval_secs: env_var("RESOLVE_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid RESOLVE_INTERVAL_SECS".to_string()))?,
            fare_policy: match env_var("FARE_POLICY")
                .unwrap_or_else(|_| "fixed_quote".to_string())
                .as_str()
            {
                "fixed_quote" => FarePolicy::FixedQuote,
                "metered" => FarePolicy::Metered,
                other => {
                    return Err(ApiError::Config(format!("Invalid FARE_POLICY: {other}")));
                }
            },
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ApiError::Config(format!("Missing env var: {key}")))
}
