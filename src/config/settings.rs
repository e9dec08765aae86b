use validator::{Validate, ValidationError};

use crate::errors::ConfigError;

const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017/";
const DEFAULT_DATABASE: &str = "db-project-2";
const DEFAULT_COLLECTION: &str = "db";

/// Runtime settings for a sweep run.
///
/// Everything the binaries need to reach the collection and parameterise the
/// reports lives here, so the store and the sweeper never read the environment
/// themselves.
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_price_range"))]
pub struct SweepConfig {
    #[validate(length(min = 1, message = "MONGODB_URI cannot be empty"))]
    pub mongodb_uri: String,
    #[validate(length(min = 1, message = "MONGODB_DATABASE cannot be empty"))]
    pub database_name: String,
    #[validate(length(min = 1, message = "MONGODB_COLLECTION cannot be empty"))]
    pub collection_name: String,
    #[validate(range(min = 1, message = "Connect timeout must be at least 1 second"))]
    pub connect_timeout_secs: u64,
    #[validate(range(min = 1, message = "Server selection timeout must be at least 1 second"))]
    pub server_selection_timeout_secs: u64,
    pub dry_run: bool,
    pub report_price_min: f64,
    pub report_price_max: f64,
    #[validate(range(min = 0, max = 100, message = "Condition must be between 0 and 100"))]
    pub report_min_condition: i32,
    #[validate(length(min = 1, message = "Title pattern cannot be empty"))]
    pub report_title_pattern: String,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            mongodb_uri: DEFAULT_MONGODB_URI.to_string(),
            database_name: DEFAULT_DATABASE.to_string(),
            collection_name: DEFAULT_COLLECTION.to_string(),
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 10,
            dry_run: false,
            report_price_min: 200.0,
            report_price_max: 500.0,
            report_min_condition: 85,
            report_title_pattern: "Retro High".to_string(),
        }
    }
}

fn validate_price_range(config: &SweepConfig) -> Result<(), ValidationError> {
    if config.report_price_min > config.report_price_max {
        let mut err = ValidationError::new("price_range");
        err.message = Some("REPORT_PRICE_MIN must not exceed REPORT_PRICE_MAX".into());
        return Err(err);
    }
    Ok(())
}

/// Load settings from the process environment, after reading `.env` if present.
pub fn load_config() -> Result<SweepConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_config(|key| std::env::var(key))
}

/// Parse and validate settings through `lookup`, so tests can feed a plain map
/// instead of mutating the process environment.
pub fn build_config<F>(lookup: F) -> Result<SweepConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = SweepConfig::default();

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let raw = |var: &str, default: String| -> String {
        lookup(var).map(|v| v.trim().to_string()).unwrap_or(default)
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        raw(var, default.to_string())
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: f64| -> Result<f64, ConfigError> {
        let value = raw(var, default.to_string())
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() {
            return Err(invalid(var, "must be a finite number".to_string()));
        }
        Ok(value)
    };

    let parse_i32 = |var: &str, default: i32| -> Result<i32, ConfigError> {
        raw(var, default.to_string())
            .parse::<i32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(false),
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "" | "0" | "false" | "no" | "off" => Ok(false),
                other => Err(invalid(var, format!("expected a boolean, got {:?}", other))),
            },
        }
    };

    let config = SweepConfig {
        mongodb_uri: or_default("MONGODB_URI", &defaults.mongodb_uri),
        database_name: or_default("MONGODB_DATABASE", &defaults.database_name),
        collection_name: or_default("MONGODB_COLLECTION", &defaults.collection_name),
        connect_timeout_secs: parse_u64("MONGODB_CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs)?,
        server_selection_timeout_secs: parse_u64(
            "MONGODB_SERVER_SELECTION_TIMEOUT_SECS",
            defaults.server_selection_timeout_secs,
        )?,
        dry_run: parse_bool("SWEEP_DRY_RUN")?,
        report_price_min: parse_f64("REPORT_PRICE_MIN", defaults.report_price_min)?,
        report_price_max: parse_f64("REPORT_PRICE_MAX", defaults.report_price_max)?,
        report_min_condition: parse_i32("REPORT_MIN_CONDITION", defaults.report_min_condition)?,
        report_title_pattern: or_default("REPORT_TITLE_PATTERN", &defaults.report_title_pattern),
    };

    config.validate()?;
    Ok(config)
}
