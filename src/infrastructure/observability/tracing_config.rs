use crate::presentation::config::LoggingSettings;

const DEFAULT_LEVEL: &str = "info";

/// Inputs to `init_tracing`. `LOG_FORMAT=json` forces JSON output on top of settings.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    pub level: String,
    pub json_format: bool,
}

impl TracingConfig {
    pub fn from_settings(environment: &str, logging: &LoggingSettings) -> Self {
        Self {
            environment: environment.to_string(),
            level: logging.level.clone(),
            json_format: logging.enable_json || json_forced_by_env(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string()),
            level: DEFAULT_LEVEL.to_string(),
            json_format: json_forced_by_env(),
        }
    }
}

fn json_forced_by_env() -> bool {
    std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"))
}
