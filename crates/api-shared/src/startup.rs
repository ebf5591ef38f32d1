//! Startup configuration loading.
//!
//! Environment variables are read exactly once, here, and resolved into a [`CoreConfig`].
//! Binaries call [`load_core_config`] after `dotenvy::dotenv()`; nothing below the binaries
//! reads the environment.

use medchat_core::config::{gemini_model_from_env_value, max_records_from_env_value};
use medchat_core::{CoreConfig, PatientError, PatientResult};

/// Default listen address of the REST server.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:5000";

/// Resolves a required variable, rejecting unset and blank values.
pub fn required_env_value(name: &str, value: Option<String>) -> PatientResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PatientError::InvalidConfig(format!("{name} must be set")))
}

/// Resolves the REST listen address, defaulting to [`DEFAULT_REST_ADDR`].
pub fn rest_addr_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_REST_ADDR.into())
}

/// Reads `SUPABASE_URL`, `SUPABASE_KEY`, `GOOGLE_API_KEY`, `GEMINI_MODEL` and
/// `PROMPT_MAX_RECORDS` from the process environment.
///
/// # Errors
///
/// Returns `PatientError::InvalidConfig` if a required variable is missing or any value is
/// invalid.
pub fn load_core_config() -> PatientResult<CoreConfig> {
    let env = |name: &str| std::env::var(name).ok();

    let cfg = CoreConfig::new(
        required_env_value("SUPABASE_URL", env("SUPABASE_URL"))?,
        required_env_value("SUPABASE_KEY", env("SUPABASE_KEY"))?,
        required_env_value("GOOGLE_API_KEY", env("GOOGLE_API_KEY"))?,
        gemini_model_from_env_value(env("GEMINI_MODEL")),
        max_records_from_env_value(env("PROMPT_MAX_RECORDS"))?,
    )?;

    tracing::debug!("resolved configuration: {:?}", cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_value_rejects_missing_and_blank() {
        let err = required_env_value("SUPABASE_URL", None).unwrap_err();
        assert!(err.to_string().contains("SUPABASE_URL must be set"));
        assert!(required_env_value("SUPABASE_KEY", Some("   ".into())).is_err());
        assert_eq!(
            required_env_value("GOOGLE_API_KEY", Some(" abc ".into())).unwrap(),
            "abc"
        );
    }

    #[test]
    fn rest_addr_defaults() {
        assert_eq!(rest_addr_from_env_value(None), DEFAULT_REST_ADDR);
        assert_eq!(
            rest_addr_from_env_value(Some("127.0.0.1:8080".into())),
            "127.0.0.1:8080"
        );
    }
}
