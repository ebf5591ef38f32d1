//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handlers never read process-wide environment variables;
//! the binaries read them once and hand the resolved values to [`CoreConfig::new`].

use crate::constants::{DEFAULT_GEMINI_MODEL, DEFAULT_MAX_RECORDS_PER_KIND};
use crate::validation::validate_store_url;
use crate::{PatientError, PatientResult};

/// Core configuration resolved at startup.
#[derive(Clone)]
pub struct CoreConfig {
    supabase_url: String,
    supabase_key: String,
    gemini_api_key: String,
    gemini_model: String,
    max_records_per_kind: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidConfig` if:
    /// - the store URL is not an absolute `http(s)` URL,
    /// - either API key is empty,
    /// - the model name is empty,
    /// - `max_records_per_kind` is zero.
    pub fn new(
        supabase_url: String,
        supabase_key: String,
        gemini_api_key: String,
        gemini_model: String,
        max_records_per_kind: usize,
    ) -> PatientResult<Self> {
        validate_store_url(&supabase_url)?;

        if supabase_key.trim().is_empty() {
            return Err(PatientError::InvalidConfig(
                "SUPABASE_KEY cannot be empty".into(),
            ));
        }
        if gemini_api_key.trim().is_empty() {
            return Err(PatientError::InvalidConfig(
                "GOOGLE_API_KEY cannot be empty".into(),
            ));
        }
        if gemini_model.trim().is_empty() {
            return Err(PatientError::InvalidConfig(
                "GEMINI_MODEL cannot be empty".into(),
            ));
        }
        if max_records_per_kind == 0 {
            return Err(PatientError::InvalidConfig(
                "PROMPT_MAX_RECORDS must be at least 1".into(),
            ));
        }

        Ok(Self {
            supabase_url: supabase_url.trim().trim_end_matches('/').to_string(),
            supabase_key: supabase_key.trim().to_string(),
            gemini_api_key: gemini_api_key.trim().to_string(),
            gemini_model: gemini_model.trim().to_string(),
            max_records_per_kind,
        })
    }

    pub fn supabase_url(&self) -> &str {
        &self.supabase_url
    }

    pub fn supabase_key(&self) -> &str {
        &self.supabase_key
    }

    pub fn gemini_api_key(&self) -> &str {
        &self.gemini_api_key
    }

    pub fn gemini_model(&self) -> &str {
        &self.gemini_model
    }

    pub fn max_records_per_kind(&self) -> usize {
        self.max_records_per_kind
    }
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &"<redacted>")
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("max_records_per_kind", &self.max_records_per_kind)
            .finish()
    }
}

/// Parse the per-kind prompt record cap from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_MAX_RECORDS_PER_KIND`].
pub fn max_records_from_env_value(value: Option<String>) -> PatientResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_MAX_RECORDS_PER_KIND),
        Some(v) => match v.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(PatientError::InvalidConfig(format!(
                "PROMPT_MAX_RECORDS must be a positive integer, got `{v}`"
            ))),
        },
    }
}

/// Resolve the Gemini model name from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_GEMINI_MODEL`].
pub fn gemini_model_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string())
}
