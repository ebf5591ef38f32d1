//! Constants used throughout the MedChat core crate.
//!
//! Store table names, generation defaults and prompt limits live here so the HTTP clients, the
//! prompt builder and the configuration layer agree on them.

/// Table holding one row per patient; used to authenticate chat users by record identifier.
pub const PATIENTS_TABLE: &str = "patients";

/// Column of every record table that references the owning patient.
pub const PATIENT_ID_COLUMN: &str = "patient_id";

/// Key under which a prescription row carries its embedded line items.
pub const PRESCRIPTION_ITEMS_KEY: &str = "prescription_items";

/// Default base URL of the Gemini generative language API.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default Gemini model used for answers.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Request timeout for the generation service, in seconds.
pub const GENERATION_TIMEOUT_SECS: u64 = 60;

/// Request timeout for the record store, in seconds.
pub const STORE_TIMEOUT_SECS: u64 = 15;

/// Default cap on rendered records per kind in a single prompt.
pub const DEFAULT_MAX_RECORDS_PER_KIND: usize = 50;

/// Longest rendered value of a single record field, in characters.
pub const MAX_FIELD_CHARS: usize = 500;

/// Longest accepted question, in characters.
pub const MAX_QUESTION_CHARS: usize = 4_000;

/// Characters of a remote error body kept in error values.
pub const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// Prefix of the answer text returned when the generation call fails.
pub const GENERATION_ERROR_PREFIX: &str = "Error communicating with Gemini AI";

/// Rendered in place of a missing field value.
pub const MISSING_VALUE: &str = "N/A";
