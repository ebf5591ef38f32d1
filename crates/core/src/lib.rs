//! # MedChat Core
//!
//! Core logic for answering free-text questions about a patient's medical records.
//!
//! This crate contains:
//! - The records model and the per-kind field-normalisation policy ([`records`])
//! - Deterministic prompt assembly ([`prompt`])
//! - The relational store boundary and its Supabase/PostgREST client ([`store`])
//! - The text-generation boundary and its Gemini client ([`generation`])
//! - [`AssistantService`], which ties the pieces together
//!
//! **No API concerns**: HTTP routing, chat channels and process wiring belong in `api-rest`,
//! `api-telegram` and the binaries.

pub mod assistant;
pub mod config;
pub mod constants;
pub mod error;
pub mod generation;
pub mod notify;
pub mod prompt;
pub mod records;
pub mod store;
pub mod validation;

pub use assistant::{Answer, AssistantService};
pub use config::CoreConfig;
pub use error::{PatientError, PatientResult};
pub use generation::{GeminiClient, GenerationSettings, TextGenerator};
pub use notify::Notifier;
pub use prompt::PromptBuilder;
pub use records::{PatientRecords, RecordCounts, RecordKind};
pub use store::{fetch_patient_records, InMemoryStore, RecordStore, SupabaseStore};

pub use medchat_types::{NonEmptyText, PatientId, TextError};
