//! Question answering over a patient's records.
//!
//! [`AssistantService`] fetches records from a [`RecordStore`], builds the prompt with
//! [`PromptBuilder`] and hands it to a [`TextGenerator`]. Generated text is returned untouched.
//!
//! A generation failure is not an error for callers: the failure is logged and a readable
//! error string is returned in place of the answer.

use crate::constants::GENERATION_ERROR_PREFIX;
use crate::generation::{GeminiClient, TextGenerator};
use crate::prompt::PromptBuilder;
use crate::records::{PatientRecords, RecordCounts};
use crate::store::{fetch_patient_records, RecordStore, SupabaseStore};
use crate::{CoreConfig, PatientResult};
use medchat_types::{NonEmptyText, PatientId};
use std::sync::Arc;

/// An answer together with the number of records it was based on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub counts: RecordCounts,
}

/// Service tying record retrieval, prompt assembly and generation together.
#[derive(Clone)]
pub struct AssistantService {
    store: Arc<dyn RecordStore>,
    generator: Arc<dyn TextGenerator>,
    prompt: PromptBuilder,
}

impl AssistantService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        generator: Arc<dyn TextGenerator>,
        prompt: PromptBuilder,
    ) -> Self {
        Self {
            store,
            generator,
            prompt,
        }
    }

    /// Builds the production service: Supabase store and Gemini generator.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built from the configuration.
    pub fn from_config(cfg: &CoreConfig) -> PatientResult<Self> {
        let store = SupabaseStore::from_config(cfg)?;
        let generator = GeminiClient::from_config(cfg)?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(generator),
            PromptBuilder::new(cfg.max_records_per_kind()),
        ))
    }

    pub fn prompt_builder(&self) -> &PromptBuilder {
        &self.prompt
    }

    /// Fetches every record kind for a patient.
    ///
    /// # Errors
    ///
    /// Returns the store error if a required kind (diagnoses or prescriptions) cannot be fetched.
    pub async fn fetch_records(&self, patient_id: &PatientId) -> PatientResult<PatientRecords> {
        fetch_patient_records(self.store.as_ref(), patient_id).await
    }

    pub async fn patient_exists(&self, patient_id: &PatientId) -> PatientResult<bool> {
        self.store.patient_exists(patient_id).await
    }

    /// The prompt that would be sent for this question and these records.
    pub fn preview_prompt(
        &self,
        patient_id: &PatientId,
        question: &NonEmptyText,
        records: &PatientRecords,
    ) -> String {
        self.prompt.build(patient_id, question, records)
    }

    /// Answers a question over records supplied by the caller.
    ///
    /// Never fails: a generation error is logged and returned as
    /// `"Error communicating with Gemini AI: <error>"`.
    pub async fn answer_with_records(
        &self,
        patient_id: &PatientId,
        question: &NonEmptyText,
        records: &PatientRecords,
    ) -> String {
        let prompt = self.prompt.build(patient_id, question, records);

        match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(%patient_id, "generation error: {:?}", e);
                format!("{GENERATION_ERROR_PREFIX}: {e}")
            }
        }
    }

    /// Fetches a patient's records and answers the question over them.
    ///
    /// # Errors
    ///
    /// Returns the store error from [`AssistantService::fetch_records`]. Generation failures are
    /// carried in the answer text.
    pub async fn ask(&self, patient_id: &PatientId, question: &NonEmptyText) -> PatientResult<Answer> {
        let records = self.fetch_records(patient_id).await?;
        let text = self.answer_with_records(patient_id, question, &records).await;
        Ok(Answer {
            text,
            counts: records.counts(),
        })
    }
}
