//! Deterministic prompt assembly.
//!
//! The prompt layout is fixed: role preamble and instructions, patient identifier, the user's
//! question, one section per [`RecordKind`] in [`RecordKind::ALL`] order, and a closing request.
//! Sections are bounded to `max_records_per_kind` lines.

use crate::constants::DEFAULT_MAX_RECORDS_PER_KIND;
use crate::records::{expand_rows, normalize, PatientRecords, RecordKind};
use medchat_types::{NonEmptyText, PatientId};
use serde_json::Value;

const PREAMBLE: &str = "You are a helpful Medical Data Assistant. Your role is to help doctors \
and healthcare professionals understand patient medical records.";

const INSTRUCTIONS: [&str; 7] = [
    "Answer questions based *only* on the provided patient data below",
    "Be concise, clear, and professional",
    "If the data doesn't contain the answer, politely say so",
    "Provide medical insights when relevant",
    "Use proper medical terminology",
    "Summarize information when asked",
    "Highlight important findings or patterns",
];

const CLOSING: &str = "Please provide a helpful, accurate response based on this data:";

/// Builds the generation prompt from a patient's records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PromptBuilder {
    max_records_per_kind: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORDS_PER_KIND)
    }
}

impl PromptBuilder {
    /// Creates a builder; a cap of zero is raised to one.
    pub fn new(max_records_per_kind: usize) -> Self {
        Self {
            max_records_per_kind: max_records_per_kind.max(1),
        }
    }

    pub fn max_records_per_kind(&self) -> usize {
        self.max_records_per_kind
    }

    /// Assembles the full prompt.
    pub fn build(
        &self,
        patient_id: &PatientId,
        question: &NonEmptyText,
        records: &PatientRecords,
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str(PREAMBLE);
        prompt.push_str("\n\n**IMPORTANT INSTRUCTIONS:**\n");
        for (i, instruction) in INSTRUCTIONS.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, instruction));
        }

        prompt.push_str(&format!("\n**Patient ID:** {patient_id}\n"));
        prompt.push_str(&format!("\n**User Question:** {question}\n"));

        for kind in RecordKind::ALL {
            prompt.push_str(&format!("\n**{}:**\n", kind.heading()));
            prompt.push_str(&self.render_section(kind, records.rows(kind)));
            prompt.push('\n');
        }

        prompt.push('\n');
        prompt.push_str(CLOSING);
        prompt
    }

    /// Renders one section body: bullet lines, or the kind's placeholder when empty.
    pub fn render_section(&self, kind: RecordKind, rows: &[Value]) -> String {
        let expanded = expand_rows(kind, rows);
        if expanded.is_empty() {
            return kind.placeholder().to_string();
        }

        let mut lines: Vec<String> = expanded
            .iter()
            .take(self.max_records_per_kind)
            .map(|row| normalize(kind, row).to_string())
            .collect();

        let hidden = expanded.len().saturating_sub(self.max_records_per_kind);
        if hidden > 0 {
            lines.push(format!("- … and {hidden} more {} not shown", kind.plural()));
        }

        lines.join("\n")
    }
}
