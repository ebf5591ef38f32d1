//! Patient record collections and the field-normalisation policy.
//!
//! Record rows arrive as loosely-typed JSON objects whose column names drift between data-source
//! versions (a lab test name may be `test_type`, `testType`, `test_name` or `report_type`). Each
//! [`RecordKind`] owns a small table of [`FieldSpec`]s, one per logical field, listing the
//! accepted aliases in priority order. [`normalize`] maps a raw row through that table into a
//! canonical [`NormalizedRecord`] that renders as a single prompt line.
//!
//! Missing collections are handled in one place: every collection of [`PatientRecords`]
//! deserialises from an absent key or `null` to an empty list, and an empty list renders as the
//! kind's placeholder text.

use crate::constants::{MAX_FIELD_CHARS, MISSING_VALUE, PRESCRIPTION_ITEMS_KEY};
use crate::validation::truncate_chars;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

// ============================================================================
// Record kinds and their field tables
// ============================================================================

/// The five record collections a prompt is assembled from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Diagnosis,
    Prescription,
    LabReport,
    Surgery,
    Vaccination,
}

/// One logical field of a record kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// Label used in the rendered prompt line.
    pub label: &'static str,
    /// Accepted source keys, highest priority first.
    pub aliases: &'static [&'static str],
    /// Whether a missing value renders as `N/A` (true) or the field is omitted (false).
    pub always_shown: bool,
}

const fn shown(label: &'static str, aliases: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        label,
        aliases,
        always_shown: true,
    }
}

const fn optional(label: &'static str, aliases: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        label,
        aliases,
        always_shown: false,
    }
}

const DIAGNOSIS_FIELDS: &[FieldSpec] = &[
    shown("Date", &["date", "diagnosis_date", "diagnosisDate"]),
    shown("Condition", &["condition", "diagnosis", "name"]),
    shown("Severity", &["severity"]),
    shown(
        "Notes",
        &["clinical_notes", "clinicalNotes", "notes", "details"],
    ),
    optional("Status", &["status"]),
    optional("ICD-10", &["icd10_code", "icd10Code"]),
];

const PRESCRIPTION_FIELDS: &[FieldSpec] = &[
    shown(
        "Medication",
        &[
            "medication",
            "medication_name",
            "medicationName",
            "drug",
            "name",
        ],
    ),
    shown("Dosage", &["dosage", "dose"]),
    shown("Frequency", &["frequency"]),
    shown("Duration", &["duration", "duration_days", "durationDays"]),
    shown("Instructions", &["instructions", "notes"]),
    optional(
        "Issued",
        &["issue_date", "issueDate", "start_date", "startDate"],
    ),
    optional("Valid Until", &["valid_until", "validUntil"]),
];

const LAB_REPORT_FIELDS: &[FieldSpec] = &[
    shown(
        "Test",
        &[
            "test_type",
            "testType",
            "test_name",
            "testName",
            "report_type",
            "reportType",
        ],
    ),
    shown("Date", &["date", "test_date", "testDate"]),
    shown("Result", &["result", "results", "value"]),
    shown("Status", &["status"]),
    optional("Remarks", &["remarks", "notes"]),
    optional("Tags", &["tags"]),
];

const SURGERY_FIELDS: &[FieldSpec] = &[
    shown(
        "Procedure",
        &[
            "procedure",
            "procedure_name",
            "procedureName",
            "surgery_name",
            "surgeryName",
        ],
    ),
    shown("Date", &["date", "surgery_date", "surgeryDate"]),
    shown("Outcome", &["outcome"]),
    shown("Complications", &["complications"]),
    optional("Remarks", &["remarks", "notes"]),
    optional("ICD-PCS", &["icd_pcs_code", "icdPcsCode"]),
];

const VACCINATION_FIELDS: &[FieldSpec] = &[
    shown("Vaccine", &["vaccine_name", "vaccineName", "vaccine"]),
    shown("Date", &["administered_date", "administeredDate", "date"]),
    shown("Dose", &["dose_number", "doseNumber"]),
    optional("Total Doses", &["total_doses", "totalDoses"]),
    optional("Next Dose Due", &["next_dose_due", "nextDoseDue"]),
    optional("Batch", &["batch_number", "batchNumber"]),
    optional("Reaction Notes", &["reaction_notes", "reactionNotes"]),
];

impl RecordKind {
    /// All kinds, in the order they appear in a prompt.
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Diagnosis,
        RecordKind::Prescription,
        RecordKind::LabReport,
        RecordKind::Surgery,
        RecordKind::Vaccination,
    ];

    /// Store table holding this kind.
    pub fn table(self) -> &'static str {
        match self {
            RecordKind::Diagnosis => "diagnoses",
            RecordKind::Prescription => "prescriptions",
            RecordKind::LabReport => "lab_reports",
            RecordKind::Surgery => "surgeries",
            RecordKind::Vaccination => "vaccinations",
        }
    }

    /// Column rows are ordered by, newest first.
    pub fn order_column(self) -> &'static str {
        match self {
            RecordKind::Prescription => "created_at",
            RecordKind::Vaccination => "administered_date",
            RecordKind::Diagnosis | RecordKind::LabReport | RecordKind::Surgery => "date",
        }
    }

    /// Store column selection. Prescriptions embed their line items.
    pub fn select(self) -> &'static str {
        match self {
            RecordKind::Prescription => "*,prescription_items(*)",
            _ => "*",
        }
    }

    /// Whether a failure to fetch this kind fails the whole fetch.
    ///
    /// Lab reports, surgeries and vaccinations live in tables that older deployments lack.
    pub fn is_required(self) -> bool {
        matches!(self, RecordKind::Diagnosis | RecordKind::Prescription)
    }

    pub fn heading(self) -> &'static str {
        match self {
            RecordKind::Diagnosis => "📋 DIAGNOSES",
            RecordKind::Prescription => "💊 PRESCRIPTIONS",
            RecordKind::LabReport => "🔬 LAB REPORTS",
            RecordKind::Surgery => "🏥 SURGERIES",
            RecordKind::Vaccination => "💉 VACCINATIONS",
        }
    }

    /// Text rendered in place of an empty collection.
    pub fn placeholder(self) -> &'static str {
        match self {
            RecordKind::Diagnosis => "No diagnosis records found.",
            RecordKind::Prescription => "No prescription records found.",
            RecordKind::LabReport => "No lab report records found.",
            RecordKind::Surgery => "No surgery records found.",
            RecordKind::Vaccination => "No vaccination records found.",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            RecordKind::Diagnosis => "diagnoses",
            RecordKind::Prescription => "prescriptions",
            RecordKind::LabReport => "lab reports",
            RecordKind::Surgery => "surgeries",
            RecordKind::Vaccination => "vaccinations",
        }
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            RecordKind::Diagnosis => DIAGNOSIS_FIELDS,
            RecordKind::Prescription => PRESCRIPTION_FIELDS,
            RecordKind::LabReport => LAB_REPORT_FIELDS,
            RecordKind::Surgery => SURGERY_FIELDS,
            RecordKind::Vaccination => VACCINATION_FIELDS,
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordKind::Diagnosis => "diagnosis",
            RecordKind::Prescription => "prescription",
            RecordKind::LabReport => "lab report",
            RecordKind::Surgery => "surgery",
            RecordKind::Vaccination => "vaccination",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Normalisation
// ============================================================================

/// A record mapped into its kind's canonical field order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub kind: RecordKind,
    pub fields: Vec<NormalizedField>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedField {
    pub label: &'static str,
    pub value: Option<String>,
}

impl NormalizedRecord {
    /// Value of the field with the given label, if present.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .and_then(|f| f.value.as_deref())
    }
}

impl std::fmt::Display for NormalizedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("- ")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{}: {}",
                field.label,
                field.value.as_deref().unwrap_or(MISSING_VALUE)
            )?;
        }
        Ok(())
    }
}

/// Maps a raw row through the kind's alias table.
///
/// Never fails: rows that are not JSON objects normalise to a record with every field absent.
pub fn normalize(kind: RecordKind, row: &Value) -> NormalizedRecord {
    let object = row.as_object();
    let fields = kind
        .fields()
        .iter()
        .filter_map(|spec| {
            let value = object.and_then(|o| lookup(o, spec.aliases));
            if value.is_none() && !spec.always_shown {
                return None;
            }
            Some(NormalizedField {
                label: spec.label,
                value,
            })
        })
        .collect();

    NormalizedRecord { kind, fields }
}

fn lookup(object: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|alias| object.get(*alias).and_then(render_value))
        .map(|text| truncate_chars(&text, MAX_FIELD_CHARS))
}

/// Renders a JSON value as prompt text. `None` means "absent".
fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.trim().to_owned(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(map) => (!map.is_empty()).then(|| value.to_string()),
    }
}

/// Expands rows that bundle several records into one row per record.
///
/// A prescription carrying a non-empty `prescription_items` array becomes one row per item; the
/// item's own non-null keys win and the parent prescription fills the gaps (instructions, issue
/// date). Every other row passes through borrowed.
pub fn expand_rows(kind: RecordKind, rows: &[Value]) -> Vec<Cow<'_, Value>> {
    if kind != RecordKind::Prescription {
        return rows.iter().map(Cow::Borrowed).collect();
    }
    rows.iter().flat_map(expand_prescription).collect()
}

fn expand_prescription(row: &Value) -> Vec<Cow<'_, Value>> {
    let Some(parent) = row.as_object() else {
        return vec![Cow::Borrowed(row)];
    };
    let items = match parent.get(PRESCRIPTION_ITEMS_KEY) {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return vec![Cow::Borrowed(row)],
    };

    items
        .iter()
        .map(|item| {
            let mut merged: Map<String, Value> = parent
                .iter()
                .filter(|(key, _)| key.as_str() != PRESCRIPTION_ITEMS_KEY)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            if let Some(item) = item.as_object() {
                for (key, value) in item {
                    if !value.is_null() {
                        merged.insert(key.clone(), value.clone());
                    }
                }
            }
            Cow::Owned(Value::Object(merged))
        })
        .collect()
}

// ============================================================================
// Record collections
// ============================================================================

/// Raw rows of every record kind for one patient.
///
/// Each collection accepts a missing key or `null` as "no records".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecords {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub diagnoses: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub prescriptions: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub lab_reports: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub surgeries: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub vaccinations: Vec<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl PatientRecords {
    pub fn rows(&self, kind: RecordKind) -> &[Value] {
        match kind {
            RecordKind::Diagnosis => &self.diagnoses,
            RecordKind::Prescription => &self.prescriptions,
            RecordKind::LabReport => &self.lab_reports,
            RecordKind::Surgery => &self.surgeries,
            RecordKind::Vaccination => &self.vaccinations,
        }
    }

    pub fn set(&mut self, kind: RecordKind, rows: Vec<Value>) {
        let slot = match kind {
            RecordKind::Diagnosis => &mut self.diagnoses,
            RecordKind::Prescription => &mut self.prescriptions,
            RecordKind::LabReport => &mut self.lab_reports,
            RecordKind::Surgery => &mut self.surgeries,
            RecordKind::Vaccination => &mut self.vaccinations,
        };
        *slot = rows;
    }

    pub fn is_empty(&self) -> bool {
        RecordKind::ALL.iter().all(|kind| self.rows(*kind).is_empty())
    }

    /// Number of stored rows per kind (before prescription expansion).
    pub fn counts(&self) -> RecordCounts {
        RecordCounts {
            diagnoses: self.diagnoses.len(),
            prescriptions: self.prescriptions.len(),
            lab_reports: self.lab_reports.len(),
            surgeries: self.surgeries.len(),
            vaccinations: self.vaccinations.len(),
        }
    }
}

/// Row counts per record kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCounts {
    pub diagnoses: usize,
    pub prescriptions: usize,
    pub lab_reports: usize,
    pub surgeries: usize,
    pub vaccinations: usize,
}

impl std::fmt::Display for RecordCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} diagnoses, {} prescriptions, {} lab reports, {} surgeries and {} vaccinations",
            self.diagnoses, self.prescriptions, self.lab_reports, self.surgeries, self.vaccinations
        )
    }
}
