//! JSON request and response bodies of the HTTP API.
//!
//! Request identifiers and messages are optional at the wire level so that a missing field
//! produces the API's own `400` body instead of a deserialisation rejection.

use medchat_core::{Answer, PatientRecords, RecordCounts};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub status: String,
    pub message: String,
}

/// Error body returned with every non-2xx status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub success: bool,
    pub error: String,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct FetchReq {
    #[serde(default)]
    pub patient_id: Option<String>,
}

/// A patient's raw record rows, newest first per kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FetchRes {
    pub success: bool,
    #[schema(value_type = Vec<Object>)]
    pub diagnoses: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub prescriptions: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub lab_reports: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub surgeries: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub vaccinations: Vec<Value>,
}

impl From<PatientRecords> for FetchRes {
    fn from(records: PatientRecords) -> Self {
        Self {
            success: true,
            diagnoses: records.diagnoses,
            prescriptions: records.prescriptions,
            lab_reports: records.lab_reports,
            surgeries: records.surgeries,
            vaccinations: records.vaccinations,
        }
    }
}

/// A question over records supplied by the caller; absent collections count as empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ChatWithDataReq {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub diagnoses: Option<Vec<Value>>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub prescriptions: Option<Vec<Value>>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub lab_reports: Option<Vec<Value>>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub surgeries: Option<Vec<Value>>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub vaccinations: Option<Vec<Value>>,
}

impl ChatWithDataReq {
    /// Moves the supplied collections out of the request.
    pub fn take_records(&mut self) -> PatientRecords {
        PatientRecords {
            diagnoses: self.diagnoses.take().unwrap_or_default(),
            prescriptions: self.prescriptions.take().unwrap_or_default(),
            lab_reports: self.lab_reports.take().unwrap_or_default(),
            surgeries: self.surgeries.take().unwrap_or_default(),
            vaccinations: self.vaccinations.take().unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatWithDataRes {
    pub success: bool,
    pub response: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ChatReq {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecordCountsRes {
    pub diagnoses: usize,
    pub prescriptions: usize,
    pub lab_reports: usize,
    pub surgeries: usize,
    pub vaccinations: usize,
}

impl From<RecordCounts> for RecordCountsRes {
    fn from(c: RecordCounts) -> Self {
        Self {
            diagnoses: c.diagnoses,
            prescriptions: c.prescriptions,
            lab_reports: c.lab_reports,
            surgeries: c.surgeries,
            vaccinations: c.vaccinations,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatRes {
    pub success: bool,
    pub response: String,
    pub record_counts: RecordCountsRes,
}

impl From<Answer> for ChatRes {
    fn from(answer: Answer) -> Self {
        Self {
            success: true,
            response: answer.text,
            record_counts: answer.counts.into(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct NotificationReq {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NotificationRes {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_with_data_defaults_missing_collections() {
        let mut req: ChatWithDataReq = serde_json::from_value(json!({
            "patient_id": "p-1",
            "message": "Summary?",
            "diagnoses": [{ "condition": "Asthma" }],
            "lab_reports": null
        }))
        .unwrap();

        let records = req.take_records();
        assert_eq!(records.diagnoses.len(), 1);
        assert!(records.prescriptions.is_empty());
        assert!(records.lab_reports.is_empty());
        assert!(records.vaccinations.is_empty());
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let req: ChatReq = serde_json::from_value(json!({})).unwrap();
        assert!(req.patient_id.is_none());
        assert!(req.message.is_none());
    }

    #[test]
    fn fetch_res_serializes_every_collection() {
        let body = serde_json::to_value(FetchRes::from(PatientRecords::default())).unwrap();
        assert_eq!(body["success"], true);
        for key in ["diagnoses", "prescriptions", "lab_reports", "surgeries", "vaccinations"] {
            assert_eq!(body[key], json!([]), "{key}");
        }
    }

    #[test]
    fn error_res_is_unsuccessful() {
        let body = serde_json::to_value(ErrorRes::new("patient_id is required")).unwrap();
        assert_eq!(body, json!({ "success": false, "error": "patient_id is required" }));
    }
}
