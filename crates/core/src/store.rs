//! Relational record store boundary.
//!
//! The store is queried with simple equality/order filters only: every record table is filtered
//! by `patient_id` and ordered newest-first, and the `patients` table is probed by `id`.
//!
//! [`SupabaseStore`] speaks the PostgREST dialect exposed by Supabase. [`InMemoryStore`] holds
//! rows in memory for offline prompt previews and tests.

use crate::constants::{PATIENTS_TABLE, PATIENT_ID_COLUMN, STORE_TIMEOUT_SECS};
use crate::error::body_preview;
use crate::records::{PatientRecords, RecordKind};
use crate::{CoreConfig, PatientError, PatientResult};
use async_trait::async_trait;
use medchat_types::PatientId;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Read access to patient records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows of `kind` belonging to `patient_id`, newest first by the kind's order column.
    async fn fetch_rows(&self, kind: RecordKind, patient_id: &PatientId)
        -> PatientResult<Vec<Value>>;

    /// Whether a patient row with this identifier exists.
    async fn patient_exists(&self, patient_id: &PatientId) -> PatientResult<bool>;
}

/// Fetches every record kind for a patient.
///
/// Diagnoses and prescriptions are required; a failure on either is returned. The remaining
/// kinds are optional: a failure is logged and the collection is left empty.
pub async fn fetch_patient_records(
    store: &dyn RecordStore,
    patient_id: &PatientId,
) -> PatientResult<PatientRecords> {
    let mut records = PatientRecords::default();

    for kind in RecordKind::ALL {
        match store.fetch_rows(kind, patient_id).await {
            Ok(rows) => records.set(kind, rows),
            Err(e) if !kind.is_required() => {
                tracing::warn!(
                    table = kind.table(),
                    "{} table might not exist, continuing without it: {}",
                    kind,
                    e
                );
            }
            Err(e) => return Err(e),
        }
    }

    tracing::debug!(%patient_id, counts = %records.counts(), "fetched patient records");
    Ok(records)
}

// ============================================================================
// Supabase / PostgREST
// ============================================================================

/// Record store backed by a Supabase project's PostgREST endpoint.
#[derive(Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    rest_url: String,
}

impl SupabaseStore {
    /// Creates a store for the project at `base_url` (for example `https://abc.supabase.co`).
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a valid header value or the HTTP client cannot be
    /// built.
    pub fn new(base_url: &str, api_key: &str) -> PatientResult<Self> {
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| PatientError::InvalidConfig("SUPABASE_KEY is not a valid header".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| PatientError::InvalidConfig("SUPABASE_KEY is not a valid header".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(STORE_TIMEOUT_SECS))
            .build()
            .map_err(PatientError::HttpClient)?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
        })
    }

    pub fn from_config(cfg: &CoreConfig) -> PatientResult<Self> {
        Self::new(cfg.supabase_url(), cfg.supabase_key())
    }

    async fn select(&self, table: &'static str, query: &[(&str, String)]) -> PatientResult<Vec<Value>> {
        let url = format!("{}/{}", self.rest_url, table);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| PatientError::StoreRequest { table, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PatientError::StoreStatus {
                table,
                status: status.as_u16(),
                body: body_preview(&body),
            });
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|source| PatientError::StoreDecode { table, source })
    }
}

#[async_trait]
impl RecordStore for SupabaseStore {
    async fn fetch_rows(
        &self,
        kind: RecordKind,
        patient_id: &PatientId,
    ) -> PatientResult<Vec<Value>> {
        self.select(
            kind.table(),
            &[
                ("select", kind.select().to_string()),
                (PATIENT_ID_COLUMN, format!("eq.{patient_id}")),
                ("order", format!("{}.desc", kind.order_column())),
            ],
        )
        .await
    }

    async fn patient_exists(&self, patient_id: &PatientId) -> PatientResult<bool> {
        let rows = self
            .select(
                PATIENTS_TABLE,
                &[
                    ("select", "id".to_string()),
                    ("id", format!("eq.{patient_id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Record store holding rows in memory.
///
/// Rows are returned exactly as inserted; callers are expected to insert them newest first.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    rows: HashMap<(RecordKind, String), Vec<Value>>,
    patients: HashSet<String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a patient and all of their records.
    pub fn with_patient(mut self, patient_id: &PatientId, records: PatientRecords) -> Self {
        self.patients.insert(patient_id.to_string());
        for kind in RecordKind::ALL {
            self.rows
                .insert((kind, patient_id.to_string()), records.rows(kind).to_vec());
        }
        self
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn fetch_rows(
        &self,
        kind: RecordKind,
        patient_id: &PatientId,
    ) -> PatientResult<Vec<Value>> {
        Ok(self
            .rows
            .get(&(kind, patient_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn patient_exists(&self, patient_id: &PatientId) -> PatientResult<bool> {
        Ok(self.patients.contains(patient_id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn patient() -> PatientId {
        PatientId::parse("p-1").unwrap()
    }

    /// Fails for the listed kinds, returns one row for the rest.
    struct FlakyStore {
        failing: Vec<RecordKind>,
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        async fn fetch_rows(
            &self,
            kind: RecordKind,
            _patient_id: &PatientId,
        ) -> PatientResult<Vec<Value>> {
            if self.failing.contains(&kind) {
                return Err(PatientError::StoreStatus {
                    table: kind.table(),
                    status: 404,
                    body: "relation does not exist".into(),
                });
            }
            Ok(vec![json!({ "table": kind.table() })])
        }

        async fn patient_exists(&self, _patient_id: &PatientId) -> PatientResult<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn optional_kinds_degrade_to_empty() {
        let store = FlakyStore {
            failing: vec![
                RecordKind::LabReport,
                RecordKind::Surgery,
                RecordKind::Vaccination,
            ],
        };
        let records = fetch_patient_records(&store, &patient())
            .await
            .expect("optional failures are tolerated");

        assert_eq!(records.diagnoses.len(), 1);
        assert_eq!(records.prescriptions.len(), 1);
        assert!(records.lab_reports.is_empty());
        assert!(records.surgeries.is_empty());
        assert!(records.vaccinations.is_empty());
    }

    #[tokio::test]
    async fn required_kind_failure_propagates() {
        let store = FlakyStore {
            failing: vec![RecordKind::Prescription],
        };
        let err = fetch_patient_records(&store, &patient())
            .await
            .expect_err("prescriptions are required");
        match err {
            PatientError::StoreStatus { table, status, .. } => {
                assert_eq!(table, "prescriptions");
                assert_eq!(status, 404);
            }
            other => panic!("expected StoreStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn supabase_fetch_rows_sends_filters_and_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/diagnoses")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("select".into(), "*".into()),
                Matcher::UrlEncoded("patient_id".into(), "eq.p-1".into()),
                Matcher::UrlEncoded("order".into(), "date.desc".into()),
            ]))
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer anon-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"date":"2024-05-01","condition":"Flu"}]"#)
            .create_async()
            .await;

        let store = SupabaseStore::new(&server.url(), "anon-key").unwrap();
        let rows = store
            .fetch_rows(RecordKind::Diagnosis, &patient())
            .await
            .expect("rows");

        mock.assert_async().await;
        assert_eq!(rows, vec![json!({ "date": "2024-05-01", "condition": "Flu" })]);
    }

    #[tokio::test]
    async fn supabase_prescriptions_embed_items() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/prescriptions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("select".into(), "*,prescription_items(*)".into()),
                Matcher::UrlEncoded("order".into(), "created_at.desc".into()),
            ]))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let store = SupabaseStore::new(&format!("{}/", server.url()), "anon-key").unwrap();
        let rows = store
            .fetch_rows(RecordKind::Prescription, &patient())
            .await
            .expect("rows");

        mock.assert_async().await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn supabase_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/surgeries")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message":"relation \"public.surgeries\" does not exist"}"#)
            .create_async()
            .await;

        let store = SupabaseStore::new(&server.url(), "anon-key").unwrap();
        let err = store
            .fetch_rows(RecordKind::Surgery, &patient())
            .await
            .expect_err("404 is an error");

        match err {
            PatientError::StoreStatus {
                table,
                status,
                body,
            } => {
                assert_eq!(table, "surgeries");
                assert_eq!(status, 404);
                assert!(body.contains("does not exist"));
            }
            other => panic!("expected StoreStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn supabase_patient_exists_probes_patients_table() {
        let mut server = mockito::Server::new_async().await;
        let _known = server
            .mock("GET", "/rest/v1/patients")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "eq.p-1".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"id":"p-1"}]"#)
            .create_async()
            .await;
        let _unknown = server
            .mock("GET", "/rest/v1/patients")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.p-2".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let store = SupabaseStore::new(&server.url(), "anon-key").unwrap();
        assert!(store.patient_exists(&patient()).await.unwrap());
        assert!(!store
            .patient_exists(&PatientId::parse("p-2").unwrap())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn in_memory_store_returns_registered_rows() {
        let records: PatientRecords = serde_json::from_value(json!({
            "surgeries": [{ "procedure": "Appendectomy" }],
        }))
        .unwrap();
        let store = InMemoryStore::new().with_patient(&patient(), records);

        assert!(store.patient_exists(&patient()).await.unwrap());
        let fetched = fetch_patient_records(&store, &patient()).await.unwrap();
        assert_eq!(fetched.surgeries.len(), 1);
        assert!(fetched.diagnoses.is_empty());

        let stranger = PatientId::parse("p-9").unwrap();
        assert!(!store.patient_exists(&stranger).await.unwrap());
        assert!(fetch_patient_records(&store, &stranger)
            .await
            .unwrap()
            .is_empty());
    }
}
