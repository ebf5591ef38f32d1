//! Outbound notification boundary.

use crate::PatientResult;
use async_trait::async_trait;

/// Delivers a short operator-facing notice (for example "New Diagnosis Added").
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> PatientResult<()>;
}
