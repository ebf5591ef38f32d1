use crate::wire::HealthRes;

/// Simple health service shared by every MedChat entry point.
///
/// Health is static: the check never contacts the record store or the generation service.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            status: "healthy".into(),
            message: "Medical AI Chatbot Server is running".into(),
        }
    }
}
