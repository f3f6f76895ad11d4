use crate::dto::HealthRes;

/// Simple health service shared by the API binaries.
///
/// This service provides a standardised way to check the health status of the clinic system.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Clinic is alive".into(),
        }
    }
}
