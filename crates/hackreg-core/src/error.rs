use thiserror::Error;

use crate::validation::ValidationReport;

/// Registration wizard errors.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Registration form invalid: {0}")]
    Validation(ValidationReport),

    #[error("No track selected before entering registration")]
    TrackMissing,

    #[error("Payment declined by '{provider}': {reason}")]
    PaymentDeclined { provider: String, reason: String },

    #[error("A charge is already in flight for this payment episode")]
    ChargeInFlight,

    #[error("Payment provider did not respond within {timeout:?}")]
    PaymentTimeout { timeout: std::time::Duration },

    #[error("Registration storage failed: {0}")]
    Persistence(String),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Stage order violation: expected '{expected}', got '{actual}'")]
    StageViolation {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Member index {index} out of bounds for roster of {len}")]
    MemberIndexOutOfBounds { index: usize, len: usize },

    #[error("Team size {0} outside the offered 3..=5 choices")]
    InvalidTeamSize(u8),

    #[error("Wizard state unavailable: {0}")]
    State(String),
}

impl RegistrationError {
    pub fn stage_violation(expected: &'static str, actual: &'static str) -> Self {
        Self::StageViolation { expected, actual }
    }
}
