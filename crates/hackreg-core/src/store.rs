use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RegistrationError;
use crate::types::TeamRegistration;

/// Durable registration row handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub registration_id: String,
    pub track_id: String,
    pub team: TeamRegistration,
    /// Authenticated user the registration is attributed to, when a session
    /// exists. Opaque to the wizard; never validated here.
    pub registered_by: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl RegistrationRecord {
    pub fn new(
        track_id: impl Into<String>,
        team: TeamRegistration,
        registered_by: Option<String>,
    ) -> Self {
        Self {
            registration_id: Uuid::new_v4().to_string(),
            track_id: track_id.into(),
            team,
            registered_by,
            submitted_at: Utc::now(),
        }
    }
}

/// External registration storage collaborator.
///
/// Retry idempotency is the collaborator's contract; the wizard only
/// guarantees it never swallows a storage failure.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn save(&self, record: &RegistrationRecord) -> Result<(), RegistrationError>;

    /// Total stored registrations, surfaced on the landing page counter.
    async fn count(&self) -> Result<usize, RegistrationError>;
}
