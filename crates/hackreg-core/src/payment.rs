use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RegistrationError;

/// Charge instruction handed to the external payment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub charge_id: String,
    pub registration_id: String,
    pub team_name: String,
    pub amount: u64,
    pub currency: String,
}

impl ChargeRequest {
    pub fn new(
        registration_id: impl Into<String>,
        team_name: impl Into<String>,
        amount: u64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            charge_id: Uuid::new_v4().to_string(),
            registration_id: registration_id.into(),
            team_name: team_name.into(),
            amount,
            currency: currency.into(),
        }
    }
}

/// Receipt returned by a settled charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeReceipt {
    pub charge_id: String,
    pub provider: String,
    pub amount: u64,
    pub currency: String,
    pub charged_at: DateTime<Utc>,
}

/// Pluggable payment collaborator.
///
/// The wizard treats the provider as opaque: one call per accepted charge,
/// asynchronous, allowed to fail. Declines map to
/// [`RegistrationError::PaymentDeclined`].
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, RegistrationError>;
}
