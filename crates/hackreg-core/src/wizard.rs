use serde::{Deserialize, Serialize};

use crate::error::RegistrationError;

/// Stages of the registration wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    Editing,
    AwaitingPayment,
    Confirmed,
}

impl WizardStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Editing => "editing",
            Self::AwaitingPayment => "awaiting_payment",
            Self::Confirmed => "confirmed",
        }
    }
}

/// Enforces editing->awaiting_payment->confirmed ordering.
///
/// Payment cancellation is the single backward edge; every other
/// out-of-order call is rejected rather than silently absorbed.
#[derive(Debug, Clone)]
pub struct WizardFlow {
    stage: WizardStage,
}

impl WizardFlow {
    pub fn new() -> Self {
        Self {
            stage: WizardStage::Editing,
        }
    }

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    pub fn require(&self, expected: WizardStage) -> Result<(), RegistrationError> {
        if self.stage != expected {
            return Err(RegistrationError::stage_violation(
                expected.name(),
                self.stage.name(),
            ));
        }
        Ok(())
    }

    pub fn begin_payment(&mut self) -> Result<(), RegistrationError> {
        self.advance(WizardStage::Editing, WizardStage::AwaitingPayment)
    }

    pub fn cancel_payment(&mut self) -> Result<(), RegistrationError> {
        self.advance(WizardStage::AwaitingPayment, WizardStage::Editing)
    }

    pub fn confirm(&mut self) -> Result<(), RegistrationError> {
        self.advance(WizardStage::AwaitingPayment, WizardStage::Confirmed)
    }

    fn advance(
        &mut self,
        expected_current: WizardStage,
        next: WizardStage,
    ) -> Result<(), RegistrationError> {
        if self.stage != expected_current {
            return Err(RegistrationError::stage_violation(
                expected_current.name(),
                self.stage.name(),
            ));
        }
        self.stage = next;
        Ok(())
    }
}

impl Default for WizardFlow {
    fn default() -> Self {
        Self::new()
    }
}
