use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::timeout;

use crate::effects::ConfirmationHooks;
use crate::error::RegistrationError;
use crate::payment::{ChargeReceipt, ChargeRequest, PaymentGateway};
use crate::roster::RosterModel;
use crate::session::SessionContext;
use crate::store::{RegistrationRecord, RegistrationStore};
use crate::types::{MemberField, PaymentRequest, TeamRegistration, TeamSize, Track};
use crate::validation::validate;
use crate::wizard::{WizardFlow, WizardStage};

/// Wizard runtime configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Flat registration fee quoted to the payment stage.
    pub fee_amount: u64,
    pub fee_currency: String,
    /// Charge calls that outlive this window fail with `PaymentTimeout`.
    pub charge_timeout: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            fee_amount: 499,
            fee_currency: "INR".to_string(),
            charge_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of a resolved charge call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// Payment settled; the wizard advanced to the confirmation stage.
    Confirmed(ChargeReceipt),
    /// The payment episode was cancelled before the provider responded.
    /// The result was discarded and no transition happened.
    Superseded,
}

#[derive(Debug, Clone)]
struct PendingPayment {
    registration_id: String,
    request: PaymentRequest,
}

#[derive(Debug)]
struct WizardState {
    flow: WizardFlow,
    roster: RosterModel,
    pending: Option<PendingPayment>,
    /// Bumped on cancellation so in-flight charges resolve as stale.
    episode: u64,
    charge_in_flight: bool,
}

/// Controller for one registration wizard lifetime.
///
/// Owns the stage machine and the roster; collaborators (storage, payment,
/// confirmation effects) are injected at mount and reached only through
/// their trait boundaries. Dropping the value discards all wizard state,
/// which is what navigating away means.
pub struct RegistrationWizard {
    track: Track,
    session: Arc<SessionContext>,
    store: Arc<dyn RegistrationStore>,
    gateway: Arc<dyn PaymentGateway>,
    hooks: Arc<dyn ConfirmationHooks>,
    config: WizardConfig,
    state: Mutex<WizardState>,
}

impl RegistrationWizard {
    /// Mount the wizard for a selected track.
    ///
    /// Fails closed when no track was selected upstream; the caller is
    /// expected to redirect back to track selection instead of rendering
    /// the form.
    pub fn mount(
        track: Option<Track>,
        session: Arc<SessionContext>,
        store: Arc<dyn RegistrationStore>,
        gateway: Arc<dyn PaymentGateway>,
        hooks: Arc<dyn ConfirmationHooks>,
        config: WizardConfig,
    ) -> Result<Self, RegistrationError> {
        let track = track.ok_or(RegistrationError::TrackMissing)?;
        Ok(Self {
            track,
            session,
            store,
            gateway,
            hooks,
            config,
            state: Mutex::new(WizardState {
                flow: WizardFlow::new(),
                roster: RosterModel::new(),
                pending: None,
                episode: 0,
                charge_in_flight: false,
            }),
        })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn stage(&self) -> Result<WizardStage, RegistrationError> {
        Ok(self.lock_state()?.flow.stage())
    }

    /// Whether a charge is currently awaiting the provider. Front ends use
    /// this to render the processing state and disable duplicate submission.
    pub fn is_charge_in_flight(&self) -> Result<bool, RegistrationError> {
        Ok(self.lock_state()?.charge_in_flight)
    }

    pub fn roster_snapshot(&self) -> Result<TeamRegistration, RegistrationError> {
        Ok(self.lock_state()?.roster.registration().clone())
    }

    pub fn set_team_name(&self, value: impl Into<String>) -> Result<(), RegistrationError> {
        let mut state = self.lock_state()?;
        state.flow.require(WizardStage::Editing)?;
        state.roster.set_team_name(value);
        Ok(())
    }

    pub fn set_total_members(&self, size: TeamSize) -> Result<(), RegistrationError> {
        let mut state = self.lock_state()?;
        state.flow.require(WizardStage::Editing)?;
        state.roster.set_total_members(size);
        Ok(())
    }

    pub fn update_lead_field(
        &self,
        field: MemberField,
        value: impl Into<String>,
    ) -> Result<(), RegistrationError> {
        let mut state = self.lock_state()?;
        state.flow.require(WizardStage::Editing)?;
        state.roster.update_lead_field(field, value);
        Ok(())
    }

    pub fn update_member_field(
        &self,
        index: usize,
        field: MemberField,
        value: impl Into<String>,
    ) -> Result<(), RegistrationError> {
        let mut state = self.lock_state()?;
        state.flow.require(WizardStage::Editing)?;
        state.roster.update_member_field(index, field, value)
    }

    /// Validate the roster and hand the registration to storage.
    ///
    /// On success the wizard advances to the payment stage and returns the
    /// fee quote. Validation and storage failures leave the wizard on the
    /// editing stage with the roster untouched, so the caller can surface
    /// per-field state and retry. Never mutates roster data.
    pub async fn submit(&self) -> Result<PaymentRequest, RegistrationError> {
        let record = {
            let state = self.lock_state()?;
            state.flow.require(WizardStage::Editing)?;

            let report = validate(state.roster.registration());
            if !report.is_valid() {
                return Err(RegistrationError::Validation(report));
            }

            RegistrationRecord::new(
                self.track.id.clone(),
                state.roster.registration().clone(),
                self.session.identity().map(|user| user.user_id),
            )
        };

        self.store.save(&record).await?;

        let mut state = self.lock_state()?;
        state.flow.begin_payment()?;
        let request = PaymentRequest {
            amount: self.config.fee_amount,
            currency: self.config.fee_currency.clone(),
        };
        state.pending = Some(PendingPayment {
            registration_id: record.registration_id,
            request: request.clone(),
        });
        Ok(request)
    }

    /// Execute the registration fee charge for the current payment episode.
    ///
    /// At most one charge is in flight per episode; a concurrent call is
    /// rejected before any provider call is made. A charge resolving after
    /// its episode was cancelled is discarded and does not transition the
    /// wizard, even if a newer episode has since started.
    pub async fn charge(&self) -> Result<ChargeOutcome, RegistrationError> {
        let (request, episode) = {
            let mut state = self.lock_state()?;
            state.flow.require(WizardStage::AwaitingPayment)?;
            if state.charge_in_flight {
                return Err(RegistrationError::ChargeInFlight);
            }
            let pending = state.pending.as_ref().ok_or_else(|| {
                RegistrationError::State("payment stage without a pending fee".to_string())
            })?;
            let request = ChargeRequest::new(
                pending.registration_id.clone(),
                state.roster.registration().team_name.clone(),
                pending.request.amount,
                pending.request.currency.clone(),
            );
            state.charge_in_flight = true;
            (request, state.episode)
        };

        let outcome = timeout(self.config.charge_timeout, self.gateway.charge(&request)).await;

        let mut state = self.lock_state()?;
        if state.episode != episode {
            // Cancellation ended this episode mid-flight and already reset
            // the in-flight flag; whatever the provider said is stale now.
            return Ok(ChargeOutcome::Superseded);
        }
        state.charge_in_flight = false;

        match outcome {
            Err(_) => Err(RegistrationError::PaymentTimeout {
                timeout: self.config.charge_timeout,
            }),
            Ok(Err(err)) => Err(err),
            Ok(Ok(receipt)) => {
                state.flow.confirm()?;
                state.pending = None;
                drop(state);
                self.hooks.celebrate();
                self.hooks.invite_community();
                Ok(ChargeOutcome::Confirmed(receipt))
            }
        }
    }

    /// Abandon the payment stage and return to editing.
    ///
    /// Entered roster data is preserved. Any in-flight charge is orphaned:
    /// the episode bump makes its eventual result resolve as superseded.
    pub fn cancel_payment(&self) -> Result<(), RegistrationError> {
        let mut state = self.lock_state()?;
        state.flow.cancel_payment()?;
        state.pending = None;
        state.episode += 1;
        state.charge_in_flight = false;
        Ok(())
    }

    /// Acknowledge the confirmation stage.
    ///
    /// Fires the return-home collaborator; the caller drops the wizard
    /// afterwards, which is the state teardown.
    pub fn acknowledge(&self) -> Result<(), RegistrationError> {
        let state = self.lock_state()?;
        state.flow.require(WizardStage::Confirmed)?;
        drop(state);
        self.hooks.return_home();
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, WizardState>, RegistrationError> {
        self.state
            .lock()
            .map_err(|_| RegistrationError::State("wizard state lock poisoned".to_string()))
    }
}
