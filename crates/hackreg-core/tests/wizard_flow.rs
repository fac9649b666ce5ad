//! End-to-end wizard behavior over inline test collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use hackreg_core::{
    AuthSession, ChargeOutcome, ChargeReceipt, ChargeRequest, ConfirmationHooks, Credentials,
    FieldRef, IdentityProvider, MemberField, NoopHooks, PaymentGateway, RegistrationError,
    RegistrationRecord, RegistrationStore, RegistrationWizard, SessionContext, SessionTokenStore,
    TrackCatalog, WizardConfig, WizardStage,
};

struct ApproveGateway {
    calls: AtomicUsize,
}

impl ApproveGateway {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ApproveGateway {
    fn provider(&self) -> &'static str {
        "approve-test"
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, RegistrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ChargeReceipt {
            charge_id: request.charge_id.clone(),
            provider: self.provider().to_string(),
            amount: request.amount,
            currency: request.currency.clone(),
            charged_at: Utc::now(),
        })
    }
}

struct DeclineGateway {
    calls: AtomicUsize,
}

impl DeclineGateway {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PaymentGateway for DeclineGateway {
    fn provider(&self) -> &'static str {
        "decline-test"
    }

    async fn charge(&self, _request: &ChargeRequest) -> Result<ChargeReceipt, RegistrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RegistrationError::PaymentDeclined {
            provider: self.provider().to_string(),
            reason: "card rejected".to_string(),
        })
    }
}

/// Gateway that parks every charge until the test releases it.
struct GatedGateway {
    entered: Notify,
    release: Notify,
    calls: AtomicUsize,
}

impl GatedGateway {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for GatedGateway {
    fn provider(&self) -> &'static str {
        "gated-test"
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, RegistrationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(ChargeReceipt {
            charge_id: request.charge_id.clone(),
            provider: self.provider().to_string(),
            amount: request.amount,
            currency: request.currency.clone(),
            charged_at: Utc::now(),
        })
    }
}

struct SlowGateway;

#[async_trait]
impl PaymentGateway for SlowGateway {
    fn provider(&self) -> &'static str {
        "slow-test"
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, RegistrationError> {
        tokio::time::sleep(Duration::from_millis(400)).await;
        Ok(ChargeReceipt {
            charge_id: request.charge_id.clone(),
            provider: self.provider().to_string(),
            amount: request.amount,
            currency: request.currency.clone(),
            charged_at: Utc::now(),
        })
    }
}

#[derive(Default)]
struct MemStore {
    records: Mutex<Vec<RegistrationRecord>>,
}

impl MemStore {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn records(&self) -> Vec<RegistrationRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistrationStore for MemStore {
    async fn save(&self, record: &RegistrationRecord) -> Result<(), RegistrationError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn count(&self) -> Result<usize, RegistrationError> {
        Ok(self.records.lock().unwrap().len())
    }
}

/// Store that fails a fixed number of saves before accepting.
struct FlakyStore {
    failures_left: AtomicUsize,
    accepted: AtomicUsize,
}

impl FlakyStore {
    fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures_left: AtomicUsize::new(failures),
            accepted: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl RegistrationStore for FlakyStore {
    async fn save(&self, _record: &RegistrationRecord) -> Result<(), RegistrationError> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok()
        {
            return Err(RegistrationError::Persistence(
                "registration backend unavailable".to_string(),
            ));
        }
        self.accepted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn count(&self) -> Result<usize, RegistrationError> {
        Ok(self.accepted.load(Ordering::SeqCst))
    }
}

#[derive(Default)]
struct CountingHooks {
    celebrated: AtomicUsize,
    invited: AtomicUsize,
    sent_home: AtomicUsize,
}

impl CountingHooks {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl ConfirmationHooks for CountingHooks {
    fn celebrate(&self) {
        self.celebrated.fetch_add(1, Ordering::SeqCst);
    }

    fn invite_community(&self) {
        self.invited.fetch_add(1, Ordering::SeqCst);
    }

    fn return_home(&self) {
        self.sent_home.fetch_add(1, Ordering::SeqCst);
    }
}

/// Identity collaborator that rejects everything; sessions stay anonymous.
struct NoIdentity;

#[async_trait]
impl IdentityProvider for NoIdentity {
    async fn sign_in(&self, _credentials: &Credentials) -> Result<AuthSession, RegistrationError> {
        Err(RegistrationError::Identity("auth disabled".to_string()))
    }

    async fn sign_up(
        &self,
        _username: &str,
        _credentials: &Credentials,
    ) -> Result<AuthSession, RegistrationError> {
        Err(RegistrationError::Identity("auth disabled".to_string()))
    }

    async fn session_for_token(
        &self,
        _token: &str,
    ) -> Result<Option<AuthSession>, RegistrationError> {
        Ok(None)
    }

    async fn sign_out(&self, _token: &str) -> Result<(), RegistrationError> {
        Ok(())
    }
}

#[derive(Default)]
struct NoTokens;

impl SessionTokenStore for NoTokens {
    fn store(&self, _token: &str, _expires_at: DateTime<Utc>) -> Result<(), RegistrationError> {
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, RegistrationError> {
        Ok(None)
    }

    fn clear(&self) -> Result<(), RegistrationError> {
        Ok(())
    }
}

fn anonymous_session() -> Arc<SessionContext> {
    Arc::new(SessionContext::new(
        Arc::new(NoIdentity),
        Arc::new(NoTokens),
    ))
}

fn mount(
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn RegistrationStore>,
    hooks: Arc<dyn ConfirmationHooks>,
    config: WizardConfig,
) -> Arc<RegistrationWizard> {
    let track = TrackCatalog::standard().find("ai-ml").cloned();
    Arc::new(
        RegistrationWizard::mount(track, anonymous_session(), store, gateway, hooks, config)
            .unwrap(),
    )
}

fn fill_complete_roster(wizard: &RegistrationWizard) {
    wizard.set_team_name("Null Pointers").unwrap();
    let lead = [
        (MemberField::Name, "Asha Rao"),
        (MemberField::Branch, "CSE"),
        (MemberField::Section, "B"),
        (MemberField::RollNumber, "2025CSE014"),
        (MemberField::Phone, "+91 98765 43210"),
        (MemberField::Email, "asha@campus.edu"),
    ];
    for (field, value) in lead {
        wizard.update_lead_field(field, value).unwrap();
    }
    for index in 0..2 {
        let fields = [
            (MemberField::Name, format!("Member {}", index + 2)),
            (MemberField::Branch, "ECE".to_string()),
            (MemberField::Section, "A".to_string()),
            (MemberField::RollNumber, format!("2025ECE{:03}", index + 20)),
            (MemberField::Phone, "98765 43211".to_string()),
            (MemberField::Email, format!("member{}@campus.edu", index + 2)),
        ];
        for (field, value) in fields {
            wizard.update_member_field(index, field, value).unwrap();
        }
    }
}

#[test]
fn mount_fails_closed_without_a_track() {
    let err = RegistrationWizard::mount(
        None,
        anonymous_session(),
        MemStore::new(),
        ApproveGateway::new(),
        Arc::new(NoopHooks),
        WizardConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, RegistrationError::TrackMissing));
}

#[tokio::test]
async fn incomplete_submit_reports_fields_and_stays_editing() {
    let store = MemStore::new();
    let wizard = mount(
        ApproveGateway::new(),
        store.clone(),
        CountingHooks::new(),
        WizardConfig::default(),
    );
    fill_complete_roster(&wizard);
    wizard.update_lead_field(MemberField::Email, "").unwrap();

    let err = wizard.submit().await.unwrap_err();
    let RegistrationError::Validation(report) = err else {
        panic!("expected validation failure, got {err}");
    };
    assert!(report.contains(FieldRef::Lead(MemberField::Email)));
    assert_eq!(wizard.stage().unwrap(), WizardStage::Editing);
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn valid_submit_quotes_fee_and_advances() {
    let store = MemStore::new();
    let wizard = mount(
        ApproveGateway::new(),
        store.clone(),
        CountingHooks::new(),
        WizardConfig::default(),
    );
    fill_complete_roster(&wizard);

    let quote = wizard.submit().await.unwrap();
    assert_eq!(quote.amount, 499);
    assert_eq!(quote.currency, "INR");
    assert_eq!(wizard.stage().unwrap(), WizardStage::AwaitingPayment);

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].track_id, "ai-ml");
    assert_eq!(records[0].team.team_name, "Null Pointers");
    assert_eq!(records[0].team.members.len(), 2);
    assert_eq!(records[0].registered_by, None);
}

#[tokio::test]
async fn submit_is_rejected_outside_editing() {
    let wizard = mount(
        ApproveGateway::new(),
        MemStore::new(),
        CountingHooks::new(),
        WizardConfig::default(),
    );
    fill_complete_roster(&wizard);
    wizard.submit().await.unwrap();

    let err = wizard.submit().await.unwrap_err();
    assert!(matches!(err, RegistrationError::StageViolation { .. }));
}

#[tokio::test]
async fn storage_failure_surfaces_and_preserves_entered_data() {
    let store = FlakyStore::new(1);
    let wizard = mount(
        ApproveGateway::new(),
        store.clone(),
        CountingHooks::new(),
        WizardConfig::default(),
    );
    fill_complete_roster(&wizard);

    let err = wizard.submit().await.unwrap_err();
    assert!(matches!(err, RegistrationError::Persistence(_)));
    assert_eq!(wizard.stage().unwrap(), WizardStage::Editing);
    assert_eq!(
        wizard.roster_snapshot().unwrap().team_name,
        "Null Pointers"
    );

    // Retry succeeds once the backend recovers.
    wizard.submit().await.unwrap();
    assert_eq!(wizard.stage().unwrap(), WizardStage::AwaitingPayment);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn roster_edits_are_rejected_off_the_editing_stage() {
    let wizard = mount(
        ApproveGateway::new(),
        MemStore::new(),
        CountingHooks::new(),
        WizardConfig::default(),
    );
    fill_complete_roster(&wizard);
    wizard.submit().await.unwrap();

    let err = wizard.set_team_name("Rename Attempt").unwrap_err();
    assert!(matches!(err, RegistrationError::StageViolation { .. }));

    wizard.cancel_payment().unwrap();
    wizard.set_team_name("Renamed After Cancel").unwrap();
    assert_eq!(
        wizard.roster_snapshot().unwrap().team_name,
        "Renamed After Cancel"
    );
}

#[tokio::test]
async fn charge_requires_the_payment_stage() {
    let wizard = mount(
        ApproveGateway::new(),
        MemStore::new(),
        CountingHooks::new(),
        WizardConfig::default(),
    );
    let err = wizard.charge().await.unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::StageViolation {
            expected: "awaiting_payment",
            actual: "editing",
        }
    ));
}

#[tokio::test]
async fn decline_keeps_payment_stage_and_roster() {
    let gateway = DeclineGateway::new();
    let wizard = mount(
        gateway.clone(),
        MemStore::new(),
        CountingHooks::new(),
        WizardConfig::default(),
    );
    fill_complete_roster(&wizard);
    let before = wizard.roster_snapshot().unwrap();
    wizard.submit().await.unwrap();

    let err = wizard.charge().await.unwrap_err();
    assert!(matches!(err, RegistrationError::PaymentDeclined { .. }));
    assert_eq!(wizard.stage().unwrap(), WizardStage::AwaitingPayment);
    assert!(!wizard.is_charge_in_flight().unwrap());
    assert_eq!(wizard.roster_snapshot().unwrap(), before);

    // Retry reaches the provider again.
    assert!(wizard.charge().await.is_err());
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_charge_is_rejected_without_a_second_provider_call() {
    let gateway = GatedGateway::new();
    let hooks = CountingHooks::new();
    let wizard = mount(
        gateway.clone(),
        MemStore::new(),
        hooks.clone(),
        WizardConfig::default(),
    );
    fill_complete_roster(&wizard);
    wizard.submit().await.unwrap();

    let first = {
        let wizard = wizard.clone();
        tokio::spawn(async move { wizard.charge().await })
    };
    gateway.entered.notified().await;
    assert!(wizard.is_charge_in_flight().unwrap());

    let err = wizard.charge().await.unwrap_err();
    assert!(matches!(err, RegistrationError::ChargeInFlight));
    assert_eq!(gateway.calls(), 1);

    gateway.release.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, ChargeOutcome::Confirmed(_)));
    assert_eq!(wizard.stage().unwrap(), WizardStage::Confirmed);
    assert_eq!(hooks.celebrated.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cancellation_discards_the_in_flight_result() {
    let gateway = GatedGateway::new();
    let hooks = CountingHooks::new();
    let wizard = mount(
        gateway.clone(),
        MemStore::new(),
        hooks.clone(),
        WizardConfig::default(),
    );
    fill_complete_roster(&wizard);
    wizard.submit().await.unwrap();

    let in_flight = {
        let wizard = wizard.clone();
        tokio::spawn(async move { wizard.charge().await })
    };
    gateway.entered.notified().await;

    wizard.cancel_payment().unwrap();
    assert_eq!(wizard.stage().unwrap(), WizardStage::Editing);

    gateway.release.notify_one();
    let outcome = in_flight.await.unwrap().unwrap();
    assert_eq!(outcome, ChargeOutcome::Superseded);
    assert_eq!(wizard.stage().unwrap(), WizardStage::Editing);
    assert_eq!(hooks.celebrated.load(Ordering::SeqCst), 0);
    assert_eq!(
        wizard.roster_snapshot().unwrap().team_name,
        "Null Pointers"
    );
}

#[tokio::test]
async fn stale_result_does_not_confirm_a_newer_episode() {
    let gateway = GatedGateway::new();
    let wizard = mount(
        gateway.clone(),
        MemStore::new(),
        CountingHooks::new(),
        WizardConfig::default(),
    );
    fill_complete_roster(&wizard);
    wizard.submit().await.unwrap();

    let orphaned = {
        let wizard = wizard.clone();
        tokio::spawn(async move { wizard.charge().await })
    };
    gateway.entered.notified().await;

    // Cancel and resubmit: the wizard is awaiting payment again, but on a
    // newer episode than the parked charge.
    wizard.cancel_payment().unwrap();
    wizard.submit().await.unwrap();
    assert_eq!(wizard.stage().unwrap(), WizardStage::AwaitingPayment);

    gateway.release.notify_one();
    let outcome = orphaned.await.unwrap().unwrap();
    assert_eq!(outcome, ChargeOutcome::Superseded);
    assert_eq!(wizard.stage().unwrap(), WizardStage::AwaitingPayment);
    assert!(!wizard.is_charge_in_flight().unwrap());

    // The fresh episode still confirms exactly once.
    let second = {
        let wizard = wizard.clone();
        tokio::spawn(async move { wizard.charge().await })
    };
    gateway.entered.notified().await;
    gateway.release.notify_one();
    let outcome = second.await.unwrap().unwrap();
    assert!(matches!(outcome, ChargeOutcome::Confirmed(_)));
    assert_eq!(wizard.stage().unwrap(), WizardStage::Confirmed);
}

#[tokio::test]
async fn charge_times_out_and_stays_recoverable() {
    let config = WizardConfig {
        charge_timeout: Duration::from_millis(25),
        ..WizardConfig::default()
    };
    let wizard = mount(
        Arc::new(SlowGateway),
        MemStore::new(),
        CountingHooks::new(),
        config,
    );
    fill_complete_roster(&wizard);
    wizard.submit().await.unwrap();

    let err = wizard.charge().await.unwrap_err();
    assert!(matches!(err, RegistrationError::PaymentTimeout { .. }));
    assert_eq!(wizard.stage().unwrap(), WizardStage::AwaitingPayment);
    assert!(!wizard.is_charge_in_flight().unwrap());

    wizard.cancel_payment().unwrap();
    assert_eq!(wizard.stage().unwrap(), WizardStage::Editing);
}

#[tokio::test]
async fn full_flow_select_fill_pay_acknowledge() {
    let store = MemStore::new();
    let hooks = CountingHooks::new();
    let gateway = ApproveGateway::new();
    let wizard = mount(
        gateway.clone(),
        store.clone(),
        hooks.clone(),
        WizardConfig::default(),
    );
    assert_eq!(wizard.track().id, "ai-ml");

    fill_complete_roster(&wizard);
    let quote = wizard.submit().await.unwrap();
    assert_eq!(quote.amount, 499);
    assert_eq!(wizard.stage().unwrap(), WizardStage::AwaitingPayment);

    let outcome = wizard.charge().await.unwrap();
    let ChargeOutcome::Confirmed(receipt) = outcome else {
        panic!("expected confirmation");
    };
    assert_eq!(receipt.amount, 499);
    assert_eq!(wizard.stage().unwrap(), WizardStage::Confirmed);
    assert_eq!(hooks.celebrated.load(Ordering::SeqCst), 1);
    assert_eq!(hooks.invited.load(Ordering::SeqCst), 1);

    wizard.acknowledge().unwrap();
    assert_eq!(hooks.sent_home.load(Ordering::SeqCst), 1);
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn acknowledge_requires_confirmation() {
    let wizard = mount(
        ApproveGateway::new(),
        MemStore::new(),
        CountingHooks::new(),
        WizardConfig::default(),
    );
    let err = wizard.acknowledge().unwrap_err();
    assert!(matches!(err, RegistrationError::StageViolation { .. }));
}
