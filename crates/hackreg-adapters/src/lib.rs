//! Collaborator adapters for the registration wizard.

#![deny(unsafe_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use hackreg_core::{
    AuthSession, ChargeReceipt, ChargeRequest, ConfirmationHooks, Credentials, IdentityProvider,
    PaymentGateway, RegistrationError, RegistrationRecord, RegistrationStore, SessionTokenStore,
    UserIdentity,
};
use uuid::Uuid;

/// Mock card gateway for deterministic local payment simulation.
///
/// Always settles; an optional latency keeps the processing state visible
/// long enough to exercise in-flight behavior.
#[derive(Debug, Clone, Default)]
pub struct MockCardGateway {
    latency: Option<Duration>,
}

impl MockCardGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockCardGateway {
    fn provider(&self) -> &'static str {
        "mockcard"
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, RegistrationError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(ChargeReceipt {
            charge_id: request.charge_id.clone(),
            provider: self.provider().to_string(),
            amount: request.amount,
            currency: request.currency.clone(),
            charged_at: Utc::now(),
        })
    }
}

/// Gateway that declines every charge, useful for chaos testing.
#[derive(Debug, Clone)]
pub struct AlwaysDeclineGateway {
    reason: String,
}

impl AlwaysDeclineGateway {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for AlwaysDeclineGateway {
    fn provider(&self) -> &'static str {
        "declinecard"
    }

    async fn charge(&self, _request: &ChargeRequest) -> Result<ChargeReceipt, RegistrationError> {
        Err(RegistrationError::PaymentDeclined {
            provider: self.provider().to_string(),
            reason: self.reason.clone(),
        })
    }
}

/// Gateway that declines a fixed number of charges before settling.
///
/// Drives the retry-after-decline path without any randomness.
#[derive(Debug, Default)]
pub struct DeclineThenApproveGateway {
    declines_left: AtomicUsize,
}

impl DeclineThenApproveGateway {
    pub fn new(declines: usize) -> Self {
        Self {
            declines_left: AtomicUsize::new(declines),
        }
    }
}

#[async_trait]
impl PaymentGateway for DeclineThenApproveGateway {
    fn provider(&self) -> &'static str {
        "flakycard"
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, RegistrationError> {
        let declined = self
            .declines_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok();
        if declined {
            return Err(RegistrationError::PaymentDeclined {
                provider: self.provider().to_string(),
                reason: "insufficient funds".to_string(),
            });
        }
        Ok(ChargeReceipt {
            charge_id: request.charge_id.clone(),
            provider: self.provider().to_string(),
            amount: request.amount,
            currency: request.currency.clone(),
            charged_at: Utc::now(),
        })
    }
}

/// In-memory registration store.
#[derive(Debug, Default)]
pub struct InMemoryRegistrationStore {
    records: Mutex<Vec<RegistrationRecord>>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Result<Vec<RegistrationRecord>, RegistrationError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<RegistrationRecord>>, RegistrationError>
    {
        self.records
            .lock()
            .map_err(|_| RegistrationError::Persistence("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn save(&self, record: &RegistrationRecord) -> Result<(), RegistrationError> {
        self.lock()?.push(record.clone());
        Ok(())
    }

    async fn count(&self) -> Result<usize, RegistrationError> {
        Ok(self.lock()?.len())
    }
}

/// Store that rejects every save, for exercising submission-failure paths.
#[derive(Debug, Clone)]
pub struct FailingRegistrationStore {
    reason: String,
}

impl FailingRegistrationStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl RegistrationStore for FailingRegistrationStore {
    async fn save(&self, _record: &RegistrationRecord) -> Result<(), RegistrationError> {
        Err(RegistrationError::Persistence(self.reason.clone()))
    }

    async fn count(&self) -> Result<usize, RegistrationError> {
        Err(RegistrationError::Persistence(self.reason.clone()))
    }
}

/// File-backed registration store.
///
/// The record list is rewritten after every accepted save so registrations
/// survive process restarts; writes go through a temp file and rename.
#[derive(Debug)]
pub struct FileRegistrationStore {
    path: PathBuf,
    records: Mutex<Vec<RegistrationRecord>>,
}

impl FileRegistrationStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, RegistrationError> {
        let path = path.into();
        let records = if path.exists() {
            let bytes = fs::read(&path).map_err(persistence_io)?;
            if bytes.is_empty() {
                Vec::new()
            } else {
                serde_json::from_slice(&bytes).map_err(persistence_decode)?
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> Result<Vec<RegistrationRecord>, RegistrationError> {
        Ok(self.lock()?.clone())
    }

    fn persist(&self, records: &[RegistrationRecord]) -> Result<(), RegistrationError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(persistence_io)?;
        }
        let bytes = serde_json::to_vec_pretty(records).map_err(persistence_decode)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, bytes).map_err(persistence_io)?;
        fs::rename(tmp_path, &self.path).map_err(persistence_io)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<RegistrationRecord>>, RegistrationError>
    {
        self.records
            .lock()
            .map_err(|_| RegistrationError::Persistence("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RegistrationStore for FileRegistrationStore {
    async fn save(&self, record: &RegistrationRecord) -> Result<(), RegistrationError> {
        let mut records = self.lock()?;
        records.push(record.clone());
        self.persist(&records)
    }

    async fn count(&self) -> Result<usize, RegistrationError> {
        Ok(self.lock()?.len())
    }
}

fn persistence_io(err: std::io::Error) -> RegistrationError {
    RegistrationError::Persistence(format!("registration file IO error: {err}"))
}

fn persistence_decode(err: serde_json::Error) -> RegistrationError {
    RegistrationError::Persistence(format!("registration file decode error: {err}"))
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: UserIdentity,
}

/// Deterministic identity provider fixture.
///
/// Accounts are seeded up front or created through `sign_up`; tokens stay
/// honored until signed out.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    sessions: Mutex<HashMap<String, AuthSession>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(
        email: impl Into<String>,
        password: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        let provider = Self::new();
        provider.seed_account(email, password, username);
        provider
    }

    pub fn seed_account(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
        username: impl Into<String>,
    ) {
        let email = email.into();
        let account = Account {
            password: password.into(),
            user: UserIdentity {
                user_id: format!("user-{}", Uuid::new_v4()),
                username: username.into(),
                email: email.clone(),
            },
        };
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.insert(email, account);
        }
    }

    fn issue(&self, user: UserIdentity) -> Result<AuthSession, RegistrationError> {
        let session = AuthSession {
            access_token: format!("session-{}", Uuid::new_v4()),
            user,
            expires_at: Utc::now() + ChronoDuration::days(7),
        };
        self.sessions_lock()?
            .insert(session.access_token.clone(), session.clone());
        Ok(session)
    }

    fn accounts_lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Account>>, RegistrationError> {
        self.accounts
            .lock()
            .map_err(|_| RegistrationError::Identity("account lock poisoned".to_string()))
    }

    fn sessions_lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, AuthSession>>, RegistrationError> {
        self.sessions
            .lock()
            .map_err(|_| RegistrationError::Identity("session lock poisoned".to_string()))
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, RegistrationError> {
        let user = {
            let accounts = self.accounts_lock()?;
            let account = accounts
                .get(&credentials.email)
                .filter(|account| account.password == credentials.password)
                .ok_or_else(|| {
                    RegistrationError::Identity("invalid email or password".to_string())
                })?;
            account.user.clone()
        };
        self.issue(user)
    }

    async fn sign_up(
        &self,
        username: &str,
        credentials: &Credentials,
    ) -> Result<AuthSession, RegistrationError> {
        let user = {
            let mut accounts = self.accounts_lock()?;
            if accounts.contains_key(&credentials.email) {
                return Err(RegistrationError::Identity(
                    "an account already exists for this email".to_string(),
                ));
            }
            let account = Account {
                password: credentials.password.clone(),
                user: UserIdentity {
                    user_id: format!("user-{}", Uuid::new_v4()),
                    username: username.to_string(),
                    email: credentials.email.clone(),
                },
            };
            accounts.insert(credentials.email.clone(), account.clone());
            account.user
        };
        self.issue(user)
    }

    async fn session_for_token(
        &self,
        token: &str,
    ) -> Result<Option<AuthSession>, RegistrationError> {
        let sessions = self.sessions_lock()?;
        Ok(sessions
            .get(token)
            .filter(|session| session.expires_at > Utc::now())
            .cloned())
    }

    async fn sign_out(&self, token: &str) -> Result<(), RegistrationError> {
        self.sessions_lock()?.remove(token);
        Ok(())
    }
}

/// In-memory token slot with expiry, the cookie jar stand-in.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    slot: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Option<(String, DateTime<Utc>)>>, RegistrationError>
    {
        self.slot
            .lock()
            .map_err(|_| RegistrationError::Identity("token lock poisoned".to_string()))
    }
}

impl SessionTokenStore for InMemoryTokenStore {
    fn store(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), RegistrationError> {
        *self.lock()? = Some((token.to_string(), expires_at));
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, RegistrationError> {
        let mut slot = self.lock()?;
        match slot.as_ref() {
            Some((_, expires_at)) if *expires_at <= Utc::now() => {
                *slot = None;
                Ok(None)
            }
            Some((token, _)) => Ok(Some(token.clone())),
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), RegistrationError> {
        *self.lock()? = None;
        Ok(())
    }
}

/// Hooks that count invocations, for asserting confirmation effects fired.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    celebrations: AtomicUsize,
    invitations: AtomicUsize,
    returns_home: AtomicUsize,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn celebrations(&self) -> usize {
        self.celebrations.load(Ordering::SeqCst)
    }

    pub fn invitations(&self) -> usize {
        self.invitations.load(Ordering::SeqCst)
    }

    pub fn returns_home(&self) -> usize {
        self.returns_home.load(Ordering::SeqCst)
    }
}

impl ConfirmationHooks for RecordingHooks {
    fn celebrate(&self) {
        self.celebrations.fetch_add(1, Ordering::SeqCst);
    }

    fn invite_community(&self) {
        self.invitations.fetch_add(1, Ordering::SeqCst);
    }

    fn return_home(&self) {
        self.returns_home.fetch_add(1, Ordering::SeqCst);
    }
}
