use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RegistrationError;

/// Token lifetime matching the seven-day session cookie.
const SESSION_TTL_DAYS: i64 = 7;

/// Authenticated user attached to stored registrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

/// Session material issued by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: UserIdentity,
    pub expires_at: DateTime<Utc>,
}

/// Sign-in credentials forwarded verbatim to the identity collaborator.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// External identity collaborator (hosted auth service).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, RegistrationError>;

    async fn sign_up(
        &self,
        username: &str,
        credentials: &Credentials,
    ) -> Result<AuthSession, RegistrationError>;

    /// Resolve the session behind a previously issued token, if still honored.
    async fn session_for_token(
        &self,
        token: &str,
    ) -> Result<Option<AuthSession>, RegistrationError>;

    async fn sign_out(&self, token: &str) -> Result<(), RegistrationError>;
}

/// Persisted token slot, the browser-cookie analogue.
pub trait SessionTokenStore: Send + Sync {
    fn store(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), RegistrationError>;

    fn load(&self) -> Result<Option<String>, RegistrationError>;

    fn clear(&self) -> Result<(), RegistrationError>;
}

/// Explicit session context injected into the wizard at construction.
///
/// Replaces ambient global auth state: recovery and teardown are explicit
/// lifecycle calls, and deep components only ever see the injected value.
pub struct SessionContext {
    provider: Arc<dyn IdentityProvider>,
    tokens: Arc<dyn SessionTokenStore>,
    current: Mutex<Option<AuthSession>>,
}

impl SessionContext {
    pub fn new(provider: Arc<dyn IdentityProvider>, tokens: Arc<dyn SessionTokenStore>) -> Self {
        Self {
            provider,
            tokens,
            current: Mutex::new(None),
        }
    }

    /// Recover a session from the persisted token.
    ///
    /// A token the provider no longer honors is dropped from the store so
    /// the next recovery starts clean.
    pub async fn recover(&self) -> Result<Option<UserIdentity>, RegistrationError> {
        let Some(token) = self.tokens.load()? else {
            return Ok(None);
        };

        match self.provider.session_for_token(&token).await {
            Ok(Some(session)) => {
                let identity = session.user.clone();
                *self.lock()? = Some(session);
                Ok(Some(identity))
            }
            Ok(None) => {
                self.tokens.clear()?;
                Ok(None)
            }
            Err(err) => {
                self.tokens.clear()?;
                Err(err)
            }
        }
    }

    pub async fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> Result<UserIdentity, RegistrationError> {
        let session = self.provider.sign_in(credentials).await?;
        self.establish(session)
    }

    pub async fn sign_up(
        &self,
        username: &str,
        credentials: &Credentials,
    ) -> Result<UserIdentity, RegistrationError> {
        let session = self.provider.sign_up(username, credentials).await?;
        self.establish(session)
    }

    /// Current identity, if signed in.
    pub fn identity(&self) -> Option<UserIdentity> {
        self.current
            .lock()
            .ok()?
            .as_ref()
            .map(|session| session.user.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity().is_some()
    }

    /// Tear down the session: provider sign-out, persisted token, local state.
    pub async fn sign_out(&self) -> Result<(), RegistrationError> {
        let token = self.lock()?.take().map(|session| session.access_token);
        if let Some(token) = token {
            self.provider.sign_out(&token).await?;
        }
        self.tokens.clear()?;
        Ok(())
    }

    fn establish(&self, session: AuthSession) -> Result<UserIdentity, RegistrationError> {
        self.tokens.store(
            &session.access_token,
            Utc::now() + Duration::days(SESSION_TTL_DAYS),
        )?;
        let identity = session.user.clone();
        *self.lock()? = Some(session);
        Ok(identity)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<AuthSession>>, RegistrationError> {
        self.current
            .lock()
            .map_err(|_| RegistrationError::State("session lock poisoned".to_string()))
    }
}
