//! Team registration core for the Hack The Future hackathon.
//!
//! Implements the registration wizard: roster form state, submission-time
//! validation, and the editing -> awaiting_payment -> confirmed stage
//! machine. Persistence, payment, identity, and confirmation effects are
//! external collaborators behind trait boundaries.

#![deny(unsafe_code)]

pub mod effects;
pub mod engine;
pub mod error;
pub mod payment;
pub mod roster;
pub mod session;
pub mod store;
pub mod tracks;
pub mod types;
pub mod validation;
pub mod wizard;

pub use effects::{ConfirmationHooks, NoopHooks};
pub use engine::{ChargeOutcome, RegistrationWizard, WizardConfig};
pub use error::RegistrationError;
pub use payment::{ChargeReceipt, ChargeRequest, PaymentGateway};
pub use roster::RosterModel;
pub use session::{
    AuthSession, Credentials, IdentityProvider, SessionContext, SessionTokenStore, UserIdentity,
};
pub use store::{RegistrationRecord, RegistrationStore};
pub use tracks::TrackCatalog;
pub use types::{MemberField, PaymentRequest, TeamMember, TeamRegistration, TeamSize, Track};
pub use validation::{validate, FieldIssue, FieldRef, IssueKind, ValidationReport};
pub use wizard::{WizardFlow, WizardStage};
