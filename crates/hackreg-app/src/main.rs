use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use hackreg_adapters::{
    DeclineThenApproveGateway, FileRegistrationStore, InMemoryRegistrationStore, InMemoryTokenStore,
    MockCardGateway, StaticIdentityProvider,
};
use hackreg_core::{
    ChargeOutcome, ConfirmationHooks, Credentials, MemberField, PaymentGateway, RegistrationError,
    RegistrationStore, RegistrationWizard, SessionContext, TeamMember, TeamSize, TrackCatalog,
    WizardConfig,
};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "hackreg", version, about = "Hack The Future registration walkthrough")]
struct Cli {
    /// Track to register under: ai-ml, web3, or open.
    #[arg(long, default_value = "ai-ml")]
    track: String,
    /// Team name submitted with the roster.
    #[arg(long, default_value = "Null Pointers")]
    team_name: String,
    /// Total team size including the lead (3-5).
    #[arg(long, default_value_t = 3)]
    team_size: u8,
    /// Registration fee quoted at the payment stage.
    #[arg(long, default_value_t = 499, env = "HACKREG_FEE")]
    fee: u64,
    /// Number of simulated card declines before the charge settles.
    #[arg(long, default_value_t = 0)]
    declines: usize,
    /// Persist registrations to this JSON file instead of memory.
    #[arg(long, env = "HACKREG_DATA")]
    data_file: Option<PathBuf>,
}

/// Console rendition of the confirmation-stage collaborators.
struct ConsoleHooks;

impl ConfirmationHooks for ConsoleHooks {
    fn celebrate(&self) {
        info!("confetti! your team has been successfully registered");
    }

    fn invite_community(&self) {
        info!("join the participant community to get real-time updates");
    }

    fn return_home(&self) {
        info!("returning to the home page");
    }
}

fn demo_member(position: usize) -> TeamMember {
    TeamMember::new(
        format!("Member {position}"),
        "CSE",
        "B",
        format!("2025CSE{position:03}"),
        "+91 98765 43210",
        format!("member{position}@campus.edu"),
    )
}

fn fill_member(
    wizard: &RegistrationWizard,
    index: usize,
    member: &TeamMember,
) -> Result<(), RegistrationError> {
    for field in MemberField::ALL {
        wizard.update_member_field(index, field, member.get(field))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "hackreg=info,info".to_string()),
        )
        .init();

    let cli = Cli::parse();

    let catalog = TrackCatalog::standard();
    let track = catalog.find(&cli.track).cloned();
    if track.is_none() {
        warn!(track = %cli.track, "unknown track, redirecting to track selection");
        for track in catalog.tracks() {
            info!(id = %track.id, title = %track.title, "available track");
        }
        anyhow::bail!("no track selected");
    }

    let store: Arc<dyn RegistrationStore> = match &cli.data_file {
        Some(path) => Arc::new(FileRegistrationStore::load(path)?),
        None => Arc::new(InMemoryRegistrationStore::new()),
    };
    let gateway: Arc<dyn PaymentGateway> = if cli.declines > 0 {
        Arc::new(DeclineThenApproveGateway::new(cli.declines))
    } else {
        Arc::new(MockCardGateway::new())
    };

    let session = Arc::new(SessionContext::new(
        Arc::new(StaticIdentityProvider::with_account(
            "lead@campus.edu",
            "demo-password",
            "team-lead",
        )),
        Arc::new(InMemoryTokenStore::new()),
    ));
    let identity = session
        .sign_in(&Credentials::new("lead@campus.edu", "demo-password"))
        .await?;
    info!(user = %identity.username, "signed in");

    let config = WizardConfig {
        fee_amount: cli.fee,
        ..WizardConfig::default()
    };
    let wizard = RegistrationWizard::mount(
        track,
        session.clone(),
        store.clone(),
        gateway,
        Arc::new(ConsoleHooks),
        config,
    )?;
    info!(track = %wizard.track().title, "registration opened");

    let team_size = TeamSize::try_from(cli.team_size)?;
    wizard.set_total_members(team_size)?;
    wizard.set_team_name(&cli.team_name)?;

    let lead = TeamMember::new(
        "Asha Rao",
        "CSE",
        "A",
        "2025CSE001",
        "+91 98765 43200",
        "lead@campus.edu",
    );
    for field in MemberField::ALL {
        wizard.update_lead_field(field, lead.get(field))?;
    }
    for index in 0..team_size.member_slots() {
        let member = demo_member(index + 2);
        fill_member(&wizard, index, &member)?;
    }

    let quote = wizard.submit().await?;
    info!(amount = quote.amount, currency = %quote.currency, "registration stored, fee due");

    let receipt = loop {
        match wizard.charge().await {
            Ok(ChargeOutcome::Confirmed(receipt)) => break receipt,
            Ok(ChargeOutcome::Superseded) => anyhow::bail!("payment episode was cancelled"),
            Err(RegistrationError::PaymentDeclined { provider, reason }) => {
                warn!(%provider, %reason, "charge declined, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    };
    info!(charge_id = %receipt.charge_id, provider = %receipt.provider, "payment settled");

    wizard.acknowledge()?;

    info!(total = store.count().await?, "registrations on record");
    println!(
        "{}",
        serde_json::to_string_pretty(&wizard.roster_snapshot()?)?
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn demo_members_pass_validation_shape() {
        let member = demo_member(2);
        assert!(member.email.contains('@'));
        assert!(member
            .phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-')));
    }
}
