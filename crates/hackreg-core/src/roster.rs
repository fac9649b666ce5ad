use crate::error::RegistrationError;
use crate::types::{MemberField, TeamMember, TeamRegistration, TeamSize};

/// Form-state owner for one team registration.
///
/// Maintains `members.len() == total_members.member_slots()` across every
/// resize. Edits never validate content; completeness is checked once at
/// submission.
#[derive(Debug, Clone, Default)]
pub struct RosterModel {
    registration: TeamRegistration,
}

impl RosterModel {
    pub fn new() -> Self {
        Self {
            registration: TeamRegistration::new(),
        }
    }

    pub fn registration(&self) -> &TeamRegistration {
        &self.registration
    }

    pub fn into_registration(self) -> TeamRegistration {
        self.registration
    }

    pub fn team_size(&self) -> TeamSize {
        self.registration.total_members
    }

    pub fn set_team_name(&mut self, value: impl Into<String>) {
        self.registration.team_name = value.into();
    }

    /// Resize the roster to the chosen team size.
    ///
    /// Slots still in range keep their entries; slots beyond the new length
    /// are discarded for good. Regrowing after a shrink yields fresh empty
    /// slots, not the discarded data.
    pub fn set_total_members(&mut self, size: TeamSize) {
        self.registration
            .members
            .resize_with(size.member_slots(), TeamMember::empty);
        self.registration.total_members = size;
    }

    pub fn update_lead_field(&mut self, field: MemberField, value: impl Into<String>) {
        self.registration.team_lead.set(field, value);
    }

    pub fn update_member_field(
        &mut self,
        index: usize,
        field: MemberField,
        value: impl Into<String>,
    ) -> Result<(), RegistrationError> {
        let len = self.registration.members.len();
        let member = self
            .registration
            .members
            .get_mut(index)
            .ok_or(RegistrationError::MemberIndexOutOfBounds { index, len })?;
        member.set(field, value);
        Ok(())
    }
}
