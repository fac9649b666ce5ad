use serde::{Deserialize, Serialize};

use crate::error::RegistrationError;

/// Single participant record captured by the registration form.
///
/// The field set is closed: form code addresses fields through
/// [`MemberField`], so there is no way to attach keys the record does not
/// carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub branch: String,
    pub section: String,
    pub roll_number: String,
    pub phone: String,
    pub email: String,
}

impl TeamMember {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(
        name: impl Into<String>,
        branch: impl Into<String>,
        section: impl Into<String>,
        roll_number: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            branch: branch.into(),
            section: section.into(),
            roll_number: roll_number.into(),
            phone: phone.into(),
            email: email.into(),
        }
    }

    pub fn get(&self, field: MemberField) -> &str {
        match field {
            MemberField::Name => &self.name,
            MemberField::Branch => &self.branch,
            MemberField::Section => &self.section,
            MemberField::RollNumber => &self.roll_number,
            MemberField::Phone => &self.phone,
            MemberField::Email => &self.email,
        }
    }

    pub fn set(&mut self, field: MemberField, value: impl Into<String>) {
        let value = value.into();
        match field {
            MemberField::Name => self.name = value,
            MemberField::Branch => self.branch = value,
            MemberField::Section => self.section = value,
            MemberField::RollNumber => self.roll_number = value,
            MemberField::Phone => self.phone = value,
            MemberField::Email => self.email = value,
        }
    }
}

/// Closed set of fields on a [`TeamMember`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberField {
    Name,
    Branch,
    Section,
    RollNumber,
    Phone,
    Email,
}

impl MemberField {
    pub const ALL: [MemberField; 6] = [
        MemberField::Name,
        MemberField::Branch,
        MemberField::Section,
        MemberField::RollNumber,
        MemberField::Phone,
        MemberField::Email,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Branch => "branch",
            Self::Section => "section",
            Self::RollNumber => "roll_number",
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }
}

/// Allowed team sizes, lead included.
///
/// The form only ever offers 3, 4, or 5; anything else is unrepresentable
/// here rather than checked at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TeamSize {
    Three,
    Four,
    Five,
}

impl TeamSize {
    pub fn total(self) -> usize {
        match self {
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }

    /// Roster slots besides the lead.
    pub fn member_slots(self) -> usize {
        self.total() - 1
    }
}

impl From<TeamSize> for u8 {
    fn from(size: TeamSize) -> Self {
        size.total() as u8
    }
}

impl TryFrom<u8> for TeamSize {
    type Error = RegistrationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            5 => Ok(Self::Five),
            other => Err(RegistrationError::InvalidTeamSize(other)),
        }
    }
}

/// Full team registration as entered in the form.
///
/// Invariant: `members.len() == total_members.member_slots()` after every
/// mutation; [`crate::roster::RosterModel`] is the only writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRegistration {
    pub team_name: String,
    pub total_members: TeamSize,
    pub team_lead: TeamMember,
    pub members: Vec<TeamMember>,
}

impl TeamRegistration {
    /// Fresh form state: smallest team size, all slots empty.
    pub fn new() -> Self {
        let total_members = TeamSize::Three;
        Self {
            team_name: String::new(),
            total_members,
            team_lead: TeamMember::empty(),
            members: vec![TeamMember::empty(); total_members.member_slots()],
        }
    }
}

impl Default for TeamRegistration {
    fn default() -> Self {
        Self::new()
    }
}

/// Competition track selected upstream of the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub description: String,
    pub long_description: String,
    pub challenges: Vec<String>,
    pub tools: Vec<String>,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            long_description: String::new(),
            challenges: Vec::new(),
            tools: Vec::new(),
        }
    }

    pub fn with_profile(
        mut self,
        long_description: impl Into<String>,
        challenges: Vec<String>,
        tools: Vec<String>,
    ) -> Self {
        self.long_description = long_description.into();
        self.challenges = challenges;
        self.tools = tools;
        self
    }
}

/// Fee quote handed to the payment stage by an accepted submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: u64,
    pub currency: String,
}
