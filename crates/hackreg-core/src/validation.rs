use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{MemberField, TeamMember, TeamRegistration};

/// Addressable location of a single form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRef {
    TeamName,
    Lead(MemberField),
    Member { index: usize, field: MemberField },
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TeamName => write!(f, "team_name"),
            Self::Lead(field) => write!(f, "lead.{}", field.name()),
            Self::Member { index, field } => write!(f, "member[{index}].{}", field.name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    InvalidEmail,
    InvalidPhone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: FieldRef,
    pub kind: IssueKind,
}

/// Per-field result of submission validation.
///
/// Callers get the full issue list so the form can mark individual fields,
/// not a single pass/fail bit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    issues: Vec<FieldIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn contains(&self, field: FieldRef) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }

    fn push(&mut self, field: FieldRef, kind: IssueKind) {
        self.issues.push(FieldIssue { field, kind });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) missing or invalid", self.issues.len())
    }
}

/// Submission-time completeness check over a whole registration.
///
/// Emptiness is judged on trimmed values. Email and phone get the same
/// advisory shape checks the form inputs apply; a missing value is reported
/// as missing, never double-reported as malformed.
pub fn validate(registration: &TeamRegistration) -> ValidationReport {
    let mut report = ValidationReport::default();

    if registration.team_name.trim().is_empty() {
        report.push(FieldRef::TeamName, IssueKind::Missing);
    }

    check_member(&mut report, &registration.team_lead, FieldRef::Lead);
    for (index, member) in registration.members.iter().enumerate() {
        check_member(&mut report, member, |field| FieldRef::Member { index, field });
    }

    report
}

fn check_member(
    report: &mut ValidationReport,
    member: &TeamMember,
    at: impl Fn(MemberField) -> FieldRef,
) {
    for field in MemberField::ALL {
        let value = member.get(field);
        if value.trim().is_empty() {
            report.push(at(field), IssueKind::Missing);
            continue;
        }
        match field {
            MemberField::Email if !is_plausible_email(value) => {
                report.push(at(field), IssueKind::InvalidEmail);
            }
            MemberField::Phone if !is_plausible_phone(value) => {
                report.push(at(field), IssueKind::InvalidPhone);
            }
            _ => {}
        }
    }
}

fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

// Matches the form input pattern `[0-9+ -]+`, requiring at least one digit.
fn is_plausible_phone(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-'))
}
