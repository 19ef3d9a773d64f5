//! Member records and the rank state machine.
//!
//! A [`Member`] is the unit of storage: a common field struct tagged by a
//! closed [`Rank`] set. The JSON representation carries the rank name in a
//! `memberType` discriminator field, so a serialized record reads as one
//! concrete variant per rank even though the field layout is shared.
//!
//! Rank transitions move exactly one step up or down; the transition table
//! lives on [`Rank`] and the record rebuild lives in [`Member::with_rank`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Score bounds
// ============================================================================

/// Upper bound for the interview score (inclusive).
pub const INTERVIEW_SCORE_MAX: f64 = 15.0;

/// Upper bound for the internship score (inclusive).
pub const INTERNSHIP_SCORE_MAX: f64 = 20.0;

/// Upper bound for the salary score (inclusive).
pub const SALARY_SCORE_MAX: f64 = 5500.0;

/// Conversion factor applied to the internship score on regularization.
pub(crate) const REGULARIZE_FACTOR: f64 = 10.0;

// ============================================================================
// Rank
// ============================================================================

/// A member's position tier.
///
/// The set is closed: every stored record carries exactly one of these
/// three ranks, and the snapshot discriminator holds the variant name
/// verbatim. Transitions are bidirectional single steps with no skipping:
///
/// | Current | promoted() | demoted() |
/// |---|---|---|
/// | RegularMember | SectionHead | — |
/// | SectionHead | President | RegularMember |
/// | President | — | SectionHead |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rank {
    /// The lowest tier; the default for records with no discriminator.
    #[default]
    RegularMember,
    /// The middle tier.
    SectionHead,
    /// The highest tier.
    President,
}

impl Rank {
    /// The rank one step up, or `None` at the top of the ladder.
    pub fn promoted(self) -> Option<Rank> {
        match self {
            Rank::RegularMember => Some(Rank::SectionHead),
            Rank::SectionHead => Some(Rank::President),
            Rank::President => None,
        }
    }

    /// The rank one step down, or `None` at the bottom of the ladder.
    pub fn demoted(self) -> Option<Rank> {
        match self {
            Rank::RegularMember => None,
            Rank::SectionHead => Some(Rank::RegularMember),
            Rank::President => Some(Rank::SectionHead),
        }
    }

    /// The rank name exactly as it appears in the snapshot discriminator.
    pub fn as_str(self) -> &'static str {
        match self {
            Rank::RegularMember => "RegularMember",
            Rank::SectionHead => "SectionHead",
            Rank::President => "President",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Member
// ============================================================================

/// A stored member record.
///
/// All three score fields exist on every rank; which one is "active" is a
/// convention of the rank, not a structural difference. `id` is `None` only
/// before the first save; `join_date` is fixed at creation and survives rank
/// transitions unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Store-assigned identifier; absent only before first save.
    #[serde(default)]
    pub id: Option<u64>,

    /// Display name, non-empty.
    pub name: String,

    /// Twelve-digit student ID, unique across the store, immutable.
    #[serde(rename = "studentID")]
    pub student_id: String,

    /// Position tier; the snapshot discriminator.
    #[serde(rename = "memberType", default)]
    pub rank: Rank,

    /// Provisional (non-regularized) status; true at creation.
    #[serde(default = "default_probation")]
    pub on_probation: bool,

    /// Contact email, if known.
    #[serde(default)]
    pub email: Option<String>,

    /// Contact phone number, if known.
    #[serde(default)]
    pub phone_number: Option<String>,

    /// Interview score in `[0, 15]`.
    #[serde(default)]
    pub interview_score: f64,

    /// Internship score in `[0, 20]`; converted to salary on regularization.
    #[serde(default)]
    pub internship_score: f64,

    /// Salary score in `[0, 5500]`.
    #[serde(default)]
    pub salary_score: f64,

    /// Creation timestamp (`%Y-%m-%d %H:%M:%S`), never mutated.
    #[serde(default)]
    pub join_date: String,
}

fn default_probation() -> bool {
    true
}

impl Member {
    /// Create a fresh record with the given rank.
    ///
    /// Probation defaults to true and the join date is fixed to the current
    /// local time. Scores start at zero; contact fields start empty.
    pub fn new(name: impl Into<String>, student_id: impl Into<String>, rank: Rank) -> Self {
        Member {
            id: None,
            name: name.into(),
            student_id: student_id.into(),
            rank,
            on_probation: true,
            email: None,
            phone_number: None,
            interview_score: 0.0,
            internship_score: 0.0,
            salary_score: 0.0,
            join_date: current_timestamp(),
        }
    }

    /// Rebuild this record under a new rank.
    ///
    /// Carries name, student ID, contact fields, probation flag, and all
    /// three scores; `id` and `join_date` are copied verbatim. This is the
    /// record half of a rank transition; the store half (delete + reinsert
    /// under one lock) lives in the store.
    pub(crate) fn with_rank(&self, rank: Rank) -> Member {
        Member {
            rank,
            ..self.clone()
        }
    }
}

/// Current local time as a `%Y-%m-%d %H:%M:%S` string.
pub(crate) fn current_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ============================================================================
// Field validation
// ============================================================================

/// Validate and normalize a member name (trimmed, non-empty).
pub(crate) fn validate_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(Error::Validation("Name cannot be empty.".to_string()));
    }
    Ok(name.to_string())
}

/// Validate and normalize a student ID (trimmed, exactly 12 decimal digits).
pub(crate) fn validate_student_id(raw: &str) -> Result<String> {
    let student_id = raw.trim();
    if student_id.len() != 12 || !student_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Validation(
            "StudentID must be exactly 12 digits.".to_string(),
        ));
    }
    Ok(student_id.to_string())
}

/// Validate an interview score against `[0, 15]`.
pub(crate) fn validate_interview_score(value: f64) -> Result<f64> {
    if !(0.0..=INTERVIEW_SCORE_MAX).contains(&value) {
        return Err(Error::Validation(
            "Interview score must be between 0 and 15.".to_string(),
        ));
    }
    Ok(value)
}

/// Validate an internship score against `[0, 20]`.
pub(crate) fn validate_internship_score(value: f64) -> Result<f64> {
    if !(0.0..=INTERNSHIP_SCORE_MAX).contains(&value) {
        return Err(Error::Validation(
            "Internship score must be between 0 and 20.".to_string(),
        ));
    }
    Ok(value)
}

/// Validate a salary score against `[0, 5500]`.
pub(crate) fn validate_salary_score(value: f64) -> Result<f64> {
    if !(0.0..=SALARY_SCORE_MAX).contains(&value) {
        return Err(Error::Validation(
            "Salary score must be between 0 and 5500.".to_string(),
        ));
    }
    Ok(value)
}
