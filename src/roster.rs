//! Main roster entry point.
//!
//! [`Roster`] owns the member store and a configured snapshot path, and
//! exposes the operations the HTTP/CLI adapters call: create, lookups,
//! partial update, delete, promote/demote, regularize, filtered listing,
//! and snapshot export/import.
//!
//! # Example
//!
//! ```ignore
//! use rosterdb::prelude::*;
//!
//! let roster = Roster::open("data/members.json")?;
//! let member = roster.create(NewMember::new("Alice", "202100100000", Rank::RegularMember))?;
//! roster.promote(member.id.unwrap())?;
//! roster.persist()?;
//! ```

use crate::error::{Error, Result};
use crate::member::{
    self, Member, Rank, REGULARIZE_FACTOR,
};
use crate::snapshot::{self, SnapshotReport};
use crate::sort;
use crate::store::MemberStore;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Default snapshot location, relative to the working directory.
const DEFAULT_SNAPSHOT_PATH: &str = "data/members.json";

// ============================================================================
// Requests
// ============================================================================

/// Fields for creating a member.
///
/// `name`, `student_id`, and `rank` are required; everything else is
/// optional and validated only when supplied.
#[derive(Debug, Clone)]
pub struct NewMember {
    /// Display name, non-empty after trim.
    pub name: String,
    /// Twelve-digit student ID.
    pub student_id: String,
    /// Initial rank; creation accepts any of the three.
    pub rank: Rank,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone_number: Option<String>,
    /// Probation flag override; defaults to true when absent.
    pub on_probation: Option<bool>,
    /// Interview score in `[0, 15]`.
    pub interview_score: Option<f64>,
    /// Internship score in `[0, 20]`.
    pub internship_score: Option<f64>,
    /// Salary score in `[0, 5500]`.
    pub salary_score: Option<f64>,
}

impl NewMember {
    /// A creation request with only the required fields set.
    pub fn new(name: impl Into<String>, student_id: impl Into<String>, rank: Rank) -> Self {
        NewMember {
            name: name.into(),
            student_id: student_id.into(),
            rank,
            email: None,
            phone_number: None,
            on_probation: None,
            interview_score: None,
            internship_score: None,
            salary_score: None,
        }
    }
}

/// Partial update for an existing member.
///
/// `name`, `on_probation`, and the scores change only when supplied.
/// `email` and `phone_number` are written through verbatim: leaving them
/// `None` clears the stored value. A supplied `rank` must equal the current
/// rank; rank changes go through promote/demote only.
#[derive(Debug, Clone, Default)]
pub struct MemberUpdate {
    /// Replacement name, when supplied.
    pub name: Option<String>,
    /// Must match the current rank when supplied; never changes it.
    pub rank: Option<Rank>,
    /// New email; `None` clears it.
    pub email: Option<String>,
    /// New phone number; `None` clears it.
    pub phone_number: Option<String>,
    /// Replacement probation flag, when supplied.
    pub on_probation: Option<bool>,
    /// Replacement interview score, when supplied.
    pub interview_score: Option<f64>,
    /// Replacement internship score, when supplied.
    pub internship_score: Option<f64>,
    /// Replacement salary score, when supplied.
    pub salary_score: Option<f64>,
}

// ============================================================================
// Roster
// ============================================================================

/// The member roster.
///
/// Create one with [`Roster::open`] (loads the snapshot at the given path)
/// or [`Roster::builder`]. All methods take `&self`; the roster can be
/// shared across threads behind an `Arc` or by reference.
pub struct Roster {
    store: Arc<MemberStore>,
    snapshot_path: PathBuf,
}

impl Roster {
    /// An empty roster with the default snapshot path.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Open a roster backed by the snapshot at `path`.
    ///
    /// A missing file yields an empty roster; unreadable entries in an
    /// existing file are skipped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().snapshot_path(path.as_ref()).open()
    }

    /// Create a builder for roster configuration.
    pub fn builder() -> RosterBuilder {
        RosterBuilder::new()
    }

    /// The configured snapshot path.
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    // ------------------------------------------------------------------------
    // Create / read
    // ------------------------------------------------------------------------

    /// Create a member.
    ///
    /// All supplied fields are validated before anything is written; the
    /// duplicate-studentID check and the insert share one critical section.
    /// Returns the stored record with its id populated.
    pub fn create(&self, request: NewMember) -> Result<Member> {
        let name = member::validate_name(&request.name)?;
        let student_id = member::validate_student_id(&request.student_id)?;
        let interview = request
            .interview_score
            .map(member::validate_interview_score)
            .transpose()?;
        let internship = request
            .internship_score
            .map(member::validate_internship_score)
            .transpose()?;
        let salary = request
            .salary_score
            .map(member::validate_salary_score)
            .transpose()?;

        let mut record = Member::new(name, student_id, request.rank);
        record.email = request.email;
        record.phone_number = request.phone_number;
        if let Some(flag) = request.on_probation {
            record.on_probation = flag;
        }
        if let Some(score) = interview {
            record.interview_score = score;
        }
        if let Some(score) = internship {
            record.internship_score = score;
        }
        if let Some(score) = salary {
            record.salary_score = score;
        }

        self.store.insert_unique(record)
    }

    /// Look up a member by id.
    pub fn get(&self, id: u64) -> Result<Member> {
        self.store
            .find_by_id(id)
            .ok_or_else(|| Error::NotFound(format!("member id={id}")))
    }

    /// Look up a member by student ID.
    pub fn get_by_student_id(&self, student_id: &str) -> Result<Member> {
        self.store
            .find_by_student_id(student_id)
            .ok_or_else(|| Error::NotFound(format!("member studentID={student_id}")))
    }

    /// All members, in insertion order.
    pub fn list(&self) -> Vec<Member> {
        self.store.find_all()
    }

    /// Members matching an arbitrary predicate.
    pub fn list_where<P>(&self, predicate: P) -> Vec<Member>
    where
        P: Fn(&Member) -> bool,
    {
        self.store.find_where(predicate)
    }

    /// Members with exactly this name.
    pub fn list_by_name(&self, name: &str) -> Vec<Member> {
        self.store.find_where(|m| m.name == name)
    }

    /// Members whose probation flag matches.
    pub fn list_on_probation(&self, on_probation: bool) -> Vec<Member> {
        self.store.find_where(|m| m.on_probation == on_probation)
    }

    /// Members holding this rank.
    pub fn list_by_rank(&self, rank: Rank) -> Vec<Member> {
        self.store.find_where(|m| m.rank == rank)
    }

    /// Members with an internship score strictly above `threshold`.
    pub fn list_internship_above(&self, threshold: f64) -> Vec<Member> {
        self.store.find_where(|m| m.internship_score > threshold)
    }

    /// Number of members.
    pub fn count(&self) -> usize {
        self.store.count()
    }

    // ------------------------------------------------------------------------
    // Update / delete
    // ------------------------------------------------------------------------

    /// Apply a partial update to the member at `id`.
    ///
    /// Every supplied field is validated against the current record before
    /// any of it is applied; a failure leaves the record unchanged. The
    /// student ID, id, and join date are immutable here, and a rank change
    /// is rejected: promote/demote are the only rank mutators.
    pub fn update(&self, id: u64, update: MemberUpdate) -> Result<Member> {
        self.store.replace_with(id, |current| {
            let mut updated = current.clone();

            if let Some(raw) = &update.name {
                updated.name = member::validate_name(raw)?;
            }
            if let Some(rank) = update.rank {
                if rank != current.rank {
                    return Err(Error::InvalidTransition(format!(
                        "changing rank via update is not supported (member id={id} is {}); use promote/demote",
                        current.rank
                    )));
                }
            }
            if let Some(score) = update.interview_score {
                updated.interview_score = member::validate_interview_score(score)?;
            }
            if let Some(score) = update.internship_score {
                updated.internship_score = member::validate_internship_score(score)?;
            }
            if let Some(score) = update.salary_score {
                updated.salary_score = member::validate_salary_score(score)?;
            }
            if let Some(flag) = update.on_probation {
                updated.on_probation = flag;
            }
            updated.email = update.email.clone();
            updated.phone_number = update.phone_number.clone();

            Ok(updated)
        })
    }

    /// Delete the member at `id`.
    pub fn delete(&self, id: u64) -> Result<()> {
        if !self.store.delete_by_id(id) {
            return Err(Error::NotFound(format!("member id={id}")));
        }
        Ok(())
    }

    /// Remove every member.
    pub fn delete_all(&self) {
        self.store.delete_all();
    }

    // ------------------------------------------------------------------------
    // Rank transitions
    // ------------------------------------------------------------------------

    /// Promote the member at `id` one rank.
    ///
    /// The record is rebuilt under the target rank with all shared fields
    /// carried over and id/joinDate copied verbatim, then swapped in
    /// atomically (delete + reinsert in one critical section).
    pub fn promote(&self, id: u64) -> Result<Member> {
        self.store.replace_with(id, |current| {
            let target = current.rank.promoted().ok_or_else(|| {
                Error::InvalidTransition(format!("member id={id} is already at the highest rank"))
            })?;
            Ok(current.with_rank(target))
        })
    }

    /// Demote the member at `id` one rank.
    pub fn demote(&self, id: u64) -> Result<Member> {
        self.store.replace_with(id, |current| {
            let target = current.rank.demoted().ok_or_else(|| {
                Error::InvalidTransition(format!("member id={id} is already at the lowest rank"))
            })?;
            Ok(current.with_rank(target))
        })
    }

    /// End the member's probation.
    ///
    /// Clears the probation flag, converts the internship score into salary
    /// score (×10), and zeroes the internship score. Fails `InvalidState`
    /// if the member is not currently on probation.
    pub fn regularize(&self, id: u64) -> Result<Member> {
        self.store.replace_with(id, |current| {
            if !current.on_probation {
                return Err(Error::InvalidState(format!(
                    "member id={id} is not on probation"
                )));
            }
            let mut updated = current.clone();
            updated.on_probation = false;
            updated.salary_score = current.internship_score * REGULARIZE_FACTOR;
            updated.internship_score = 0.0;
            Ok(updated)
        })
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Export the current record set as a JSON snapshot at `path`.
    pub fn export_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        snapshot::write_snapshot(path.as_ref(), &self.store.find_all())
    }

    /// Replace the roster contents with the snapshot at `path`.
    ///
    /// Unreadable entries and entries duplicating an already-imported
    /// student ID are skipped and reported, never fatal. A missing file
    /// imports as empty. Import is an I/O boundary operation and assumes a
    /// single writer.
    pub fn import_snapshot(&self, path: impl AsRef<Path>) -> Result<SnapshotReport> {
        let (decoded, mut report) = snapshot::read_snapshot(path.as_ref())?;

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(decoded.len());
        for record in decoded {
            if !seen.insert(record.student_id.clone()) {
                warn!(
                    "skipping snapshot entry with duplicate student ID {}",
                    record.student_id
                );
                report.loaded -= 1;
                report.skipped += 1;
                report
                    .errors
                    .push(format!("duplicate student ID {}", record.student_id));
                continue;
            }
            unique.push(record);
        }

        self.store.delete_all();
        self.store.save_all(unique);
        info!("imported {} members", self.store.count());
        Ok(report)
    }

    /// Export to the configured snapshot path.
    pub fn persist(&self) -> Result<()> {
        self.export_snapshot(&self.snapshot_path)
    }

    /// Order the roster by id and write it out.
    ///
    /// Applies the three-way quicksort to the record set, replaces the
    /// store contents with the ordered sequence, and exports to the
    /// configured path.
    pub fn sort_and_persist(&self) -> Result<()> {
        let sorted = sort::sort_by_id(self.store.find_all());
        self.store.replace_contents(sorted);
        self.persist()
    }

    /// Seed one member of each rank and persist.
    ///
    /// Intended for an empty roster; fails with a duplicate error if the
    /// sample student IDs are already taken.
    pub fn seed_sample_data(&self) -> Result<()> {
        let mut regular = NewMember::new("张三", "202100100000", Rank::RegularMember);
        regular.interview_score = Some(8.5);
        let mut section_head = NewMember::new("李四", "202100200000", Rank::SectionHead);
        section_head.internship_score = Some(18.0);
        let mut president = NewMember::new("王五", "202100300000", Rank::President);
        president.salary_score = Some(950.0);

        self.create(regular)?;
        self.create(section_head)?;
        self.create(president)?;
        self.persist()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for roster configuration.
///
/// # Example
///
/// ```ignore
/// // Load an existing snapshot
/// let roster = Roster::builder()
///     .snapshot_path("data/members.json")
///     .open()?;
///
/// // Start empty, same path for later persists
/// let roster = Roster::builder()
///     .snapshot_path("data/members.json")
///     .build();
/// ```
pub struct RosterBuilder {
    snapshot_path: PathBuf,
}

impl RosterBuilder {
    /// A builder with the default snapshot path.
    pub fn new() -> Self {
        RosterBuilder {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
        }
    }

    /// Set the snapshot path used by `open`, `persist`, and
    /// `sort_and_persist`.
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }

    /// Build an empty roster.
    pub fn build(self) -> Roster {
        Roster {
            store: Arc::new(MemberStore::new()),
            snapshot_path: self.snapshot_path,
        }
    }

    /// Build a roster and load the snapshot at the configured path.
    pub fn open(self) -> Result<Roster> {
        let roster = self.build();
        let report = roster.import_snapshot(roster.snapshot_path.clone())?;
        if !report.is_clean() {
            warn!("{}", report.summary());
        }
        Ok(roster)
    }
}

impl Default for RosterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_default_path() {
        let roster = Roster::new();
        assert_eq!(
            roster.snapshot_path(),
            Path::new("data/members.json")
        );
    }

    #[test]
    fn create_trims_and_assigns_id() {
        let roster = Roster::new();
        let m = roster
            .create(NewMember::new("  Alice ", " 202100100000 ", Rank::RegularMember))
            .unwrap();
        assert_eq!(m.id, Some(0));
        assert_eq!(m.name, "Alice");
        assert_eq!(m.student_id, "202100100000");
        assert!(m.on_probation);
    }

    #[test]
    fn create_rejects_before_any_write() {
        let roster = Roster::new();
        let mut request = NewMember::new("Bob", "202100100001", Rank::RegularMember);
        request.interview_score = Some(85.0);
        let err = roster.create(request).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: Interview score must be between 0 and 15."
        );
        assert_eq!(roster.count(), 0);
    }

    #[test]
    fn update_rejects_rank_change() {
        let roster = Roster::new();
        let m = roster
            .create(NewMember::new("Carol", "202100100002", Rank::SectionHead))
            .unwrap();
        let err = roster
            .update(
                m.id.unwrap(),
                MemberUpdate {
                    rank: Some(Rank::President),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
        assert_eq!(roster.get(m.id.unwrap()).unwrap().rank, Rank::SectionHead);
    }

    #[test]
    fn update_writes_contact_fields_through() {
        let roster = Roster::new();
        let mut request = NewMember::new("Dave", "202100100003", Rank::RegularMember);
        request.email = Some("dave@example.com".to_string());
        let m = roster.create(request).unwrap();

        let updated = roster
            .update(m.id.unwrap(), MemberUpdate::default())
            .unwrap();
        assert_eq!(updated.email, None);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let roster = Roster::new();
        assert!(roster.delete(9).unwrap_err().is_not_found());
    }
}
