//! # rosterdb
//!
//! Embedded member roster store with ranked advancement and JSON snapshots.
//!
//! rosterdb keeps a set of organizational member records in memory, assigns
//! identifiers, enforces student-ID uniqueness, governs promotion and
//! demotion through a three-rank state machine, and persists the record set
//! as a discriminated JSON array.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rosterdb::prelude::*;
//!
//! // Open a roster backed by a snapshot file
//! let roster = Roster::open("data/members.json")?;
//!
//! // Create a member
//! let alice = roster.create(NewMember::new("Alice", "202100100000", Rank::RegularMember))?;
//!
//! // Advance her one rank, then write everything out in id order
//! roster.promote(alice.id.unwrap())?;
//! roster.sort_and_persist()?;
//! ```
//!
//! ## Pieces
//!
//! - [`Roster`] - the facade: create/get/update/delete, rank transitions,
//!   regularization, filtered listing, snapshot export/import
//! - [`MemberStore`] - the lock-guarded record arena with smallest-free-id
//!   allocation and atomic replace-by-id
//! - [`Member`] / [`Rank`] - the record and the closed rank set
//! - [`snapshot`] - the JSON-array codec with per-element decode tolerance
//! - [`sort_by_id`] - deterministic id ordering used before export
//!
//! ## Concurrency
//!
//! Every operation takes `&self`; share a [`Roster`] across threads behind
//! an `Arc` or by reference. Mutations serialize through a write lock so
//! scans never observe a torn record; reads never block other reads.
//! Snapshot file I/O assumes a single writer per path.

#![warn(missing_docs)]

mod error;
mod member;
mod roster;
mod sort;
mod store;

pub mod prelude;
pub mod snapshot;

// Re-export main entry points
pub use error::{Error, Result};
pub use roster::{MemberUpdate, NewMember, Roster, RosterBuilder};

// Re-export record types and the store
pub use member::{
    Member, Rank, INTERNSHIP_SCORE_MAX, INTERVIEW_SCORE_MAX, SALARY_SCORE_MAX,
};
pub use snapshot::SnapshotReport;
pub use sort::sort_by_id;
pub use store::MemberStore;

/// Current version of rosterdb.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
