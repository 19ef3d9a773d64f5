//! Convenient imports for rosterdb.
//!
//! Re-exports the most commonly used types so you can get started with a
//! single import:
//!
//! ```ignore
//! use rosterdb::prelude::*;
//!
//! let roster = Roster::open("data/members.json")?;
//! roster.create(NewMember::new("Alice", "202100100000", Rank::RegularMember))?;
//! ```

// Main entry point
pub use crate::roster::{MemberUpdate, NewMember, Roster, RosterBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Record types
pub use crate::member::{Member, Rank};

// Snapshot diagnostics
pub use crate::snapshot::SnapshotReport;
