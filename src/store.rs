//! In-memory member store.
//!
//! A single order-preserving arena of records guarded by a
//! [`parking_lot::RwLock`]. Mutations serialize against each other and
//! against scans through the write lock, so a reader never observes a
//! duplicate id or a half-replaced record; reads never block other reads.
//!
//! # Thread Safety
//!
//! All operations are thread-safe. `MemberStore` is shared as
//! `Arc<MemberStore>`; every public method takes `&self`.
//!
//! # Identity
//!
//! Identifiers are allocated as the smallest non-negative integer not held
//! by a live record, so ids freed by deletion are reused and no two live
//! records ever share one.

use crate::error::{Error, Result};
use crate::member::Member;
use parking_lot::RwLock;
use std::collections::BTreeSet;

/// Smallest non-negative integer not present in `existing`.
///
/// Pure function of the current id set; deterministic even after deletions
/// free up small values for reuse.
pub(crate) fn next_id(existing: &BTreeSet<u64>) -> u64 {
    let mut candidate = 0;
    for &id in existing {
        if id == candidate {
            candidate += 1;
        } else if id > candidate {
            break;
        }
    }
    candidate
}

/// The member record arena.
///
/// Backing storage is an insertion-ordered `Vec`; records are keyed by id
/// through the access discipline (`save` replaces by id, lookups scan).
/// The roster facade layers uniqueness and existence errors on top; at this
/// level `delete_by_id` on a missing id is a no-op and `save` with a present
/// id is an unconditional replace.
pub struct MemberStore {
    records: RwLock<Vec<Member>>,
}

impl MemberStore {
    /// Create an empty store.
    pub fn new() -> Self {
        MemberStore {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Save a record, returning the stored copy with its id populated.
    ///
    /// A record without an id is assigned the smallest free one. A record
    /// with an id replaces any existing record under that id (delete +
    /// reinsert in one critical section).
    pub fn save(&self, mut member: Member) -> Member {
        let mut records = self.records.write();
        match member.id {
            None => {
                let ids: BTreeSet<u64> = records.iter().filter_map(|m| m.id).collect();
                member.id = Some(next_id(&ids));
            }
            Some(id) => {
                records.retain(|m| m.id != Some(id));
            }
        }
        records.push(member.clone());
        member
    }

    /// Save each record sequentially with per-record id assignment.
    pub fn save_all(&self, members: Vec<Member>) -> Vec<Member> {
        members.into_iter().map(|m| self.save(m)).collect()
    }

    /// Insert a brand-new record, enforcing student-ID uniqueness.
    ///
    /// The uniqueness check and the insert happen under one write lock, so
    /// two concurrent creates with the same student ID cannot both succeed.
    pub fn insert_unique(&self, mut member: Member) -> Result<Member> {
        let mut records = self.records.write();
        if records.iter().any(|m| m.student_id == member.student_id) {
            return Err(Error::DuplicateStudentId(member.student_id));
        }
        let ids: BTreeSet<u64> = records.iter().filter_map(|m| m.id).collect();
        member.id = Some(next_id(&ids));
        records.push(member.clone());
        Ok(member)
    }

    /// Atomically replace the record at `id` with one derived from it.
    ///
    /// Looks up the record, applies `rebuild` to a borrow of it, then removes
    /// the original and inserts the result under the same id, all in one
    /// critical section. Rank transitions and field updates go through here
    /// so a concurrent scan never sees the record absent or duplicated.
    ///
    /// Fails `NotFound` if no record holds `id`; an `Err` from `rebuild`
    /// leaves the store untouched.
    pub fn replace_with<F>(&self, id: u64, rebuild: F) -> Result<Member>
    where
        F: FnOnce(&Member) -> Result<Member>,
    {
        let mut records = self.records.write();
        let pos = records
            .iter()
            .position(|m| m.id == Some(id))
            .ok_or_else(|| Error::NotFound(format!("member id={id}")))?;
        let mut replacement = rebuild(&records[pos])?;
        replacement.id = Some(id);
        records.remove(pos);
        records.push(replacement.clone());
        Ok(replacement)
    }

    /// Point lookup by id.
    pub fn find_by_id(&self, id: u64) -> Option<Member> {
        self.records
            .read()
            .iter()
            .find(|m| m.id == Some(id))
            .cloned()
    }

    /// Point lookup by student ID.
    pub fn find_by_student_id(&self, student_id: &str) -> Option<Member> {
        self.records
            .read()
            .iter()
            .find(|m| m.student_id == student_id)
            .cloned()
    }

    /// All records, in insertion order.
    pub fn find_all(&self) -> Vec<Member> {
        self.records.read().clone()
    }

    /// All records matching `predicate`.
    pub fn find_where<P>(&self, predicate: P) -> Vec<Member>
    where
        P: Fn(&Member) -> bool,
    {
        self.records
            .read()
            .iter()
            .filter(|m| predicate(m))
            .cloned()
            .collect()
    }

    /// Whether a record holds `id`.
    pub fn exists_by_id(&self, id: u64) -> bool {
        self.records.read().iter().any(|m| m.id == Some(id))
    }

    /// Whether a record holds `student_id`.
    pub fn exists_by_student_id(&self, student_id: &str) -> bool {
        self.records
            .read()
            .iter()
            .any(|m| m.student_id == student_id)
    }

    /// Remove the record at `id`, returning whether one was removed.
    ///
    /// A missing id is a no-op, not an error; the facade surfaces existence
    /// where "not found" must be reported.
    pub fn delete_by_id(&self, id: u64) -> bool {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|m| m.id != Some(id));
        records.len() != before
    }

    /// Clear the store.
    pub fn delete_all(&self) {
        self.records.write().clear();
    }

    /// Replace the entire contents with `members`, preserving their order.
    ///
    /// Used by snapshot import and by sort-and-persist; the caller is
    /// responsible for the records already carrying valid, unique ids.
    pub fn replace_contents(&self, members: Vec<Member>) {
        *self.records.write() = members;
    }

    /// Number of live records.
    pub fn count(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for MemberStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::Rank;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn member(student_id: &str) -> Member {
        Member::new("Test", student_id, Rank::RegularMember)
    }

    // ========================================
    // Id allocation
    // ========================================

    #[test]
    fn next_id_starts_at_zero() {
        assert_eq!(next_id(&BTreeSet::new()), 0);
    }

    #[test]
    fn next_id_fills_gaps() {
        let ids: BTreeSet<u64> = [0, 1, 3, 4].into_iter().collect();
        assert_eq!(next_id(&ids), 2);
    }

    #[test]
    fn next_id_extends_past_contiguous_range() {
        let ids: BTreeSet<u64> = [0, 1, 2].into_iter().collect();
        assert_eq!(next_id(&ids), 3);
    }

    #[test]
    fn next_id_ignores_high_ids() {
        let ids: BTreeSet<u64> = [5, 9].into_iter().collect();
        assert_eq!(next_id(&ids), 0);
    }

    proptest! {
        #[test]
        fn next_id_is_smallest_free(ids in proptest::collection::btree_set(0u64..64, 0..32)) {
            let id = next_id(&ids);
            prop_assert!(!ids.contains(&id));
            for smaller in 0..id {
                prop_assert!(ids.contains(&smaller));
            }
        }
    }

    // ========================================
    // Save / replace semantics
    // ========================================

    #[test]
    fn save_assigns_id() {
        let store = MemberStore::new();
        let saved = store.save(member("202100100000"));
        assert_eq!(saved.id, Some(0));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn save_reuses_deleted_id() {
        let store = MemberStore::new();
        store.save(member("202100100000"));
        store.save(member("202100100001"));
        assert!(store.delete_by_id(0));
        let saved = store.save(member("202100100002"));
        assert_eq!(saved.id, Some(0));
    }

    #[test]
    fn save_with_id_replaces() {
        let store = MemberStore::new();
        let mut saved = store.save(member("202100100000"));
        saved.name = "Renamed".to_string();
        store.save(saved);
        assert_eq!(store.count(), 1);
        assert_eq!(store.find_by_id(0).unwrap().name, "Renamed");
    }

    #[test]
    fn insert_unique_rejects_duplicate_student_id() {
        let store = MemberStore::new();
        store.insert_unique(member("202100100000")).unwrap();
        let err = store.insert_unique(member("202100100000")).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn replace_with_keeps_id_and_is_single_record() {
        let store = MemberStore::new();
        let saved = store.save(member("202100100000"));
        let id = saved.id.unwrap();
        let replaced = store
            .replace_with(id, |m| Ok(m.with_rank(Rank::SectionHead)))
            .unwrap();
        assert_eq!(replaced.id, Some(id));
        assert_eq!(replaced.rank, Rank::SectionHead);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn replace_with_missing_id_is_not_found() {
        let store = MemberStore::new();
        let err = store
            .replace_with(42, |m| Ok(m.clone()))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn replace_with_error_leaves_store_untouched() {
        let store = MemberStore::new();
        let saved = store.save(member("202100100000"));
        let err = store
            .replace_with(saved.id.unwrap(), |_| {
                Err(Error::Validation("nope".to_string()))
            })
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.find_by_id(0).unwrap(), saved);
    }

    // ========================================
    // Lookups and deletes
    // ========================================

    #[test]
    fn find_by_student_id_matches_exactly() {
        let store = MemberStore::new();
        store.save(member("202100100000"));
        assert!(store.find_by_student_id("202100100000").is_some());
        assert!(store.find_by_student_id("202100100001").is_none());
    }

    #[test]
    fn find_where_filters() {
        let store = MemberStore::new();
        let mut a = member("202100100000");
        a.internship_score = 15.0;
        store.save(a);
        store.save(member("202100100001"));

        let hits = store.find_where(|m| m.internship_score > 10.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].student_id, "202100100000");
    }

    #[test]
    fn exists_checks() {
        let store = MemberStore::new();
        let saved = store.save(member("202100100000"));
        assert!(store.exists_by_id(saved.id.unwrap()));
        assert!(!store.exists_by_id(99));
        assert!(store.exists_by_student_id("202100100000"));
        assert!(!store.exists_by_student_id("202100100001"));
    }

    #[test]
    fn delete_missing_is_noop() {
        let store = MemberStore::new();
        assert!(!store.delete_by_id(7));
    }

    #[test]
    fn delete_all_clears() {
        let store = MemberStore::new();
        store.save(member("202100100000"));
        store.save(member("202100100001"));
        store.delete_all();
        assert!(store.is_empty());
    }

    #[test]
    fn save_all_assigns_sequential_ids() {
        let store = MemberStore::new();
        let saved = store.save_all(vec![
            member("202100100000"),
            member("202100100001"),
            member("202100100002"),
        ]);
        let ids: Vec<_> = saved.iter().map(|m| m.id.unwrap()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    // ========================================
    // Concurrency
    // ========================================

    #[test]
    fn concurrent_saves_never_share_ids() {
        let store = Arc::new(MemberStore::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    store.save(member(&format!("2021{:02}1{:05}", t, i)));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let all = store.find_all();
        let ids: BTreeSet<u64> = all.iter().filter_map(|m| m.id).collect();
        assert_eq!(all.len(), 400);
        assert_eq!(ids.len(), 400);
    }

    #[test]
    fn concurrent_replace_never_tears() {
        let store = Arc::new(MemberStore::new());
        let id = store.save(member("202100100000")).id.unwrap();

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    store
                        .replace_with(id, |m| {
                            Ok(m.with_rank(match m.rank {
                                Rank::RegularMember => Rank::SectionHead,
                                _ => Rank::RegularMember,
                            }))
                        })
                        .unwrap();
                }
            })
        };

        for _ in 0..200 {
            let all = store.find_all();
            assert_eq!(all.len(), 1);
            assert_eq!(all[0].id, Some(id));
        }
        writer.join().unwrap();
    }
}
