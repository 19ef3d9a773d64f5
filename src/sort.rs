//! Deterministic ordering of member records by identifier.
//!
//! A recursive three-way quicksort with a median-of-three pivot, used to
//! put the record set in id order before snapshot export. Stable: records
//! sharing an id keep their original relative order.

use crate::member::Member;
use std::cmp::Ordering;

/// Sort records by id, ascending.
///
/// Empty and single-element inputs are returned unchanged. Records not yet
/// saved (`id == None`) order before all saved records.
pub fn sort_by_id(records: Vec<Member>) -> Vec<Member> {
    if records.len() <= 1 {
        return records;
    }

    let first = records[0].id;
    let middle = records[records.len() / 2].id;
    let last = records[records.len() - 1].id;
    let pivot = median_of_three(first, middle, last);

    let mut less = Vec::new();
    let mut equal = Vec::new();
    let mut greater = Vec::new();
    for record in records {
        match record.id.cmp(&pivot) {
            Ordering::Less => less.push(record),
            Ordering::Equal => equal.push(record),
            Ordering::Greater => greater.push(record),
        }
    }

    let mut sorted = sort_by_id(less);
    sorted.extend(equal);
    sorted.extend(sort_by_id(greater));
    sorted
}

/// Median of three candidate pivot keys.
///
/// `a` is the median when exactly one of `b`, `c` is below it; likewise for
/// `b`; otherwise `c` is.
fn median_of_three<K: Ord + Copy>(a: K, b: K, c: K) -> K {
    if (a > b) != (a > c) {
        a
    } else if (b > a) != (b > c) {
        b
    } else {
        c
    }
}
