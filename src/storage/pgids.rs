//! # Sorted Page-Id Sets
//!
//! The freelist tracks reclaimable pages as sorted sequences of page ids.
//! When a transaction frees pages, the new ids are merged into the existing
//! set; the whole set is rewritten on every freelist flush, so sets are
//! built, merged, and discarded rather than mutated in place.
//!
//! ## Merge Algorithm
//!
//! `merge_into` produces the sorted multiset union of two already-sorted
//! inputs in O(|a|+|b|) with binary-search run-skipping: whichever input
//! currently has the smaller head is the *lead*; the longest prefix of the
//! lead that is <= the other input's head is bulk-copied, then the roles
//! swap. Freed-page runs tend to be contiguous, so this copies long runs
//! instead of interleaving element by element.
//!
//! ## Preconditions
//!
//! A destination smaller than `a.len() + b.len()` is a caller bug, not an
//! environmental condition, and panics rather than silently truncating the
//! freelist. Inputs must already be sorted; duplicates are kept, not
//! deduplicated.

/// Identifier of a fixed-size page within the database file.
///
/// Page 0's size is the unit of file growth. Id zero and the meta pages are
/// reserved by the transaction layer.
pub type PageId = u64;

/// Copies the sorted union of `a` and `b` into the front of `dst`.
///
/// Panics if `dst` is too small to hold the union.
pub fn merge_into(dst: &mut [PageId], a: &[PageId], b: &[PageId]) {
    assert!(
        dst.len() >= a.len() + b.len(),
        "merge destination too small: {} < {} + {}",
        dst.len(),
        a.len(),
        b.len()
    );

    if a.is_empty() {
        dst[..b.len()].copy_from_slice(b);
        return;
    }
    if b.is_empty() {
        dst[..a.len()].copy_from_slice(a);
        return;
    }

    let (mut lead, mut follow) = if b[0] < a[0] { (b, a) } else { (a, b) };
    let mut written = 0;

    loop {
        // Longest prefix of lead that does not pass follow's head.
        let run = lead.partition_point(|&id| id <= follow[0]);
        dst[written..written + run].copy_from_slice(&lead[..run]);
        written += run;
        if run >= lead.len() {
            break;
        }

        let rest = &lead[run..];
        lead = follow;
        follow = rest;
    }

    dst[written..written + follow.len()].copy_from_slice(follow);
}

/// Returns the sorted union of `a` and `b` as a new vector.
pub fn merge(a: &[PageId], b: &[PageId]) -> Vec<PageId> {
    if a.is_empty() {
        return b.to_vec();
    }
    if b.is_empty() {
        return a.to_vec();
    }

    let mut merged = vec![0; a.len() + b.len()];
    merge_into(&mut merged, a, b);
    merged
}

/// An ascending sequence of page ids.
///
/// Well-formed sets hold unique ids, but `merge` performs a multiset union
/// and does not deduplicate; callers must not feed overlapping sets and
/// expect dedup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageIdSet {
    ids: Vec<PageId>,
}

impl PageIdSet {
    pub fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Wraps an already-sorted vector without copying.
    pub fn from_sorted(ids: Vec<PageId>) -> Self {
        debug_assert!(ids.windows(2).all(|w| w[0] <= w[1]));
        Self { ids }
    }

    /// Sorts `ids` ascending and wraps the result.
    pub fn from_unsorted(mut ids: Vec<PageId>) -> Self {
        ids.sort_unstable();
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_slice(&self) -> &[PageId] {
        &self.ids
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageId> {
        self.ids.iter()
    }

    /// Sorted union of this set and `other`.
    pub fn merge(&self, other: &PageIdSet) -> PageIdSet {
        PageIdSet {
            ids: merge(&self.ids, &other.ids),
        }
    }

    pub fn into_vec(self) -> Vec<PageId> {
        self.ids
    }
}

impl From<Vec<PageId>> for PageIdSet {
    fn from(ids: Vec<PageId>) -> Self {
        Self::from_unsorted(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_interleaved_inputs() {
        let a = [4, 5, 6, 10, 11, 12, 13, 27];
        let b = [1, 3, 8, 9, 25, 30];

        let merged = merge(&a, &b);

        assert_eq!(merged, vec![1, 3, 4, 5, 6, 8, 9, 10, 11, 12, 13, 25, 27, 30]);
    }

    #[test]
    fn merge_with_long_runs() {
        let a = [4, 5, 6, 10, 11, 12, 13, 27, 35, 36];
        let b = [8, 9, 25, 30];

        let merged = merge(&a, &b);

        assert_eq!(
            merged,
            vec![4, 5, 6, 8, 9, 10, 11, 12, 13, 25, 27, 30, 35, 36]
        );
    }

    #[test]
    fn merge_empty_sides() {
        let a = [1, 2, 3];

        assert_eq!(merge(&a, &[]), vec![1, 2, 3]);
        assert_eq!(merge(&[], &a), vec![1, 2, 3]);
        assert_eq!(merge(&[], &[]), Vec::<PageId>::new());
    }

    #[test]
    fn merge_disjoint_ranges() {
        let a = [1, 2, 3];
        let b = [10, 11, 12];

        assert_eq!(merge(&a, &b), vec![1, 2, 3, 10, 11, 12]);
        assert_eq!(merge(&b, &a), vec![1, 2, 3, 10, 11, 12]);
    }

    #[test]
    fn merge_keeps_duplicates() {
        let a = [1, 5, 5, 9];
        let b = [5, 7];

        let merged = merge(&a, &b);

        assert_eq!(merged.len(), a.len() + b.len());
        assert_eq!(merged, vec![1, 5, 5, 5, 7, 9]);
    }

    #[test]
    fn merge_length_is_sum_of_inputs() {
        let a: Vec<PageId> = (0..100).map(|i| i * 3).collect();
        let b: Vec<PageId> = (0..50).map(|i| i * 7 + 1).collect();

        let merged = merge(&a, &b);

        assert_eq!(merged.len(), a.len() + b.len());
        assert!(merged.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn merge_is_multiset_union() {
        let a: Vec<PageId> = vec![2, 4, 4, 8, 16, 23, 42];
        let b: Vec<PageId> = vec![1, 4, 15, 16, 99];

        let merged = merge(&a, &b);

        let mut expected: Vec<PageId> = a.iter().chain(b.iter()).copied().collect();
        expected.sort_unstable();
        assert_eq!(merged, expected);
    }

    #[test]
    #[should_panic(expected = "merge destination too small")]
    fn merge_into_short_destination_panics() {
        let a = [1, 2, 3];
        let b = [4, 5];
        let mut dst = [0; 4];

        merge_into(&mut dst, &a, &b);
    }

    #[test]
    fn merge_into_oversized_destination() {
        let a = [2, 6];
        let b = [1, 9];
        let mut dst = [0; 6];

        merge_into(&mut dst, &a, &b);

        assert_eq!(&dst[..4], &[1, 2, 6, 9]);
    }

    #[test]
    fn set_from_unsorted_sorts() {
        let set = PageIdSet::from_unsorted(vec![9, 1, 5]);

        assert_eq!(set.as_slice(), &[1, 5, 9]);
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
    }

    #[test]
    fn set_merge() {
        let a = PageIdSet::from_sorted(vec![1, 4, 7]);
        let b = PageIdSet::from_sorted(vec![2, 4, 9]);

        let merged = a.merge(&b);

        assert_eq!(merged.as_slice(), &[1, 2, 4, 4, 7, 9]);
    }

    #[test]
    fn set_merge_with_empty_set() {
        let a = PageIdSet::from_sorted(vec![3, 5]);
        let empty = PageIdSet::new();

        assert_eq!(a.merge(&empty).as_slice(), &[3, 5]);
        assert_eq!(empty.merge(&a).as_slice(), &[3, 5]);
    }
}
