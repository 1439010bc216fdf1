//! Searches along the diagonals of the merge of two sorted inputs.
//!
//! A diagonal `d` crosses the merge path at the coordinate `(i, j)`, `i + j = d`, where the merge
//! consumed `i` elements of `A` and `j` of `B`. The merge path takes `A` first on ties, the
//! balanced path alternates on ties so equal elements of both inputs are consumed in pairs.

use crate::Comparator;

/// Random access to a sorted sequence, on the host or on the device.
pub trait Sequence<T> {
    /// Number of elements.
    fn len(&self) -> usize;

    /// The element at `index`.
    fn at(&self, index: usize) -> T;

    /// Whether the sequence is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Copy> Sequence<T> for [T] {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn at(&self, index: usize) -> T {
        self[index]
    }
}

/// Coordinate of the balanced path on a diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BalancedPath {
    /// Elements of `A` before the coordinate.
    pub i: usize,
    /// Elements of `B` before the coordinate, including the partner of a split pair.
    pub j: usize,
    /// Whether the diagonal splits a pair of equal elements, the `B` element being counted in
    /// `j`.
    pub star: bool,
}

/// Intersection of the merge path with a diagonal.
///
/// Returns `(i, j)` with `i + j = diag`, `A[i - 1] <= B[j]` and `B[j - 1] < A[i]` when the
/// elements exist.
pub fn merge_path<T, S, C>(a: &S, b: &S, diag: usize, comp: &C) -> (usize, usize)
where
    S: Sequence<T> + ?Sized,
    C: Comparator<T>,
{
    debug_assert!(diag <= a.len() + b.len());

    let mut lo = diag.saturating_sub(b.len());
    let mut hi = diag.min(a.len());

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match comp.less(&b.at(diag - 1 - mid), &a.at(mid)) {
            true => hi = mid,
            false => lo = mid + 1,
        }
    }

    (lo, diag - lo)
}

/// Number of the first `end` elements of a sorted sequence ordered before `value`, searching
/// from `end`.
///
/// Gallops backward with a doubling step until an element ordered before `value` is found, then
/// binary searches the last step. Cheap when the answer is near `end`.
pub fn biased_lower_bound<T, S, C>(seq: &S, end: usize, value: &T, comp: &C) -> usize
where
    S: Sequence<T> + ?Sized,
    C: Comparator<T>,
{
    debug_assert!(end <= seq.len());

    let mut hi = end;
    let mut step = 1;

    let mut lo = loop {
        if hi == 0 {
            return 0;
        }

        let pivot = hi.saturating_sub(step);
        if comp.less(&seq.at(pivot), value) {
            break pivot + 1;
        }
        hi = pivot;
        step *= 2;
    };

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match comp.less(&seq.at(mid), value) {
            true => lo = mid + 1,
            false => hi = mid,
        }
    }

    lo
}

/// First index at or after `start` of an element ordered after `value`.
///
/// Gallops forward with a doubling step, then binary searches the last step.
pub fn upper_bound_from<T, S, C>(seq: &S, start: usize, value: &T, comp: &C) -> usize
where
    S: Sequence<T> + ?Sized,
    C: Comparator<T>,
{
    let mut lo = start;
    let mut step = 1;

    let mut hi = loop {
        if lo >= seq.len() {
            return seq.len();
        }

        let pivot = (lo + step - 1).min(seq.len() - 1);
        if comp.less(value, &seq.at(pivot)) {
            break pivot;
        }
        lo = pivot + 1;
        step *= 2;
    };

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match comp.less(value, &seq.at(mid)) {
            true => hi = mid,
            false => lo = mid + 1,
        }
    }

    hi
}

/// Intersection of the balanced path with a diagonal.
///
/// Starts from the merge path coordinate and redistributes the run of equal elements it ends
/// in: pairs of equal elements alternate, starting with `A`, and the excess of the longer run
/// follows the pairs.
pub fn balanced_path<T, S, C>(a: &S, b: &S, diag: usize, comp: &C) -> BalancedPath
where
    S: Sequence<T> + ?Sized,
    C: Comparator<T>,
{
    let (i, j) = merge_path(a, b, diag, comp);

    let pivot = match (i.checked_sub(1), j.checked_sub(1)) {
        (None, None) => return BalancedPath { i, j, star: false },
        (Some(ia), None) => a.at(ia),
        (None, Some(jb)) => b.at(jb),
        (Some(ia), Some(jb)) => {
            let (x, y) = (a.at(ia), b.at(jb));
            match comp.less(&x, &y) {
                true => y,
                false => x,
            }
        }
    };

    let a_start = biased_lower_bound(a, i, &pivot, comp);
    let b_start = biased_lower_bound(b, j, &pivot, comp);
    let a_run = upper_bound_from(a, a_start, &pivot, comp) - a_start;
    let b_run = upper_bound_from(b, b_start, &pivot, comp) - b_start;

    let consumed = diag - a_start - b_start;
    let pairs = a_run.min(b_run);

    if consumed <= 2 * pairs {
        let half = consumed.div_ceil(2);
        return BalancedPath {
            i: a_start + half,
            j: b_start + half,
            star: consumed % 2 == 1,
        };
    }

    let excess = consumed - 2 * pairs;
    match a_run > b_run {
        true => BalancedPath {
            i: a_start + pairs + excess,
            j: b_start + pairs,
            star: false,
        },
        false => BalancedPath {
            i: a_start + pairs,
            j: b_start + pairs + excess,
            star: false,
        },
    }
}

/// Walk the merge step by step for `diag` steps, alternating on ties starting with `A`.
///
/// Reference for [balanced_path], linear in `diag`.
pub fn walk_balanced_path<T, C: Comparator<T>>(
    a: &[T],
    b: &[T],
    diag: usize,
    comp: &C,
) -> BalancedPath {
    debug_assert!(diag <= a.len() + b.len());

    let (mut i, mut j) = (0, 0);
    let mut owed_b = false;

    for _ in 0..diag {
        let take_a = match (a.get(i), b.get(j)) {
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(x), Some(y)) if comp.less(x, y) => true,
            (Some(x), Some(y)) if comp.less(y, x) => false,
            _ => !owed_b,
        };

        match take_a {
            true => {
                owed_b = matches!(b.get(j), Some(y) if !comp.less(&a[i], y));
                i += 1;
            }
            false => {
                owed_b = false;
                j += 1;
            }
        }
    }

    match owed_b {
        true => BalancedPath {
            i,
            j: j + 1,
            star: true,
        },
        false => BalancedPath { i, j, star: false },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LessThan;
    use proptest::prelude::*;

    #[test]
    fn balanced_path_splits_runs_in_pairs() {
        let a = [3, 4, 4, 5, 5, 5, 5];
        let b = [3, 4, 4, 4, 5, 5, 5];
        let expected = BalancedPath {
            i: 3,
            j: 3,
            star: false,
        };

        assert_eq!(balanced_path(&a[..], &b[..], 6, &LessThan), expected);
        assert_eq!(walk_balanced_path(&a, &b, 6, &LessThan), expected);
    }

    #[test]
    fn balanced_path_marks_split_pairs() {
        let a = [5, 7];
        let b = [5, 9];
        let expected = BalancedPath {
            i: 1,
            j: 1,
            star: true,
        };

        assert_eq!(balanced_path(&a[..], &b[..], 1, &LessThan), expected);
        assert_eq!(walk_balanced_path(&a, &b, 1, &LessThan), expected);
    }

    #[test]
    fn merge_path_takes_a_first_on_ties() {
        let a = [1, 2, 2];
        let b = [2, 3];

        assert_eq!(merge_path(&a[..], &b[..], 0, &LessThan), (0, 0));
        assert_eq!(merge_path(&a[..], &b[..], 3, &LessThan), (3, 0));
        assert_eq!(merge_path(&a[..], &b[..], 4, &LessThan), (3, 1));
        assert_eq!(merge_path(&a[..], &b[..], 5, &LessThan), (3, 2));
    }

    #[test]
    fn biased_lower_bound_edges() {
        let values = [1, 2, 2, 2, 7];

        let values = &values[..];

        assert_eq!(biased_lower_bound(values, 5, &0, &LessThan), 0);
        assert_eq!(biased_lower_bound(values, 5, &2, &LessThan), 1);
        assert_eq!(biased_lower_bound(values, 5, &7, &LessThan), 4);
        assert_eq!(biased_lower_bound(values, 5, &8, &LessThan), 5);
        assert_eq!(biased_lower_bound(values, 3, &8, &LessThan), 3);
        assert_eq!(biased_lower_bound(&[] as &[i32], 0, &8, &LessThan), 0);
    }

    #[test]
    fn upper_bound_finds_the_end_of_the_run() {
        let values = &[1, 2, 2, 2, 2, 2, 7][..];

        assert_eq!(upper_bound_from(values, 1, &2, &LessThan), 6);
        assert_eq!(upper_bound_from(values, 6, &7, &LessThan), 7);
        assert_eq!(upper_bound_from(values, 0, &0, &LessThan), 0);
    }

    fn sorted(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(0u8..6, 0..max_len).prop_map(|mut values| {
            values.sort();
            values
        })
    }

    proptest! {
        #[test]
        fn balanced_path_matches_the_walk(a in sorted(40), b in sorted(40)) {
            for diag in 0..=a.len() + b.len() {
                prop_assert_eq!(
                    balanced_path(a.as_slice(), b.as_slice(), diag, &LessThan),
                    walk_balanced_path(&a, &b, diag, &LessThan),
                    "diag {}", diag
                );
            }
        }

        #[test]
        fn biased_lower_bound_matches_partition_point(values in sorted(100), value in 0u8..7) {
            prop_assert_eq!(
                biased_lower_bound(values.as_slice(), values.len(), &value, &LessThan),
                values.partition_point(|element| *element < value)
            );
        }

        #[test]
        fn upper_bound_matches_partition_point(values in sorted(100), value in 0u8..7) {
            let start = values.partition_point(|element| *element < value);
            prop_assert_eq!(
                upper_bound_from(values.as_slice(), start, &value, &LessThan),
                values.partition_point(|element| *element <= value)
            );
        }

        #[test]
        fn merge_path_is_a_valid_split(a in sorted(30), b in sorted(30)) {
            for diag in 0..=a.len() + b.len() {
                let (i, j) = merge_path(&a[..], &b[..], diag, &LessThan);
                prop_assert_eq!(i + j, diag);
                if i > 0 && j < b.len() {
                    prop_assert!(a[i - 1] <= b[j]);
                }
                if j > 0 && i < a.len() {
                    prop_assert!(b[j - 1] < a[i]);
                }
            }
        }
    }
}
