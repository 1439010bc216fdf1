
use crate::SetOperation;
use rand::{Rng, SeedableRng, distr::Uniform, rngs::StdRng};
use std::collections::BTreeMap;

#[allow(missing_docs)]
#[macro_export]
macro_rules! testgen_set {
    () => {
        mod test_set {
            use super::*;

            $crate::testgen_set!(@group: [ty=[u16, u32, i32, u64], sizes=[(0, 0), (0, 7), (7, 0), (1, 1), (100, 37), (2000, 2500), (20_000, 9_000)]]);

            #[test]
            fn test_set_union_overlapping() {
                $crate::tests::set::test_set_union_overlapping::<TestRuntime>();
            }

            #[test]
            fn test_set_intersection_with_duplicates() {
                $crate::tests::set::test_set_intersection_with_duplicates::<TestRuntime>();
            }

            #[test]
            fn test_set_differences_with_duplicates() {
                $crate::tests::set::test_set_differences_with_duplicates::<TestRuntime>();
            }

            #[test]
            fn test_set_split_runs() {
                $crate::tests::set::test_set_split_runs::<TestRuntime>();
            }

            #[test]
            fn test_set_descending() {
                $crate::tests::set::test_set_descending::<TestRuntime>();
            }

            #[test]
            fn test_set_compare_fn() {
                $crate::tests::set::test_set_compare_fn::<TestRuntime>();
            }

            #[test]
            fn test_set_larger_buffers() {
                $crate::tests::set::test_set_larger_buffers::<TestRuntime>();
            }

            #[test]
            fn test_set_buffer_too_small() {
                $crate::tests::set::test_set_buffer_too_small::<TestRuntime>();
            }

            #[test]
            fn test_merge_is_stable() {
                $crate::tests::merge::test_merge_is_stable::<TestRuntime>();
            }

            #[test]
            fn test_merge_empty() {
                $crate::tests::merge::test_merge_empty::<TestRuntime>();
            }
        }
    };
    (@group: [ty=[$($ty:ty),*], sizes=$sizes:expr]) => {
        $(
            paste::paste! {
                #[test]
                fn [<test_set_operations_ $ty:lower>]() {
                    for (a_len, b_len) in $sizes {
                        for op in $crate::tests::OPERATIONS {
                            $crate::tests::set::test_set_operation::<TestRuntime, $ty>(op, a_len, b_len);
                        }
                    }
                }

                #[test]
                fn [<test_merge_ $ty:lower>]() {
                    for (a_len, b_len) in $sizes {
                        $crate::tests::merge::test_merge::<TestRuntime, $ty>(a_len, b_len);
                    }
                }
            }
        )*
    };
}

/// Every set operation.
pub const OPERATIONS: [SetOperation; 4] = [
    SetOperation::Union,
    SetOperation::Intersection,
    SetOperation::Difference,
    SetOperation::SymmetricDifference,
];

/// Sorted random values in `[0, range)`, with duplicates when `range` is small.
pub fn random_sorted<T: From<u8> + Ord>(len: usize, range: u8, seed: u64) -> Vec<T> {
    let mut values: Vec<T> = StdRng::seed_from_u64(seed)
        .sample_iter(Uniform::<u8>::new(0, range).unwrap())
        .take(len)
        .map(T::from)
        .collect();
    values.sort();
    values
}

/// Set operation computed from the multiplicities of both inputs.
pub fn reference_set_op<T: Ord + Copy>(a: &[T], b: &[T], op: SetOperation) -> Vec<T> {
    let mut counts = BTreeMap::<T, (usize, usize)>::new();
    for value in a {
        counts.entry(*value).or_default().0 += 1;
    }
    for value in b {
        counts.entry(*value).or_default().1 += 1;
    }

    counts
        .into_iter()
        .flat_map(|(value, (in_a, in_b))| {
            let count = match op {
                SetOperation::Union => in_a.max(in_b),
                SetOperation::Intersection => in_a.min(in_b),
                SetOperation::Difference => in_a.saturating_sub(in_b),
                SetOperation::SymmetricDifference => in_a.abs_diff(in_b),
            };
            core::iter::repeat_n(value, count)
        })
        .collect()
}
