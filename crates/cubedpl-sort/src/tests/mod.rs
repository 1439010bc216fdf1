
use crate::RadixKey;
use half::f16;
use rand::{Rng, SeedableRng, distr::Uniform, rngs::StdRng};

#[allow(missing_docs)]
#[macro_export]
macro_rules! testgen_sort {
    () => {
        mod test_sort {
            use super::*;

            $crate::testgen_sort!(@group: [ty=[u8, u16, u32, u64, i8, i16, i32, i64, f32, f64], sizes=[0, 1, 2, 100, 2048, 4097, 100_000]]);

            #[test]
            fn test_sort_f16() {
                for len in [1, 100, 5000] {
                    $crate::tests::sort::test_sort_keys::<TestRuntime, half::f16>(len, $crate::SortOrder::Ascending);
                    $crate::tests::sort::test_sort_keys::<TestRuntime, half::f16>(len, $crate::SortOrder::Descending);
                }
            }

            #[test]
            fn test_sort_special_floats() {
                $crate::tests::sort::test_sort_special_floats::<TestRuntime>();
            }

            #[test]
            fn test_sort_small_tiles() {
                $crate::tests::sort::test_sort_small_tiles::<TestRuntime>();
            }

            #[test]
            fn test_argsort() {
                $crate::tests::sort::test_argsort::<TestRuntime>();
            }

            #[test]
            fn test_sort_larger_user_buffer() {
                $crate::tests::sort::test_sort_larger_user_buffer::<TestRuntime>();
            }
        }
    };
    (@group: [ty=[$($ty:ty),*], sizes=$sizes:expr]) => {
        $(
            paste::paste! {
                #[test]
                fn [<test_sort_ $ty:lower _ascending>]() {
                    for len in $sizes {
                        $crate::tests::sort::test_sort_keys::<TestRuntime, $ty>(len, $crate::SortOrder::Ascending);
                    }
                }

                #[test]
                fn [<test_sort_ $ty:lower _descending>]() {
                    for len in $sizes {
                        $crate::tests::sort::test_sort_keys::<TestRuntime, $ty>(len, $crate::SortOrder::Descending);
                    }
                }

                #[test]
                fn [<test_sort_pairs_ $ty:lower>]() {
                    for len in $sizes {
                        $crate::tests::sort::test_sort_pairs::<TestRuntime, $ty>(len, $crate::SortOrder::Ascending);
                        $crate::tests::sort::test_sort_pairs::<TestRuntime, $ty>(len, $crate::SortOrder::Descending);
                    }
                }
            }
        )*
    };
}

/// Keys built from small integers, so the tests can control the number of duplicates.
pub trait TestKey: RadixKey {
    /// Convert the integer into a key, wrapping for unsigned keys.
    fn from_i64(value: i64) -> Self;
}

macro_rules! test_key_int {
    ($($ty:ty),*) => {
        $(
            impl TestKey for $ty {
                fn from_i64(value: i64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

test_key_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl TestKey for f32 {
    fn from_i64(value: i64) -> Self {
        value as f32 / 4.0
    }
}

impl TestKey for f64 {
    fn from_i64(value: i64) -> Self {
        value as f64 / 4.0
    }
}

impl TestKey for f16 {
    fn from_i64(value: i64) -> Self {
        f16::from_f32(value as f32 / 4.0)
    }
}

/// Random keys in `[-range, range)`.
pub fn random_keys<K: TestKey>(len: usize, range: i64, seed: u64) -> Vec<K> {
    StdRng::seed_from_u64(seed)
        .sample_iter(Uniform::<i64>::new(-range, range).unwrap())
        .take(len)
        .map(K::from_i64)
        .collect()
}
