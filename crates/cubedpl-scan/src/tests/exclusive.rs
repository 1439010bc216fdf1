use crate::{ScanInstruction, exclusive_scan, multi_pass_inclusive_scan, tests::*};
use cubedpl_runtime::{element::Numeric, kernel::KernelParams, runtime::Runtime};
use pretty_assertions::assert_eq;

#[allow(missing_docs)]
#[macro_export]
macro_rules! testgen_scan_exclusive {
    () => {
        mod scan_exclusive {
            use super::*;

            $crate::testgen_scan_exclusive!(@group: [ty=[i8, u16, i32, u32, u64], sizes=[1, 10, 512, 4097, 100_000]]: [Add, Mul, Max, BitXor]);
            $crate::testgen_scan_exclusive!(@group: [ty=[f32], sizes=[1, 10, 512, 4097]]: [Add, Min]);

            #[test]
            fn test_exclusive_with_init() {
                $crate::tests::exclusive::test_exclusive_init::<TestRuntime>();
            }

            #[test]
            fn test_exclusive_many_tile_sums() {
                $crate::tests::exclusive::test_exclusive_many_tile_sums::<TestRuntime>();
            }
        }
    };
    (@group: [ty=[$($ty:ty),*], sizes=$sizes:expr]: $instrs:tt) => {
        $(
            $crate::testgen_scan_exclusive!(@ty: $ty, $sizes, $instrs);
        )*
    };
    (@ty: $ty:ty, $sizes:expr, [$($instr:ident),*]) => {
        $(
            paste::paste! {
                #[test]
                fn [<test_exclusive_ $ty:lower _ $instr:lower>]() {
                    for len in $sizes {
                        $crate::tests::exclusive::test_exclusive::<TestRuntime, $ty, _>(
                            len,
                            $crate::$instr,
                        );
                    }
                }

                #[test]
                fn [<test_multi_pass_ $ty:lower _ $instr:lower>]() {
                    for len in $sizes {
                        $crate::tests::exclusive::test_multi_pass_inclusive::<TestRuntime, $ty, _>(
                            len,
                            $crate::$instr,
                        );
                    }
                }
            }
        )*
    };
}

/// Compare the exclusive scan of random data with the serial scan.
pub fn test_exclusive<R: Runtime, N: Numeric, I: ScanInstruction<N>>(len: usize, instruction: I) {
    let client = R::client(&Default::default());
    let data = random_data::<N>(len, 99);
    let expected = reference_exclusive(&data, None, &instruction);

    let input = client.create_from_slice(&data).unwrap();
    let output = client.empty_array::<N>(len).unwrap();
    exclusive_scan::<R, N, I>(&client, &input, &output, len, instruction, None, None).unwrap();

    let actual = client.read_array::<N>(output).unwrap();
    assert_eq!(&actual[..len], &expected[..]);
}

/// Compare the multi-pass inclusive scan of random data with the serial scan.
pub fn test_multi_pass_inclusive<R: Runtime, N: Numeric, I: ScanInstruction<N>>(
    len: usize,
    instruction: I,
) {
    let client = R::client(&Default::default());
    let data = random_data::<N>(len, 5);
    let expected = reference_inclusive(&data, None, &instruction);

    let input = client.create_from_slice(&data).unwrap();
    let output = client.empty_array::<N>(len).unwrap();
    multi_pass_inclusive_scan::<R, N, I>(&client, &input, &output, len, instruction, None, None)
        .unwrap();

    let actual = client.read_array::<N>(output).unwrap();
    assert_eq!(&actual[..len], &expected[..]);
}

/// The first output is the initial value.
pub fn test_exclusive_init<R: Runtime>() {
    let client = R::client(&Default::default());
    let data = [3i32, 1, 4, 1, 5];

    let input = client.create_from_slice(&data).unwrap();
    let output = client.empty_array::<i32>(data.len()).unwrap();
    exclusive_scan::<R, i32, _>(&client, &input, &output, data.len(), crate::Add, Some(10), None)
        .unwrap();

    assert_eq!(
        client.read_array::<i32>(output).unwrap(),
        vec![10, 13, 14, 18, 19]
    );
}

/// More tile sums than elements in a tile: the carry scan loops over several chunks.
pub fn test_exclusive_many_tile_sums<R: Runtime>() {
    let client = R::client(&Default::default());
    let plane_dim = client.properties().plane_size;
    let params = KernelParams::new(1, plane_dim, "exclusive_scan_small");
    let len = plane_dim as usize * plane_dim as usize * 3 + 17;
    let data = random_data::<u64>(len, 11);
    let expected = reference_exclusive(&data, Some(1), &crate::Add);

    let input = client.create_from_slice(&data).unwrap();
    let output = client.empty_array::<u64>(len).unwrap();
    exclusive_scan::<R, u64, _>(&client, &input, &output, len, crate::Add, Some(1), Some(params))
        .unwrap();

    assert_eq!(client.read_array::<u64>(output).unwrap(), expected);
}
