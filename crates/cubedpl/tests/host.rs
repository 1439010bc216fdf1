use cubedpl::prelude::*;
use pretty_assertions::assert_eq;

type TestRuntime = CpuRuntime;

fn client() -> ComputeClient<<TestRuntime as Runtime>::Server> {
    TestRuntime::client(&CpuDevice::default())
}

#[test]
fn scan_in_place_with_init() {
    let client = client();
    let mut data: Vec<i64> = (1..=2000).collect();

    inclusive_scan_in_place::<TestRuntime, _, _>(&client, &mut data, Add, Some(-10)).unwrap();

    let expected: Vec<i64> = (1..=2000i64).map(|n| n * (n + 1) / 2 - 10).collect();
    assert_eq!(data, expected);
}

#[test]
fn exclusive_scan_starts_with_init() {
    let client = client();
    let input = [3u32, 9, 2, 7, 5];
    let mut output = [0u32; 5];

    exclusive_scan_slice::<TestRuntime, _, _>(&client, &input, &mut output, Max, Some(4)).unwrap();

    assert_eq!(output, [4, 4, 9, 9, 9]);
}

#[test]
fn reduce_of_slices() {
    let client = client();
    let values: Vec<u32> = (0..10_000).map(|i| (i * 7919) % 10_007).collect();

    let max = reduce_slice::<TestRuntime, _, _>(&client, &values, Max).unwrap();
    let sum = reduce_slice::<TestRuntime, _, _>(&client, &values, Add).unwrap();

    assert_eq!(max, *values.iter().max().unwrap());
    assert_eq!(sum, values.iter().sum::<u32>());
    assert_eq!(reduce_slice::<TestRuntime, u32, _>(&client, &[], Min).unwrap(), u32::MAX);
}

#[test]
fn argsort_is_stable() {
    let client = client();
    let keys = [5u16, 1, 5, 0, 1, 5];

    let ascending = argsort_slice::<TestRuntime, _>(&client, &keys, SortOrder::Ascending).unwrap();
    let descending =
        argsort_slice::<TestRuntime, _>(&client, &keys, SortOrder::Descending).unwrap();

    assert_eq!(ascending, vec![3, 1, 4, 0, 2, 5]);
    assert_eq!(descending, vec![0, 2, 5, 1, 4, 3]);
}
