use cubedpl_runtime::{
    config::GlobalConfig,
    cube::{CubeContext, CubeCount, CubeDim},
    element::CubeElement,
    host::{AccessMode, HostBuffer},
    kernel::{CubeKernel, KernelBindings},
    runtime::{CpuDevice, CpuRuntime, Runtime},
    server::{Bindings, IoError, LaunchError, ServerError},
    utils,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

/// Adds one to every element, one element per unit.
struct AddOne {
    len: usize,
}

unsafe impl CubeKernel for AddOne {
    fn name(&self) -> &'static str {
        "add_one"
    }

    fn cube_dim(&self) -> CubeDim {
        CubeDim::new_1d(32)
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let values = bindings.array::<u32>(0);
        for unit in 0..cube.units() {
            let index = (cube.cube_pos * cube.units() + unit) as usize;
            if index < self.len {
                values.write(index, values.read(index) + 1);
            }
        }
    }
}

/// Reads one element past the end of the buffer.
struct OutOfBounds;

unsafe impl CubeKernel for OutOfBounds {
    fn name(&self) -> &'static str {
        "out_of_bounds"
    }

    fn cube_dim(&self) -> CubeDim {
        CubeDim::new_single()
    }

    fn execute(&self, _cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let values = bindings.array::<u32>(0);
        values.write(values.len(), 0);
    }
}

/// Cube 0 panics, every other cube waits on a flag that is never set.
struct WaitForever;

unsafe impl CubeKernel for WaitForever {
    fn name(&self) -> &'static str {
        "wait_forever"
    }

    fn cube_dim(&self) -> CubeDim {
        CubeDim::new_single()
    }

    fn execute(&self, cube: &CubeContext<'_>, bindings: &KernelBindings) {
        let flags = bindings.atomic(0);
        match cube.cube_pos {
            0 => panic!("cube {} failed", cube.cube_pos),
            _ => cube.spin_wait(|| flags.load(0, core::sync::atomic::Ordering::Acquire) != 0),
        }
    }
}

#[test]
fn launch_updates_buffer() {
    let client = CpuRuntime::client(&CpuDevice::default());
    let input: Vec<u32> = (0..100).collect();
    let handle = client.create_from_slice(&input).unwrap();

    client
        .launch(
            AddOne { len: 100 },
            CubeCount::new_1d(4),
            Bindings::new().with_buffer(handle.clone().binding()),
        )
        .unwrap();

    let output = client.read_array::<u32>(handle).unwrap();
    let expected: Vec<u32> = (1..101).collect();
    assert_eq!(output, expected);
}

#[test]
fn unchecked_launch_updates_buffer() {
    let client = CpuRuntime::client(&CpuDevice::default());
    let handle = client.create_from_slice(&[7u32; 40]).unwrap();

    // SAFETY: Units past `len` don't access the buffer.
    unsafe {
        client
            .launch_unchecked(
                AddOne { len: 40 },
                CubeCount::new_1d(2),
                Bindings::new().with_buffer(handle.clone().binding()),
            )
            .unwrap();
    }

    assert_eq!(client.read_array::<u32>(handle).unwrap(), vec![8u32; 40]);
}

#[test]
fn launches_execute_in_submission_order() {
    let client = CpuRuntime::client(&CpuDevice::default());
    let handle = client.create_from_slice(&[0u32; 64]).unwrap();

    for _ in 0..5 {
        client
            .launch(
                AddOne { len: 64 },
                CubeCount::new_1d(2),
                Bindings::new().with_buffer(handle.clone().binding()),
            )
            .unwrap();
    }
    client.write(&handle, u32::as_bytes(&[10, 10])).unwrap();

    let output = client.read_array::<u32>(handle).unwrap();
    assert_eq!(&output[..3], &[10, 10, 5]);
}

#[test]
fn out_of_bounds_access_is_reported_on_sync() {
    let client = CpuRuntime::client(&CpuDevice::new(1));
    let handle = client.create_from_slice(&[0u32; 4]).unwrap();

    client
        .launch(
            OutOfBounds,
            CubeCount::new_single(),
            Bindings::new().with_buffer(handle.binding()),
        )
        .unwrap();

    let err = client.sync().unwrap_err();
    match err {
        ServerError::KernelPanic { kernel, cube, .. } => {
            assert_eq!(kernel, "out_of_bounds");
            assert_eq!(cube, 0);
        }
        err => panic!("Unexpected error {err}"),
    }

    // The error is only reported once.
    client.sync().unwrap();
}

#[test]
fn failing_cube_aborts_waiting_cubes() {
    let client = CpuRuntime::client(&CpuDevice::new(2));
    let flags = client.create_from_slice(&[0u32]).unwrap();

    client
        .launch(
            WaitForever,
            CubeCount::new_1d(8),
            Bindings::new().with_buffer(flags.binding()),
        )
        .unwrap();

    assert!(matches!(
        client.sync(),
        Err(ServerError::KernelPanic { cube: 0, .. })
    ));
}

#[test]
fn callbacks_run_in_stream_order() {
    let client = CpuRuntime::client(&CpuDevice::default());
    let handle = client.create_from_slice(&[0u32; 32]).unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    let first = order.clone();
    client.on_complete(move || first.lock().unwrap().push(1));
    client
        .launch(
            AddOne { len: 32 },
            CubeCount::new_single(),
            Bindings::new().with_buffer(handle.clone().binding()),
        )
        .unwrap();
    let second = order.clone();
    client.on_complete(move || second.lock().unwrap().push(2));

    client.event().wait().unwrap();
    assert_eq!(*order.lock().unwrap(), vec![1, 2]);
}

#[test]
fn too_many_units_is_a_launch_error() {
    struct Huge;

    unsafe impl CubeKernel for Huge {
        fn name(&self) -> &'static str {
            "huge"
        }

        fn cube_dim(&self) -> CubeDim {
            CubeDim::new_1d(1 << 20)
        }

        fn execute(&self, _cube: &CubeContext<'_>, _bindings: &KernelBindings) {}
    }

    let client = CpuRuntime::client(&CpuDevice::default());
    let err = client
        .launch(Huge, CubeCount::new_single(), Bindings::new())
        .unwrap_err();

    assert!(matches!(err, LaunchError::TooManyResources(_)));
}

#[test]
fn memory_limit_is_out_of_memory() {
    let mut config = GlobalConfig::default();
    config.memory.max_bytes = Some(4096);
    let client = CpuRuntime::register(&CpuDevice::new(100), config);

    let _kept = client.empty(4096).unwrap();
    let err = client.empty(1).unwrap_err();
    assert!(matches!(err, IoError::OutOfMemory { .. }));
    assert_eq!(client.memory_usage().bytes_reserved, 4096);
}

#[test]
fn fill_and_sequence() {
    let client = CpuRuntime::client(&CpuDevice::default());
    let len = 10_000;
    let values = client.empty_array::<f32>(len).unwrap();
    let indices = client.empty_array::<u32>(len).unwrap();

    utils::fill(&client, &values, len, 2.5f32).unwrap();
    utils::sequence(&client, &indices, len).unwrap();

    let values = client.read_array::<f32>(values).unwrap();
    let indices = client.read_array::<u32>(indices).unwrap();
    assert!(values.iter().all(|v| *v == 2.5));
    assert_eq!(indices, (0..len as u32).collect::<Vec<_>>());
}

#[test]
fn host_buffer_copies_in_unless_no_init() {
    let client = CpuRuntime::client(&CpuDevice::default());

    let mut host = vec![7u32; 64];
    let buffer = HostBuffer::new(&client, &mut host, AccessMode::Write).unwrap();
    client
        .launch(
            AddOne { len: 64 },
            CubeCount::new_1d(2),
            Bindings::new().with_buffer(buffer.handle().clone().binding()),
        )
        .unwrap();
    buffer.finish().unwrap();
    assert_eq!(host, vec![8u32; 64]);

    let mut host = vec![7u32; 64];
    let buffer = HostBuffer::no_init(&client, &mut host, AccessMode::Write).unwrap();
    utils::fill(&client, buffer.handle(), 64, 3u32).unwrap();
    buffer.finish().unwrap();
    assert_eq!(host, vec![3u32; 64]);
}

#[test]
fn host_buffer_dropped_without_finish_keeps_host_data() {
    let client = CpuRuntime::client(&CpuDevice::default());
    let mut host = vec![7u32; 64];

    let buffer = HostBuffer::new(&client, &mut host, AccessMode::ReadWrite).unwrap();
    utils::fill(&client, buffer.handle(), 64, 3u32).unwrap();
    let handle = buffer.handle().clone();
    drop(buffer);

    assert_eq!(client.read_array::<u32>(handle).unwrap(), vec![3u32; 64]);
    assert_eq!(host, vec![7u32; 64]);
}

#[test]
fn read_only_host_buffer_is_not_copied_back() {
    let client = CpuRuntime::client(&CpuDevice::default());
    let host = vec![1u32; 32];

    let buffer = HostBuffer::read_only(&client, &host).unwrap();
    assert_eq!(buffer.mode(), AccessMode::Read);
    assert_eq!(
        client.read_array::<u32>(buffer.handle().clone()).unwrap(),
        host
    );
    buffer.finish().unwrap();
}
