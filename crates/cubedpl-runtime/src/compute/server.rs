use super::{
    scheduler::Scheduler,
    stream::{Stream, StreamTask},
    task::LaunchTask,
};
use crate::{
    BackTrace,
    config::{GlobalConfig, Logger},
    cube::CubeCount,
    kernel::{CubeKernel, KernelBindings},
    logging::ServerLogger,
    memory_management::{MemoryManagement, MemoryUsage},
    server::{
        Binding, Bindings, ComputeServer, DeviceProperties, Event, ExecutionMode, Handle, IoError,
        LaunchError, PendingRead, ResourceLimitError,
    },
    storage::{BytesResource, BytesStorage},
};
use std::sync::Arc;

/// Server of the emulated device.
///
/// Allocations are served synchronously, every other operation is enqueued on the stream of the
/// device and executed in submission order.
#[derive(Debug)]
pub struct CpuServer {
    memory_management: MemoryManagement,
    stream: Stream,
    properties: DeviceProperties,
    spin_budget: u32,
}

impl CpuServer {
    /// Start a new device with the given configuration.
    pub fn new(device: usize, config: Arc<GlobalConfig>) -> std::io::Result<Self> {
        let execution = &config.execution;
        let properties = DeviceProperties {
            plane_size: execution.plane_size(),
            max_units_per_cube: execution.max_units_per_cube,
            max_shared_memory: execution.max_shared_memory,
            num_workers: execution.workers(),
            max_memory: config.memory.max_bytes,
        };

        let scheduler = Scheduler::new(device, properties.num_workers)?;
        let logger = ServerLogger::new(Logger::from_config(config.clone()));
        let stream = Stream::start(device, scheduler, logger)?;

        log::debug!("Started device {device} with {properties:?}");

        Ok(Self {
            memory_management: MemoryManagement::from_configuration(
                BytesStorage::default(),
                &config.memory,
            ),
            stream,
            spin_budget: execution.spin_budget,
            properties,
        })
    }

    fn resource(&self, binding: &Binding) -> Result<BytesResource, IoError> {
        self.memory_management.get_resource(&binding.memory)
    }

    fn validate(&self, kernel: &dyn CubeKernel) -> Result<(), LaunchError> {
        let units = kernel.cube_dim().num_elems();
        if units == 0 || units > self.properties.max_units_per_cube {
            return Err(ResourceLimitError::Units {
                requested: units,
                max: self.properties.max_units_per_cube,
                backtrace: BackTrace::capture(),
            }
            .into());
        }

        let shared_memory = kernel.shared_memory_size();
        if shared_memory > self.properties.max_shared_memory {
            return Err(ResourceLimitError::SharedMemory {
                requested: shared_memory,
                max: self.properties.max_shared_memory,
                backtrace: BackTrace::capture(),
            }
            .into());
        }

        Ok(())
    }
}

impl ComputeServer for CpuServer {
    fn create(&mut self, data: &[u8]) -> Result<Handle, IoError> {
        let handle = self.empty(data.len())?;
        self.write(handle.clone().binding(), data)?;
        Ok(handle)
    }

    fn empty(&mut self, size: usize) -> Result<Handle, IoError> {
        let memory = self.memory_management.reserve(size as u64)?;
        Ok(Handle::new(memory, size as u64))
    }

    fn read(&mut self, bindings: Vec<Binding>) -> Result<PendingRead, IoError> {
        let resources = bindings
            .into_iter()
            .map(|binding| Ok((self.resource(&binding)?, binding)))
            .collect::<Result<Vec<_>, IoError>>()?;

        Ok(PendingRead::new(self.event(), resources))
    }

    fn write(&mut self, binding: Binding, data: &[u8]) -> Result<(), IoError> {
        if data.len() as u64 > binding.size {
            return Err(IoError::SizeMismatch {
                expected: binding.size,
                actual: data.len() as u64,
                backtrace: BackTrace::capture(),
            });
        }

        let resource = self.resource(&binding)?;
        self.stream
            .enqueue(StreamTask::Write {
                resource,
                data: data.to_vec(),
                _binding: binding,
            })
            .map_err(|err| IoError::Execution(Box::new(err)))
    }

    fn copy(&mut self, src: Binding, dst: Binding) -> Result<(), IoError> {
        let src_resource = self.resource(&src)?;
        let dst_resource = self.resource(&dst)?;

        self.stream
            .enqueue(StreamTask::Copy {
                src: src_resource,
                dst: dst_resource,
                _bindings: [src, dst],
            })
            .map_err(|err| IoError::Execution(Box::new(err)))
    }

    unsafe fn launch(
        &mut self,
        kernel: Box<dyn CubeKernel>,
        count: CubeCount,
        bindings: Bindings,
        mode: ExecutionMode,
    ) -> Result<(), LaunchError> {
        self.validate(kernel.as_ref())?;

        let cube_count = count.num_cubes();
        if cube_count == 0 {
            return Ok(());
        }

        let resources = bindings
            .buffers
            .iter()
            .map(|binding| self.resource(binding))
            .collect::<Result<Vec<_>, IoError>>()?;

        let task = LaunchTask::new(
            kernel,
            KernelBindings::new(resources, mode),
            bindings.buffers,
            cube_count,
            self.properties.plane_size,
            self.spin_budget,
        );

        self.stream
            .enqueue(StreamTask::Launch(task))
            .map_err(|err| LaunchError::Unknown {
                reason: err.to_string(),
                backtrace: BackTrace::capture(),
            })
    }

    fn callback(&mut self, callback: Box<dyn FnOnce() + Send>) {
        if let Err(err) = self.stream.enqueue(StreamTask::Callback(callback)) {
            log::error!("Can't register the host callback: {err}");
        }
    }

    fn event(&mut self) -> Event {
        let event = Event::new();

        if let Err(err) = self.stream.enqueue(StreamTask::Fence(event.clone())) {
            event.complete(Err(err));
        }

        event
    }

    fn memory_usage(&self) -> MemoryUsage {
        self.memory_management.memory_usage()
    }

    fn memory_cleanup(&mut self) {
        self.memory_management.cleanup(true);
    }

    fn properties(&self) -> &DeviceProperties {
        &self.properties
    }
}
