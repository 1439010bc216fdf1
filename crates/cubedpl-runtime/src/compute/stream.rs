use super::{scheduler::Scheduler, task::LaunchTask};
use crate::{
    BackTrace,
    logging::ServerLogger,
    server::{Binding, Event, ServerError},
    storage::BytesResource,
};
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::mpsc,
    thread,
    time::Instant,
};

/// Work executed in order by the stream of a device.
pub(crate) enum StreamTask {
    Launch(LaunchTask),
    Write {
        resource: BytesResource,
        data: Vec<u8>,
        _binding: Binding,
    },
    Copy {
        src: BytesResource,
        dst: BytesResource,
        _bindings: [Binding; 2],
    },
    Callback(Box<dyn FnOnce() + Send>),
    Fence(Event),
}

/// The queue of a device: tasks are executed one after the other by a dedicated thread.
#[derive(Debug)]
pub(crate) struct Stream {
    sender: mpsc::Sender<StreamTask>,
}

impl Stream {
    pub fn start(device: usize, scheduler: Scheduler, logger: ServerLogger) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let state = StreamState {
            scheduler,
            logger,
            errors: Vec::new(),
        };

        thread::Builder::new()
            .name(format!("cubedpl-device{device}-stream"))
            .spawn(move || state.run(receiver))?;

        Ok(Self { sender })
    }

    pub fn enqueue(&self, task: StreamTask) -> Result<(), ServerError> {
        self.sender
            .send(task)
            .map_err(|_| ServerError::ServerUnhealthy {
                reason: "The device stream stopped".into(),
                backtrace: BackTrace::capture(),
            })
    }
}

struct StreamState {
    scheduler: Scheduler,
    logger: ServerLogger,
    errors: Vec<ServerError>,
}

impl StreamState {
    fn run(mut self, receiver: mpsc::Receiver<StreamTask>) {
        for task in receiver.iter() {
            match task {
                StreamTask::Launch(launch) => self.launch(launch),
                StreamTask::Write { resource, data, .. } => {
                    // SAFETY: Launches are executed to completion before the next task.
                    unsafe { resource.write(&data) }
                }
                StreamTask::Copy { src, dst, .. } => {
                    let size = src.size().min(dst.size());
                    // SAFETY: Launches are executed to completion before the next task.
                    unsafe { core::ptr::copy(src.ptr(), dst.ptr(), size) }
                }
                StreamTask::Callback(callback) => {
                    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
                        self.errors.push(ServerError::Generic {
                            reason: "A host callback panicked".into(),
                            backtrace: BackTrace::capture(),
                        });
                    }
                }
                StreamTask::Fence(event) => {
                    let result = match self.errors.drain(..).next() {
                        Some(err) => Err(err),
                        None => Ok(()),
                    };
                    event.complete(result);
                }
            }
        }

        log::trace!("Device stream stopped");
    }

    fn launch(&mut self, launch: LaunchTask) {
        let name = launch.kernel.name();
        let cube_count = launch.cube_count;
        let cube_dim = launch.cube_dim;
        let start = Instant::now();

        let result = self.scheduler.execute(launch);
        self.logger
            .register_launch(name, cube_count, cube_dim, start.elapsed());

        if let Err(err) = result {
            log::error!("Launch of `{name}` failed: {err}");
            self.errors.push(err);
        }
    }
}
