use super::{
    task::LaunchTask,
    worker::{Worker, WorkerTask},
};
use crate::{BackTrace, server::ServerError};
use std::sync::{Arc, mpsc};

/// Dispatches launches over the workers of a device.
#[derive(Debug)]
pub(crate) struct Scheduler {
    workers: Vec<Worker>,
}

impl Scheduler {
    pub fn new(device: usize, num_workers: usize) -> std::io::Result<Self> {
        let workers = (0..num_workers.max(1))
            .map(|worker_id| Worker::new(device, worker_id))
            .collect::<std::io::Result<Vec<_>>>()?;

        Ok(Self { workers })
    }

    /// Execute the launch to completion.
    pub fn execute(&self, launch: LaunchTask) -> Result<(), ServerError> {
        let launch = Arc::new(launch);
        let (done, receive) = mpsc::channel();
        let mut dispatched = 0;

        let helpers = (launch.cube_count as usize).min(self.workers.len());
        for worker in self.workers.iter().take(helpers) {
            let sent = worker.send_task(WorkerTask {
                launch: launch.clone(),
                done: done.clone(),
            });
            if sent {
                dispatched += 1;
            }
        }
        core::mem::drop(done);

        if dispatched == 0 && launch.cube_count > 0 {
            return Err(ServerError::ServerUnhealthy {
                reason: "No worker available to execute the launch".into(),
                backtrace: BackTrace::capture(),
            });
        }

        for _ in 0..dispatched {
            if receive.recv().is_err() {
                return Err(ServerError::ServerUnhealthy {
                    reason: "A worker stopped while executing a launch".into(),
                    backtrace: BackTrace::capture(),
                });
            }
        }

        match launch.take_failure() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
