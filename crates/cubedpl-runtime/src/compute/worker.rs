use super::task::LaunchTask;
use std::{
    sync::{Arc, mpsc},
    thread,
};

/// Message sent to a worker: the launch to help with, and where to report completion.
pub(crate) struct WorkerTask {
    pub launch: Arc<LaunchTask>,
    pub done: mpsc::Sender<()>,
}

/// A worker thread executing cubes.
#[derive(Debug)]
pub(crate) struct Worker {
    tx: mpsc::Sender<WorkerTask>,
}

impl Worker {
    pub fn new(device: usize, worker_id: usize) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let inner_worker = InnerWorker { worker_id, rx };

        thread::Builder::new()
            .name(format!("cubedpl-device{device}-worker{worker_id}"))
            .spawn(move || inner_worker.work())?;

        Ok(Self { tx })
    }

    /// Returns false when the worker thread is gone.
    pub fn send_task(&self, task: WorkerTask) -> bool {
        self.tx.send(task).is_ok()
    }
}

struct InnerWorker {
    worker_id: usize,
    rx: mpsc::Receiver<WorkerTask>,
}

impl InnerWorker {
    fn work(self) {
        log::trace!("Worker {} started", self.worker_id);
        for task in self.rx.iter() {
            task.launch.run();
            // The scheduler may have stopped waiting if the device is shutting down.
            let _ = task.done.send(());
        }
        log::trace!("Worker {} stopped", self.worker_id);
    }
}
