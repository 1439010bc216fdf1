use crate::{Backend, Waitable};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Number of submissions in flight on a resource.
#[derive(Debug, Clone, Default)]
pub struct Load {
    count: Arc<AtomicUsize>,
}

impl Load {
    /// The current number of submissions in flight.
    pub fn get(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

/// A resource chosen by a policy, used for one submission.
#[derive(Debug, Clone)]
pub struct Selection<R> {
    resource: R,
    index: usize,
    load: Option<Load>,
}

impl<R: Clone + Send + Sync + 'static> Selection<R> {
    /// Select a resource without load reporting.
    pub fn new(resource: R, index: usize) -> Self {
        Self {
            resource,
            index,
            load: None,
        }
    }

    /// Select a resource, counting the submissions made through the selection in `load`
    /// until they complete.
    pub fn with_load(resource: R, index: usize, load: Load) -> Self {
        Self {
            resource,
            index,
            load: Some(load),
        }
    }

    /// The selected resource.
    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Index of the resource in the policy.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Run `f` on the selected resource.
    ///
    /// The load of the resource is increased before running `f` and decreased once the work
    /// completes, as reported by the backend, or when the submission is waited on or dropped.
    pub fn submit<B, W, F>(&self, backend: &B, f: F) -> Submission<W>
    where
        B: Backend<Resource = R>,
        F: FnOnce(&R) -> W,
    {
        let guard = self.load.as_ref().map(|load| {
            load.count.fetch_add(1, Ordering::Relaxed);
            CompletionGuard(Completion {
                load: load.clone(),
                done: Arc::new(AtomicBool::new(false)),
            })
        });

        let work = f(&self.resource);

        if let Some(guard) = &guard {
            let completion = guard.0.clone();
            backend.on_complete(&self.resource, Box::new(move || completion.complete()));
        }

        Submission { work, guard }
    }
}

#[derive(Clone)]
struct Completion {
    load: Load,
    done: Arc<AtomicBool>,
}

impl Completion {
    fn complete(&self) {
        if !self.done.swap(true, Ordering::AcqRel) {
            self.load.count.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

struct CompletionGuard(Completion);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.complete();
    }
}

/// Work submitted through a [Selection].
pub struct Submission<W> {
    work: W,
    guard: Option<CompletionGuard>,
}

impl<W> Submission<W> {
    /// The value returned by the submitted function.
    pub fn work(&self) -> &W {
        &self.work
    }

    /// Whether the completion of the work was reported. Always false without load reporting.
    pub fn is_complete(&self) -> bool {
        self.guard
            .as_ref()
            .is_some_and(|guard| guard.0.done.load(Ordering::Acquire))
    }
}

impl<W: Waitable> Submission<W> {
    /// Block until the submitted work completes.
    pub fn wait(self) -> W::Output {
        let Submission { work, guard } = self;
        let output = work.wait();
        drop(guard);
        output
    }
}

impl<W: core::fmt::Debug> core::fmt::Debug for Submission<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Submission")
            .field("work", &self.work)
            .field("complete", &self.is_complete())
            .finish()
    }
}
