/// Resources running the work submitted through policies.
pub trait Backend: Send + Sync + 'static {
    /// A resource able to run work, cheap to clone.
    type Resource: Clone + Send + Sync + 'static;

    /// Every resource of the backend.
    fn get_resources(&self) -> Vec<Self::Resource>;

    /// Call `callback` once the work submitted to `resource` so far completed.
    ///
    /// Backends unable to observe completion drop the callback: completion is then reported
    /// when the submission is waited on or dropped.
    fn on_complete(&self, resource: &Self::Resource, callback: Box<dyn FnOnce() + Send>) {
        let _ = (resource, callback);
    }
}

/// Work that can be waited on.
///
/// Submissions can only be waited on when the submitted function returns a waitable value.
pub trait Waitable {
    /// Result of the work.
    type Output;

    /// Block until the work completes.
    fn wait(self) -> Self::Output;
}

impl<T> Waitable for std::thread::JoinHandle<T> {
    type Output = std::thread::Result<T>;

    fn wait(self) -> Self::Output {
        self.join()
    }
}

impl<W: Waitable, E> Waitable for Result<W, E> {
    type Output = Result<W::Output, E>;

    fn wait(self) -> Self::Output {
        self.map(Waitable::wait)
    }
}
