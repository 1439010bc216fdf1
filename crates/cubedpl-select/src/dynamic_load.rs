use crate::{
    Backend, Load, Policy, ResourceOf, Select, Selection, SelectionError, check_resources,
};

/// Selects the resource with the fewest submissions in flight, the first one on ties.
///
/// The load of a resource is increased when work is submitted to it and decreased when the
/// work completes, as reported by the backend, or when its submission is waited on or dropped.
#[derive(Debug)]
pub struct DynamicLoadPolicy<B: Backend> {
    backend: B,
    resources: Vec<B::Resource>,
    loads: Vec<Load>,
}

impl<B: Backend> DynamicLoadPolicy<B> {
    /// Balance the load over every resource of the backend.
    pub fn new(backend: B) -> Result<Self, SelectionError> {
        let resources = backend.get_resources();
        Self::with_resources(backend, resources)
    }

    /// Balance the load over the given resources of the backend.
    pub fn with_resources(backend: B, resources: Vec<B::Resource>) -> Result<Self, SelectionError> {
        check_resources(&resources)?;
        let loads = resources.iter().map(|_| Load::default()).collect();

        Ok(Self {
            backend,
            resources,
            loads,
        })
    }

    /// Balance the load over user handles, converted into resources of the backend by
    /// `adapter`.
    pub fn with_adapter<U, A>(backend: B, handles: Vec<U>, adapter: A) -> Result<Self, SelectionError>
    where
        A: Fn(U) -> B::Resource,
    {
        let resources = handles.into_iter().map(adapter).collect();
        Self::with_resources(backend, resources)
    }

    /// Number of submissions in flight on every resource.
    pub fn loads(&self) -> Vec<usize> {
        self.loads.iter().map(Load::get).collect()
    }
}

impl<B: Backend> Policy for DynamicLoadPolicy<B> {
    type Backend = B;

    fn backend(&self) -> &B {
        &self.backend
    }

    fn get_resources(&self) -> Vec<B::Resource> {
        self.resources.clone()
    }
}

impl<B: Backend> Select for DynamicLoadPolicy<B> {
    fn select(&self) -> Selection<ResourceOf<Self>> {
        // `min_by_key` keeps the first minimum.
        let (index, _) = self
            .loads
            .iter()
            .map(Load::get)
            .enumerate()
            .min_by_key(|(_, load)| *load)
            .unwrap_or((0, 0));

        Selection::with_load(
            self.resources[index].clone(),
            index,
            self.loads[index].clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Submit, SubmitAndWait,
        policy::tests::{Done, Pool},
    };
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    #[test]
    fn selects_the_least_loaded_resource() {
        let policy = DynamicLoadPolicy::new(Pool::new(3)).unwrap();

        let first = policy.submit(|r| policy.backend().run(*r));
        let second = policy.submit(|r| policy.backend().run(*r));
        assert_eq!(policy.loads(), vec![1, 1, 0]);

        drop(first);
        assert_eq!(policy.loads(), vec![0, 1, 0]);

        let third = policy.submit(|r| policy.backend().run(*r));
        assert_eq!(policy.loads(), vec![1, 1, 0]);
        assert_eq!(third.wait(), 0);
        assert_eq!(second.wait(), 1);

        assert_eq!(policy.loads(), vec![0, 0, 0]);
        assert_eq!(policy.backend().calls(), vec![0, 1, 0]);
    }

    #[test]
    fn ties_go_to_the_first_resource() {
        let policy = DynamicLoadPolicy::new(Pool::new(4)).unwrap();

        for _ in 0..3 {
            assert_eq!(policy.submit_and_wait(|r| policy.backend().run(*r)), 0);
        }
        assert_eq!(policy.loads(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn adapter_converts_the_handles() {
        let names = vec!["second", "first"];
        let policy = DynamicLoadPolicy::with_adapter(Pool::new(2), names, |name| match name {
            "first" => 0,
            _ => 1,
        })
        .unwrap();

        assert_eq!(policy.get_resources(), vec![1, 0]);
        assert_eq!(policy.submit_and_wait(|r| policy.backend().run(*r)), 1);
    }

    /// Completes the work when asked to, running the completion callbacks of the resources.
    #[derive(Default)]
    struct Deferred {
        callbacks: Mutex<Vec<(usize, Box<dyn FnOnce() + Send>)>>,
    }

    impl Deferred {
        fn complete(&self, resource: usize) {
            let mut callbacks = self.callbacks.lock().unwrap();
            let (ready, pending) = core::mem::take(&mut *callbacks)
                .into_iter()
                .partition::<Vec<_>, _>(|(r, _)| *r == resource);
            *callbacks = pending;
            drop(callbacks);

            for (_, callback) in ready {
                callback();
            }
        }
    }

    impl Backend for Arc<Deferred> {
        type Resource = usize;

        fn get_resources(&self) -> Vec<usize> {
            vec![0, 1]
        }

        fn on_complete(&self, resource: &usize, callback: Box<dyn FnOnce() + Send>) {
            self.callbacks.lock().unwrap().push((*resource, callback));
        }
    }

    #[test]
    fn completion_reported_by_the_backend() {
        let backend = Arc::new(Deferred::default());
        let policy = DynamicLoadPolicy::new(backend.clone()).unwrap();

        let first = policy.submit(|r| Done(*r));
        let second = policy.submit(|r| Done(*r));
        assert_eq!(policy.loads(), vec![1, 1]);

        backend.complete(1);
        assert_eq!(policy.loads(), vec![1, 0]);
        assert!(second.is_complete());
        assert!(!first.is_complete());

        // Waiting after the completion was reported doesn't decrease the load twice.
        assert_eq!(second.wait(), 1);
        assert_eq!(policy.loads(), vec![1, 0]);
        assert_eq!(first.wait(), 0);
        assert_eq!(policy.loads(), vec![0, 0]);
        backend.complete(0);
        assert_eq!(policy.loads(), vec![0, 0]);
    }
}
