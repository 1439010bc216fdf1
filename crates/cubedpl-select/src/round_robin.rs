use crate::{Backend, Policy, ResourceOf, Select, Selection, SelectionError, check_resources};
use core::sync::atomic::{AtomicUsize, Ordering};

/// Selects the resources in turn.
#[derive(Debug)]
pub struct RoundRobinPolicy<B: Backend> {
    backend: B,
    resources: Vec<B::Resource>,
    next: AtomicUsize,
}

impl<B: Backend> RoundRobinPolicy<B> {
    /// Select in turn every resource of the backend.
    pub fn new(backend: B) -> Result<Self, SelectionError> {
        let resources = backend.get_resources();
        Self::with_resources(backend, resources)
    }

    /// Select in turn the given resources of the backend.
    pub fn with_resources(backend: B, resources: Vec<B::Resource>) -> Result<Self, SelectionError> {
        check_resources(&resources)?;

        Ok(Self {
            backend,
            resources,
            next: AtomicUsize::new(0),
        })
    }
}

impl<B: Backend> Policy for RoundRobinPolicy<B> {
    type Backend = B;

    fn backend(&self) -> &B {
        &self.backend
    }

    fn get_resources(&self) -> Vec<B::Resource> {
        self.resources.clone()
    }
}

impl<B: Backend> Select for RoundRobinPolicy<B> {
    fn select(&self) -> Selection<ResourceOf<Self>> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.resources.len();
        Selection::new(self.resources[index].clone(), index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Submit, policy::tests::Pool};
    use pretty_assertions::assert_eq;

    #[test]
    fn alternates_over_two_resources() {
        let policy = RoundRobinPolicy::new(Pool::new(2)).unwrap();

        for _ in 0..6 {
            policy.submit(|resource| policy.backend().run(*resource));
        }

        let calls = policy.backend().calls();
        assert_eq!(calls, vec![0, 1, 0, 1, 0, 1]);
        assert_eq!(calls.iter().filter(|r| **r == 0).count(), 3);
        assert_eq!(calls.iter().filter(|r| **r == 1).count(), 3);
    }

    #[test]
    fn selects_among_the_given_resources() {
        let policy = RoundRobinPolicy::with_resources(Pool::new(4), vec![3, 1]).unwrap();

        let selected: Vec<usize> = (0..4).map(|_| *policy.select().resource()).collect();

        assert_eq!(selected, vec![3, 1, 3, 1]);
        assert_eq!(policy.get_resources(), vec![3, 1]);
    }

    #[test]
    fn requires_a_resource() {
        assert_eq!(
            RoundRobinPolicy::new(Pool::new(0)).unwrap_err(),
            SelectionError::NoResources
        );
    }
}
