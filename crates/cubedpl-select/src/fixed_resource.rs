use crate::{Backend, Policy, ResourceOf, Select, Selection, SelectionError, check_resources};

/// Always selects the same resource.
#[derive(Debug)]
pub struct FixedResourcePolicy<B: Backend> {
    backend: B,
    resources: Vec<B::Resource>,
    index: usize,
}

impl<B: Backend> FixedResourcePolicy<B> {
    /// Always select the resource of the backend at `index`.
    pub fn new(backend: B, index: usize) -> Result<Self, SelectionError> {
        let resources = backend.get_resources();
        check_resources(&resources)?;

        if index >= resources.len() {
            return Err(SelectionError::InvalidResource {
                index,
                count: resources.len(),
            });
        }

        Ok(Self {
            backend,
            resources,
            index,
        })
    }
}

impl<B: Backend> Policy for FixedResourcePolicy<B> {
    type Backend = B;

    fn backend(&self) -> &B {
        &self.backend
    }

    fn get_resources(&self) -> Vec<B::Resource> {
        self.resources.clone()
    }
}

impl<B: Backend> Select for FixedResourcePolicy<B> {
    fn select(&self) -> Selection<ResourceOf<Self>> {
        Selection::new(self.resources[self.index].clone(), self.index)
    }
}
