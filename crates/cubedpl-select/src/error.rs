use thiserror::Error;

/// Errors raised when creating a policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The policy has no resource to select.
    #[error("The policy has no resource to select")]
    NoResources,

    /// The resource doesn't exist.
    #[error("Invalid resource {index}, the policy has {count} resources")]
    InvalidResource {
        /// Index of the resource.
        index: usize,
        /// Number of resources.
        count: usize,
    },
}

pub(crate) fn check_resources<R>(resources: &[R]) -> Result<(), SelectionError> {
    match resources.is_empty() {
        true => Err(SelectionError::NoResources),
        false => Ok(()),
    }
}
