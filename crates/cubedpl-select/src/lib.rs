//! Dynamic selection of the resource running submitted work.
//!
//! A policy picks a resource of a [Backend] for every submission. The capabilities of a policy
//! form a chain of traits, each one implemented for every policy providing the previous one:
//!
//! [Select] → [TrySelect] → [TrySubmit] → [Submit] → [SubmitAndWait]
//!
//! A policy implements the first capability it provides and gets the following ones. Fusing
//! the selection with the submission is done by implementing [TrySubmit] directly, and so on.

#![warn(missing_docs)]

mod backend;
mod dynamic_load;
mod error;
mod fixed_resource;
mod policy;
mod round_robin;
mod runtime_backend;
mod selection;

pub use backend::*;
pub use dynamic_load::*;
pub use error::*;
pub use fixed_resource::*;
pub use policy::*;
pub use round_robin::*;
pub use runtime_backend::*;
pub use selection::*;
