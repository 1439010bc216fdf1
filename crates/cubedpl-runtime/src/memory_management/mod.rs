mod base;
mod memory_manage;
mod memory_pool;

pub use base::*;
pub use memory_manage::*;
pub use memory_pool::*;
