mod scheduler;
mod server;
mod stream;
mod task;
mod worker;

pub use server::*;
