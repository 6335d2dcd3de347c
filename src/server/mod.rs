//! Accepting connections and scheduling them on the worker pool.

pub mod listener;
pub mod pool;

pub use listener::Server;
pub use pool::{Slot, WorkerPool};
