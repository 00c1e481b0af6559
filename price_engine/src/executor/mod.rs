//! Bounded asynchronous executor.
//!
//! - `pool` — `WorkerPool`, the fixed-size thread pool with `submit` and `chain`.
//! - `handle` — `TaskHandle`, its lifecycle, timed waits, and the `all_of` join.

pub mod handle;
pub mod pool;

pub use handle::{TaskHandle, TaskState, all_of};
pub use pool::WorkerPool;
