//! Runtime abstraction for file access.
//!
//! - [`NativeRuntime`]: the local file system through `tokio::fs`
//! - [`MemoryRuntime`]: an in-memory file system for tests, with read
//!   counting and per-file latency

mod memory;
mod native;
mod traits;

pub use memory::MemoryRuntime;
pub use native::NativeRuntime;
pub use traits::{RuntimeError, RuntimeResult, SharedRuntime, SystemRuntime};

/// Create the runtime for the local machine.
pub fn default_runtime() -> NativeRuntime {
    NativeRuntime::new()
}
