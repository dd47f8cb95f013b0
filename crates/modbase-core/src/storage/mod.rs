//! Storage backend contract and the in-memory reference implementation.

mod backend;
mod memory;

pub use backend::{Backend, Row, TableInfo, TableSpec, Value};
pub use memory::MemoryBackend;

/// Current time in microseconds since the Unix epoch.
pub fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before Unix epoch")
        .as_micros() as i64
}
