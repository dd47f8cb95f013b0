//! Schema synchronization.

mod sync;

pub use sync::SchemaSynchronizer;
