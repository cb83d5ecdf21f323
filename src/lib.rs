//! command-injector - facade over `injector-core`
//!
//! Re-exports the core crate so the workspace integration tests (and
//! downstream users) can depend on a single package.
pub use injector_core::*;
