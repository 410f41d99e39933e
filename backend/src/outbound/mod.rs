//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **memory**: process-local item store for tests and local runs
//! - **redis**: item store on a remote Redis server behind a `bb8` pool
//!
//! Adapters are thin translators between the item model and the substrate's
//! own representation. They contain no business logic.

pub mod memory;
pub mod redis;
