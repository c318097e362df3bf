//! Entity store abstraction for Herald.
//!
//! [`EntityStore`] persists audiences, sources, subscribers, integrations and
//! the links between audiences and integrations. Backends live in their own
//! crates; [`testing::run_store_conformance_tests`] checks any backend against
//! the shared contract.

pub mod error;
pub mod store;
pub mod testing;

pub use error::StoreError;
pub use store::{ActiveLink, EntityStore};
