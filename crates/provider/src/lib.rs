pub mod config;
pub mod error;
pub mod provider;
pub mod registry;

pub use error::{ErrorCategory, ProviderError};
pub use provider::{DynProvider, Provider};
pub use registry::{ProviderDescriptor, ProviderFactory, ProviderRegistry};
