pub mod error;
pub mod record;
pub mod store;

pub use error::LogStoreError;
pub use record::{IntegrationLog, LogCompletion, LogPage, LogQuery, LogStatus};
pub use store::IntegrationLogStore;
