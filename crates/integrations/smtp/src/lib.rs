//! SMTP provider for Herald.
//!
//! Sends a `multipart/alternative` e-mail (plain text and HTML table) to a
//! fixed recipient for every new subscriber. Audience settings may redirect
//! the recipient (`to_email`) or switch the `language`.

pub mod config;
pub mod message;
pub mod provider;

pub use config::{KIND, SmtpSettings, config_schema};
pub use provider::SmtpProvider;
