//! Subscriber dispatch for Herald.
//!
//! A public submission goes through [`SubscriberIntake`], which stores the
//! subscriber and puts a [`SubscriberCreated`] event on the
//! [`DispatchQueue`]. A [`DispatchWorker`] drains the queue and runs the
//! [`DispatchPipeline`] for each event, writing one integration log row per
//! active integration of the subscriber's audience.

pub mod builtin;
pub mod error;
pub mod intake;
pub mod metrics;
pub mod pipeline;
pub mod purge;
pub mod worker;

pub use builtin::{
    BuiltinProvider, builtin_registry, builtin_registry_with_client, shared_http_client,
};
pub use error::{DispatchError, IntakeError, QueueError};
pub use intake::{AudienceRef, Submission, SubmissionRequest, SubscriberIntake, source_domain};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use pipeline::{
    AttemptSummary, DEFAULT_TIMEOUT, DispatchPipeline, DispatchPipelineBuilder, DispatchReport,
};
pub use purge::{AudiencePurge, purge_audience};
pub use worker::{DispatchQueue, DispatchWorker, SubscriberCreated};
