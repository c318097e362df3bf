pub mod audience;
pub mod error;
pub mod integration;
pub mod locale;
pub mod subscriber;
pub mod summary;
pub mod types;

pub use audience::{Audience, AudienceType, Source};
pub use error::RenderError;
pub use integration::{AudienceIntegration, Integration};
pub use locale::Language;
pub use subscriber::{Subscriber, SubscriberContext};
pub use summary::{SubscriberSummary, render_title_template};
pub use types::{AudienceId, ConfigMap, IntegrationId, LinkId, LogId, SourceId, SubscriberId};
