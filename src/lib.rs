//! Faultline - failure classification and user-facing messages
//!
//! Every failure an application raises is matched against an ordered rule
//! catalog. The first matching rule decides the message shown to the user
//! and whether the failure is worth forwarding to telemetry. The catalog
//! ends in a fallback rule, so classification never fails.

pub mod classify;
pub mod failure;
pub mod logging;
pub mod messages;
pub mod output;
pub mod report;
pub mod settings;

pub use classify::{CatalogError, Classification, Classifier, Matched, Rule, RuleCatalog};
pub use failure::{from_error, Failure, FailureKind};
pub use messages::{LocalContext, LookupError, MessageContext, MessageKey};
pub use report::{FailureHandler, FailureReport, Notice, Reporter, TracingReporter};
pub use settings::{Settings, SettingsError};
