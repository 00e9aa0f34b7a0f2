//! Failure classification.
//!
//! A [`Classifier`] owns an immutable [`RuleCatalog`] and decides, for any
//! [`Failure`], which rule applies. From that rule callers get the message to
//! show and whether the failure should be forwarded to telemetry.
//!
//! ```
//! use faultline::classify::Classifier;
//! use faultline::failure::Failure;
//! use faultline::messages::LocalContext;
//!
//! let classifier = Classifier::standard();
//! let context = LocalContext::new();
//!
//! let failure = Failure::http_status(429, "");
//! let matched = classifier.classify(&failure);
//! assert_eq!(matched.rule().name(), "http_rate_limited");
//! assert!(!matched.should_report());
//! assert!(!matched.message(&context).is_empty());
//! ```

pub mod catalog;
pub mod rule;

use serde::Serialize;
use tracing::debug;

use crate::failure::{ChainWalker, Failure};
use crate::messages::MessageContext;

pub use catalog::{CatalogError, RuleCatalog};
pub use rule::{best_effort_message, Guard, MessageSource, Resolver, Rule, Subject};

/// The only entry point other subsystems call.
///
/// Immutable after construction; share it by reference or `Arc`.
#[derive(Debug, Default)]
pub struct Classifier {
    catalog: RuleCatalog,
    walker: ChainWalker,
}

impl Classifier {
    pub fn new(catalog: RuleCatalog) -> Self {
        Self {
            catalog,
            walker: ChainWalker::default(),
        }
    }

    /// Classifier over the standard catalog.
    pub fn standard() -> Self {
        Self::new(RuleCatalog::standard())
    }

    /// Limits how many cause-chain nodes a rule may inspect.
    pub fn with_max_cause_depth(mut self, max_depth: usize) -> Self {
        self.walker = ChainWalker::new(max_depth);
        self
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn walker(&self) -> ChainWalker {
        self.walker
    }

    /// Returns the first rule, in catalog order, matching `failure`.
    pub fn classify<'c, 'f>(&'c self, failure: &'f Failure) -> Matched<'c, 'f> {
        let subject = Subject::new(failure, self.walker);
        let (position, rule) = self.catalog.first_match(&subject);
        debug!(rule = rule.name(), position, failure = %failure, "classified failure");
        Matched {
            rule,
            position,
            subject,
        }
    }

    /// User-facing message for `failure`; never empty.
    pub fn message(&self, failure: &Failure, context: &dyn MessageContext) -> String {
        self.classify(failure).message(context)
    }

    /// Whether `failure` should be forwarded to telemetry.
    pub fn should_report(&self, failure: &Failure) -> bool {
        self.classify(failure).should_report()
    }

    /// Full classification record, e.g. for diagnostics output.
    pub fn explain(&self, failure: &Failure, context: &dyn MessageContext) -> Classification {
        self.classify(failure).to_classification(context)
    }
}

/// Result of [`Classifier::classify`].
#[derive(Clone, Copy, Debug)]
pub struct Matched<'c, 'f> {
    rule: &'c Rule,
    position: usize,
    subject: Subject<'f>,
}

impl<'c, 'f> Matched<'c, 'f> {
    pub fn rule(&self) -> &'c Rule {
        self.rule
    }

    /// 1-based position of the rule in its catalog.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn failure(&self) -> &'f Failure {
        self.subject.failure()
    }

    pub fn message(&self, context: &dyn MessageContext) -> String {
        self.rule.resolve_message(&self.subject, context)
    }

    pub fn should_report(&self) -> bool {
        self.rule.should_report()
    }

    pub fn is_silent(&self) -> bool {
        self.rule.is_silent()
    }

    pub fn to_classification(&self, context: &dyn MessageContext) -> Classification {
        Classification {
            rule: self.rule.name().to_string(),
            position: self.position,
            message: self.message(context),
            report: self.should_report(),
            silent: self.is_silent(),
        }
    }
}

/// Serializable outcome of a classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Name of the matched rule.
    pub rule: String,
    /// 1-based catalog position of the matched rule.
    pub position: usize,
    /// Resolved user-facing message.
    pub message: String,
    /// Whether the failure should be forwarded to telemetry.
    pub report: bool,
    /// Whether the message should be withheld from the user.
    pub silent: bool,
}
