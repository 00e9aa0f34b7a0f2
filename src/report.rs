//! Consumers of classification: the failure handler and the telemetry gate.
//!
//! [`FailureHandler`] is what an application's global error hook calls. It
//! resolves the notice shown to the user and forwards reportable failures to
//! a [`Reporter`].

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, error};

use crate::classify::{Classifier, Matched};
use crate::failure::Failure;
use crate::messages::MessageContext;

/// What the user gets to see about a failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// User-facing message, never empty.
    pub message: String,
    /// The failure was forwarded to telemetry.
    pub reportable: bool,
    /// The message should not be displayed.
    pub silent: bool,
}

/// Payload forwarded to telemetry for a reportable failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    /// Name of the rule that matched.
    pub rule: String,
    /// Message shown to the user.
    pub message: String,
    /// Display text of the failure.
    pub failure: String,
    /// Display texts of the cause chain, outermost first, the failure itself
    /// included.
    pub chain: Vec<String>,
    /// RFC 3339 timestamp.
    pub reported_at: String,
}

impl FailureReport {
    pub fn new(matched: &Matched<'_, '_>, message: impl Into<String>, classifier: &Classifier) -> Self {
        let failure = matched.failure();
        Self {
            rule: matched.rule().name().to_string(),
            message: message.into(),
            failure: failure.to_string(),
            chain: classifier
                .walker()
                .causes(failure)
                .map(|node| node.to_string())
                .collect(),
            reported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Downstream of the telemetry gate.
pub trait Reporter {
    fn forward(&self, report: &FailureReport);
}

/// Emits reports as structured `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn forward(&self, report: &FailureReport) {
        error!(
            rule = %report.rule,
            failure = %report.failure,
            chain = ?report.chain,
            reported_at = %report.reported_at,
            "{}",
            report.message
        );
    }
}

/// Global failure hook.
pub struct FailureHandler<'a> {
    classifier: &'a Classifier,
    context: &'a dyn MessageContext,
    reporter: &'a dyn Reporter,
}

impl<'a> FailureHandler<'a> {
    pub fn new(
        classifier: &'a Classifier,
        context: &'a dyn MessageContext,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            classifier,
            context,
            reporter,
        }
    }

    /// Classifies `failure`, forwards it if its rule reports, and returns the
    /// notice for the user.
    pub fn handle(&self, failure: &Failure) -> Notice {
        let matched = self.classifier.classify(failure);
        let message = matched.message(self.context);

        if matched.should_report() {
            self.reporter
                .forward(&FailureReport::new(&matched, message.clone(), self.classifier));
        } else {
            debug!(rule = matched.rule().name(), "failure not reported");
        }

        Notice {
            message,
            reportable: matched.should_report(),
            silent: matched.is_silent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureKind;
    use crate::messages::{LocalContext, MessageKey};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingReporter {
        reports: RefCell<Vec<FailureReport>>,
    }

    impl Reporter for RecordingReporter {
        fn forward(&self, report: &FailureReport) {
            self.reports.borrow_mut().push(report.clone());
        }
    }

    #[test]
    fn test_reportable_failure_is_forwarded() {
        let classifier = Classifier::standard();
        let context = LocalContext::new();
        let reporter = RecordingReporter::default();
        let handler = FailureHandler::new(&classifier, &context, &reporter);

        let failure = Failure::new(FailureKind::Io)
            .with_message("request failed")
            .caused_by(Failure::new(FailureKind::Protocol).with_message("unexpected frame"));
        let notice = handler.handle(&failure);

        assert!(notice.reportable);
        assert!(!notice.silent);
        assert_eq!(notice.message, MessageKey::Protocol.default_template());

        let reports = reporter.reports.borrow();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].rule, "protocol_violation");
        assert_eq!(
            reports[0].chain,
            vec![
                "IoError: request failed".to_string(),
                "ProtocolError: unexpected frame".to_string()
            ]
        );
        assert!(!reports[0].reported_at.is_empty());
    }

    #[test]
    fn test_noisy_failure_is_not_forwarded() {
        let classifier = Classifier::standard();
        let context = LocalContext::new();
        let reporter = RecordingReporter::default();
        let handler = FailureHandler::new(&classifier, &context, &reporter);

        let notice = handler.handle(&Failure::http_transport(429, ""));

        assert!(!notice.reportable);
        assert_eq!(notice.message, MessageKey::RateLimited.default_template());
        assert!(reporter.reports.borrow().is_empty());
    }

    #[test]
    fn test_silent_notice() {
        let classifier = Classifier::standard();
        let context = LocalContext::new();
        let handler = FailureHandler::new(&classifier, &context, &TracingReporter);

        let failure = Failure::new(FailureKind::IllegalState)
            .with_message("Can not perform this action after onSaveInstanceState");
        let notice = handler.handle(&failure);

        assert!(notice.silent);
        assert!(!notice.reportable);
    }
}
