//! The ordered rule catalog and the standard taxonomy.
//!
//! Precedence is purely positional: the first rule whose guard holds wins.
//! Within the HTTP group, narrower status predicates come before broader
//! ones, and the catalog always ends in a fallback rule so every failure
//! classifies.

use std::collections::HashSet;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::rule::{Rule, Subject};
use crate::failure::FailureKind;
use crate::messages::{MessageContext, MessageKey};

/// Invalid custom catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The rule passed as fallback does not match every failure.
    #[error("rule '{0}' cannot terminate a catalog: it is not a fallback rule")]
    MissingFallback(String),
    /// A fallback rule appears before the end and would shadow later rules.
    #[error("fallback rule '{0}' must be the last rule")]
    MisplacedFallback(String),
    /// Two rules share a name.
    #[error("duplicate rule name: {0}")]
    DuplicateRule(String),
}

/// Immutable, ordered, total set of rules.
#[derive(Debug)]
pub struct RuleCatalog {
    rules: Vec<Rule>,
    fallback: Rule,
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleCatalog {
    /// Builds a catalog from ordered rules and a terminating fallback.
    pub fn new(rules: Vec<Rule>, fallback: Rule) -> Result<Self, CatalogError> {
        if !fallback.is_fallback() {
            return Err(CatalogError::MissingFallback(fallback.name().to_string()));
        }
        if let Some(rule) = rules.iter().find(|rule| rule.is_fallback()) {
            return Err(CatalogError::MisplacedFallback(rule.name().to_string()));
        }

        let mut seen = HashSet::new();
        for name in rules.iter().chain(Some(&fallback)).map(Rule::name) {
            if !seen.insert(name) {
                return Err(CatalogError::DuplicateRule(name.to_string()));
            }
        }

        Ok(Self { rules, fallback })
    }

    /// The standard taxonomy.
    pub fn standard() -> Self {
        Self {
            rules: standard_rules(),
            fallback: Rule::fallback("fallback"),
        }
    }

    /// The standard taxonomy with application rules taking precedence over
    /// every standard rule.
    pub fn standard_with(custom: Vec<Rule>) -> Result<Self, CatalogError> {
        let mut rules = custom;
        rules.extend(standard_rules());
        Self::new(rules, Rule::fallback("fallback"))
    }

    /// All rules in precedence order, fallback last.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter().chain(std::iter::once(&self.fallback))
    }

    /// Number of rules including the fallback.
    pub fn rule_count(&self) -> usize {
        self.rules.len() + 1
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.iter().find(|rule| rule.name() == name)
    }

    pub fn fallback(&self) -> &Rule {
        &self.fallback
    }

    /// Returns the 1-based position and the first rule matching `subject`.
    pub fn first_match(&self, subject: &Subject<'_>) -> (usize, &Rule) {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(subject))
            .map(|(index, rule)| (index + 1, rule))
            .unwrap_or((self.rule_count(), &self.fallback))
    }
}

fn is(kind: FailureKind) -> impl Fn(&FailureKind) -> bool + Send + Sync + 'static {
    move |candidate: &FailureKind| *candidate == kind
}

fn standard_rules() -> Vec<Rule> {
    let mut rules = http_rules();
    rules.extend(transport_rules());
    rules.extend(application_rules());
    rules
}

fn http_rules() -> Vec<Rule> {
    vec![
        Rule::http("http_edge_challenge", |status| {
            status.code == 403 && status.body_contains("cloudflare")
        })
        .with_message(MessageKey::EdgeChallenge)
        .do_not_report(),
        Rule::http("http_blocked", |status| {
            status.code == 403 && status.body_contains("<html>")
        })
        .with_message(MessageKey::Blocked)
        .do_not_report(),
        Rule::http("http_not_authorized", |status| matches!(status.code, 401 | 403))
            .with_message(MessageKey::NotAuthorized)
            .do_not_report(),
        Rule::http("http_rate_limited", |status| status.code == 429)
            .with_message(MessageKey::RateLimited)
            .do_not_report(),
        Rule::http("http_not_found", |status| status.code == 404)
            .with_message(MessageKey::NotFound)
            .do_not_report(),
        Rule::http("http_gateway_timeout", |status| status.code == 504)
            .with_message(MessageKey::GatewayTimeout)
            .do_not_report(),
        Rule::http("http_origin_timeout", |status| status.code == 522)
            .with_message(MessageKey::OriginTimeout)
            .do_not_report(),
        Rule::http("http_server_error", |status| status.is_server_error())
            .with_message(MessageKey::ServiceUnavailable)
            .do_not_report(),
    ]
}

fn transport_rules() -> Vec<Rule> {
    let https_port = Regex::new(r"[:\s]443\b").expect("https port pattern is valid");

    vec![
        Rule::kind("json_syntax", is(FailureKind::JsonSyntax))
            .with_message(MessageKey::UnparsableResponse),
        Rule::caused_by("content_not_found", is(FailureKind::ResourceNotFound))
            .with_message(MessageKey::ContentNotFound)
            .do_not_report(),
        Rule::caused_by("operation_timeout", is(FailureKind::Timeout))
            .with_message(MessageKey::TimedOut)
            .do_not_report(),
        Rule::caused_by("socket_timeout", is(FailureKind::SocketTimeout))
            .with_message(MessageKey::TimedOut)
            .do_not_report(),
        Rule::caused_by("malformed_payload", is(FailureKind::MalformedJson))
            .with_message(MessageKey::Conversion)
            .do_not_report(),
        Rule::caused_by("unknown_host", is(FailureKind::UnknownHost))
            .with_message(MessageKey::HostNotFound)
            .do_not_report(),
        Rule::caused_by("tls_failure", is(FailureKind::Tls))
            .with_message(MessageKey::SecureConnection)
            .do_not_report(),
        Rule::caused_by("protocol_violation", is(FailureKind::Protocol))
            .with_message(MessageKey::Protocol),
        Rule::caused_by("connection_refused", is(FailureKind::ConnectionRefused))
            .resolved_by(move |subject, context| {
                let over_https = subject
                    .find_cause(|node| *node.kind() == FailureKind::ConnectionRefused)
                    .map_or(false, |refused| https_port.is_match(&refused.to_string()));
                let key = if over_https {
                    MessageKey::ConnectHttps
                } else {
                    MessageKey::Connect
                };
                let failure = subject.failure();
                let detail = failure.description().unwrap_or_else(|| failure.type_name());
                context.text(key, &[detail])
            })
            .do_not_report(),
        Rule::caused_by("socket_error", FailureKind::is_socket)
            .with_message(MessageKey::Connection)
            .do_not_report(),
        Rule::caused_by("unexpected_eof", is(FailureKind::UnexpectedEof))
            .with_message(MessageKey::Connection)
            .do_not_report(),
    ]
}

fn application_rules() -> Vec<Rule> {
    let expected_value =
        Regex::new(r"(?:: |, )[Ee]xpected ").expect("expected-value pattern is valid");

    vec![
        Rule::kind("login_required", is(FailureKind::LoginRequired))
            .with_message(MessageKey::LoginRequired),
        Rule::kind("save_state_race", is(FailureKind::IllegalState))
            .and(|subject| subject.failure().to_string().contains("onSaveInstanceState"))
            .silent()
            .do_not_report(),
        Rule::kind("data_mapping", is(FailureKind::IllegalState))
            .and(move |subject| expected_value.is_match(&subject.failure().to_string()))
            .resolved_by(|subject, context| {
                let failure = subject.failure();
                let detail = failure
                    .message()
                    .or_else(|| failure.description())
                    .unwrap_or_default();
                context.text(MessageKey::DataMapping, &[detail])
            })
            .do_not_report(),
        Rule::kind("permission_denied", |kind| {
            matches!(kind, FailureKind::PermissionDenied { .. })
        })
        .resolved_by(permission_message),
        Rule::kind("io_failure", FailureKind::is_io).do_not_report(),
        Rule::kind("null_reference", is(FailureKind::NullReference))
            .with_message(MessageKey::Internal),
        Rule::kind("out_of_memory", is(FailureKind::OutOfMemory))
            .with_message(MessageKey::OutOfMemory),
    ]
}

fn permission_message(subject: &Subject<'_>, context: &dyn MessageContext) -> String {
    let permission = match subject.kind() {
        FailureKind::PermissionDenied { permission } => permission.as_str(),
        _ => "",
    };

    let label = match context.permission_label(permission) {
        Ok(label) if !label.trim().is_empty() => label,
        Ok(_) => permission.to_string(),
        Err(err) => {
            debug!(permission, error = %err, "permission label lookup failed, using identifier");
            permission.to_string()
        }
    };

    context.text(MessageKey::PermissionNotGranted, &[label.as_str()])
}
