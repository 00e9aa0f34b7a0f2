//! A single classification rule: guard, message source and report flag.

use std::fmt;

use crate::failure::{ChainWalker, Failure, FailureKind, HttpStatus};
use crate::messages::{MessageContext, MessageKey};

/// A failure prepared for matching.
///
/// Carries the normalized HTTP view so HTTP rules never look at the wrapper
/// shape, and the walker bound used for cause-chain predicates.
#[derive(Clone, Copy, Debug)]
pub struct Subject<'f> {
    failure: &'f Failure,
    http: Option<HttpStatus<'f>>,
    walker: ChainWalker,
}

impl<'f> Subject<'f> {
    pub fn new(failure: &'f Failure, walker: ChainWalker) -> Self {
        Self {
            failure,
            http: failure.http(),
            walker,
        }
    }

    pub fn failure(&self) -> &'f Failure {
        self.failure
    }

    pub fn kind(&self) -> &'f FailureKind {
        self.failure.kind()
    }

    pub fn http(&self) -> Option<HttpStatus<'f>> {
        self.http
    }

    pub fn walker(&self) -> ChainWalker {
        self.walker
    }

    /// First node of the cause chain satisfying `predicate`.
    pub fn find_cause<P>(&self, predicate: P) -> Option<&'f Failure>
    where
        P: FnMut(&Failure) -> bool,
    {
        self.walker.find_cause(self.failure, predicate)
    }

    pub fn has_cause<P>(&self, predicate: P) -> bool
    where
        P: FnMut(&Failure) -> bool,
    {
        self.find_cause(predicate).is_some()
    }
}

/// Predicate deciding whether a rule applies.
pub type Guard = Box<dyn Fn(&Subject<'_>) -> bool + Send + Sync>;

/// Builds a message from the failure's content.
pub type Resolver = Box<dyn Fn(&Subject<'_>, &dyn MessageContext) -> String + Send + Sync>;

/// Where a rule's user-facing text comes from.
pub enum MessageSource {
    /// Fixed template, independent of the failure.
    Template(MessageKey),
    /// Computed from the failure.
    Resolver(Resolver),
    /// The failure's own description, else its type name.
    BestEffort,
    /// Nothing is shown to the user. The message still resolves best-effort
    /// so callers that ignore the flag never get an empty string.
    Silent,
}

impl fmt::Debug for MessageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSource::Template(key) => f.debug_tuple("Template").field(key).finish(),
            MessageSource::Resolver(_) => f.write_str("Resolver"),
            MessageSource::BestEffort => f.write_str("BestEffort"),
            MessageSource::Silent => f.write_str("Silent"),
        }
    }
}

/// An immutable member of a [`RuleCatalog`](super::RuleCatalog).
pub struct Rule {
    name: String,
    guard: Guard,
    message: MessageSource,
    report: bool,
    fallback: bool,
}

impl Rule {
    /// Creates a rule with an arbitrary guard, best-effort message and
    /// reporting enabled.
    pub fn new<G>(name: impl Into<String>, guard: G) -> Self
    where
        G: Fn(&Subject<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            guard: Box::new(guard),
            message: MessageSource::BestEffort,
            report: true,
            fallback: false,
        }
    }

    /// Matches HTTP failures, wrapped or unwrapped, whose status satisfies
    /// `predicate`.
    pub fn http<P>(name: impl Into<String>, predicate: P) -> Self
    where
        P: Fn(HttpStatus<'_>) -> bool + Send + Sync + 'static,
    {
        Self::new(name, move |subject| subject.http().map_or(false, &predicate))
    }

    /// Matches when the failure itself is of a kind accepted by `category`.
    pub fn kind<C>(name: impl Into<String>, category: C) -> Self
    where
        C: Fn(&FailureKind) -> bool + Send + Sync + 'static,
    {
        Self::new(name, move |subject| category(subject.kind()))
    }

    /// Matches when any node of the cause chain is of a kind accepted by
    /// `category`.
    pub fn caused_by<C>(name: impl Into<String>, category: C) -> Self
    where
        C: Fn(&FailureKind) -> bool + Send + Sync + 'static,
    {
        Self::new(name, move |subject| subject.has_cause(|node| category(node.kind())))
    }

    /// Matches every failure. Only valid as the last rule of a catalog.
    pub fn fallback(name: impl Into<String>) -> Self {
        Self {
            fallback: true,
            ..Self::new(name, |_| true)
        }
    }

    /// Narrows the guard with an extra predicate.
    pub fn and<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Subject<'_>) -> bool + Send + Sync + 'static,
    {
        let guard = self.guard;
        self.guard = Box::new(move |subject| guard(subject) && predicate(subject));
        self
    }

    pub fn with_message(mut self, key: MessageKey) -> Self {
        self.message = MessageSource::Template(key);
        self
    }

    pub fn resolved_by<R>(mut self, resolver: R) -> Self
    where
        R: Fn(&Subject<'_>, &dyn MessageContext) -> String + Send + Sync + 'static,
    {
        self.message = MessageSource::Resolver(Box::new(resolver));
        self
    }

    pub fn silent(mut self) -> Self {
        self.message = MessageSource::Silent;
        self
    }

    /// Deactivates reporting of failures matched by this rule.
    pub fn do_not_report(mut self) -> Self {
        self.report = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn should_report(&self) -> bool {
        self.report
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Returns true if matched failures should not be shown to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self.message, MessageSource::Silent)
    }

    pub fn message_source(&self) -> &MessageSource {
        &self.message
    }

    /// Tests the guard against a prepared subject.
    pub fn matches(&self, subject: &Subject<'_>) -> bool {
        (self.guard)(subject)
    }

    /// Resolves the user-facing text. Only meaningful after [`Rule::matches`]
    /// returned true for the same subject. Never returns a blank string.
    pub fn resolve_message(&self, subject: &Subject<'_>, context: &dyn MessageContext) -> String {
        let message = match &self.message {
            MessageSource::Template(key) => context.text(*key, &[]),
            MessageSource::Resolver(resolve) => resolve(subject, context),
            MessageSource::BestEffort | MessageSource::Silent => {
                return best_effort_message(subject.failure(), context);
            }
        };

        if message.trim().is_empty() {
            best_effort_message(subject.failure(), context)
        } else {
            message
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("report", &self.report)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

/// Localized description, else raw description, else
/// `"exception of type <TypeName>"`.
pub fn best_effort_message(failure: &Failure, context: &dyn MessageContext) -> String {
    if let Some(description) = failure.description() {
        return description.to_string();
    }

    let text = context.text(MessageKey::ExceptionOfType, &[failure.type_name()]);
    if text.trim().is_empty() {
        format!("exception of type {}", failure.type_name())
    } else {
        text
    }
}
