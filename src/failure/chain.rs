//! Walking the "caused-by" chain of a failure.
//!
//! Every walk starts at the failure itself and is bounded by a maximum
//! number of visited nodes, so a pathological chain can never stall
//! classification.

use tracing::warn;

use super::Failure;

/// Default maximum number of chain nodes inspected by a walk.
pub const DEFAULT_MAX_CAUSE_DEPTH: usize = 50;

/// Bounded walker over cause chains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainWalker {
    max_depth: usize,
}

impl Default for ChainWalker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAUSE_DEPTH)
    }
}

impl ChainWalker {
    /// Creates a walker visiting at most `max_depth` nodes (at least one).
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Iterates the chain starting at `failure`.
    pub fn causes<'a>(&self, failure: &'a Failure) -> Causes<'a> {
        Causes {
            next: Some(failure),
            remaining: self.max_depth,
            max_depth: self.max_depth,
        }
    }

    /// Returns the first node of the chain satisfying `predicate`.
    pub fn find_cause<'a, P>(&self, failure: &'a Failure, mut predicate: P) -> Option<&'a Failure>
    where
        P: FnMut(&Failure) -> bool,
    {
        self.causes(failure).find(|node| predicate(*node))
    }

    /// Returns true if any node of the chain satisfies `predicate`.
    pub fn has_cause<P>(&self, failure: &Failure, predicate: P) -> bool
    where
        P: FnMut(&Failure) -> bool,
    {
        self.find_cause(failure, predicate).is_some()
    }
}

/// Iterator over a cause chain, see [`ChainWalker::causes`].
#[derive(Clone, Debug)]
pub struct Causes<'a> {
    next: Option<&'a Failure>,
    remaining: usize,
    max_depth: usize,
}

impl<'a> Iterator for Causes<'a> {
    type Item = &'a Failure;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next.take()?;
        if self.remaining == 0 {
            warn!(
                max_depth = self.max_depth,
                truncated_at = %node,
                "cause chain exceeds maximum depth, stopping walk"
            );
            return None;
        }
        self.remaining -= 1;
        self.next = node.cause();
        Some(node)
    }
}

/// [`ChainWalker::causes`] with the default depth bound.
pub fn causes(failure: &Failure) -> Causes<'_> {
    ChainWalker::default().causes(failure)
}

/// [`ChainWalker::find_cause`] with the default depth bound.
pub fn find_cause<P>(failure: &Failure, predicate: P) -> Option<&Failure>
where
    P: FnMut(&Failure) -> bool,
{
    ChainWalker::default().find_cause(failure, predicate)
}

/// [`ChainWalker::has_cause`] with the default depth bound.
pub fn has_cause<P>(failure: &Failure, predicate: P) -> bool
where
    P: FnMut(&Failure) -> bool,
{
    ChainWalker::default().has_cause(failure, predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureKind;

    fn chain_of(depth: usize) -> Failure {
        let mut failure = Failure::new(FailureKind::ConnectionRefused);
        for _ in 1..depth {
            failure = Failure::new(FailureKind::Io).caused_by(failure);
        }
        failure
    }

    #[test]
    fn test_walk_starts_at_failure_itself() {
        let failure = Failure::new(FailureKind::Tls);
        let found = find_cause(&failure, |f| f.kind() == &FailureKind::Tls);
        assert!(std::ptr::eq(found.unwrap(), &failure));
    }

    #[test]
    fn test_find_cause_returns_first_match() {
        let failure = Failure::new(FailureKind::Io)
            .with_message("outer")
            .caused_by(
                Failure::new(FailureKind::Socket)
                    .with_message("middle")
                    .caused_by(Failure::new(FailureKind::Socket).with_message("inner")),
            );

        let found = find_cause(&failure, |f| f.kind() == &FailureKind::Socket).unwrap();
        assert_eq!(found.message(), Some("middle"));
    }

    #[test]
    fn test_has_cause_absent_kind() {
        let failure = chain_of(3);
        assert!(has_cause(&failure, |f| f.kind() == &FailureKind::ConnectionRefused));
        assert!(!has_cause(&failure, |f| f.kind() == &FailureKind::Tls));
    }

    #[test]
    fn test_text_predicate() {
        let failure = Failure::new(FailureKind::Io)
            .caused_by(Failure::new(FailureKind::Socket).with_message("connection reset by peer"));
        assert!(has_cause(&failure, |f| f.to_string().contains("reset")));
    }

    #[test]
    fn test_walk_visits_whole_short_chain() {
        assert_eq!(causes(&chain_of(4)).count(), 4);
    }

    #[test]
    fn test_depth_bound_truncates_walk() {
        let walker = ChainWalker::new(5);
        let failure = chain_of(6);

        assert_eq!(walker.causes(&failure).count(), 5);
        assert!(!walker.has_cause(&failure, |f| f.kind() == &FailureKind::ConnectionRefused));
        assert!(ChainWalker::new(6).has_cause(&failure, |f| f.kind() == &FailureKind::ConnectionRefused));
    }

    #[test]
    fn test_zero_depth_still_inspects_failure() {
        let walker = ChainWalker::new(0);
        assert_eq!(walker.max_depth(), 1);
        assert_eq!(walker.causes(&chain_of(3)).count(), 1);
    }

    #[test]
    fn test_default_bound() {
        assert_eq!(ChainWalker::default().max_depth(), DEFAULT_MAX_CAUSE_DEPTH);
        let failure = chain_of(DEFAULT_MAX_CAUSE_DEPTH + 1);
        assert!(!has_cause(&failure, |f| f.kind() == &FailureKind::ConnectionRefused));
    }
}
