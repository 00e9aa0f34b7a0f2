//! Conversions from concrete error values into [`Failure`]s.
//!
//! Each adapter maps one error node onto the taxonomy. [`from_error`] applies
//! them along a `source()` chain and rebuilds it as nested causes.

use std::error::Error;
use std::io;

use tracing::warn;

use super::{Failure, FailureKind, DEFAULT_MAX_CAUSE_DEPTH};

impl From<&io::Error> for Failure {
    fn from(err: &io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => FailureKind::ResourceNotFound,
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => FailureKind::SocketTimeout,
            io::ErrorKind::ConnectionRefused => FailureKind::ConnectionRefused,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected => FailureKind::Socket,
            io::ErrorKind::UnexpectedEof => FailureKind::UnexpectedEof,
            io::ErrorKind::OutOfMemory => FailureKind::OutOfMemory,
            _ => FailureKind::Io,
        };
        Failure::new(kind).with_message(err.to_string())
    }
}

impl From<&serde_json::Error> for Failure {
    fn from(err: &serde_json::Error) -> Self {
        use serde_json::error::Category;

        let message = err.to_string();
        match err.classify() {
            // The reader's complaint sits below the decoding failure, so the
            // chain carries both shapes.
            Category::Syntax | Category::Eof => Failure::new(FailureKind::JsonSyntax)
                .with_message(message.clone())
                .caused_by(Failure::new(FailureKind::MalformedJson).with_message(message)),
            Category::Data => Failure::new(FailureKind::IllegalState).with_message(message),
            Category::Io => Failure::new(FailureKind::Io).with_message(message),
        }
    }
}

impl From<&reqwest::Error> for Failure {
    fn from(err: &reqwest::Error) -> Self {
        let kind = if let Some(status) = err.status() {
            FailureKind::HttpTransport {
                status: status.as_u16(),
                body: String::new(),
            }
        } else if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_connect() {
            connect_failure_kind(err.source())
        } else if err.is_decode() {
            FailureKind::JsonSyntax
        } else if err.is_body() || err.is_request() {
            FailureKind::Io
        } else {
            FailureKind::Other {
                type_name: "HttpClientError".to_string(),
            }
        };
        Failure::new(kind).with_message(err.to_string())
    }
}

const DNS_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
    "no such host",
];

const TLS_MARKERS: &[&str] = &["tls", "ssl", "certificate", "handshake"];

/// Narrows an HTTP client connect error by the sources below it.
///
/// DNS and TLS failures surface as connect errors too; only an I/O refusal
/// counts as a refused connection. Unrecognized causes become `Socket`.
pub(crate) fn connect_failure_kind(source: Option<&(dyn Error + 'static)>) -> FailureKind {
    let mut refused = false;
    let mut dns = false;
    let mut tls = false;

    let mut current = source;
    let mut depth = 0;
    while let Some(node) = current {
        if depth == DEFAULT_MAX_CAUSE_DEPTH {
            break;
        }
        if let Some(io) = node.downcast_ref::<io::Error>() {
            refused |= io.kind() == io::ErrorKind::ConnectionRefused;
        }
        let text = node.to_string().to_lowercase();
        dns |= DNS_MARKERS.iter().any(|marker| text.contains(marker));
        tls |= TLS_MARKERS.iter().any(|marker| text.contains(marker));

        current = node.source();
        depth += 1;
    }

    if refused {
        FailureKind::ConnectionRefused
    } else if dns {
        FailureKind::UnknownHost
    } else if tls {
        FailureKind::Tls
    } else {
        FailureKind::Socket
    }
}

/// Adapts `err` and its `source()` chain with the default depth bound.
pub fn from_error(err: &(dyn Error + 'static)) -> Failure {
    from_error_bounded(err, DEFAULT_MAX_CAUSE_DEPTH)
}

/// Adapts `err` and at most `max_depth - 1` of its sources.
pub fn from_error_bounded(err: &(dyn Error + 'static), max_depth: usize) -> Failure {
    let max_depth = max_depth.max(1);
    let mut nodes = Vec::new();
    let mut current = Some(err);

    while let Some(node) = current {
        if nodes.len() == max_depth {
            warn!(max_depth, "error source chain exceeds maximum depth, truncating");
            break;
        }
        nodes.push(adapt_node(node));
        current = node.source();
    }

    let mut nodes = nodes.into_iter().rev();
    let innermost = nodes
        .next()
        .unwrap_or_else(|| Failure::other("UnknownFailure"));
    nodes.fold(innermost, |inner, outer| outer.with_innermost_cause(inner))
}

fn adapt_node(err: &(dyn Error + 'static)) -> Failure {
    if let Some(io) = err.downcast_ref::<io::Error>() {
        return io.into();
    }
    if let Some(json) = err.downcast_ref::<serde_json::Error>() {
        return json.into();
    }
    if let Some(http) = err.downcast_ref::<reqwest::Error>() {
        return http.into();
    }
    if let Some(failure) = err.downcast_ref::<Failure>() {
        // The source walk already visits the rest of the chain.
        let mut node = failure.clone();
        node.cause = None;
        return node;
    }
    Failure::other("Error").with_message(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::causes;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapper {
        label: &'static str,
        source: Option<Box<dyn Error + 'static>>,
    }

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.label)
        }
    }

    impl Error for Wrapper {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            self.source.as_deref()
        }
    }

    fn kinds(failure: &Failure) -> Vec<FailureKind> {
        causes(failure).map(|f| f.kind().clone()).collect()
    }

    #[test]
    fn test_io_error_kinds() {
        let cases = [
            (io::ErrorKind::NotFound, FailureKind::ResourceNotFound),
            (io::ErrorKind::TimedOut, FailureKind::SocketTimeout),
            (io::ErrorKind::ConnectionRefused, FailureKind::ConnectionRefused),
            (io::ErrorKind::ConnectionReset, FailureKind::Socket),
            (io::ErrorKind::BrokenPipe, FailureKind::Socket),
            (io::ErrorKind::UnexpectedEof, FailureKind::UnexpectedEof),
            (io::ErrorKind::PermissionDenied, FailureKind::Io),
        ];

        for (kind, expected) in cases {
            let err = io::Error::new(kind, "boom");
            assert_eq!(Failure::from(&err).kind(), &expected, "for {:?}", kind);
        }
    }

    #[test]
    fn test_io_error_keeps_message() {
        let err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        assert_eq!(Failure::from(&err).message(), Some("disk on fire"));
    }

    #[test]
    fn test_json_syntax_error_chain() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let failure = Failure::from(&err);
        assert_eq!(
            kinds(&failure),
            vec![FailureKind::JsonSyntax, FailureKind::MalformedJson]
        );
    }

    #[test]
    fn test_json_data_error_is_state_failure() {
        let err = serde_json::from_str::<u32>("\"text\"").unwrap_err();
        let failure = Failure::from(&err);
        assert_eq!(failure.kind(), &FailureKind::IllegalState);
        assert!(failure.message().unwrap().contains("expected u32"));
    }

    #[test]
    fn test_from_error_walks_sources() {
        let err = Wrapper {
            label: "loading feed",
            source: Some(Box::new(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "failed to connect to example.com:443",
            ))),
        };

        let failure = from_error(&err);
        assert_eq!(
            kinds(&failure),
            vec![
                FailureKind::Other {
                    type_name: "Error".to_string()
                },
                FailureKind::ConnectionRefused
            ]
        );
        assert_eq!(failure.message(), Some("loading feed"));
    }

    fn chain(
        labels: &[&'static str],
        innermost: Option<io::Error>,
    ) -> Option<Box<dyn Error + 'static>> {
        let mut source: Option<Box<dyn Error + 'static>> =
            innermost.map(|err| Box::new(err) as Box<dyn Error + 'static>);
        for label in labels.iter().rev() {
            source = Some(Box::new(Wrapper {
                label: *label,
                source,
            }));
        }
        source
    }

    #[test]
    fn test_connect_error_with_dns_failure_is_unknown_host() {
        let source = chain(
            &["client error (Connect)", "dns error"],
            Some(io::Error::new(
                io::ErrorKind::Other,
                "failed to lookup address information: Name or service not known",
            )),
        );
        assert_eq!(connect_failure_kind(source.as_deref()), FailureKind::UnknownHost);
    }

    #[test]
    fn test_connect_error_with_refusal_is_connection_refused() {
        let source = chain(
            &["client error (Connect)", "tcp connect error"],
            Some(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "Connection refused (os error 111)",
            )),
        );
        assert_eq!(
            connect_failure_kind(source.as_deref()),
            FailureKind::ConnectionRefused
        );
    }

    #[test]
    fn test_connect_error_with_certificate_failure_is_tls() {
        let source = chain(
            &["client error (Connect)", "invalid peer certificate: UnknownIssuer"],
            None,
        );
        assert_eq!(connect_failure_kind(source.as_deref()), FailureKind::Tls);
    }

    #[test]
    fn test_unrecognized_connect_error_is_socket() {
        let source = chain(&["client error (Connect)"], None);
        assert_eq!(connect_failure_kind(source.as_deref()), FailureKind::Socket);
        assert_eq!(connect_failure_kind(None), FailureKind::Socket);
    }

    #[test]
    fn test_from_error_respects_depth() {
        let mut err = Wrapper {
            label: "innermost",
            source: None,
        };
        for _ in 0..10 {
            err = Wrapper {
                label: "wrapper",
                source: Some(Box::new(err)),
            };
        }

        let failure = from_error_bounded(&err, 4);
        assert_eq!(causes(&failure).count(), 4);
    }

    #[test]
    fn test_from_error_on_failure_round_trips() {
        let original = Failure::new(FailureKind::Io)
            .with_message("outer")
            .caused_by(Failure::new(FailureKind::Tls).with_message("handshake"));

        assert_eq!(from_error(&original), original);
    }
}
