//! Failure values and their category taxonomy.
//!
//! A [`Failure`] is the owned description of an error raised somewhere in the
//! application: a closed [`FailureKind`] discriminator, optional descriptions
//! and an optional boxed cause. Classification never inspects concrete error
//! types; the adapters in [`adapt`] turn real error values into failures first.

pub mod adapt;
pub mod chain;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use adapt::{from_error, from_error_bounded};
pub use chain::{causes, find_cause, has_cause, Causes, ChainWalker, DEFAULT_MAX_CAUSE_DEPTH};

/// The concrete shape of a failure.
///
/// The `Other` variant is the catch-all for failures the taxonomy does not
/// name; it keeps the original type name for best-effort messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// Error raised by the HTTP client for a non-success response.
    HttpTransport {
        status: u16,
        #[serde(default)]
        body: String,
    },
    /// Non-success HTTP response already unwrapped by the API layer.
    HttpStatus {
        status: u16,
        #[serde(default)]
        body: String,
    },
    /// Structured payload could not be decoded at all.
    JsonSyntax,
    /// Low-level reader rejected a malformed payload.
    MalformedJson,
    /// A local resource (usually a file) does not exist.
    ResourceNotFound,
    /// A generic operation deadline elapsed.
    Timeout,
    /// A socket read timed out.
    SocketTimeout,
    /// DNS resolution failed.
    UnknownHost,
    /// TLS handshake or secure transport failure.
    Tls,
    /// The peer violated the wire protocol.
    Protocol,
    /// The remote end refused the connection.
    ConnectionRefused,
    /// Generic socket failure (reset, aborted, broken pipe).
    Socket,
    /// Stream ended before the expected data arrived.
    UnexpectedEof,
    /// Any other I/O failure.
    Io,
    /// The session expired or the action needs a logged-in user.
    LoginRequired,
    /// Application state was inconsistent for the requested operation.
    IllegalState,
    /// A runtime permission was not granted.
    PermissionDenied { permission: String },
    /// A required value was missing (programming defect).
    NullReference,
    /// Resource exhaustion.
    OutOfMemory,
    /// Anything else.
    Other { type_name: String },
}

impl FailureKind {
    /// Stable type name used in display text and best-effort messages.
    pub fn type_name(&self) -> &str {
        match self {
            FailureKind::HttpTransport { .. } => "HttpTransportError",
            FailureKind::HttpStatus { .. } => "HttpStatusError",
            FailureKind::JsonSyntax => "JsonSyntaxError",
            FailureKind::MalformedJson => "MalformedJsonError",
            FailureKind::ResourceNotFound => "ResourceNotFound",
            FailureKind::Timeout => "Timeout",
            FailureKind::SocketTimeout => "SocketTimeout",
            FailureKind::UnknownHost => "UnknownHost",
            FailureKind::Tls => "TlsError",
            FailureKind::Protocol => "ProtocolError",
            FailureKind::ConnectionRefused => "ConnectionRefused",
            FailureKind::Socket => "SocketError",
            FailureKind::UnexpectedEof => "UnexpectedEof",
            FailureKind::Io => "IoError",
            FailureKind::LoginRequired => "LoginRequired",
            FailureKind::IllegalState => "IllegalState",
            FailureKind::PermissionDenied { .. } => "PermissionDenied",
            FailureKind::NullReference => "NullReference",
            FailureKind::OutOfMemory => "OutOfMemory",
            FailureKind::Other { type_name } if !type_name.trim().is_empty() => type_name,
            FailureKind::Other { .. } => "UnknownFailure",
        }
    }

    /// Returns true for every kind of the I/O family, transport and file
    /// failures alike.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            FailureKind::Io
                | FailureKind::ResourceNotFound
                | FailureKind::SocketTimeout
                | FailureKind::MalformedJson
                | FailureKind::UnknownHost
                | FailureKind::Tls
                | FailureKind::Protocol
                | FailureKind::ConnectionRefused
                | FailureKind::Socket
                | FailureKind::UnexpectedEof
        )
    }

    /// Returns true for socket-level failures, including refused connections.
    pub fn is_socket(&self) -> bool {
        matches!(self, FailureKind::Socket | FailureKind::ConnectionRefused)
    }
}

/// Canonical view of an HTTP failure, whichever layer raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HttpStatus<'a> {
    /// Response status code.
    pub code: u16,
    /// Response body, empty when it was not captured.
    pub body: &'a str,
}

impl HttpStatus<'_> {
    /// Returns true for any 5xx status.
    pub fn is_server_error(&self) -> bool {
        self.code / 100 == 5
    }

    /// Returns true if the body contains `needle`.
    pub fn body_contains(&self, needle: &str) -> bool {
        self.body.contains(needle)
    }
}

/// An error value reduced to what classification needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    #[serde(flatten)]
    kind: FailureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    localized_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cause: Option<Box<Failure>>,
}

impl Failure {
    /// Creates a failure of the given kind with no description and no cause.
    pub fn new(kind: FailureKind) -> Self {
        Self {
            kind,
            message: None,
            localized_message: None,
            cause: None,
        }
    }

    /// Creates an unwrapped HTTP status failure.
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::new(FailureKind::HttpStatus {
            status,
            body: body.into(),
        })
    }

    /// Creates an HTTP failure in the shape the HTTP client raises it.
    pub fn http_transport(status: u16, body: impl Into<String>) -> Self {
        Self::new(FailureKind::HttpTransport {
            status,
            body: body.into(),
        })
    }

    /// Creates a permission-denied failure for the given permission identifier.
    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::new(FailureKind::PermissionDenied {
            permission: permission.into(),
        })
    }

    /// Creates a failure of a type outside the taxonomy.
    pub fn other(type_name: impl Into<String>) -> Self {
        Self::new(FailureKind::Other {
            type_name: type_name.into(),
        })
    }

    /// Sets the raw description.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the localized description.
    pub fn with_localized_message(mut self, message: impl Into<String>) -> Self {
        self.localized_message = Some(message.into());
        self
    }

    /// Sets the direct cause, replacing any previous one.
    pub fn caused_by(mut self, cause: Failure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Appends `inner` below the deepest existing cause.
    pub(crate) fn with_innermost_cause(mut self, inner: Failure) -> Self {
        let cause = match self.cause.take() {
            Some(existing) => (*existing).with_innermost_cause(inner),
            None => inner,
        };
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn localized_message(&self) -> Option<&str> {
        self.localized_message.as_deref()
    }

    pub fn cause(&self) -> Option<&Failure> {
        self.cause.as_deref()
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    /// Normalizes both HTTP shapes into one view; `None` for anything else.
    pub fn http(&self) -> Option<HttpStatus<'_>> {
        match &self.kind {
            FailureKind::HttpTransport { status, body } | FailureKind::HttpStatus { status, body } => {
                Some(HttpStatus {
                    code: *status,
                    body,
                })
            }
            _ => None,
        }
    }

    /// The most descriptive text available, if any is non-blank.
    ///
    /// Prefers the localized description over the raw one.
    pub fn description(&self) -> Option<&str> {
        non_blank(self.localized_message.as_deref()).or_else(|| non_blank(self.message.as_deref()))
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(description) => write!(f, "{}: {}", self.type_name(), description),
            None => write!(f, "{}", self.type_name()),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}
