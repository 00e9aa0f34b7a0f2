//! User-facing message templates and the context that resolves them.
//!
//! Rules never hold message text. They name a [`MessageKey`] and a
//! [`MessageContext`] turns it into localized text at resolution time. The
//! context also answers permission-label lookups, which may fail.

pub mod local;

use thiserror::Error;

pub use local::{LocalContext, TemplateFormatter};

/// Identifies one user-facing message template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKey {
    EdgeChallenge,
    Blocked,
    NotAuthorized,
    RateLimited,
    NotFound,
    GatewayTimeout,
    OriginTimeout,
    ServiceUnavailable,
    UnparsableResponse,
    ContentNotFound,
    TimedOut,
    Conversion,
    HostNotFound,
    SecureConnection,
    Protocol,
    /// Same argument as [`MessageKey::Connect`].
    ConnectHttps,
    /// `{0}` is the top-level failure's localized description, else its raw
    /// description, else its type name. Never the refused node's text.
    Connect,
    Connection,
    LoginRequired,
    /// Takes the raw failure description as `{0}`.
    DataMapping,
    /// Takes the permission label as `{0}`.
    PermissionNotGranted,
    Internal,
    OutOfMemory,
    /// Takes the failure type name as `{0}`.
    ExceptionOfType,
}

impl MessageKey {
    /// Every key, in a stable order.
    pub const ALL: [MessageKey; 24] = [
        MessageKey::EdgeChallenge,
        MessageKey::Blocked,
        MessageKey::NotAuthorized,
        MessageKey::RateLimited,
        MessageKey::NotFound,
        MessageKey::GatewayTimeout,
        MessageKey::OriginTimeout,
        MessageKey::ServiceUnavailable,
        MessageKey::UnparsableResponse,
        MessageKey::ContentNotFound,
        MessageKey::TimedOut,
        MessageKey::Conversion,
        MessageKey::HostNotFound,
        MessageKey::SecureConnection,
        MessageKey::Protocol,
        MessageKey::ConnectHttps,
        MessageKey::Connect,
        MessageKey::Connection,
        MessageKey::LoginRequired,
        MessageKey::DataMapping,
        MessageKey::PermissionNotGranted,
        MessageKey::Internal,
        MessageKey::OutOfMemory,
        MessageKey::ExceptionOfType,
    ];

    /// Identifier used in settings files.
    pub fn id(self) -> &'static str {
        match self {
            MessageKey::EdgeChallenge => "edge_challenge",
            MessageKey::Blocked => "blocked",
            MessageKey::NotAuthorized => "not_authorized",
            MessageKey::RateLimited => "rate_limited",
            MessageKey::NotFound => "not_found",
            MessageKey::GatewayTimeout => "gateway_timeout",
            MessageKey::OriginTimeout => "origin_timeout",
            MessageKey::ServiceUnavailable => "service_unavailable",
            MessageKey::UnparsableResponse => "unparsable_response",
            MessageKey::ContentNotFound => "content_not_found",
            MessageKey::TimedOut => "timed_out",
            MessageKey::Conversion => "conversion",
            MessageKey::HostNotFound => "host_not_found",
            MessageKey::SecureConnection => "secure_connection",
            MessageKey::Protocol => "protocol",
            MessageKey::ConnectHttps => "connect_https",
            MessageKey::Connect => "connect",
            MessageKey::Connection => "connection",
            MessageKey::LoginRequired => "login_required",
            MessageKey::DataMapping => "data_mapping",
            MessageKey::PermissionNotGranted => "permission_not_granted",
            MessageKey::Internal => "internal",
            MessageKey::OutOfMemory => "out_of_memory",
            MessageKey::ExceptionOfType => "exception_of_type",
        }
    }

    /// Looks a key up by its settings identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.id() == id)
    }

    /// Built-in English template.
    pub fn default_template(self) -> &'static str {
        match self {
            MessageKey::EdgeChallenge => {
                "The request was stopped by the site's edge protection. Please try again later."
            }
            MessageKey::Blocked => "The request was blocked by the server.",
            MessageKey::NotAuthorized => "You are not authorized to do this. Please log in again.",
            MessageKey::RateLimited => "Too many requests. Please wait a moment and try again.",
            MessageKey::NotFound => "The requested content could not be found.",
            MessageKey::GatewayTimeout => "The gateway timed out waiting for the server.",
            MessageKey::OriginTimeout => "The server did not answer in time.",
            MessageKey::ServiceUnavailable => {
                "The service is currently unavailable. Please try again later."
            }
            MessageKey::UnparsableResponse => "Could not parse the server's response.",
            MessageKey::ContentNotFound => "The content could not be found.",
            MessageKey::TimedOut => "The operation timed out. Please check your connection.",
            MessageKey::Conversion => "The server's response could not be converted.",
            MessageKey::HostNotFound => {
                "The server could not be found. Please check your internet connection."
            }
            MessageKey::SecureConnection => {
                "A secure connection to the server could not be established."
            }
            MessageKey::Protocol => "The server violated the protocol.",
            MessageKey::ConnectHttps => "Could not connect to the server via https: {0}",
            MessageKey::Connect => "Could not connect to the server: {0}",
            MessageKey::Connection => "The connection to the server was interrupted.",
            MessageKey::LoginRequired => "You need to log in to do this.",
            MessageKey::DataMapping => "The server sent data in an unexpected format: {0}",
            MessageKey::PermissionNotGranted => "Permission not granted: {0}",
            MessageKey::Internal => "An internal error occurred.",
            MessageKey::OutOfMemory => "The application ran out of memory.",
            MessageKey::ExceptionOfType => "exception of type {0}",
        }
    }
}

/// Failure of a permission-label lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The platform does not know the permission identifier.
    #[error("unknown permission: {0}")]
    UnknownPermission(String),
    /// The metadata source could not be queried.
    #[error("permission metadata unavailable: {0}")]
    Unavailable(String),
}

/// Collaborator supplying localized text and platform metadata.
pub trait MessageContext {
    /// Resolves `key` with positional `{n}` arguments.
    fn text(&self, key: MessageKey, args: &[&str]) -> String;

    /// Human-readable label of a platform permission identifier.
    fn permission_label(&self, permission: &str) -> Result<String, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_round_trip() {
        for key in MessageKey::ALL {
            assert_eq!(MessageKey::from_id(key.id()), Some(key));
        }
        let mut ids: Vec<_> = MessageKey::ALL.iter().map(|k| k.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), MessageKey::ALL.len());
    }

    #[test]
    fn test_unknown_id() {
        assert_eq!(MessageKey::from_id("no_such_message"), None);
    }

    #[test]
    fn test_default_templates_are_not_empty() {
        for key in MessageKey::ALL {
            assert!(!key.default_template().trim().is_empty(), "{:?}", key);
        }
    }

    #[test]
    fn test_lookup_error_display() {
        let err = LookupError::UnknownPermission("android.permission.CAMERA".into());
        assert_eq!(err.to_string(), "unknown permission: android.permission.CAMERA");
    }
}
