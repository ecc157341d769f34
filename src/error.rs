//! Error types for the WS-Management client.

use crate::cursor::CursorState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client errors.
///
/// Transport failures, malformed responses and protocol faults are kept apart
/// so callers can tell "the wire broke" from "the device said no".
#[derive(Error, Debug)]
pub enum WsmanError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Fault(#[from] AmtError),

    #[error("enumeration cursor cannot pull in state {0:?}")]
    InvalidCursorState(CursorState),

    #[error("enumeration exceeded {0} pull round trips")]
    PullLimitExceeded(u32),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WsmanError {
    /// The decoded SOAP Fault, if this error is one.
    pub fn as_fault(&self) -> Option<&AmtError> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

/// Errors raised by a [`Transport`](crate::transport::Transport).
///
/// The core never looks inside these; they reach the caller unchanged.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("no scripted response left for request #{0}")]
    Exhausted(usize),
}

/// A SOAP Fault returned by the managed device.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[error("WS-Management fault {sub_code}: {message}")]
pub struct AmtError {
    /// Fault subcode, as written on the wire (e.g. `b:AccessDenied`)
    pub sub_code: String,
    /// Reason text
    pub message: String,
    /// Text content of the Detail element
    pub detail: String,
}

impl AmtError {
    /// Create a fault.
    pub fn new(
        sub_code: impl Into<String>,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            sub_code: sub_code.into(),
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// Classify the subcode, ignoring its namespace prefix.
    pub fn kind(&self) -> FaultKind {
        let local = self
            .sub_code
            .rsplit_once(':')
            .map_or(self.sub_code.as_str(), |(_, name)| name);
        FaultKind::from_local_name(local)
    }
}

/// Well-known WS-Management / WS-Addressing fault subcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    /// Credentials rejected or insufficient realm
    AccessDenied,
    /// Action URI not supported by the resource
    ActionNotSupported,
    /// Resource URI unknown to the device
    DestinationUnreachable,
    /// Put/Invoke payload rejected
    InvalidParameter,
    /// Selector set does not address an instance
    InvalidSelectors,
    /// Enumeration context expired, already consumed or released
    InvalidEnumerationContext,
    /// Request body failed schema validation
    SchemaValidationError,
    /// Operation did not complete within OperationTimeout
    TimedOut,
    /// Device-internal error
    InternalError,
    /// Any other subcode
    Other,
}

impl FaultKind {
    fn from_local_name(name: &str) -> Self {
        match name {
            "AccessDenied" => Self::AccessDenied,
            "ActionNotSupported" => Self::ActionNotSupported,
            "DestinationUnreachable" => Self::DestinationUnreachable,
            "InvalidParameter" | "InvalidValues" => Self::InvalidParameter,
            "InvalidSelectors" => Self::InvalidSelectors,
            "InvalidEnumerationContext" => Self::InvalidEnumerationContext,
            "SchemaValidationError" => Self::SchemaValidationError,
            "TimedOut" => Self::TimedOut,
            "InternalError" => Self::InternalError,
            _ => Self::Other,
        }
    }

    /// Get the string code for this fault kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "ACCESS_DENIED",
            Self::ActionNotSupported => "ACTION_NOT_SUPPORTED",
            Self::DestinationUnreachable => "DESTINATION_UNREACHABLE",
            Self::InvalidParameter => "INVALID_PARAMETER",
            Self::InvalidSelectors => "INVALID_SELECTORS",
            Self::InvalidEnumerationContext => "INVALID_ENUMERATION_CONTEXT",
            Self::SchemaValidationError => "SCHEMA_VALIDATION_ERROR",
            Self::TimedOut => "TIMED_OUT",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Other => "OTHER",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_kind_ignores_prefix() {
        let fault = AmtError::new("b:AccessDenied", "denied", "");
        assert_eq!(fault.kind(), FaultKind::AccessDenied);

        let fault = AmtError::new("InvalidEnumerationContext", "stale", "");
        assert_eq!(fault.kind(), FaultKind::InvalidEnumerationContext);

        let fault = AmtError::new("e:SomethingVendorSpecific", "?", "");
        assert_eq!(fault.kind(), FaultKind::Other);
    }

    #[test]
    fn test_fault_kind_as_str() {
        assert_eq!(FaultKind::AccessDenied.as_str(), "ACCESS_DENIED");
        assert_eq!(FaultKind::TimedOut.as_str(), "TIMED_OUT");
    }

    #[test]
    fn test_fault_display() {
        let err = WsmanError::from(AmtError::new(
            "b:AccessDenied",
            "The sender was not authorized to access the resource.",
            "",
        ));
        assert_eq!(
            err.to_string(),
            "WS-Management fault b:AccessDenied: The sender was not authorized to access the resource."
        );
        assert!(err.as_fault().is_some());
    }

    #[test]
    fn test_transport_error_is_not_fault() {
        let err = WsmanError::from(TransportError::Connection("refused".to_string()));
        assert!(err.as_fault().is_none());
        assert_eq!(err.to_string(), "transport error: connection failed: refused");
    }
}
