//! Error taxonomy for the request pipeline.
//!
//! Parsing failures ([`MalformedRequest`]) and routing failures ([`DispatchError`])
//! abort an exchange before any handler code runs. Authorization denial is not an
//! error: it is a normal [`crate::dispatcher::ActionResult::Unauthorized`] value.
//! Degraded parameter binding is not an error either; handlers receive unbound
//! slots and decide for themselves.

use http::StatusCode;
use std::fmt;

/// A structurally invalid request message. Always answered with `400 Bad Request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRequest {
    /// The message contained no request line at all.
    Empty,
    /// The request line did not have exactly three space-separated tokens.
    InvalidRequestLine {
        /// The offending line
        line: String,
    },
    /// The protocol token was not `HTTP/1.1`.
    UnsupportedProtocol {
        /// The protocol token that was received
        protocol: String,
    },
    /// The method token is not a recognized HTTP method.
    UnknownMethod {
        /// The method token that was received
        method: String,
    },
    /// A header line was not of the form `Name: Value`.
    InvalidHeader {
        /// The offending line
        line: String,
    },
    /// No `Host` header was present.
    MissingHost,
    /// The query string could not be split into `key=value` pairs.
    InvalidQuery {
        /// The raw query string
        query: String,
    },
    /// The form body could not be split into `key=value` pairs.
    InvalidForm {
        /// The raw body
        body: String,
    },
    /// The message bytes were not valid UTF-8.
    InvalidEncoding,
}

impl fmt::Display for MalformedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedRequest::Empty => write!(f, "malformed request: empty message"),
            MalformedRequest::InvalidRequestLine { line } => {
                write!(f, "malformed request: invalid request line '{line}'")
            }
            MalformedRequest::UnsupportedProtocol { protocol } => {
                write!(f, "malformed request: unsupported protocol '{protocol}'")
            }
            MalformedRequest::UnknownMethod { method } => {
                write!(f, "malformed request: unknown method '{method}'")
            }
            MalformedRequest::InvalidHeader { line } => {
                write!(f, "malformed request: invalid header line '{line}'")
            }
            MalformedRequest::MissingHost => {
                write!(f, "malformed request: missing Host header")
            }
            MalformedRequest::InvalidQuery { query } => {
                write!(f, "malformed request: invalid query string '{query}'")
            }
            MalformedRequest::InvalidForm { body } => {
                write!(f, "malformed request: invalid form body '{body}'")
            }
            MalformedRequest::InvalidEncoding => {
                write!(f, "malformed request: message is not valid UTF-8")
            }
        }
    }
}

impl std::error::Error for MalformedRequest {}

/// Terminal failure of the dispatch state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The path does not name a handler and an action.
    RouteNotFound {
        /// Request path
        path: String,
    },
    /// No handler is registered under the resolved type name.
    HandlerNotFound {
        /// Handler type name handed to the factory (e.g. `UserController`)
        handler: String,
    },
    /// The handler declares no action accepting this name and method.
    ActionNotFound {
        /// Handler type name
        handler: String,
        /// Resolved action name
        action: String,
        /// Request method
        method: String,
    },
    /// Registration is inconsistent (e.g. an action invoked on the wrong handler type).
    Configuration {
        /// Description of the inconsistency
        message: String,
    },
    /// The action's result could not be turned into a response.
    Render {
        /// Description of the rendering failure
        message: String,
    },
}

impl DispatchError {
    /// Status code of the response that reports this failure.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::RouteNotFound { .. }
            | DispatchError::HandlerNotFound { .. }
            | DispatchError::ActionNotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::Configuration { .. } | DispatchError::Render { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether this failure indicates a bug in application wiring rather than a bad request.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DispatchError::Configuration { .. } | DispatchError::Render { .. }
        )
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::RouteNotFound { path } => {
                write!(f, "no route for path '{path}'")
            }
            DispatchError::HandlerNotFound { handler } => {
                write!(f, "no handler registered as '{handler}'")
            }
            DispatchError::ActionNotFound {
                handler,
                action,
                method,
            } => write!(
                f,
                "handler '{handler}' has no action '{action}' accepting {method}"
            ),
            DispatchError::Configuration { message } => {
                write!(f, "configuration error: {message}")
            }
            DispatchError::Render { message } => write!(f, "render error: {message}"),
        }
    }
}

impl std::error::Error for DispatchError {}
