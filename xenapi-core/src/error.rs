use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Well-known failure codes reported by the server as the first element of
/// `ErrorDescription`.
pub mod codes {
    pub const SESSION_INVALID: &str = "SESSION_INVALID";
    pub const SESSION_AUTHENTICATION_FAILED: &str = "SESSION_AUTHENTICATION_FAILED";
    pub const HANDLE_INVALID: &str = "HANDLE_INVALID";
    pub const UUID_INVALID: &str = "UUID_INVALID";
    pub const MESSAGE_METHOD_UNKNOWN: &str = "MESSAGE_METHOD_UNKNOWN";
    pub const MESSAGE_PARAMETER_COUNT_MISMATCH: &str = "MESSAGE_PARAMETER_COUNT_MISMATCH";
    pub const OPERATION_NOT_ALLOWED: &str = "OPERATION_NOT_ALLOWED";
    pub const VM_BAD_POWER_STATE: &str = "VM_BAD_POWER_STATE";
    /// Used when a failure envelope carries an empty `ErrorDescription`.
    pub const UNKNOWN: &str = "UNKNOWN_ERROR";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TransportFailure,
    RemoteFailure,
    TypeMismatch,
    FieldDecodeFailure,
    UnknownEnumerant,
    NotAuthenticated,
    Encode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::RemoteFailure => "remote_failure",
            ErrorKind::TypeMismatch => "type_mismatch",
            ErrorKind::FieldDecodeFailure => "field_decode_failure",
            ErrorKind::UnknownEnumerant => "unknown_enumerant",
            ErrorKind::NotAuthenticated => "not_authenticated",
            ErrorKind::Encode => "encode",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of a failed call or decode.
///
/// Every dispatcher operation returns `Result<T, Fault>`; there is no
/// latched per-session error state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Fault {
    /// Connection, timeout or HTTP-level failure. The call may be retried.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Application fault reported by the server in a failure envelope.
    #[error("remote failure {code}: {params:?}")]
    RemoteFailure { code: String, params: Vec<String> },

    /// The wire value does not have the shape its descriptor requires.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A record field failed to decode; the whole record is abandoned.
    #[error("failed to decode field '{field}': {source}")]
    FieldDecodeFailure {
        field: String,
        #[source]
        source: Box<Fault>,
    },

    /// The server sent an enumerant this client does not know.
    #[error("unknown enumerant '{value}' for {enum_name}")]
    UnknownEnumerant { enum_name: String, value: String },

    /// The session was logged out (or never authenticated).
    #[error("session is not authenticated")]
    NotAuthenticated,

    /// A parameter could not be put on the wire.
    #[error("encode error: {0}")]
    Encode(String),
}

impl Fault {
    pub fn transport(message: impl Into<String>) -> Self {
        Fault::TransportFailure(message.into())
    }

    pub fn remote(code: impl Into<String>, params: Vec<String>) -> Self {
        Fault::RemoteFailure {
            code: code.into(),
            params,
        }
    }

    /// Build a remote failure from a server `ErrorDescription` list, whose
    /// first element is the code and the rest its arguments.
    pub fn from_error_description(mut description: Vec<String>) -> Self {
        if description.is_empty() {
            return Fault::remote(codes::UNKNOWN, Vec::new());
        }
        let code = description.remove(0);
        Fault::remote(code, description)
    }

    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Fault::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn field_decode(field: impl Into<String>, source: Fault) -> Self {
        Fault::FieldDecodeFailure {
            field: field.into(),
            source: Box::new(source),
        }
    }

    pub fn unknown_enumerant(enum_name: impl Into<String>, value: impl Into<String>) -> Self {
        Fault::UnknownEnumerant {
            enum_name: enum_name.into(),
            value: value.into(),
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Fault::Encode(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Fault::TransportFailure(_) => ErrorKind::TransportFailure,
            Fault::RemoteFailure { .. } => ErrorKind::RemoteFailure,
            Fault::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Fault::FieldDecodeFailure { .. } => ErrorKind::FieldDecodeFailure,
            Fault::UnknownEnumerant { .. } => ErrorKind::UnknownEnumerant,
            Fault::NotAuthenticated => ErrorKind::NotAuthenticated,
            Fault::Encode(_) => ErrorKind::Encode,
        }
    }

    /// Only transport failures may succeed when repeated unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Fault::TransportFailure(_))
    }

    /// True when this is a remote failure carrying `code`.
    pub fn is_remote(&self, code: &str) -> bool {
        matches!(self, Fault::RemoteFailure { code: c, .. } if c == code)
    }

    /// Innermost cause, following nested field decode failures.
    pub fn root_cause(&self) -> &Fault {
        match self {
            Fault::FieldDecodeFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Dotted path of record fields leading to the innermost cause.
    pub fn field_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let Fault::FieldDecodeFailure { field, source } = current {
            path.push(field.as_str());
            current = source;
        }
        path
    }
}
