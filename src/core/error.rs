//! Error types raised while building traversal maps and dispatching requests.
//!
//! Two families exist. [`ConfigError`] describes a handler type whose registered
//! members are ambiguous; it is raised when the traversal map for that type is
//! built and is meant to abort startup. [`DispatchError`] describes why a single
//! request could not be resolved; the HTTP boundary turns it into a status code.
use http::StatusCode;
use thiserror::Error;

/// A handler type registered an inconsistent set of members.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{type_name} declares more than one default route (\"{first}\" and \"{second}\")")]
    MultipleDefaults {
        type_name: &'static str,
        first: String,
        second: String,
    },

    #[error("{type_name} registers member \"{member}\" more than once")]
    DuplicateMember {
        type_name: &'static str,
        member: String,
    },

    #[error("{type_name} maps path segment \"{segment}\" to both \"{first}\" and \"{second}\"")]
    DuplicateSegment {
        type_name: &'static str,
        segment: String,
        first: String,
        second: String,
    },

    #[error("{type_name} uses invalid path segment \"{segment}\" for member \"{member}\"")]
    InvalidSegment {
        type_name: &'static str,
        member: String,
        segment: String,
    },

    #[error("member \"{member}\" of {type_name} declares parameter \"{param}\" more than once")]
    DuplicateParam {
        type_name: &'static str,
        member: String,
        param: String,
    },
}

/// Coarse classification used by the boundary layer to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Status(StatusCode),
    Internal,
}

/// Why a request could not be dispatched to a response.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DispatchError {
    /// The segment is not registered on the current object's type.
    #[error("path segment \"{segment}\" not found on {type_name}")]
    NotFound {
        segment: String,
        type_name: &'static str,
    },

    /// The segment names a registered member that is not traversable.
    #[error("member \"{segment}\" of {type_name} is not traversable")]
    NotTraversable {
        segment: String,
        type_name: &'static str,
    },

    #[error("Required parameter \"{param}\" not provided")]
    MissingParameter { route: String, param: String },

    #[error("{0}")]
    BadRequest(String),

    /// Raised by handlers that want a specific status code.
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("traversal exceeded the maximum depth of {0} steps")]
    DepthExceeded(usize),

    #[error("member \"{member}\" was invoked on a value that is not a {expected}")]
    TypeMismatch {
        member: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Any other error raised by a handler; passed through untouched.
    #[error(transparent)]
    Handler(#[from] eyre::Report),
}

impl DispatchError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::NotTraversable { .. } => ErrorKind::NotFound,
            Self::MissingParameter { .. } | Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Status { status, .. } => ErrorKind::Status(*status),
            Self::DepthExceeded(_)
            | Self::TypeMismatch { .. }
            | Self::Configuration(_)
            | Self::Handler(_) => ErrorKind::Internal,
        }
    }
}
