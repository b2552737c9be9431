//! Error kind enumeration for categorizing client errors.

/// Categorization of client errors.
///
/// This enum provides a stable interface for matching on error types, enabling
/// different handling strategies for different failure modes.
///
/// ## Retriable vs Non-Retriable
///
/// | ErrorKind         | Retriable | Typical source                        |
/// |-------------------|-----------|---------------------------------------|
/// | `Unavailable`     | Yes       | HTTP 503, gRPC UNAVAILABLE            |
/// | `Timeout`         | Yes       | HTTP 504, DEADLINE_EXCEEDED, deadline |
/// | `RateLimited`     | Yes       | HTTP 429, RESOURCE_EXHAUSTED          |
/// | `Connection`      | Yes       | DNS, TLS handshake, refused           |
/// | `Unauthorized`    | No        | Missing or invalid API key            |
/// | `NotFound`        | No        | Unknown collection or object          |
/// | `Unimplemented`   | No        | RPC method without a handler          |
/// | `InvalidArgument` | No        | Malformed request or missing field    |
/// | `InvalidResponse` | No        | Undecodable or unexpected response    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Authentication failed (missing, invalid or expired API key).
    ///
    /// HTTP: 401 Unauthorized
    /// gRPC: UNAUTHENTICATED
    #[error("unauthorized")]
    Unauthorized,

    /// Valid credentials but insufficient permissions.
    ///
    /// HTTP: 403 Forbidden
    /// gRPC: PERMISSION_DENIED
    #[error("forbidden")]
    Forbidden,

    /// Requested collection, object or tenant was not found.
    ///
    /// HTTP: 404 Not Found
    /// gRPC: NOT_FOUND
    #[error("not found")]
    NotFound,

    /// Invalid request argument or payload.
    ///
    /// HTTP: 400 Bad Request, 422 Unprocessable Entity
    /// gRPC: INVALID_ARGUMENT, FAILED_PRECONDITION, OUT_OF_RANGE
    ///
    /// Also used for programming errors detected on the client side, such
    /// as a request missing a required field.
    #[error("invalid argument")]
    InvalidArgument,

    /// Conflict with existing state (e.g. collection already exists).
    ///
    /// HTTP: 409 Conflict
    /// gRPC: ALREADY_EXISTS, ABORTED
    #[error("conflict")]
    Conflict,

    /// Rate limit exceeded.
    ///
    /// HTTP: 429 Too Many Requests
    /// gRPC: RESOURCE_EXHAUSTED
    #[error("rate limited")]
    RateLimited,

    /// Service temporarily unavailable.
    ///
    /// HTTP: 503 Service Unavailable
    /// gRPC: UNAVAILABLE
    #[error("service unavailable")]
    Unavailable,

    /// Request timed out, either server-side or because the context deadline
    /// elapsed before the transport finished.
    ///
    /// HTTP: 504 Gateway Timeout
    /// gRPC: DEADLINE_EXCEEDED
    #[error("timeout")]
    Timeout,

    /// Internal server error.
    ///
    /// HTTP: 500 Internal Server Error
    /// gRPC: INTERNAL, DATA_LOSS
    #[error("internal error")]
    Internal,

    /// Request was cancelled through its cancellation token.
    ///
    /// gRPC: CANCELLED
    #[error("cancelled")]
    Cancelled,

    /// Connection error (DNS, TLS handshake, network unreachable).
    #[error("connection error")]
    Connection,

    /// Protocol error (malformed frame, unexpected encoding).
    #[error("protocol error")]
    Protocol,

    /// Configuration error (invalid URL, bad header value).
    #[error("configuration error")]
    Configuration,

    /// The remote side, or a mock transport, has no handler for the call.
    ///
    /// gRPC: UNIMPLEMENTED
    #[error("unimplemented")]
    Unimplemented,

    /// Response could not be decoded, or had an unexpected shape.
    #[error("invalid response")]
    InvalidResponse,

    /// Generic transport error that fits no narrower category.
    #[error("transport error")]
    Transport,

    /// Unknown or unexpected error.
    #[error("unknown error")]
    Unknown,
}

impl ErrorKind {
    /// Returns `true` if this error kind is generally safe to retry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use weaviate::ErrorKind;
    ///
    /// assert!(ErrorKind::Unavailable.is_retriable());
    /// assert!(!ErrorKind::NotFound.is_retriable());
    /// ```
    #[inline]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Unavailable
                | ErrorKind::Timeout
                | ErrorKind::RateLimited
                | ErrorKind::Connection
        )
    }

    /// Creates an `ErrorKind` from a non-success HTTP status code.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorKind::InvalidArgument,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::RateLimited,
            499 => ErrorKind::Cancelled,
            500 => ErrorKind::Internal,
            501 => ErrorKind::Unimplemented,
            502 => ErrorKind::Transport,
            503 => ErrorKind::Unavailable,
            504 => ErrorKind::Timeout,
            _ if (400..500).contains(&status) => ErrorKind::InvalidArgument,
            _ if status >= 500 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        }
    }

    /// Creates an `ErrorKind` from a numeric gRPC status code.
    ///
    /// Numeric codes are used so the mapping is available without the
    /// `grpc` feature (mock transports raise gRPC-shaped failures too).
    pub fn from_grpc_code(code: i32) -> Self {
        match code {
            1 => ErrorKind::Cancelled,
            3 | 9 | 11 => ErrorKind::InvalidArgument,
            4 => ErrorKind::Timeout,
            5 => ErrorKind::NotFound,
            6 | 10 => ErrorKind::Conflict,
            7 => ErrorKind::Forbidden,
            8 => ErrorKind::RateLimited,
            12 => ErrorKind::Unimplemented,
            13 | 15 => ErrorKind::Internal,
            14 => ErrorKind::Unavailable,
            16 => ErrorKind::Unauthorized,
            _ => ErrorKind::Unknown,
        }
    }
}
