//! Error kind enumeration for categorizing storefront errors.

/// Categorization of storefront errors.
///
/// This enum provides a stable interface for matching on error types, enabling
/// different handling strategies for different failure modes.
///
/// ## Taxonomy
///
/// | Source                      | Kinds                                                   |
/// |-----------------------------|---------------------------------------------------------|
/// | Network / transport failure | `Connection`, `Timeout`, `Transport`                    |
/// | Non-2xx HTTP status         | `InvalidArgument`, `NotFound`, `Internal`, ...          |
/// | Malformed response body     | `InvalidResponse`                                       |
/// | Superseded request          | `Cancelled` (never shown to the user)                   |
/// | Local rejection             | `Busy`, `Validation`, `Configuration`                   |
///
/// ## Retriable vs Non-Retriable
///
/// | ErrorKind         | Retriable | Action                     |
/// |-------------------|-----------|----------------------------|
/// | `Unavailable`     | Yes       | Retry with backoff         |
/// | `Timeout`         | Yes       | Retry with backoff         |
/// | `RateLimited`     | Yes       | Use `retry_after()` delay  |
/// | `Connection`      | Yes       | Retry with backoff         |
/// | `NotFound`        | No        | Item doesn't exist         |
/// | `InvalidArgument` | No        | Fix input                  |
/// | `Busy`            | No        | Wait for pending mutation  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Authentication failed.
    ///
    /// HTTP: 401 Unauthorized
    #[error("unauthorized")]
    Unauthorized,

    /// Valid credentials but insufficient permissions.
    ///
    /// HTTP: 403 Forbidden
    #[error("forbidden")]
    Forbidden,

    /// Requested product, cart line or order was not found.
    ///
    /// HTTP: 404 Not Found
    #[error("not found")]
    NotFound,

    /// Invalid request argument or payload.
    ///
    /// HTTP: 400 Bad Request
    #[error("invalid argument")]
    InvalidArgument,

    /// Conflict with existing server state.
    ///
    /// HTTP: 409 Conflict
    #[error("conflict")]
    Conflict,

    /// Rate limit exceeded.
    ///
    /// HTTP: 429 Too Many Requests
    ///
    /// **Retriable.** Use `Error::retry_after()` for the recommended delay.
    #[error("rate limited")]
    RateLimited,

    /// Service temporarily unavailable.
    ///
    /// HTTP: 503 Service Unavailable
    #[error("service unavailable")]
    Unavailable,

    /// Request timed out.
    ///
    /// HTTP: 504 Gateway Timeout or client-side timeout
    #[error("timeout")]
    Timeout,

    /// Internal server error.
    ///
    /// HTTP: 500 Internal Server Error. The mock order endpoint fails this way.
    #[error("internal error")]
    Internal,

    /// Request was superseded by a newer one.
    ///
    /// This is expected control flow, not a failure. It must never populate
    /// a user-visible error state.
    #[error("cancelled")]
    Cancelled,

    /// Connection error (DNS, TLS handshake, network unreachable).
    #[error("connection error")]
    Connection,

    /// Protocol error (request could not be encoded, unexpected status class).
    #[error("protocol error")]
    Protocol,

    /// Configuration error (invalid URL, zero page size).
    #[error("configuration error")]
    Configuration,

    /// Generic transport error for HTTP issues that don't fit
    /// more specific categories.
    #[error("transport error")]
    Transport,

    /// Response could not be parsed or had an unexpected shape.
    #[error("invalid response")]
    InvalidResponse,

    /// A mutation for the same product is already in flight.
    #[error("busy")]
    Busy,

    /// Checkout form input failed field validation.
    #[error("validation failed")]
    Validation,

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
    /// use storefront::ErrorKind;
    ///
    /// assert!(ErrorKind::Timeout.is_retriable());
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

    /// Returns the default HTTP status code for this error kind.
    #[inline]
    pub fn http_status_code(&self) -> u16 {
        match self {
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidArgument | ErrorKind::Validation => 400,
            ErrorKind::Conflict | ErrorKind::Busy => 409,
            ErrorKind::RateLimited => 429,
            ErrorKind::Timeout => 504,
            ErrorKind::Unavailable => 503,
            ErrorKind::Internal => 500,
            ErrorKind::Cancelled => 499, // Client Closed Request
            ErrorKind::Connection => 502,
            ErrorKind::Protocol | ErrorKind::Transport => 502,
            ErrorKind::InvalidResponse => 502,
            ErrorKind::Configuration | ErrorKind::Unknown => 500,
        }
    }

    /// Creates an `ErrorKind` from an HTTP status code.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::InvalidArgument,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::RateLimited,
            499 => ErrorKind::Cancelled,
            500 => ErrorKind::Internal,
            502 => ErrorKind::Transport,
            503 => ErrorKind::Unavailable,
            504 => ErrorKind::Timeout,
            _ if (400..500).contains(&status) => ErrorKind::InvalidArgument,
            _ if status >= 500 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        }
    }
}
