/// Errors that can occur while fetching a record.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The subject cannot be used as a path segment.
    #[error("Invalid subject: {0:?}")]
    InvalidSubject(String),

    /// The configured base URL cannot have path segments appended.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// A network error occurred while sending the request or reading the body.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The HTTP request returned a non-success status code.
    #[error("HTTP error: status {0}")]
    HttpError(u16),

    /// The response exceeded the maximum allowed size.
    #[error("Response exceeds maximum size of {max_size} bytes")]
    ResponseTooLarge {
        /// The maximum allowed size.
        max_size: usize,
    },

    /// The response body could not be decoded into a record.
    #[error("Failed to parse record: {0}")]
    ParseError(String),
}

impl FetchError {
    /// Returns `true` if the source reported the subject as unknown.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpError(404))
    }
}
