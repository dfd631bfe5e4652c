/// Errors from the ICD API client.
#[derive(Debug, thiserror::Error)]
pub enum IcdError {
    /// The client is switched off in configuration.
    #[error("ICD integration is disabled")]
    Disabled,

    /// Transport-level failure talking to the ICD API.
    #[error("ICD request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint rejected the client credentials.
    #[error("ICD token endpoint returned status {status}")]
    TokenEndpoint {
        /// HTTP status returned by the token endpoint.
        status: u16,
    },

    /// The ICD API returned an unexpected status.
    #[error("ICD API returned status {status} for {url}")]
    Api {
        /// HTTP status returned.
        status: u16,
        /// Request URL, for diagnostics.
        url: String,
    },

    /// A response did not have the expected shape.
    #[error("Unexpected ICD response: {message}")]
    UnexpectedResponse {
        /// Description of the mismatch.
        message: String,
    },
}

impl IcdError {
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }
}
