pub type PortraitResult<T> = Result<T, PortraitError>;

#[derive(thiserror::Error, Debug)]
pub enum PortraitError {
    #[error("validation error: {0}")]
    Validation(String),

    /// The source image could not be decoded. Callers degrade to sending the
    /// original bytes instead of blocking the user.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request never reached the server or the response body was
    /// unreadable. Retrying is safe; no state was mutated.
    #[error("network error: {0}")]
    Network(String),

    /// The server was reachable but returned a body that is not JSON.
    #[error("server returned non-JSON response ({status})")]
    NonJson { status: u16 },

    /// Structured failure from the backend; the message is surfaced verbatim.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The operation requires a credential that was not supplied.
    #[error("sign-in required")]
    AuthRequired,

    /// The client-side gate denied generation before any network call.
    #[error("no portrait credits remaining")]
    CreditsExhausted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PortraitError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Whether a caller may retry the failed operation without side effects.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            PortraitError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            PortraitError::decode("x")
                .to_string()
                .contains("decode error:")
        );
        assert!(
            PortraitError::network("x")
                .to_string()
                .contains("network error:")
        );
        assert!(
            PortraitError::server(500, "boom")
                .to_string()
                .contains("server error (500): boom")
        );
    }

    #[test]
    fn non_json_display_carries_status_code() {
        let err = PortraitError::NonJson { status: 500 };
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(PortraitError::network("reset").is_retryable());
        assert!(!PortraitError::AuthRequired.is_retryable());
        assert!(!PortraitError::server(502, "bad gateway").is_retryable());
        assert!(!PortraitError::NonJson { status: 502 }.is_retryable());
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = PortraitError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
