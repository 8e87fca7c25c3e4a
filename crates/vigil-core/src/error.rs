/// Errors that can occur across the vigil pipeline.
///
/// Each variant maps to one class of failure in the review flow. Library
/// crates use this type directly; the binary converts to `miette` at the
/// boundary. Nothing here is retried automatically.
///
/// # Examples
///
/// ```
/// use vigil_core::VigilError;
///
/// let err = VigilError::Config("OPENAI_API_KEY not set".into());
/// assert!(err.to_string().contains("OPENAI_API_KEY"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum VigilError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required secret or configuration value is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed request input, detected before any external call.
    #[error("input error: {0}")]
    Input(String),

    /// An upstream service returned a non-success HTTP status.
    #[error("{service} error {status}: {body}")]
    Upstream {
        /// Which collaborator failed (`"github"` or `"model"`).
        service: &'static str,
        /// HTTP status code returned by the upstream.
        status: u16,
        /// Upstream response body, verbatim.
        body: String,
    },

    /// A network round trip failed before any HTTP status was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: VigilError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = VigilError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn upstream_error_carries_status_and_body() {
        let err = VigilError::Upstream {
            service: "model",
            status: 500,
            body: "overloaded".into(),
        };
        let text = err.to_string();
        assert!(text.contains("model"));
        assert!(text.contains("500"));
        assert!(text.contains("overloaded"));
    }

    #[test]
    fn input_error_displays_message() {
        let err = VigilError::Input("repo must be owner/name".into());
        assert!(err.to_string().starts_with("input error"));
    }
}
