/// A refresh exchange that did not yield a usable access token.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("token refresh failed: access token not found in response field `{field}`")]
    MissingAccessToken { field: String },

    #[error("token refresh failed: {0}")]
    TransportFailure(String),
}

impl RefreshError {
    /// Wrap an error, keeping the text of every source in its chain.
    pub(crate) fn transport(err: impl std::error::Error) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(inner) = source {
            let text = inner.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = inner.source();
        }
        Self::TransportFailure(message)
    }
}

/// A credential that fails field validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("`{field}` is required")]
    MissingField { field: &'static str },

    #[error("`{field}` must be an absolute http(s) URL, got `{value}`")]
    InvalidUrl { field: &'static str, value: String },

    #[error("unknown refresh token location `{0}` (expected `header` or `body`)")]
    InvalidLocation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn transport_message_includes_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = RefreshError::transport(Outer(io));
        assert_eq!(
            err.to_string(),
            "token refresh failed: error sending request: connection refused"
        );
    }

    #[test]
    fn missing_access_token_names_field() {
        let err = RefreshError::MissingAccessToken {
            field: "token".into(),
        };
        assert!(err.to_string().contains("access token not found"));
        assert!(err.to_string().contains("`token`"));
    }
}
