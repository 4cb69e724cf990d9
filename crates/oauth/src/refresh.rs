//! Refresh-token exchange against a credential's refresh endpoint.

use {
    reqwest::{
        Client,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    secrecy::{ExposeSecret, Secret},
    serde_json::Value,
    tracing::debug,
};

use crate::{
    error::RefreshError,
    types::{CredentialRecord, RefreshTokenLocation, TokenUpdate},
};

/// Exchanges a credential's refresh token for a new access token.
///
/// No timeout or retry is applied. Callers that need a deadline should wrap
/// [`TokenRefresher::refresh`] in `tokio::time::timeout` or configure the
/// underlying client.
#[derive(Debug, Clone, Default)]
pub struct TokenRefresher {
    client: Client,
}

impl TokenRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// POST the refresh token to `record.refresh_url` and read the new tokens.
    ///
    /// The header location always uses the literal `Bearer` prefix; the
    /// record's `auth_header_prefix` only applies to outgoing API calls.
    pub async fn refresh(&self, record: &CredentialRecord) -> Result<TokenUpdate, RefreshError> {
        let access_field = record.access_token_field();
        let refresh_field = record.refresh_token_field();
        let refresh_token = record.refresh_token.expose_secret();

        debug!(
            url = %record.refresh_url,
            location = %record.refresh_token_location,
            "refreshing access token"
        );

        let mut request = self
            .client
            .post(&record.refresh_url)
            .header(CONTENT_TYPE, "application/json");

        request = match record.refresh_token_location {
            RefreshTokenLocation::Header => {
                request.header(AUTHORIZATION, format!("Bearer {refresh_token}"))
            },
            RefreshTokenLocation::Body => {
                let mut body = serde_json::Map::new();
                body.insert(refresh_field.to_string(), Value::String(refresh_token.to_string()));
                request.json(&body)
            },
        };

        let response = request
            .send()
            .await
            .map_err(RefreshError::transport)?
            .error_for_status()
            .map_err(RefreshError::transport)?;

        // A 2xx body that is not JSON carries no token fields.
        let text = response.text().await.map_err(RefreshError::transport)?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        let access_token = token_value(body.get(access_field)).ok_or_else(|| {
            RefreshError::MissingAccessToken {
                field: access_field.to_string(),
            }
        })?;

        let rotated = token_value(body.get(refresh_field));
        let refresh_token_rotated = rotated.is_some();
        let refresh_token = rotated.unwrap_or_else(|| refresh_token.to_string());

        debug!(
            url = %record.refresh_url,
            refresh_token_rotated,
            "access token refreshed"
        );

        Ok(TokenUpdate {
            access_token: Secret::new(access_token),
            refresh_token: Secret::new(refresh_token),
            refresh_token_rotated,
        })
    }
}

/// Read a token out of a response field, treating falsy JSON as absent.
fn token_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
