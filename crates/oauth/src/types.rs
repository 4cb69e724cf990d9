use std::str::FromStr;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize, Serializer},
};

use crate::error::SchemaError;

pub const DEFAULT_ACCESS_TOKEN_FIELD: &str = "access_token";
pub const DEFAULT_REFRESH_TOKEN_FIELD: &str = "refresh_token";
pub const DEFAULT_AUTH_HEADER_PREFIX: &str = "Bearer";

/// Where the refresh token goes in the refresh request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTokenLocation {
    /// `Authorization: Bearer <refresh token>`.
    #[default]
    Header,
    /// JSON body `{ "<refresh token field>": "<refresh token>" }`.
    Body,
}

impl RefreshTokenLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Body => "body",
        }
    }
}

impl FromStr for RefreshTokenLocation {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "header" => Ok(Self::Header),
            "body" => Ok(Self::Body),
            _ => Err(SchemaError::InvalidLocation(s.to_string())),
        }
    }
}

impl std::fmt::Display for RefreshTokenLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored refresh-token credential.
///
/// Serialized with the credential form's field names (`accessToken`,
/// `refreshUrl`, ...). Optional settings fall back to their defaults both when
/// the key is missing and when it is present but blank.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    #[serde(default = "empty_secret", serialize_with = "serialize_secret")]
    pub access_token: Secret<String>,
    #[serde(serialize_with = "serialize_secret")]
    pub refresh_token: Secret<String>,
    pub refresh_url: String,
    pub test_url: String,
    #[serde(default = "default_access_token_field")]
    pub access_token_field_name: String,
    #[serde(default = "default_refresh_token_field")]
    pub refresh_token_field_name: String,
    #[serde(default = "default_auth_header_prefix")]
    pub auth_header_prefix: String,
    #[serde(default)]
    pub refresh_token_location: RefreshTokenLocation,
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

fn default_access_token_field() -> String {
    DEFAULT_ACCESS_TOKEN_FIELD.into()
}

fn default_refresh_token_field() -> String {
    DEFAULT_REFRESH_TOKEN_FIELD.into()
}

fn default_auth_header_prefix() -> String {
    DEFAULT_AUTH_HEADER_PREFIX.into()
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

impl CredentialRecord {
    /// A record with no access token yet and every optional setting at its default.
    pub fn new(
        refresh_token: impl Into<String>,
        refresh_url: impl Into<String>,
        test_url: impl Into<String>,
    ) -> Self {
        Self {
            access_token: empty_secret(),
            refresh_token: Secret::new(refresh_token.into()),
            refresh_url: refresh_url.into(),
            test_url: test_url.into(),
            access_token_field_name: default_access_token_field(),
            refresh_token_field_name: default_refresh_token_field(),
            auth_header_prefix: default_auth_header_prefix(),
            refresh_token_location: RefreshTokenLocation::Header,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Secret::new(token.into());
        self
    }

    pub fn with_location(mut self, location: RefreshTokenLocation) -> Self {
        self.refresh_token_location = location;
        self
    }

    /// Response key holding the new access token.
    pub fn access_token_field(&self) -> &str {
        or_default(&self.access_token_field_name, DEFAULT_ACCESS_TOKEN_FIELD)
    }

    /// Key used for the refresh token in both the request body and the response.
    pub fn refresh_token_field(&self) -> &str {
        or_default(&self.refresh_token_field_name, DEFAULT_REFRESH_TOKEN_FIELD)
    }

    /// Prefix for the outgoing `Authorization` header.
    pub fn auth_prefix(&self) -> &str {
        or_default(&self.auth_header_prefix, DEFAULT_AUTH_HEADER_PREFIX)
    }

    /// Write a refresh result into the record. Returns `true` if either token changed.
    pub fn apply(&mut self, update: TokenUpdate) -> bool {
        let changed = self.access_token.expose_secret() != update.access_token.expose_secret()
            || self.refresh_token.expose_secret() != update.refresh_token.expose_secret();
        self.access_token = update.access_token;
        self.refresh_token = update.refresh_token;
        changed
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("refresh_url", &self.refresh_url)
            .field("test_url", &self.test_url)
            .field("access_token_field_name", &self.access_token_field_name)
            .field("refresh_token_field_name", &self.refresh_token_field_name)
            .field("auth_header_prefix", &self.auth_header_prefix)
            .field("refresh_token_location", &self.refresh_token_location)
            .finish()
    }
}

/// Tokens obtained from a refresh exchange.
#[derive(Clone)]
pub struct TokenUpdate {
    pub access_token: Secret<String>,
    pub refresh_token: Secret<String>,
    /// The response carried a refresh token of its own.
    pub refresh_token_rotated: bool,
}

impl std::fmt::Debug for TokenUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenUpdate")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("refresh_token_rotated", &self.refresh_token_rotated)
            .finish()
    }
}

pub fn serialize_secret<S: Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
