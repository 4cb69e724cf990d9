//! Field table for the credential form and validation against it.

use {secrecy::ExposeSecret, serde::Serialize};

use crate::{
    error::SchemaError,
    types::{
        CredentialRecord, DEFAULT_ACCESS_TOKEN_FIELD, DEFAULT_AUTH_HEADER_PREFIX,
        DEFAULT_REFRESH_TOKEN_FIELD,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Options,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldOption {
    pub name: &'static str,
    pub value: &'static str,
}

/// One configurable field of a [`CredentialRecord`], as a form renderer sees it.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Rendered as a password input.
    pub secret: bool,
    /// Short-lived value that is refreshed before use.
    pub expirable: bool,
    pub default: &'static str,
    pub placeholder: &'static str,
    pub description: &'static str,
    pub options: &'static [FieldOption],
}

impl FieldDescriptor {
    const fn text(name: &'static str, display_name: &'static str) -> Self {
        Self {
            name,
            display_name,
            kind: FieldKind::String,
            required: false,
            secret: false,
            expirable: false,
            default: "",
            placeholder: "",
            description: "",
            options: &[],
        }
    }
}

pub const CREDENTIAL_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        secret: true,
        expirable: true,
        placeholder: "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
        description: "Current access token (Bearer token) used for API authentication",
        ..FieldDescriptor::text("accessToken", "Access Token")
    },
    FieldDescriptor {
        required: true,
        secret: true,
        placeholder: "Enter your refresh token",
        description: "Token used to obtain a new access token when it expires",
        ..FieldDescriptor::text("refreshToken", "Refresh Token")
    },
    FieldDescriptor {
        required: true,
        placeholder: "https://api.example.com/auth/refresh",
        description: "API endpoint URL to refresh the access token",
        ..FieldDescriptor::text("refreshUrl", "Refresh Token URL")
    },
    FieldDescriptor {
        required: true,
        placeholder: "https://api.example.com/user/profile",
        description: "API endpoint URL to test the token validity (should return HTTP 200)",
        ..FieldDescriptor::text("testUrl", "Test URL")
    },
    FieldDescriptor {
        secret: true,
        default: DEFAULT_ACCESS_TOKEN_FIELD,
        description: "Field name in the refresh response that contains the new access token",
        ..FieldDescriptor::text("accessTokenFieldName", "Access Token Field Name")
    },
    FieldDescriptor {
        secret: true,
        default: DEFAULT_REFRESH_TOKEN_FIELD,
        description: "Field name for refresh token (used in both API request and response)",
        ..FieldDescriptor::text("refreshTokenFieldName", "Refresh Token Field Name")
    },
    FieldDescriptor {
        default: DEFAULT_AUTH_HEADER_PREFIX,
        description: "Prefix for the Authorization header (e.g., \"Bearer\", \"Token\")",
        ..FieldDescriptor::text("authHeaderPrefix", "Authorization Header Prefix")
    },
    FieldDescriptor {
        kind: FieldKind::Options,
        default: "header",
        description: "Where to send the refresh token in the refresh request",
        options: &[
            FieldOption {
                name: "Body",
                value: "body",
            },
            FieldOption {
                name: "Header",
                value: "header",
            },
        ],
        ..FieldDescriptor::text("refreshTokenLocation", "Send Refresh Token As")
    },
];

/// Look up a field descriptor by its form name.
pub fn field(name: &str) -> Option<&'static FieldDescriptor> {
    CREDENTIAL_FIELDS.iter().find(|f| f.name == name)
}

/// Check the required fields of `record` and that its URLs are absolute http(s).
pub fn validate(record: &CredentialRecord) -> Result<(), SchemaError> {
    if record.refresh_token.expose_secret().trim().is_empty() {
        return Err(SchemaError::MissingField {
            field: "refreshToken",
        });
    }
    check_url("refreshUrl", &record.refresh_url)?;
    check_url("testUrl", &record.test_url)
}

fn check_url(field: &'static str, value: &str) -> Result<(), SchemaError> {
    if value.trim().is_empty() {
        return Err(SchemaError::MissingField { field });
    }
    match url::Url::parse(value) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.has_host() => Ok(()),
        _ => Err(SchemaError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}
