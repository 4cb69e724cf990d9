/// Config schema types: credential store location and operator-declared credentials.
use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub store: StoreConfig,

    /// Credentials declared in the config file, keyed by credential name.
    /// `tokenrelay credential import` copies these into the credential store.
    pub credentials: BTreeMap<String, CredentialEntry>,
}

/// Where the credential store lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Override the store file path. Defaults to `<config dir>/credentials.json`.
    pub path: Option<PathBuf>,
}

/// A credential as written by an operator in the config file.
///
/// Keys mirror the credential form (`refreshToken`, `refreshUrl`, ...). Values
/// may use `${ENV_VAR}` placeholders, which are resolved when the file is read.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CredentialEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub refresh_token: String,
    pub refresh_url: String,
    pub test_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_header_prefix: Option<String>,
    /// `"header"` or `"body"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_location: Option<String>,
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
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

impl RelayConfig {
    /// Get the declared entry for a credential, if any.
    pub fn credential(&self, name: &str) -> Option<&CredentialEntry> {
        self.credentials.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_credentials_table() {
        let raw = r#"
[store]
path = "/tmp/creds.json"

[credentials.crm]
refreshToken = "r-1"
refreshUrl = "https://api.example.com/auth/refresh"
testUrl = "https://api.example.com/me"
refreshTokenLocation = "body"
"#;
        let cfg: RelayConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.store.path, Some(PathBuf::from("/tmp/creds.json")));
        let crm = cfg.credential("crm").unwrap();
        assert_eq!(crm.refresh_token, "r-1");
        assert_eq!(crm.refresh_token_location.as_deref(), Some("body"));
        assert!(crm.access_token.is_none());
        assert!(cfg.credential("missing").is_none());
    }

    #[test]
    fn empty_config_is_default() {
        let cfg: RelayConfig = toml::from_str("").unwrap();
        assert!(cfg.store.path.is_none());
        assert!(cfg.credentials.is_empty());
    }

    #[test]
    fn debug_redacts_tokens() {
        let entry = CredentialEntry {
            access_token: Some("live-access".into()),
            refresh_token: "live-refresh".into(),
            ..Default::default()
        };
        let out = format!("{entry:?}");
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("live-access"));
        assert!(!out.contains("live-refresh"));
    }
}
