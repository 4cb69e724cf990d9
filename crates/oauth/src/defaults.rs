use {secrecy::Secret, tokenrelay_config::CredentialEntry};

use crate::{
    error::SchemaError,
    types::{CredentialRecord, RefreshTokenLocation},
};

impl TryFrom<&CredentialEntry> for CredentialRecord {
    type Error = SchemaError;

    /// Unset optional settings keep the record defaults.
    fn try_from(entry: &CredentialEntry) -> Result<Self, Self::Error> {
        let mut record = CredentialRecord::new(
            entry.refresh_token.clone(),
            entry.refresh_url.clone(),
            entry.test_url.clone(),
        );
        if let Some(token) = &entry.access_token {
            record.access_token = Secret::new(token.clone());
        }
        if let Some(name) = &entry.access_token_field_name {
            record.access_token_field_name = name.clone();
        }
        if let Some(name) = &entry.refresh_token_field_name {
            record.refresh_token_field_name = name.clone();
        }
        if let Some(prefix) = &entry.auth_header_prefix {
            record.auth_header_prefix = prefix.clone();
        }
        if let Some(location) = &entry.refresh_token_location {
            record.refresh_token_location = location.parse::<RefreshTokenLocation>()?;
        }
        Ok(record)
    }
}

/// Load a credential declared in the config file.
///
/// Priority:
/// 1. Environment variables (`TOKENRELAY_CREDENTIAL_{NAME}_REFRESH_TOKEN`, etc.)
/// 2. The `[credentials.<name>]` table of the config file
///
/// Returns `Ok(None)` when the config file does not declare `name`.
pub fn load_credential_config(name: &str) -> Result<Option<CredentialRecord>, SchemaError> {
    let config = tokenrelay_config::discover_and_load();
    let Some(entry) = config.credential(name) else {
        return Ok(None);
    };
    let entry = with_env_overrides(name, entry.clone(), |key| std::env::var(key).ok());
    CredentialRecord::try_from(&entry).map(Some)
}

fn with_env_overrides(
    name: &str,
    mut entry: CredentialEntry,
    lookup: impl Fn(&str) -> Option<String>,
) -> CredentialEntry {
    let env_prefix = format!(
        "TOKENRELAY_CREDENTIAL_{}_",
        name.to_uppercase().replace('-', "_")
    );
    let var = |suffix: &str| lookup(&format!("{env_prefix}{suffix}"));

    if let Some(v) = var("ACCESS_TOKEN") {
        entry.access_token = Some(v);
    }
    if let Some(v) = var("REFRESH_TOKEN") {
        entry.refresh_token = v;
    }
    if let Some(v) = var("REFRESH_URL") {
        entry.refresh_url = v;
    }
    if let Some(v) = var("TEST_URL") {
        entry.test_url = v;
    }
    entry
}
