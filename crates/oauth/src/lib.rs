pub mod authenticate;
pub mod client;
mod config_dir;
pub mod connectivity;
pub mod defaults;
pub mod error;
pub mod refresh;
pub mod schema;
pub mod storage;
pub mod types;

pub use {
    authenticate::{authenticate, authorization_value},
    client::{AuthenticatedClient, RefreshOutcome},
    connectivity::{ConnectivityReport, test_connectivity},
    defaults::load_credential_config,
    error::{RefreshError, SchemaError},
    refresh::TokenRefresher,
    schema::{CREDENTIAL_FIELDS, FieldDescriptor, FieldKind, validate},
    storage::CredentialStore,
    types::{CredentialRecord, RefreshTokenLocation, TokenUpdate, serialize_secret},
};
