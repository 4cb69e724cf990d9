//! Refresh, persist, authenticate and send, for a named stored credential.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use {
    anyhow::{Context, Result, anyhow},
    reqwest::{Client, Method, RequestBuilder, Response},
    tokio::sync::Mutex,
    tracing::debug,
};

use crate::{
    authenticate::authenticate,
    connectivity::{ConnectivityReport, test_connectivity},
    refresh::TokenRefresher,
    storage::CredentialStore,
    types::CredentialRecord,
};

/// Result of refreshing a stored credential.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub record: CredentialRecord,
    /// The stored record differed from the refresh result and was rewritten.
    pub persisted: bool,
    pub refresh_token_rotated: bool,
}

/// Sends requests on behalf of credentials held in a [`CredentialStore`].
///
/// Every call refreshes the access token first. Calls for the same credential
/// refresh one at a time, so each one starts from the pair persisted by the
/// previous one.
pub struct AuthenticatedClient {
    http: Client,
    refresher: TokenRefresher,
    store: CredentialStore,
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AuthenticatedClient {
    pub fn new(store: CredentialStore) -> Self {
        Self::with_client(Client::new(), store)
    }

    pub fn with_client(http: Client, store: CredentialStore) -> Self {
        Self {
            refresher: TokenRefresher::with_client(http.clone()),
            http,
            store,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(name.to_string()).or_default())
    }

    /// Refresh `name`'s access token and persist the new pair.
    pub async fn refresh(&self, name: &str) -> Result<RefreshOutcome> {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let mut record = self
            .store
            .load(name)?
            .ok_or_else(|| anyhow!("unknown credential: {name}"))?;

        let update = self.refresher.refresh(&record).await?;
        let refresh_token_rotated = update.refresh_token_rotated;
        let persisted = record.apply(update);
        if persisted {
            self.store
                .save(name, &record)
                .with_context(|| format!("failed to persist refreshed credential {name}"))?;
        }

        debug!(credential = name, persisted, refresh_token_rotated, "credential refreshed");
        Ok(RefreshOutcome {
            record,
            persisted,
            refresh_token_rotated,
        })
    }

    /// A request builder for `url` carrying a freshly refreshed access token.
    pub async fn request(&self, name: &str, method: Method, url: &str) -> Result<RequestBuilder> {
        let outcome = self.refresh(name).await?;
        Ok(authenticate(self.http.request(method, url), &outcome.record))
    }

    /// Refresh, then send an authenticated request with an optional JSON body.
    pub async fn send(
        &self,
        name: &str,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        let mut request = self.request(name, method, url).await?;
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))
    }

    /// Refresh, then run the credential's connectivity test.
    pub async fn test_connectivity(&self, name: &str) -> Result<ConnectivityReport> {
        let outcome = self.refresh(name).await?;
        test_connectivity(&self.http, &outcome.record).await
    }
}
