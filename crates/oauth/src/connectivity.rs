use {
    anyhow::{Context, Result},
    reqwest::{Client, StatusCode},
    tracing::debug,
};

use crate::{authenticate::authenticate, types::CredentialRecord};

/// Outcome of a credential test request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityReport {
    pub status: StatusCode,
}

impl ConnectivityReport {
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }
}

/// `GET <test_url>` with the record's `Authorization` header and no body.
///
/// Transport errors are returned as `Err`; any HTTP response, success or not,
/// becomes a report.
pub async fn test_connectivity(
    client: &Client,
    record: &CredentialRecord,
) -> Result<ConnectivityReport> {
    let response = authenticate(client.get(&record.test_url), record)
        .send()
        .await
        .with_context(|| format!("connectivity test request to {} failed", record.test_url))?;

    let status = response.status();
    debug!(url = %record.test_url, %status, "connectivity test finished");
    Ok(ConnectivityReport { status })
}
