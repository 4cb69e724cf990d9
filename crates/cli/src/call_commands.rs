use {
    anyhow::{Context, Result, bail},
    reqwest::Method,
    tokenrelay_oauth::{AuthenticatedClient, CREDENTIAL_FIELDS, CredentialStore},
};

/// Refresh a credential and persist the new token pair.
pub async fn refresh(name: &str) -> Result<()> {
    let client = AuthenticatedClient::new(CredentialStore::new());
    let outcome = client.refresh(name).await?;
    let rotation = if outcome.refresh_token_rotated {
        "refresh token rotated"
    } else {
        "refresh token kept"
    };
    println!("Refreshed {name} ({rotation})");
    Ok(())
}

/// Refresh, then `GET <testUrl>` with the new access token.
pub async fn test(name: &str) -> Result<()> {
    let client = AuthenticatedClient::new(CredentialStore::new());
    let report = client.test_connectivity(name).await?;
    if !report.ok() {
        bail!("connectivity test for {name} failed: HTTP {}", report.status);
    }
    println!("{name}: OK ({})", report.status);
    Ok(())
}

/// Send an authenticated request and print the response.
pub async fn request(name: &str, method: &str, url: &str, data: Option<&str>) -> Result<()> {
    let method: Method = method
        .to_ascii_uppercase()
        .parse()
        .with_context(|| format!("invalid HTTP method: {method}"))?;
    let body = data
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--data must be valid JSON")?;

    let client = AuthenticatedClient::new(CredentialStore::new());
    let response = client.send(name, method, url, body.as_ref()).await?;
    let status = response.status();
    let text = response
        .text()
        .await
        .context("failed to read response body")?;

    println!("HTTP {status}");
    if !text.is_empty() {
        println!("{text}");
    }
    if !status.is_success() {
        bail!("request returned HTTP {status}");
    }
    Ok(())
}

/// Print the credential field table as JSON.
pub fn schema() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(CREDENTIAL_FIELDS)?);
    Ok(())
}
