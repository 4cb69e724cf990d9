use {
    reqwest::Method,
    secrecy::ExposeSecret,
    serde_json::json,
    tokenrelay_oauth::{
        AuthenticatedClient, CredentialRecord, CredentialStore, RefreshError,
        RefreshTokenLocation,
    },
};

struct Fixture {
    _dir: tempfile::TempDir,
    server: mockito::ServerGuard,
    client: AuthenticatedClient,
}

async fn fixture(record: impl FnOnce(&str) -> CredentialRecord) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let server = mockito::Server::new_async().await;
    let store = CredentialStore::with_path(dir.path().join("credentials.json"));
    store.save("crm", &record(&server.url())).unwrap();
    Fixture {
        _dir: dir,
        server,
        client: AuthenticatedClient::new(store),
    }
}

fn crm(base: &str) -> CredentialRecord {
    CredentialRecord::new("r-1", format!("{base}/auth/refresh"), format!("{base}/me"))
        .with_access_token("a-1")
}

fn stored(f: &Fixture) -> CredentialRecord {
    f.client.store().load("crm").unwrap().unwrap()
}

#[tokio::test]
async fn send_refreshes_persists_then_authenticates() {
    let mut f = fixture(crm).await;
    let refresh = f
        .server
        .mock("POST", "/auth/refresh")
        .match_header("authorization", "Bearer r-1")
        .with_body(r#"{"access_token":"a-2","refresh_token":"r-2"}"#)
        .expect(1)
        .create_async()
        .await;
    let api = f
        .server
        .mock("POST", "/v1/contacts")
        .match_header("authorization", "Bearer a-2")
        .match_body(mockito::Matcher::Json(json!({ "name": "Ada" })))
        .with_status(201)
        .with_body(r#"{"id":7}"#)
        .create_async()
        .await;

    let url = format!("{}/v1/contacts", f.server.url());
    let response = f
        .client
        .send("crm", Method::POST, &url, Some(&json!({ "name": "Ada" })))
        .await
        .unwrap();

    refresh.assert_async().await;
    api.assert_async().await;
    assert_eq!(response.status(), 201);

    let rec = stored(&f);
    assert_eq!(rec.access_token.expose_secret(), "a-2");
    assert_eq!(rec.refresh_token.expose_secret(), "r-2");
}

#[tokio::test]
async fn refresh_without_rotation_keeps_refresh_token() {
    let mut f = fixture(|base| crm(base).with_location(RefreshTokenLocation::Body)).await;
    f.server
        .mock("POST", "/auth/refresh")
        .match_body(mockito::Matcher::Json(json!({ "refresh_token": "r-1" })))
        .with_body(r#"{"access_token":"a-2"}"#)
        .create_async()
        .await;

    let outcome = f.client.refresh("crm").await.unwrap();
    assert!(outcome.persisted);
    assert!(!outcome.refresh_token_rotated);

    let rec = stored(&f);
    assert_eq!(rec.access_token.expose_secret(), "a-2");
    assert_eq!(rec.refresh_token.expose_secret(), "r-1");
}

#[tokio::test]
async fn unchanged_tokens_are_not_rewritten() {
    let mut f = fixture(crm).await;
    f.server
        .mock("POST", "/auth/refresh")
        .with_body(r#"{"access_token":"a-1"}"#)
        .create_async()
        .await;

    let outcome = f.client.refresh("crm").await.unwrap();
    assert!(!outcome.persisted);
}

#[tokio::test]
async fn refresh_failure_aborts_the_call() {
    let mut f = fixture(crm).await;
    f.server
        .mock("POST", "/auth/refresh")
        .with_body(r#"{"refresh_token":"r-2"}"#)
        .create_async()
        .await;
    let api = f
        .server
        .mock("GET", "/v1/contacts")
        .expect(0)
        .create_async()
        .await;

    let url = format!("{}/v1/contacts", f.server.url());
    let err = f
        .client
        .send("crm", Method::GET, &url, None)
        .await
        .unwrap_err();

    api.assert_async().await;
    assert!(matches!(
        err.downcast_ref::<RefreshError>(),
        Some(RefreshError::MissingAccessToken { .. })
    ));

    let rec = stored(&f);
    assert_eq!(rec.access_token.expose_secret(), "a-1");
    assert_eq!(rec.refresh_token.expose_secret(), "r-1");
}

#[tokio::test]
async fn unknown_credential_is_an_error() {
    let f = fixture(crm).await;
    let err = f.client.refresh("billing").await.unwrap_err();
    assert!(err.to_string().contains("unknown credential: billing"));
}

#[tokio::test]
async fn concurrent_refreshes_of_one_credential_run_in_turn() {
    let mut f = fixture(crm).await;
    let first = f
        .server
        .mock("POST", "/auth/refresh")
        .match_header("authorization", "Bearer r-1")
        .with_body(r#"{"access_token":"a-2","refresh_token":"r-2"}"#)
        .expect(1)
        .create_async()
        .await;
    let second = f
        .server
        .mock("POST", "/auth/refresh")
        .match_header("authorization", "Bearer r-2")
        .with_body(r#"{"access_token":"a-3","refresh_token":"r-3"}"#)
        .expect(1)
        .create_async()
        .await;

    let (a, b) = tokio::join!(f.client.refresh("crm"), f.client.refresh("crm"));
    a.unwrap();
    b.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let rec = stored(&f);
    assert_eq!(rec.access_token.expose_secret(), "a-3");
    assert_eq!(rec.refresh_token.expose_secret(), "r-3");
}

#[tokio::test]
async fn connectivity_test_uses_refreshed_token() {
    let mut f = fixture(|base| {
        let mut rec = crm(base);
        rec.auth_header_prefix = "Token".into();
        rec
    })
    .await;
    f.server
        .mock("POST", "/auth/refresh")
        .match_header("authorization", "Bearer r-1")
        .with_body(r#"{"access_token":"a-2"}"#)
        .create_async()
        .await;
    let me = f
        .server
        .mock("GET", "/me")
        .match_header("authorization", "Token a-2")
        .with_status(200)
        .create_async()
        .await;

    let report = f.client.test_connectivity("crm").await.unwrap();
    me.assert_async().await;
    assert!(report.ok());
}
