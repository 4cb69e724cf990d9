//! Decorate outgoing requests with a credential's access token.

use {
    reqwest::{
        RequestBuilder,
        header::{AUTHORIZATION, HeaderValue},
    },
    secrecy::ExposeSecret,
};

use crate::types::CredentialRecord;

/// `"<prefix> <access token>"`, where a blank prefix falls back to `Bearer`.
///
/// An empty access token is not rejected; the header just carries no token.
pub fn authorization_value(record: &CredentialRecord) -> String {
    format!(
        "{} {}",
        record.auth_prefix(),
        record.access_token.expose_secret()
    )
}

/// Set the `Authorization` header on `request` from `record`.
///
/// Values that are not valid header text surface as an error when the request is sent.
pub fn authenticate(request: RequestBuilder, record: &CredentialRecord) -> RequestBuilder {
    let value = authorization_value(record);
    match HeaderValue::from_str(&value) {
        Ok(mut header) => {
            header.set_sensitive(true);
            request.header(AUTHORIZATION, header)
        },
        Err(_) => request.header(AUTHORIZATION, value),
    }
}
