use crate::models::{CredentialRecord, MaskedCredentialView};
use crate::startup::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    Json,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensQuery {
    pub admin_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TokenListing {
    Revealed(Vec<CredentialRecord>),
    Masked(Vec<MaskedCredentialView>),
}

#[derive(Debug, Serialize)]
pub struct TokensResponse {
    pub revealed: bool,
    pub tokens: TokenListing,
}

/// List credentials, masked unless the caller presents the admin key.
#[tracing::instrument(skip_all)]
pub async fn list_tokens(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<TokensQuery>, QueryRejection>,
) -> Json<TokensResponse> {
    // An unparseable query (e.g. a repeated adminKey) supplies no key.
    let query_key = match query {
        Ok(Query(query)) => query.admin_key,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unparseable credential listing query");
            None
        }
    };

    let supplied = query_key.or_else(|| {
        headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    });

    if is_authorized(supplied.as_deref(), state.config.admin_key.as_ref()) {
        tracing::warn!(count = state.credentials.len(), "Revealing raw credentials");
        return Json(TokensResponse {
            revealed: true,
            tokens: TokenListing::Revealed(state.credentials.records().to_vec()),
        });
    }

    if supplied.is_some_and(|key| !key.is_empty()) {
        tracing::warn!("Rejected admin key on credential listing");
    }

    Json(TokensResponse {
        revealed: false,
        tokens: TokenListing::Masked(state.credentials.masked()),
    })
}

/// Reveal is granted only when both the supplied and the configured key are
/// non-empty and equal. Comparison is constant-time; there is no rate limit.
pub fn is_authorized(supplied: Option<&str>, configured: Option<&Secret<String>>) -> bool {
    match (supplied, configured) {
        (Some(supplied), Some(configured)) => {
            let expected = configured.expose_secret();
            !supplied.is_empty()
                && !expected.is_empty()
                && bool::from(supplied.as_bytes().ct_eq(expected.as_bytes()))
        }
        _ => false,
    }
}
