use crate::errors::IssuerError;
use crate::models::{TokenRequest, TokenResponse};
use crate::routes::AppState;
use axum::{body::Bytes, extract::State, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

/// Handle assertion request
///
/// POST /api/get-es256-jwt
///
/// The body is parsed as JSON whatever the `Content-Type`, since browser
/// clients commonly post it as `text/plain` to avoid a preflight.
#[instrument(name = "issuer.token.request", skip_all, fields(status))]
pub async fn handle_get_token(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TokenResponse>, IssuerError> {
    let result = issue_from_body(&state, &body);

    let status = if result.is_ok() { "success" } else { "error" };
    tracing::Span::current().record("status", status);

    result.map(Json)
}

fn issue_from_body(state: &AppState, body: &[u8]) -> Result<TokenResponse, IssuerError> {
    let request: TokenRequest = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(target: "issuer.handlers", error = %e, "Rejected malformed request body");
        IssuerError::InvalidInput("Malformed JSON body".to_string())
    })?;

    let subject = request
        .subject()
        .ok_or_else(|| IssuerError::InvalidInput("Missing DID".to_string()))?;

    let assertion = state.issuer.issue(subject, Utc::now())?;

    Ok(TokenResponse {
        token: assertion.token,
    })
}
