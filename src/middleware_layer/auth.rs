use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    services::tokens::TokenError,
    state::AppState,
};

/// The authenticated caller, inserted as a request extension once the
/// bearer token has been validated.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser(pub Uuid);

/// Extracts the bearer token from the `Authorization` header.
fn extract_bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// A middleware that requires a valid, unexpired session token.
///
/// Every failure mode maps to the same 401 response; the logs keep the
/// distinction.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&request).ok_or_else(|| {
        tracing::warn!("❌ Missing or malformed Authorization header");
        AppError::Unauthorized
    })?;

    let subject = state.tokens.validate(token).map_err(|e| {
        match e {
            TokenError::Expired => tracing::warn!("❌ Expired session token presented"),
            TokenError::Invalid => tracing::warn!("❌ Invalid session token presented"),
        }
        AppError::Unauthorized
    })?;

    tracing::debug!("✅ Authenticated user: {}", subject);

    request.extensions_mut().insert(AuthUser(subject));

    Ok(next.run(request).await)
}
