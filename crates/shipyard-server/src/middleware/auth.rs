//! Bearer-token authentication middleware
//!
//! Extracts `Authorization: Bearer <token>`, hands the raw token to the
//! [`TokenAuthenticator`](shipyard_auth::TokenAuthenticator) and, on success,
//! stores the [`Principal`] in the request extensions. Every failure, whether
//! a missing header, another scheme, or a rejected token, produces the same
//! 401 response.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shipyard_auth::Principal;

use crate::error::ServerError;
use crate::state::AppState;

/// Extract the token from an `Authorization: Bearer` header
///
/// The scheme name is matched case-insensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = auth_str.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Authentication middleware for protected routes
pub async fn authentication_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(request.headers()) else {
        tracing::debug!("Missing or non-bearer Authorization header");
        return ServerError::Unauthenticated.into_response();
    };

    let principal: Principal = match state.authenticator.authenticate(token).await {
        Ok(principal) => principal,
        Err(_) => return ServerError::Unauthenticated.into_response(),
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}
