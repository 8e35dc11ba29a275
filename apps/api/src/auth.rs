//! Auth middleware for all `/api` routes.
//!
//! Verifies the bearer session token with the identity provider, resolves the
//! caller's entitlement, and attaches both to the request. Unauthenticated
//! requests never reach handler logic; identity provider outages surface as
//! internal errors without retry.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::entitlement::Entitlement;
use crate::errors::AppError;
use crate::identity::IdentityError;
use crate::state::AppState;

/// Authenticated caller context, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub entitlement: Entitlement,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let user_id = state
        .identity
        .verify_token(&token)
        .await
        .map_err(|e| match e {
            IdentityError::InvalidToken => AppError::Unauthorized,
            other => AppError::Identity(other.to_string()),
        })?;

    let entitlement = state.entitlements.plan_and_usage(&user_id).await?;

    req.extensions_mut().insert(AuthContext {
        user_id,
        entitlement,
    });
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        let headers = headers_with("Bearer sess_abc123");
        assert_eq!(bearer_token(&headers), Some("sess_abc123"));
    }

    #[test]
    fn test_bearer_token_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_bearer_token_empty_value() {
        let headers = headers_with("Bearer ");
        assert_eq!(bearer_token(&headers), None);
    }
}
