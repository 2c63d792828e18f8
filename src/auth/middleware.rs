//! Middleware that verifies the bearer token and attaches the caller's [`Identity`].

use super::AuthError;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

/// Last space-separated token of the header value, so both `Bearer <jwt>` and a bare `<jwt>` work.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value.trim().split(' ').last().filter(|t| !t.is_empty())
}

/// Rejects with 401 before the handler runs unless the token verifies.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let raw = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::Malformed("authorization header is not valid text".into()))?;
    let token = bearer_token(raw).ok_or_else(|| AuthError::Malformed("empty bearer token".into()))?;

    let identity = match state.verifier.verify(token).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(error = %e, "token verification failed");
            return Err(e.into());
        }
    };
    tracing::debug!(user_id = %identity.user_id, "request authenticated");
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_last_token() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("  abc.def.ghi  "), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer   xyz"), Some("xyz"));
        assert_eq!(bearer_token("   "), None);
    }
}
