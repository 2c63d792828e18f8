//! Bearer-token gate: verifier trait, JWKS-backed implementation, axum middleware.

mod middleware;
mod verifier;

pub use middleware::{bearer_token, require_auth};
pub use verifier::{AuthError, Identity, JwksVerifier, TokenVerifier};

impl From<AuthError> for crate::error::AppError {
    fn from(e: AuthError) -> Self {
        crate::error::AppError::Unauthorized(e.to_string())
    }
}
