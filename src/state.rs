//! Shared application state, built once at startup and handed to every router.

use crate::auth::TokenVerifier;
use crate::config::ResolvedModel;
use crate::sms::SmsGateway;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub model: Arc<ResolvedModel>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub sms: Arc<dyn SmsGateway>,
    /// Build-output directory served as static files; `index.html` is the gated app shell.
    pub static_dir: Arc<PathBuf>,
}
