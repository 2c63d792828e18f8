//! App shell behind the bearer-token gate.

use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::state::AppState;
use axum::{extract::State, response::Html};

pub async fn index(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Html<String>, AppError> {
    tracing::debug!(user_id = %identity.user_id, email = %identity.email, "serving app shell");
    let path = state.static_dir.join("index.html");
    let html = tokio::fs::read_to_string(&path).await.map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "index.html unavailable");
        AppError::NotFound("index.html".into())
    })?;
    Ok(Html(html))
}
