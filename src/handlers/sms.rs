//! Relay a form submission to the SMS gateway.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct SendSmsRequest {
    #[serde(default)]
    pub number: Value,
    #[serde(default)]
    pub text: Value,
}

/// Strings pass through; numbers (phone numbers typed as JSON numbers) are stringified; anything else is empty.
fn field_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

pub async fn send_sms(
    State(state): State<AppState>,
    Json(req): Json<SendSmsRequest>,
) -> Result<Json<Value>, AppError> {
    let to = field_text(&req.number);
    let text = field_text(&req.text);
    match state.sms.send(&to, &text).await {
        Ok(payload) => {
            tracing::info!(to = %to, "sms submitted");
            Ok(Json(payload))
        }
        Err(e) => {
            tracing::error!(error = %e, to = %to, "sms send failed");
            Err(AppError::Gateway(e.to_string()))
        }
    }
}
