//! Outbound SMS through the Nexmo (Vonage) REST API.

use crate::settings::SmsSettings;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmsError {
    #[error("request to sms gateway failed: {0}")]
    Transport(String),
    #[error("sms gateway returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("sms gateway response was not JSON: {0}")]
    Decode(String),
}

/// Sends one message and returns the gateway's response payload untouched.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, to: &str, text: &str) -> Result<Value, SmsError>;
}

#[derive(Serialize)]
struct SendRequest<'a> {
    api_key: &'a str,
    api_secret: &'a str,
    from: &'a str,
    to: &'a str,
    text: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

pub struct NexmoGateway {
    client: reqwest::Client,
    settings: SmsSettings,
}

impl NexmoGateway {
    pub fn new(settings: SmsSettings) -> Self {
        NexmoGateway {
            client: reqwest::Client::new(),
            settings,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/sms/json", self.settings.base_url)
    }
}

#[async_trait]
impl SmsGateway for NexmoGateway {
    async fn send(&self, to: &str, text: &str) -> Result<Value, SmsError> {
        let body = SendRequest {
            api_key: &self.settings.api_key,
            api_secret: &self.settings.api_secret,
            from: &self.settings.from_number,
            to,
            text,
            kind: "unicode",
        };
        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| SmsError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SmsError::Status {
                status: status.as_u16(),
                body,
            });
        }
        resp.json::<Value>()
            .await
            .map_err(|e| SmsError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn settings(base_url: String) -> SmsSettings {
        SmsSettings {
            api_key: "key".into(),
            api_secret: "secret".into(),
            from_number: "15550001111".into(),
            base_url,
        }
    }

    async fn spawn(app: Router) -> (String, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn posts_unicode_message_and_returns_payload() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::default();
        let captured = seen.clone();
        let app = Router::new().route(
            "/sms/json",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some(body);
                    Json(json!({
                        "message-count": "1",
                        "messages": [{ "to": "15559998888", "status": "0", "message-id": "abc" }]
                    }))
                }
            }),
        );
        let (base, server) = spawn(app).await;

        let gateway = NexmoGateway::new(settings(base));
        let payload = gateway.send("15559998888", "Your bike is ready 🚲").await.unwrap();
        assert_eq!(payload["message-count"], "1");
        assert_eq!(payload["messages"][0]["message-id"], "abc");

        let sent = seen.lock().unwrap().clone().unwrap();
        assert_eq!(
            sent,
            json!({
                "api_key": "key",
                "api_secret": "secret",
                "from": "15550001111",
                "to": "15559998888",
                "text": "Your bike is ready 🚲",
                "type": "unicode"
            })
        );
        server.abort();
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let app = Router::new().route(
            "/sms/json",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad credentials") }),
        );
        let (base, server) = spawn(app).await;
        let err = NexmoGateway::new(settings(base)).send("1", "hi").await.unwrap_err();
        assert!(matches!(err, SmsError::Status { status: 401, .. }));
        server.abort();
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_transport_error() {
        let err = NexmoGateway::new(settings("http://127.0.0.1:1".into()))
            .send("1", "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, SmsError::Transport(_)));
    }
}
