//! Payment gateway adapter.
//!
//! The order subsystem only sees the `PaymentGateway` trait; the concrete
//! implementation drives Stripe's PaymentIntent API. The adapter is injected
//! through `AppState`, never reached through a global client.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("payment gateway unreachable: {0}")]
    Transport(String),
    #[error("payment gateway rejected the request: {0}")]
    Rejected(String),
}

/// Outcome of an authorization attempt that reached the gateway.
///
/// `approved == false` means the gateway answered and declined the charge;
/// transport failures and request rejections surface as `GatewayError`.
#[derive(Clone, Debug)]
pub struct Authorization {
    pub approved: bool,
    pub client_secret: Option<String>,
    pub message: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(&self, amount_minor: i64, currency: &str)
        -> Result<Authorization, GatewayError>;
}

pub struct StripeGateway {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            secret_key: secret_key.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct IntentBody {
    client_secret: Option<String>,
    error: Option<IntentError>,
}

#[derive(Debug, Deserialize)]
struct IntentError {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

/// Maps a Stripe response to the adapter contract. Card declines come back
/// as HTTP 402 with `error.type == "card_error"` and are an answered "no",
/// not an adapter failure.
fn interpret(status: u16, body: IntentBody) -> Result<Authorization, GatewayError> {
    if (200..300).contains(&status) {
        return Ok(Authorization {
            approved: true,
            client_secret: body.client_secret,
            message: None,
        });
    }
    let (kind, message) = match body.error {
        Some(e) => (
            e.kind.unwrap_or_default(),
            e.message.unwrap_or_else(|| "authorization declined".to_string()),
        ),
        None => (String::new(), format!("gateway returned status {status}")),
    };
    if status == 402 && kind == "card_error" {
        return Ok(Authorization {
            approved: false,
            client_secret: None,
            message: Some(message),
        });
    }
    Err(GatewayError::Rejected(message))
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn authorize(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<Authorization, GatewayError> {
        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];
        let resp = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let body: IntentBody = resp
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        interpret(status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> IntentBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_created_intent_is_approved() {
        let auth = interpret(200, body(r#"{"id": "pi_1", "client_secret": "pi_1_secret"}"#)).unwrap();
        assert!(auth.approved);
        assert_eq!(auth.client_secret.as_deref(), Some("pi_1_secret"));
    }

    #[test]
    fn test_card_decline_is_an_answer_not_an_error() {
        let auth = interpret(
            402,
            body(r#"{"error": {"type": "card_error", "message": "Your card was declined."}}"#),
        )
        .unwrap();
        assert!(!auth.approved);
        assert_eq!(auth.message.as_deref(), Some("Your card was declined."));
    }

    #[test]
    fn test_other_failures_are_gateway_errors() {
        assert!(interpret(500, IntentBody::default()).is_err());
        assert!(interpret(
            401,
            body(r#"{"error": {"type": "invalid_request_error", "message": "Invalid API key"}}"#)
        )
        .is_err());
    }

    struct ApprovingGateway;

    #[async_trait]
    impl PaymentGateway for ApprovingGateway {
        async fn authorize(&self, _: i64, _: &str) -> Result<Authorization, GatewayError> {
            Ok(Authorization {
                approved: true,
                client_secret: Some("test_secret".into()),
                message: None,
            })
        }
    }

    #[tokio::test]
    async fn test_injected_adapter() {
        let gateway: std::sync::Arc<dyn PaymentGateway> = std::sync::Arc::new(ApprovingGateway);
        let auth = gateway.authorize(1999, "usd").await.unwrap();
        assert!(auth.approved);
    }
}
