use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::service::error::ServiceError;

type HmacSha256 = Hmac<Sha256>;

/// How far a webhook timestamp may drift before we reject the signature.
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutStatus {
    /// Session lifecycle: open, complete, expired.
    pub status: String,
    /// Payment state: unpaid, paid, no_payment_required.
    pub payment_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event_type: String,
    pub session_id: String,
    pub payment_status: String,
}

/// Thin call-through to the hosted Stripe checkout API. Sessions are created
/// and polled over HTTPS; webhook payloads are verified locally against the
/// endpoint signing secret.
#[derive(Debug, Clone)]
pub struct StripeCheckout {
    secret_key: String,
    webhook_secret: String,
}

impl StripeCheckout {
    pub fn new(config: &Config) -> Self {
        Self {
            secret_key: config.stripe_secret_key.clone(),
            webhook_secret: config.stripe_webhook_secret.clone(),
        }
    }

    pub async fn create_checkout_session(
        &self,
        amount: f64,
        currency: &str,
        success_url: &str,
        cancel_url: &str,
        job_id: &str,
        payer_id: &str,
    ) -> Result<CheckoutSession, ServiceError> {
        let amount_cents = (amount * 100.0).round() as i64;

        let params = vec![
            ("mode", "payment".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", currency.to_string()),
            (
                "line_items[0][price_data][unit_amount]",
                amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                "Escrow funding".to_string(),
            ),
            ("metadata[job_id]", job_id.to_string()),
            ("metadata[user_id]", payer_id.to_string()),
            ("metadata[payment_type]", "escrow".to_string()),
        ];

        let client = reqwest::Client::new();
        let response = client
            .post("https://api.stripe.com/v1/checkout/sessions")
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        match (body["id"].as_str(), body["url"].as_str()) {
            (Some(id), Some(url)) => Ok(CheckoutSession {
                session_id: id.to_string(),
                url: url.to_string(),
            }),
            _ => {
                let message = body["error"]["message"]
                    .as_str()
                    .unwrap_or("Checkout session creation failed");
                Err(ServiceError::Upstream(message.to_string()))
            }
        }
    }

    pub async fn get_checkout_status(
        &self,
        session_id: &str,
    ) -> Result<CheckoutStatus, ServiceError> {
        let url = format!(
            "https://api.stripe.com/v1/checkout/sessions/{}",
            session_id
        );

        let client = reqwest::Client::new();
        let response = client
            .get(&url)
            .basic_auth(&self.secret_key, Option::<&str>::None)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        if body["id"].as_str().is_none() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("Checkout session lookup failed");
            return Err(ServiceError::Upstream(message.to_string()));
        }

        Ok(CheckoutStatus {
            status: body["status"].as_str().unwrap_or("open").to_string(),
            payment_status: body["payment_status"]
                .as_str()
                .unwrap_or("unpaid")
                .to_string(),
        })
    }

    /// Verifies the `Stripe-Signature` header (t=...,v1=...) against the
    /// payload and extracts the checkout session from the event. The compare
    /// is constant-time.
    pub fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, ServiceError> {
        self.verify_webhook_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    fn verify_webhook_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<WebhookEvent, ServiceError> {
        let mut timestamp: Option<i64> = None;
        let mut signature: Option<String> = None;

        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse().ok(),
                Some(("v1", value)) => signature = Some(value.to_string()),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| ServiceError::Validation("Missing webhook timestamp".to_string()))?;
        let signature = signature
            .ok_or_else(|| ServiceError::Validation("Missing webhook signature".to_string()))?;

        if (now - timestamp).abs() > WEBHOOK_TOLERANCE_SECS {
            return Err(ServiceError::Validation(
                "Webhook timestamp outside tolerance".to_string(),
            ));
        }

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        if expected.as_bytes().ct_eq(signature.as_bytes()).unwrap_u8() != 1 {
            return Err(ServiceError::Validation(
                "Webhook signature mismatch".to_string(),
            ));
        }

        let event: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let session = &event["data"]["object"];
        let session_id = session["id"]
            .as_str()
            .ok_or_else(|| ServiceError::Validation("Event has no session id".to_string()))?;

        Ok(WebhookEvent {
            event_type: event["type"].as_str().unwrap_or("").to_string(),
            session_id: session_id.to_string(),
            payment_status: session["payment_status"]
                .as_str()
                .unwrap_or("unpaid")
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> StripeCheckout {
        StripeCheckout {
            secret_key: "sk_test_x".to_string(),
            webhook_secret: "whsec_test".to_string(),
        }
    }

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    const EVENT: &[u8] = br#"{
        "type": "checkout.session.completed",
        "data": {"object": {"id": "cs_test_123", "payment_status": "paid"}}
    }"#;

    #[test]
    fn valid_signature_accepted() {
        let p = provider();
        let now = chrono::Utc::now().timestamp();
        let header = sign(EVENT, "whsec_test", now);

        let event = p.verify_webhook_at(EVENT, &header, now).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.session_id, "cs_test_123");
        assert_eq!(event.payment_status, "paid");
    }

    #[test]
    fn wrong_secret_rejected() {
        let p = provider();
        let now = chrono::Utc::now().timestamp();
        let header = sign(EVENT, "whsec_other", now);
        assert!(p.verify_webhook_at(EVENT, &header, now).is_err());
    }

    #[test]
    fn stale_timestamp_rejected() {
        let p = provider();
        let now = chrono::Utc::now().timestamp();
        let header = sign(EVENT, "whsec_test", now - 3600);
        assert!(p.verify_webhook_at(EVENT, &header, now).is_err());
    }

    #[test]
    fn malformed_header_rejected() {
        let p = provider();
        let now = chrono::Utc::now().timestamp();
        assert!(p.verify_webhook_at(EVENT, "v1=aaaa", now).is_err());
        assert!(p.verify_webhook_at(EVENT, "", now).is_err());
    }
}
