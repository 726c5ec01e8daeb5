use super::{BillingError, BillingGateway, FALLBACK_CUSTOMER_NAME, FALLBACK_TEXT};
use crate::config::BillingConfig;
use async_trait::async_trait;
use sdk::types::{BillingContext, ChargeFacts, CustomerFacts, ProductFacts};
use std::collections::BTreeMap;

/// REST client for a Stripe-shaped billing platform
pub struct StripeGateway {
    config: BillingConfig,
    api_key: String,
    client: reqwest::Client,
}

impl StripeGateway {
    /// Create a gateway with an explicit API key (used by tests against mock servers)
    pub fn new(config: BillingConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a gateway reading the key from `STRIPE_SECRET_KEY`
    pub fn from_env(config: BillingConfig) -> super::Result<Self> {
        let api_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| BillingError::AuthenticationFailed("STRIPE_SECRET_KEY is not set".into()))?;
        Ok(Self::new(config, api_key))
    }

    async fn get_json(&self, url: &str) -> super::Result<serde_json::Value> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| BillingError::Network(e.to_string()))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BillingError::Parse(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &body));
        }

        Ok(body)
    }

    async fn fetch_charge(&self, charge_id: &str) -> super::Result<serde_json::Value> {
        let url = format!("{}/v1/charges/{charge_id}", self.config.base_url);
        self.get_json(&url).await
    }

    async fn fetch_dispute(&self, charge_id: &str) -> super::Result<serde_json::Value> {
        let url = format!("{}/v1/disputes?charge={charge_id}", self.config.base_url);
        let body = self.get_json(&url).await?;

        body.get("data")
            .and_then(|d| d.as_array())
            .and_then(|d| d.first())
            .cloned()
            .ok_or_else(|| BillingError::NoDispute(charge_id.to_string()))
    }
}

#[async_trait]
impl BillingGateway for StripeGateway {
    async fn charge_context(&self, charge_id: &str) -> super::Result<BillingContext> {
        let charge = self.fetch_charge(charge_id).await?;
        let dispute = self.fetch_dispute(charge_id).await?;

        Ok(build_context(charge_id, &charge, &dispute))
    }

    async fn submit_evidence(
        &self,
        dispute_id: &str,
        fields: &BTreeMap<String, String>,
        submit_immediately: bool,
    ) -> super::Result<String> {
        let url = format!("{}/v1/disputes/{dispute_id}", self.config.base_url);

        let mut form: Vec<(String, String)> = fields
            .iter()
            .map(|(name, value)| (format!("evidence[{name}]"), value.clone()))
            .collect();
        form.push(("submit".to_string(), submit_immediately.to_string()));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| BillingError::Network(e.to_string()))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BillingError::Parse(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &body));
        }

        Ok(body
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown")
            .to_string())
    }
}

fn error_from_response(status: u16, body: &serde_json::Value) -> BillingError {
    let message = body
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("no error message")
        .to_string();

    match status {
        404 => BillingError::NotFound(message),
        401 | 403 => BillingError::AuthenticationFailed(message),
        _ => BillingError::Api { status, message },
    }
}

/// Map the loosely-typed charge payload into the explicit context schema.
///
/// Metadata keys win over the charge's own billing details; every field has
/// a defined fallback so downstream prompts never render empty holes.
fn build_context(
    charge_id: &str,
    charge: &serde_json::Value,
    dispute: &serde_json::Value,
) -> BillingContext {
    let metadata: BTreeMap<String, String> = charge
        .get("metadata")
        .and_then(|m| m.as_object())
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let billing_details = charge.get("billing_details");
    let detail = |key: &str| {
        billing_details
            .and_then(|d| d.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    let customer = CustomerFacts {
        name: metadata
            .get("customer_name")
            .cloned()
            .or_else(|| detail("name"))
            .unwrap_or_else(|| FALLBACK_CUSTOMER_NAME.to_string()),
        email: metadata
            .get("customer_email")
            .cloned()
            .or_else(|| detail("email"))
            .unwrap_or_else(|| FALLBACK_TEXT.to_string()),
        phone: metadata
            .get("customer_phone")
            .cloned()
            .or_else(|| detail("phone")),
    };

    let product = ProductFacts {
        name: metadata
            .get("product_name")
            .cloned()
            .or_else(|| {
                charge
                    .get("description")
                    .and_then(|d| d.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Unknown Product".to_string()),
        description: metadata
            .get("product_description")
            .cloned()
            .unwrap_or_default(),
    };

    let charge_facts = ChargeFacts {
        amount_cents: charge.get("amount").and_then(|a| a.as_i64()).unwrap_or(0),
        currency: charge
            .get("currency")
            .and_then(|c| c.as_str())
            .unwrap_or("usd")
            .to_string(),
    };

    let dispute_id = dispute
        .get("id")
        .and_then(|i| i.as_str())
        .unwrap_or_default()
        .to_string();
    let dispute_reason = dispute
        .get("reason")
        .and_then(|r| r.as_str())
        .unwrap_or("unknown")
        .to_string();

    BillingContext {
        charge_id: charge_id.to_string(),
        dispute_id,
        dispute_reason,
        customer,
        product,
        charge: charge_facts,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_prefers_metadata_over_billing_details() {
        let charge = json!({
            "amount": 4999,
            "currency": "usd",
            "description": "Pro Plan",
            "billing_details": {"name": "J. Doe", "email": "jd@example.com", "phone": "+15550000000"},
            "metadata": {
                "customer_name": "Jane Doe",
                "customer_phone": "+15551234567",
                "product_name": "Chargeback Shield Pro"
            }
        });
        let dispute = json!({"id": "du_1", "reason": "subscription_canceled"});

        let ctx = build_context("ch_1", &charge, &dispute);
        assert_eq!(ctx.customer.name, "Jane Doe");
        assert_eq!(ctx.customer.email, "jd@example.com");
        assert_eq!(ctx.customer.phone.as_deref(), Some("+15551234567"));
        assert_eq!(ctx.product.name, "Chargeback Shield Pro");
        assert_eq!(ctx.charge.amount_cents, 4999);
        assert_eq!(ctx.dispute_id, "du_1");
        assert_eq!(ctx.dispute_reason, "subscription_canceled");
    }

    #[test]
    fn context_applies_fallbacks_for_missing_fields() {
        let charge = json!({"metadata": {}});
        let dispute = json!({});

        let ctx = build_context("ch_2", &charge, &dispute);
        assert_eq!(ctx.customer.name, "Unknown Customer");
        assert_eq!(ctx.customer.email, "N/A");
        assert!(ctx.customer.phone.is_none());
        assert_eq!(ctx.product.name, "Unknown Product");
        assert_eq!(ctx.dispute_reason, "unknown");
        assert_eq!(ctx.charge.currency, "usd");
    }

    #[test]
    fn error_mapping_extracts_platform_message() {
        let body = json!({"error": {"message": "No such charge: ch_404"}});
        let err = error_from_response(404, &body);
        assert_eq!(err.to_string(), "No such charge: ch_404");
    }
}
