//! Billing platform client layer
//!
//! The pipeline's view of the dispute platform: resolve a charge id into a
//! validated `BillingContext` and push generated evidence back onto the
//! dispute. The `BillingGateway` trait is the seam; `StripeGateway` is the
//! REST implementation.
//!
//! The platform stores customer and product facts as loosely-typed
//! string-keyed charge metadata. That mapping is validated here, at the
//! fetch boundary, with defined fallback values, so the rest of the
//! pipeline only ever sees the explicit schema.

use async_trait::async_trait;
use sdk::types::BillingContext;
use std::collections::BTreeMap;

pub mod stripe;

pub use stripe::StripeGateway;

/// Result type for billing operations
pub type Result<T> = std::result::Result<T, BillingError>;

/// Errors that can occur against the billing platform
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// The platform's own message, verbatim
    #[error("{0}")]
    NotFound(String),

    #[error("no dispute found for charge {0}")]
    NoDispute(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("billing API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Gateway to the billing/dispute platform
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Resolve a charge id into the validated billing context: customer,
    /// product, and charge facts plus the dispute id and reason.
    async fn charge_context(&self, charge_id: &str) -> Result<BillingContext>;

    /// Submit evidence fields for a dispute.
    ///
    /// `submit_immediately` pushes the evidence to the bank at once;
    /// otherwise it is staged on the dispute. Returns the dispute status
    /// reported by the platform.
    async fn submit_evidence(
        &self,
        dispute_id: &str,
        fields: &BTreeMap<String, String>,
        submit_immediately: bool,
    ) -> Result<String>;
}

// Fallback values applied at the fetch boundary.
pub(crate) const FALLBACK_CUSTOMER_NAME: &str = "Unknown Customer";
pub(crate) const FALLBACK_TEXT: &str = "N/A";
