//! Knowledge retrieval
//!
//! Vector-index lookup that runs before a call is placed: the dispute
//! reason, product, and customer name are embedded as one composite query
//! and the nearest matches are bucketed by their metadata type into the
//! sections the agent persona understands. Retrieval is best-effort; the
//! pipeline proceeds without a knowledge block when it fails.

use crate::config::KnowledgeConfig;
use crate::llm::EmbeddingModel;
use async_trait::async_trait;
use std::sync::Arc;

pub mod pinecone;

pub use pinecone::PineconeIndex;

/// Result type for knowledge operations
pub type Result<T> = std::result::Result<T, KnowledgeError>;

/// Errors that can occur during knowledge retrieval
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] crate::llm::LlmError),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("index API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// One retrieved text snippet
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub score: f64,
    pub content: String,
}

/// One retrieved order record
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFact {
    pub score: f64,
    pub product: String,
    pub amount: String,
    pub date: String,
    pub status: String,
    pub customer: String,
}

/// Matches bucketed by metadata type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedKnowledge {
    pub dispute_scripts: Vec<Snippet>,
    pub policies: Vec<Snippet>,
    pub resolution_authority: Vec<Snippet>,
    pub orders: Vec<OrderFact>,
    pub common_confusions: Vec<Snippet>,
}

impl RetrievedKnowledge {
    pub fn is_empty(&self) -> bool {
        self.dispute_scripts.is_empty()
            && self.policies.is_empty()
            && self.resolution_authority.is_empty()
            && self.orders.is_empty()
            && self.common_confusions.is_empty()
    }

    /// Render the sectioned knowledge block appended to the agent persona.
    /// Empty sections are omitted entirely.
    pub fn format_for_prompt(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if !self.dispute_scripts.is_empty() {
            parts.push("## DISPUTE RESOLUTION SCRIPTS".to_string());
            for snippet in &self.dispute_scripts {
                parts.push(format!("- {}", snippet.content));
            }
        }

        if !self.policies.is_empty() {
            parts.push("\n## COMPANY POLICIES".to_string());
            for snippet in &self.policies {
                parts.push(format!("- {}", snippet.content));
            }
        }

        if !self.resolution_authority.is_empty() {
            parts.push("\n## YOUR AUTHORITY TO RESOLVE".to_string());
            for snippet in &self.resolution_authority {
                parts.push(format!("- {}", snippet.content));
            }
        }

        if !self.orders.is_empty() {
            parts.push("\n## RELEVANT ORDER INFORMATION".to_string());
            for order in &self.orders {
                parts.push(format!(
                    "- Order for {}: ${} on {}, Status: {}, Customer: {}",
                    order.product, order.amount, order.date, order.status, order.customer
                ));
            }
        }

        if !self.common_confusions.is_empty() {
            parts.push("\n## COMMON CUSTOMER QUESTIONS".to_string());
            for snippet in &self.common_confusions {
                parts.push(format!("- {}", snippet.content));
            }
        }

        parts.join("\n")
    }
}

/// Query surface of the vector index
#[async_trait]
pub trait KnowledgeIndex: Send + Sync {
    /// Retrieve knowledge relevant to one dispute. The three arguments are
    /// combined into a single embedded query.
    async fn query(
        &self,
        dispute_reason: &str,
        product_name: &str,
        customer_name: &str,
    ) -> Result<RetrievedKnowledge>;
}

/// Build the configured index client, or `None` when retrieval is disabled
/// (empty index URL).
pub fn from_config(
    config: &KnowledgeConfig,
    embeddings: Arc<dyn EmbeddingModel>,
) -> Result<Option<Arc<dyn KnowledgeIndex>>> {
    if config.index_url.is_empty() {
        return Ok(None);
    }
    let index = PineconeIndex::from_env(config.clone(), embeddings)?;
    Ok(Some(Arc::new(index)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(content: &str) -> Snippet {
        Snippet {
            score: 0.9,
            content: content.to_string(),
        }
    }

    #[test]
    fn empty_knowledge_formats_to_empty_string() {
        let knowledge = RetrievedKnowledge::default();
        assert!(knowledge.is_empty());
        assert_eq!(knowledge.format_for_prompt(), "");
    }

    #[test]
    fn sections_render_in_fixed_order_and_skip_empty() {
        let knowledge = RetrievedKnowledge {
            dispute_scripts: vec![snippet("Acknowledge the charge first")],
            policies: vec![],
            resolution_authority: vec![snippet("You may offer up to 50% refund")],
            orders: vec![OrderFact {
                score: 0.8,
                product: "Pro Plan".into(),
                amount: "49.99".into(),
                date: "2024-01-15".into(),
                status: "paid".into(),
                customer: "Jane Doe".into(),
            }],
            common_confusions: vec![],
        };

        let block = knowledge.format_for_prompt();
        assert!(block.starts_with("## DISPUTE RESOLUTION SCRIPTS"));
        assert!(!block.contains("## COMPANY POLICIES"));
        let authority = block.find("## YOUR AUTHORITY TO RESOLVE").expect("authority");
        let orders = block.find("## RELEVANT ORDER INFORMATION").expect("orders");
        assert!(authority < orders);
        assert!(block.contains("- Order for Pro Plan: $49.99 on 2024-01-15, Status: paid, Customer: Jane Doe"));
    }
}
