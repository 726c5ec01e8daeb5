use super::{KnowledgeError, KnowledgeIndex, OrderFact, RetrievedKnowledge, Snippet};
use crate::config::KnowledgeConfig;
use crate::llm::EmbeddingModel;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// REST client for a Pinecone-shaped vector index
pub struct PineconeIndex {
    config: KnowledgeConfig,
    embeddings: Arc<dyn EmbeddingModel>,
    api_key: String,
    client: reqwest::Client,
}

impl PineconeIndex {
    /// Create an index client with an explicit API key (used by tests
    /// against mock servers)
    pub fn new(
        config: KnowledgeConfig,
        embeddings: Arc<dyn EmbeddingModel>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            config,
            embeddings,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create an index client reading the key from `PINECONE_API_KEY`
    pub fn from_env(
        config: KnowledgeConfig,
        embeddings: Arc<dyn EmbeddingModel>,
    ) -> super::Result<Self> {
        let api_key = std::env::var("PINECONE_API_KEY").map_err(|_| {
            KnowledgeError::AuthenticationFailed("PINECONE_API_KEY is not set".into())
        })?;
        Ok(Self::new(config, embeddings, api_key))
    }
}

#[async_trait]
impl KnowledgeIndex for PineconeIndex {
    async fn query(
        &self,
        dispute_reason: &str,
        product_name: &str,
        customer_name: &str,
    ) -> super::Result<RetrievedKnowledge> {
        let query_text = format!("{dispute_reason} {product_name} {customer_name}");
        let vector = self.embeddings.embed(&query_text).await?;

        let url = format!("{}/query", self.config.index_url);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&json!({
                "vector": vector,
                "topK": self.config.top_k,
                "includeMetadata": true,
            }))
            .send()
            .await
            .map_err(|e| KnowledgeError::Network(e.to_string()))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| KnowledgeError::Parse(e.to_string()))?;

        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("no error message")
                .to_string();
            return Err(match status.as_u16() {
                401 | 403 => KnowledgeError::AuthenticationFailed(message),
                code => KnowledgeError::Api {
                    status: code,
                    message,
                },
            });
        }

        let knowledge = bucket_matches(&body);
        debug!(
            scripts = knowledge.dispute_scripts.len(),
            policies = knowledge.policies.len(),
            authority = knowledge.resolution_authority.len(),
            orders = knowledge.orders.len(),
            confusions = knowledge.common_confusions.len(),
            "knowledge retrieved"
        );
        Ok(knowledge)
    }
}

/// Sort matches into the fixed section buckets by their `metadata.type` tag.
/// Matches with an unknown type, or text matches without content, are
/// dropped.
fn bucket_matches(body: &serde_json::Value) -> RetrievedKnowledge {
    let mut knowledge = RetrievedKnowledge::default();

    let Some(matches) = body.get("matches").and_then(|m| m.as_array()) else {
        return knowledge;
    };

    for entry in matches {
        let score = entry.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0);
        let Some(metadata) = entry.get("metadata") else {
            continue;
        };
        let field = |key: &str| {
            metadata
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        let snippet = || -> Option<Snippet> {
            let content = metadata.get("content").and_then(|c| c.as_str())?;
            Some(Snippet {
                score,
                content: content.to_string(),
            })
        };

        match metadata.get("type").and_then(|t| t.as_str()) {
            Some("dispute_script") => knowledge.dispute_scripts.extend(snippet()),
            Some("policy") => knowledge.policies.extend(snippet()),
            Some("resolution_authority") => knowledge.resolution_authority.extend(snippet()),
            Some("common_confusion") => knowledge.common_confusions.extend(snippet()),
            Some("order") => knowledge.orders.push(OrderFact {
                score,
                product: field("product"),
                amount: field("amount"),
                date: field("date"),
                status: field("status"),
                customer: field("customer"),
            }),
            _ => {}
        }
    }

    knowledge
}
