//! Agent persona composition
//!
//! Assembles the full prompt override for the voice agent from the base
//! persona, the customer context, the argument brief, and the optional
//! knowledge block. Composition only ever appends; the base persona is
//! always present.

use sdk::types::BillingContext;

const BASE_PERSONA: &str = "You are a helpful customer service agent for Chargeback Shield, \
calling to resolve a customer dispute before it becomes a chargeback.";

const GUIDELINES: &str = "IMPORTANT GUIDELINES:
1. Be empathetic and understanding - the customer is frustrated
2. Listen carefully to their specific concern
3. Use the dispute scripts and policies above to guide your responses
4. Offer immediate solutions within your authority
5. Always aim to resolve the issue and prevent the chargeback
6. If you can't resolve it, escalate appropriately

Your goal is to turn this frustrated customer into a satisfied one through a helpful, \
solution-focused conversation.";

/// Compose the complete agent persona for one call.
pub fn compose_persona(
    context: &BillingContext,
    brief: &str,
    knowledge_block: Option<&str>,
) -> String {
    let mut sections = vec![
        BASE_PERSONA.to_string(),
        format!(
            "CUSTOMER CONTEXT:\n- Name: {}\n- Product: {}\n- Dispute Reason: {}",
            context.customer.name, context.product.name, context.dispute_reason
        ),
        format!("ARGUMENTS AND EVIDENCE POINTS:\n{brief}"),
    ];

    if let Some(block) = knowledge_block.filter(|b| !b.is_empty()) {
        sections.push(format!(
            "KNOWLEDGE BASE (Use this information to help resolve the dispute):\n{block}"
        ));
    }

    sections.push(GUIDELINES.to_string());
    sections.join("\n\n")
}
