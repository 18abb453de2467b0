//! The shopping assistant and its support specialist

use baton_agent::{Agent, Handoff, ModelRef};
use std::sync::Arc;
use tracing::info;

use crate::profile::UserProfile;
use crate::tools::{
    AddToShoppingCart, GetBudget, GetShoppingCart, PriceSource, PurchaseItems, SearchForItem,
};

pub const SHOPPING_ASSISTANT: &str = "Shopping Assistant";
pub const CUSTOMER_SUPPORT: &str = "Customer Support Agent";

const SUPPORT_INSTRUCTIONS: &str = "You provide assistance with customer-related queries and \
issues. If the user has a question about their account or needs help with a purchase, you will \
assist them.";

const SHOPPING_INSTRUCTIONS: &str = "You are a shopping assistant dedicated to helping the user \
with their grocery shopping needs. Your primary role is to assist in creating a shopping plan \
that fits within the user's budget. Start by getting the user's budget using the tool \
get_budget. Provide suggestions for items if requested, and always aim to keep the total cost \
within the user's budget. If the user is nearing or exceeding their budget, inform them and \
suggest alternatives or adjustments to the shopping list. If the user authorizes it, you can \
purchase the items using the tool purchase_items.";

/// Account and purchase questions; has no tools of its own
pub fn customer_support_agent(model: ModelRef) -> Arc<Agent<UserProfile>> {
    Agent::builder(CUSTOMER_SUPPORT, model)
        .instructions(SUPPORT_INSTRUCTIONS)
        .handoff_description("Specialist agent for handling customer queries")
        .build()
}

/// Entry agent for every turn
pub fn shopping_assistant(
    model: ModelRef,
    support: Arc<Agent<UserProfile>>,
    prices: Arc<dyn PriceSource>,
) -> Arc<Agent<UserProfile>> {
    Agent::builder(SHOPPING_ASSISTANT, model)
        .instructions(SHOPPING_INSTRUCTIONS)
        .tool(GetShoppingCart)
        .tool(AddToShoppingCart)
        .tool(GetBudget)
        .tool(SearchForItem::new(prices))
        .tool(PurchaseItems)
        .handoff(Handoff::new(support).on_handoff(|trigger| {
            info!("Handing off to customer agent (from {})", trigger.from_agent);
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::RandomPrice;
    use async_trait::async_trait;
    use baton_provider::{ChatParams, ChatResponse, Provider};

    struct NullProvider;

    #[async_trait]
    impl Provider for NullProvider {
        async fn chat(&self, _params: ChatParams) -> baton_provider::Result<ChatResponse> {
            Ok(ChatResponse::text(""))
        }
        fn default_model(&self) -> String {
            "gemini-2.0-flash".to_string()
        }
        fn is_configured(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_shopping_assistant_offers_tools_then_handoff() {
        let model = ModelRef::new(Arc::new(NullProvider));
        let support = customer_support_agent(model.clone());
        let shop = shopping_assistant(model, support, Arc::new(RandomPrice));

        let names: Vec<String> = shop
            .tool_definitions()
            .into_iter()
            .map(|t| t.function.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "get_shopping_cart",
                "add_to_shopping_cart",
                "get_budget",
                "search_for_item",
                "purchase_items",
                "transfer_to_customer_support_agent",
            ]
        );
        assert!(shop.instructions().contains("get_budget"));
    }

    #[test]
    fn test_support_handoff_description() {
        let model = ModelRef::new(Arc::new(NullProvider));
        let support = customer_support_agent(model.clone());
        assert!(support.tools().is_empty());

        let shop = shopping_assistant(model, support, Arc::new(RandomPrice));
        let handoff = shop
            .handoff("transfer_to_customer_support_agent")
            .unwrap();
        assert_eq!(handoff.target().name(), CUSTOMER_SUPPORT);
        assert!(handoff
            .description()
            .ends_with("Specialist agent for handling customer queries"));
    }
}
