//! Shop tools over a [`UserProfile`]

use async_trait::async_trait;
use baton_agent::{parse_args, Tool, ToolError};
use baton_provider::object_schema;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::profile::UserProfile;

/// Balance reported for every account
pub const ACCOUNT_BALANCE: f64 = 100.0;

/// Where catalogue prices come from
pub trait PriceSource: Send + Sync {
    /// Whole-dollar price for `item`
    fn quote(&self, item: &str) -> u32;
}

/// Uniform random price between 1 and 100 dollars
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPrice;

impl PriceSource for RandomPrice {
    fn quote(&self, _item: &str) -> u32 {
        rand::thread_rng().gen_range(1..=100)
    }
}

/// Same price for everything
#[derive(Debug, Clone, Copy)]
pub struct FixedPrice(pub u32);

impl PriceSource for FixedPrice {
    fn quote(&self, _item: &str) -> u32 {
        self.0
    }
}

fn no_arguments() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Account balance lookup
pub struct GetBudget;

#[async_trait]
impl Tool<UserProfile> for GetBudget {
    fn name(&self) -> &str {
        "get_budget"
    }

    fn description(&self) -> &str {
        "Get the account balance of the user using the user's id and their linked bank account"
    }

    fn parameters(&self) -> Value {
        no_arguments()
    }

    async fn invoke(&self, ctx: &mut UserProfile, _args: Value) -> Result<Value, ToolError> {
        info!("Getting account balance for user {}", ctx.id);
        Ok(json!(ACCOUNT_BALANCE))
    }
}

/// Catalogue search with a quoted price
pub struct SearchForItem {
    prices: Arc<dyn PriceSource>,
}

impl SearchForItem {
    pub fn new(prices: Arc<dyn PriceSource>) -> Self {
        Self { prices }
    }
}

impl Default for SearchForItem {
    fn default() -> Self {
        Self::new(Arc::new(RandomPrice))
    }
}

#[async_trait]
impl Tool<UserProfile> for SearchForItem {
    fn name(&self) -> &str {
        "search_for_item"
    }

    fn description(&self) -> &str {
        "Search for an item in the database"
    }

    fn parameters(&self) -> Value {
        object_schema(vec![(
            "item".to_string(),
            "Item to look up".to_string(),
            true,
        )])
    }

    async fn invoke(&self, _ctx: &mut UserProfile, args: Value) -> Result<Value, ToolError> {
        #[derive(Deserialize)]
        struct Args {
            item: String,
        }
        let args: Args = parse_args(args)?;

        info!("Searching for item: {}", args.item);
        let price = self.prices.quote(&args.item);
        Ok(json!(format!(
            "Found {} in the database for ${}.00",
            args.item, price
        )))
    }
}

pub struct GetShoppingCart;

#[async_trait]
impl Tool<UserProfile> for GetShoppingCart {
    fn name(&self) -> &str {
        "get_shopping_cart"
    }

    fn description(&self) -> &str {
        "Get the items currently in the user's shopping cart"
    }

    fn parameters(&self) -> Value {
        no_arguments()
    }

    async fn invoke(&self, ctx: &mut UserProfile, _args: Value) -> Result<Value, ToolError> {
        info!("Getting shopping cart");
        Ok(json!(ctx.shopping_cart))
    }
}

pub struct AddToShoppingCart;

#[async_trait]
impl Tool<UserProfile> for AddToShoppingCart {
    fn name(&self) -> &str {
        "add_to_shopping_cart"
    }

    fn description(&self) -> &str {
        "Add items to the user's shopping cart"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Items to add"
                }
            },
            "required": ["items"]
        })
    }

    async fn invoke(&self, ctx: &mut UserProfile, args: Value) -> Result<Value, ToolError> {
        #[derive(Deserialize)]
        struct Args {
            items: Vec<String>,
        }
        let args: Args = parse_args(args)?;

        info!("Adding {} items to shopping cart", args.items.len());
        ctx.shopping_cart.extend(args.items);
        debug!("Cart now holds {:?}", ctx.shopping_cart);
        Ok(Value::Null)
    }
}

/// Checkout; no payment backend is attached, so this only records the order
pub struct PurchaseItems;

#[async_trait]
impl Tool<UserProfile> for PurchaseItems {
    fn name(&self) -> &str {
        "purchase_items"
    }

    fn description(&self) -> &str {
        "Purchase the items in the user's shopping cart"
    }

    fn parameters(&self) -> Value {
        no_arguments()
    }

    async fn invoke(&self, ctx: &mut UserProfile, _args: Value) -> Result<Value, ToolError> {
        info!("Successfully purchased items: {:?}", ctx.shopping_cart);
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alex() -> UserProfile {
        UserProfile::new("123", "Alex")
    }

    #[tokio::test]
    async fn test_get_budget() {
        let mut profile = alex();
        let out = GetBudget.invoke(&mut profile, json!({})).await.unwrap();
        assert_eq!(out, json!(100.0));
    }

    #[tokio::test]
    async fn test_search_for_item_uses_price_source() {
        let tool = SearchForItem::new(Arc::new(FixedPrice(42)));
        let mut profile = alex();
        let out = tool
            .invoke(&mut profile, json!({"item": "apples"}))
            .await
            .unwrap();
        assert_eq!(out, json!("Found apples in the database for $42.00"));
    }

    #[test]
    fn test_random_price_in_range() {
        for _ in 0..200 {
            let price = RandomPrice.quote("bread");
            assert!((1..=100).contains(&price));
        }
    }

    #[tokio::test]
    async fn test_add_to_shopping_cart_extends() {
        let mut profile = alex();
        profile.shopping_cart.push("milk".to_string());

        let out = AddToShoppingCart
            .invoke(&mut profile, json!({"items": ["eggs", "bread"]}))
            .await
            .unwrap();

        assert_eq!(out, Value::Null);
        assert_eq!(profile.shopping_cart, vec!["milk", "eggs", "bread"]);
    }

    #[tokio::test]
    async fn test_purchase_items_keeps_cart() {
        let mut profile = alex();
        profile.shopping_cart.push("milk".to_string());
        PurchaseItems.invoke(&mut profile, json!({})).await.unwrap();
        assert_eq!(profile.shopping_cart, vec!["milk"]);
    }
}
