//! Grocery shopping assistant
//!
//! A shopping agent that plans purchases within the user's budget and hands
//! account questions over to a customer support agent.

pub mod agents;
pub mod profile;
pub mod tools;

pub use agents::{customer_support_agent, shopping_assistant, CUSTOMER_SUPPORT, SHOPPING_ASSISTANT};
pub use profile::UserProfile;
pub use tools::{
    AddToShoppingCart, FixedPrice, GetBudget, GetShoppingCart, PriceSource, PurchaseItems,
    RandomPrice, SearchForItem, ACCOUNT_BALANCE,
};
