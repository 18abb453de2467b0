//! Conversation context for the shopping agents

use serde::{Deserialize, Serialize};

/// The shopper; every shop tool reads or updates this
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub shopping_cart: Vec<String>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shopping_cart: Vec::new(),
        }
    }
}
