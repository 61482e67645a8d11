use serde::{Deserialize, Serialize};

/// Identifier assigned by the content API. Opaque string, unique per item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// A catalog entry as delivered by the menu API. Never created or mutated
/// locally; `price` is in the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: ItemId,
    pub name: String,
    pub price: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<MenuImage>,
}

/// One distinct menu item and its selected quantity. Quantity is always >= 1;
/// a line that would drop to 0 is removed instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item: MenuItem,
    pub quantity: u32,
}

impl CartLine {
    pub fn subtotal(&self) -> u64 {
        self.item.price * u64::from(self.quantity)
    }
}

/// The paid total captured when a simulated payment completes. Persisted
/// transiently so the confirmation message survives an app restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub amount: u64,
}
