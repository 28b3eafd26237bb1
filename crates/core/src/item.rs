use serde::{Deserialize, Serialize};

use crate::money::Money;

/// One receipt line that matched a catalog template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedLine {
    /// Trimmed item description, never empty.
    pub name: String,
    /// Signed amount after normalization (parenthesized prices are negative).
    pub price: f64,
    /// Name of the template that produced the match.
    pub template_used: String,
    /// The trimmed input line.
    pub raw_line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ParsedLine {
    pub fn to_item(&self) -> ReceiptItem {
        ReceiptItem::new(self.name.clone(), self.price)
    }
}

/// The `{name, price}` record handed to callers and serialized on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    pub price: f64,
}

impl ReceiptItem {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self { name: name.into(), price }
    }

    pub fn money(&self) -> Money {
        Money::from_price(self.price)
    }
}

impl From<ParsedLine> for ReceiptItem {
    fn from(line: ParsedLine) -> Self {
        Self { name: line.name, price: line.price }
    }
}

/// Sum of all item prices, rounded per item to cents.
pub fn total(items: &[ReceiptItem]) -> Money {
    items.iter().map(ReceiptItem::money).sum()
}
