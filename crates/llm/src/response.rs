use serde::Deserialize;

use tillscan_core::ReceiptItem;

use crate::LlmError;

/// Remove a surrounding Markdown code fence (```` ```json … ``` ````), if any.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string ("json", "JSON", …) on the opening line.
        body = rest.split_once('\n').map_or(rest, |(_, after)| after);
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    List(Vec<RawItem>),
    Wrapped { items: Vec<RawItem> },
}

#[derive(Deserialize)]
struct RawItem {
    name: String,
    price: RawPrice,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

impl RawPrice {
    fn value(self) -> Result<f64, LlmError> {
        match self {
            RawPrice::Number(n) => Ok(n),
            RawPrice::Text(s) => {
                let cleaned: String =
                    s.trim().trim_start_matches('$').chars().filter(|c| *c != ',').collect();
                cleaned
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|p| p.is_finite())
                    .ok_or(LlmError::InvalidPrice(s))
            }
        }
    }
}

/// Parse model output into items. Accepts a bare array or `{"items": [...]}`,
/// fenced or not. Entries with a blank name are dropped.
pub fn parse_items(output: &str) -> Result<Vec<ReceiptItem>, LlmError> {
    let raw = match serde_json::from_str::<Payload>(strip_code_fences(output))? {
        Payload::List(items) | Payload::Wrapped { items } => items,
    };

    let mut items = Vec::with_capacity(raw.len());
    for entry in raw {
        let name = entry.name.trim();
        if name.is_empty() {
            continue;
        }
        items.push(ReceiptItem::new(name, entry.price.value()?));
    }
    Ok(items)
}
