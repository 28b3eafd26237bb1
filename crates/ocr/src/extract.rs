use serde::Serialize;
use tracing::{debug, info};

use tillscan_core::{ParsedLine, ReceiptItem};

use crate::classify::LineClassifier;
use crate::summary::{ReceiptSummary, TotalCheck};

re!(re_two_decimal_amount, r"\d+\.\d{2}");

/// How a line made it into the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LineMatch {
    /// Matched a catalog template; carries full diagnostics.
    Template(ParsedLine),
    /// Rejected by the catalog but rescued by the last-resort heuristic.
    Fallback(ReceiptItem),
}

impl LineMatch {
    pub fn item(&self) -> ReceiptItem {
        match self {
            LineMatch::Template(line) => line.to_item(),
            LineMatch::Fallback(item) => item.clone(),
        }
    }

    pub fn into_item(self) -> ReceiptItem {
        match self {
            LineMatch::Template(line) => line.into(),
            LineMatch::Fallback(item) => item,
        }
    }

    pub fn template_used(&self) -> Option<&str> {
        match self {
            LineMatch::Template(line) => Some(&line.template_used),
            LineMatch::Fallback(_) => None,
        }
    }
}

/// Item lines plus the receipt's own printed amounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedReceipt {
    pub lines: Vec<LineMatch>,
    pub summary: ReceiptSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<TotalCheck>,
}

impl ExtractedReceipt {
    pub fn items(&self) -> Vec<ReceiptItem> {
        self.lines.iter().map(LineMatch::item).collect()
    }

    pub fn into_items(self) -> Vec<ReceiptItem> {
        self.lines.into_iter().map(LineMatch::into_item).collect()
    }
}

/// Runs the classifier over a whole OCR text blob, line by line, in order.
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'a> {
    classifier: LineClassifier<'a>,
    fallback: bool,
}

impl Default for Extractor<'static> {
    fn default() -> Self {
        Self::new(LineClassifier::default())
    }
}

impl<'a> Extractor<'a> {
    /// The fallback heuristic is enabled by default.
    pub fn new(classifier: LineClassifier<'a>) -> Self {
        Self { classifier, fallback: true }
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled;
        self
    }

    pub fn extract(&self, ocr_text: &str) -> Vec<LineMatch> {
        let matches: Vec<LineMatch> =
            ocr_text.lines().filter_map(|line| self.extract_line(line)).collect();
        debug!(
            lines = ocr_text.lines().count(),
            matched = matches.len(),
            fallback = matches.iter().filter(|m| m.template_used().is_none()).count(),
            "extracted receipt lines"
        );
        matches
    }

    /// Like [`extract`](Self::extract), plus subtotal, tax and total read
    /// from the lines the classifier treats as noise.
    pub fn extract_receipt(&self, ocr_text: &str) -> ExtractedReceipt {
        let lines = self.extract(ocr_text);
        let summary = ReceiptSummary::from_text(ocr_text);
        let items: Vec<ReceiptItem> = lines.iter().map(LineMatch::item).collect();
        let check = summary.check(&items);
        if let Some(check) = check.filter(|c| !c.balanced()) {
            info!(
                printed = %check.printed,
                computed = %check.computed,
                "extracted items do not add up to the printed amount"
            );
        }
        ExtractedReceipt { lines, summary, check }
    }

    pub fn extract_items(&self, ocr_text: &str) -> Vec<ReceiptItem> {
        self.extract(ocr_text).into_iter().map(LineMatch::into_item).collect()
    }

    fn extract_line(&self, line: &str) -> Option<LineMatch> {
        if let Some(parsed) = self.classifier.classify(line) {
            return Some(LineMatch::Template(parsed));
        }
        if !self.fallback {
            return None;
        }
        self.rescue(line).map(LineMatch::Fallback)
    }

    /// Split on the last whitespace and try the tail as a bare number.
    /// Noise lines stay excluded even here.
    fn rescue(&self, line: &str) -> Option<ReceiptItem> {
        let line = line.trim();
        if !re_two_decimal_amount().is_match(line) || self.classifier.skip_filter().should_skip(line) {
            return None;
        }
        let (name, price) = line.rsplit_once(char::is_whitespace)?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let price = price.parse::<f64>().ok().filter(|p| p.is_finite())?;
        debug!(line, "fallback item");
        Some(ReceiptItem::new(name, price))
    }
}
