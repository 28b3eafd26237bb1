use serde::Serialize;

use tillscan_core::{total, Money, ReceiptItem};

re!(re_subtotal,
    r"(?i)^sub[\s\-]?total\b\s*[:\-]?\s*\$?\s*([\d,]+\.\d{2})\b");
re!(re_tax,
    r"(?i)^(?:sales\s+)?(?:tax|hst|gst|pst|vat)\b(?:\s*\d+(?:\.\d+)?\s*%)?\s*[:\-]?\s*\$?\s*([\d,]+\.\d{2})\b");
re!(re_total,
    r"(?i)^(?:grand\s+total|total\s+due|total|amount\s+due|balance\s+due)\b\s*[:\-]?\s*\$?\s*([\d,]+\.\d{2})\b");

/// The amounts a receipt prints about itself. These lines are noise to the
/// item classifier and are read separately here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReceiptSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Money>,
}

impl ReceiptSummary {
    /// The first labelled amount of each kind wins.
    pub fn from_text(ocr_text: &str) -> Self {
        let mut summary = Self::default();
        for line in ocr_text.lines().map(str::trim) {
            if summary.subtotal.is_none() {
                if let Some(amount) = labelled_amount(re_subtotal(), line) {
                    summary.subtotal = Some(amount);
                    continue;
                }
            }
            if summary.total.is_none() {
                if let Some(amount) = labelled_amount(re_total(), line) {
                    summary.total = Some(amount);
                    continue;
                }
            }
            if summary.tax.is_none() {
                summary.tax = labelled_amount(re_tax(), line);
            }
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.subtotal.is_none() && self.tax.is_none() && self.total.is_none()
    }

    /// What the item lines should add up to: the subtotal, or else the total
    /// less any tax.
    pub fn expected_item_sum(&self) -> Option<Money> {
        self.subtotal
            .or_else(|| self.total.map(|t| t - self.tax.unwrap_or_else(Money::zero)))
    }

    /// Compare the printed amounts with the sum of extracted items.
    /// `None` when the receipt printed nothing to compare against.
    pub fn check(&self, items: &[ReceiptItem]) -> Option<TotalCheck> {
        let printed = self.expected_item_sum()?;
        let computed = total(items);
        Some(TotalCheck { printed, computed, difference: printed - computed })
    }
}

/// Printed item sum versus the sum of extracted items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TotalCheck {
    pub printed: Money,
    pub computed: Money,
    /// `printed - computed`; positive means items were missed.
    pub difference: Money,
}

impl TotalCheck {
    pub fn balanced(&self) -> bool {
        self.difference.is_zero()
    }
}

fn labelled_amount(re: &regex::Regex, line: &str) -> Option<Money> {
    let caps = re.captures(line)?;
    Money::parse_amount(caps.get(1)?.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(c: i64) -> Option<Money> {
        Some(Money::from_cents(c))
    }

    #[test]
    fn reads_subtotal_tax_and_total() {
        let s = ReceiptSummary::from_text("STORE\nSubtotal $45.00\nTax $3.60\nTotal $48.60");
        assert_eq!(s.subtotal, cents(4500));
        assert_eq!(s.tax, cents(360));
        assert_eq!(s.total, cents(4860));
    }

    #[test]
    fn subtotal_is_not_mistaken_for_total() {
        let s = ReceiptSummary::from_text("SUBTOTAL 12.00");
        assert_eq!(s.subtotal, cents(1200));
        assert_eq!(s.total, None);
    }

    #[test]
    fn label_variants() {
        let s = ReceiptSummary::from_text("SUB-TOTAL: 1,288.56\nSALES TAX 8% 12.00\nAMOUNT DUE 1,300.56");
        assert_eq!(s.subtotal, cents(128856));
        assert_eq!(s.tax, cents(1200));
        assert_eq!(s.total, cents(130056));

        let s = ReceiptSummary::from_text("GST 0.50\nGrand Total 10.50");
        assert_eq!(s.tax, cents(50));
        assert_eq!(s.total, cents(1050));
    }

    #[test]
    fn first_labelled_amount_wins() {
        let s = ReceiptSummary::from_text("TOTAL 10.00\nTOTAL 99.00");
        assert_eq!(s.total, cents(1000));
    }

    #[test]
    fn item_lines_and_unlabelled_totals_are_ignored() {
        let s = ReceiptSummary::from_text("MILK 3.50\nTOTAL SAVINGS\nTAXI FARE 12.00\nTOTAL");
        assert!(s.is_empty());
    }

    #[test]
    fn expected_sum_prefers_subtotal() {
        let s = ReceiptSummary { subtotal: cents(900), tax: cents(100), total: cents(1000) };
        assert_eq!(s.expected_item_sum(), cents(900));

        let s = ReceiptSummary { subtotal: None, tax: cents(100), total: cents(1000) };
        assert_eq!(s.expected_item_sum(), cents(900));

        let s = ReceiptSummary { subtotal: None, tax: None, total: cents(1000) };
        assert_eq!(s.expected_item_sum(), cents(1000));

        assert_eq!(ReceiptSummary::default().expected_item_sum(), None);
    }

    #[test]
    fn check_flags_missing_items() {
        let s = ReceiptSummary::from_text("SUBTOTAL 6.50\nTOTAL 6.50");
        let items = [ReceiptItem::new("MILK", 3.5)];
        let check = s.check(&items).unwrap();
        assert!(!check.balanced());
        assert_eq!(check.printed, Money::from_cents(650));
        assert_eq!(check.computed, Money::from_cents(350));
        assert_eq!(check.difference, Money::from_cents(300));

        let items = [ReceiptItem::new("MILK", 3.5), ReceiptItem::new("APPLES", 3.0)];
        assert!(s.check(&items).unwrap().balanced());
    }

    #[test]
    fn no_check_without_printed_amounts() {
        assert_eq!(ReceiptSummary::default().check(&[ReceiptItem::new("MILK", 3.5)]), None);
    }
}
