use std::sync::OnceLock;

use regex::Regex;

/// Administrative receipt lines, tested in order against the lowercased,
/// trimmed line. Patterns are searched, not full-line matched.
const STANDARD_RULES: &[(&str, &str)] = &[
    ("subtotal", r"^subtotal"),
    ("total", r"^total"),
    ("tax", r"^tax"),
    ("change", r"^change"),
    ("cash", r"^cash"),
    ("card", r"^card"),
    ("credit", r"^credit"),
    ("debit", r"^debit"),
    ("thank_you", r"^thank\s+you"),
    ("receipt", r"^receipt"),
    ("store", r"^store"),
    ("date", r"^date"),
    ("time", r"^time"),
    ("cashier", r"^cashier"),
    ("transaction", r"^transaction"),
    // Reference-number lines, but not "REFUND (5.00)", which is an item.
    ("ref", r"^ref(?:\b|erence|no|\d)"),
    ("auth", r"^auth"),
    ("blank", r"^\s*$"),
    ("separator", r"^(?:-+|=+|\*+)$"),
];

#[derive(Debug, Clone)]
struct NoiseRule {
    label: String,
    pattern: Regex,
}

/// Decides whether a line is receipt noise (totals, payment, headers,
/// separators) rather than a purchasable item.
#[derive(Debug, Clone, Default)]
pub struct SkipFilter {
    rules: Vec<NoiseRule>,
}

impl SkipFilter {
    /// The built-in noise categories, compiled once.
    pub fn standard() -> &'static SkipFilter {
        static FILTER: OnceLock<SkipFilter> = OnceLock::new();
        FILTER.get_or_init(|| SkipFilter {
            rules: STANDARD_RULES
                .iter()
                .map(|(label, pattern)| NoiseRule {
                    label: (*label).to_string(),
                    pattern: Regex::new(pattern).expect("invalid noise pattern"),
                })
                .collect(),
        })
    }

    /// A filter with no rules; nothing is skipped.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a noise category. Rules are tried in insertion order.
    pub fn with_rule(mut self, label: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        self.rules.push(NoiseRule { label: label.into(), pattern: Regex::new(pattern)? });
        Ok(self)
    }

    /// The label of the first rule that flags `line`, if any.
    pub fn matching_label(&self, line: &str) -> Option<&str> {
        let normalized = line.trim().to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(&normalized))
            .map(|rule| rule.label.as_str())
    }

    pub fn should_skip(&self, line: &str) -> bool {
        self.matching_label(line).is_some()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skip(line: &str) -> bool {
        SkipFilter::standard().should_skip(line)
    }

    #[test]
    fn skips_totals_and_payment_lines() {
        for line in [
            "SUBTOTAL 12.00",
            "TOTAL 45.00",
            "Tax 3.60",
            "CHANGE DUE 0.50",
            "CASH 50.00",
            "Card ****1234",
            "CREDIT 45.00",
            "DEBIT",
            "Thank  you for shopping!",
            "Receipt #00123",
            "Store 042",
            "Date: 2024-01-15",
            "Time 14:32",
            "CASHIER: ANNA",
            "Transaction 998877",
            "REF: 55501",
            "Reference: 123456",
            "REFERENCE NO 00123",
            "REFNO 4455",
            "REF123 45.00",
            "AUTH CODE 123456",
        ] {
            assert!(skip(line), "expected noise: {line:?}");
        }
    }

    #[test]
    fn case_and_surrounding_whitespace_ignored() {
        assert!(skip("   total   "));
        assert!(skip("ToTaL"));
    }

    #[test]
    fn skips_blank_and_separator_lines() {
        assert!(skip(""));
        assert!(skip("   \t "));
        assert!(skip("----------"));
        assert!(skip("=========="));
        assert!(skip("**********"));
    }

    #[test]
    fn mixed_separator_is_not_noise() {
        assert!(!skip("-=-=-=-="));
    }

    #[test]
    fn item_lines_pass() {
        assert!(!skip("MILK 3.50"));
        assert!(!skip("2 APPLES 3.00"));
        assert!(!skip("REFUND (5.00)"));
        assert!(!skip("REFRIED BEANS 1.29"));
        // Only a prefix counts.
        assert!(!skip("GRAND TOTAL 45.00"));
    }

    #[test]
    fn reports_matching_label() {
        let filter = SkipFilter::standard();
        assert_eq!(filter.matching_label("Subtotal 9.00"), Some("subtotal"));
        assert_eq!(filter.matching_label("TOTAL 9.00"), Some("total"));
        assert_eq!(filter.matching_label("====="), Some("separator"));
        assert_eq!(filter.matching_label("MILK 3.50"), None);
    }

    #[test]
    fn custom_rule_extends_standard_set() {
        let filter = SkipFilter::standard()
            .clone()
            .with_rule("loyalty", r"^member\s+savings")
            .unwrap();
        assert!(filter.should_skip("MEMBER SAVINGS 2.00"));
        assert!(filter.should_skip("TOTAL 2.00"));
        assert_eq!(filter.labels().last(), Some("loyalty"));
    }

    #[test]
    fn invalid_custom_rule_is_an_error() {
        assert!(SkipFilter::empty().with_rule("broken", r"(unclosed").is_err());
    }

    #[test]
    fn empty_filter_skips_nothing() {
        assert!(!SkipFilter::empty().should_skip("TOTAL 45.00"));
    }
}
