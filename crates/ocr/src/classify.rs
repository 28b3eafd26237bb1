use regex::Captures;
use tracing::trace;

use tillscan_core::ParsedLine;

use crate::catalog::{Catalog, Template};
use crate::normalize::normalize_price;
use crate::skip::SkipFilter;

/// Turns one OCR line into a [`ParsedLine`], or rejects it.
///
/// Stateless: the same line always classifies the same way.
#[derive(Debug, Clone, Copy)]
pub struct LineClassifier<'a> {
    catalog: &'a Catalog,
    skip: &'a SkipFilter,
}

impl Default for LineClassifier<'static> {
    fn default() -> Self {
        Self::new(Catalog::standard(), SkipFilter::standard())
    }
}

impl<'a> LineClassifier<'a> {
    pub fn new(catalog: &'a Catalog, skip: &'a SkipFilter) -> Self {
        Self { catalog, skip }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn skip_filter(&self) -> &'a SkipFilter {
        self.skip
    }

    pub fn classify(&self, line: &str) -> Option<ParsedLine> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if let Some(label) = self.skip.matching_label(line) {
            trace!(line, label, "noise line");
            return None;
        }

        let parsed = self.catalog.iter().find_map(|template| apply(template, line));
        match &parsed {
            Some(p) => trace!(line, template = %p.template_used, "classified"),
            None => trace!(line, "no template matched"),
        }
        parsed
    }
}

/// Classify with the standard catalog and skip rules.
pub fn classify_line(line: &str) -> Option<ParsedLine> {
    LineClassifier::default().classify(line)
}

/// A missing group or an unparseable quantity makes the template a non-match.
fn apply(template: &Template, line: &str) -> Option<ParsedLine> {
    let caps = template.captures(line)?;

    let name = group(&caps, template.item_group)?.trim();
    if name.is_empty() {
        return None;
    }
    let price = normalize_price(group(&caps, template.price_group)?, template);

    let quantity = match template.quantity_group {
        Some(g) => Some(group(&caps, g)?.parse::<u64>().ok()?),
        None => None,
    };
    let code = match template.code_group {
        Some(g) => Some(group(&caps, g)?.to_string()),
        None => None,
    };

    Some(ParsedLine {
        name: name.to_string(),
        price,
        template_used: template.name().to_string(),
        raw_line: line.to_string(),
        quantity,
        code,
    })
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> Option<&'t str> {
    caps.get(index).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::names;

    fn classify(line: &str) -> Option<ParsedLine> {
        classify_line(line)
    }

    fn template_of(line: &str) -> String {
        classify(line)
            .unwrap_or_else(|| panic!("no match for {line:?}"))
            .template_used
    }

    // ── Noise ────────────────────────────────────────────────────────────────

    #[test]
    fn noise_lines_rejected_despite_prices() {
        assert_eq!(classify("TOTAL 45.00"), None);
        assert_eq!(classify("Subtotal 40.00"), None);
        assert_eq!(classify("TAX 5.00"), None);
        assert_eq!(classify("CASH $50.00"), None);
        assert_eq!(classify("---------"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("    "), None);
    }

    // ── Shapes ───────────────────────────────────────────────────────────────

    #[test]
    fn plain_decimal_line() {
        let p = classify("MILK 3.50").unwrap();
        assert_eq!(p.name, "MILK");
        assert_eq!(p.price, 3.5);
        assert_eq!(p.template_used, names::BASIC);
        assert_eq!(p.raw_line, "MILK 3.50");
        assert_eq!(p.quantity, None);
        assert_eq!(p.code, None);
    }

    #[test]
    fn multi_word_names_kept_whole() {
        let p = classify("ORGANIC WHOLE MILK 1GAL 5.49").unwrap();
        assert_eq!(p.name, "ORGANIC WHOLE MILK 1GAL");
        assert_eq!(p.price, 5.49);
    }

    #[test]
    fn currency_prefixed() {
        let p = classify("COFFEE $4.75").unwrap();
        assert_eq!(p.name, "COFFEE");
        assert_eq!(p.price, 4.75);
        assert_eq!(p.template_used, names::CURRENCY);
    }

    #[test]
    fn quantity_prefixed() {
        let p = classify("2 APPLES 3.00").unwrap();
        assert_eq!(p.name, "APPLES");
        assert_eq!(p.price, 3.0);
        assert_eq!(p.quantity, Some(2));
        assert_eq!(p.template_used, names::QUANTITY);
    }

    #[test]
    fn tab_separated() {
        let p = classify("BANANAS\t\t1.29").unwrap();
        assert_eq!(p.name, "BANANAS");
        assert_eq!(p.price, 1.29);
        assert_eq!(p.template_used, names::TAB);
    }

    #[test]
    fn european_comma_decimal() {
        let p = classify("BROT 2,50").unwrap();
        assert_eq!(p.name, "BROT");
        assert_eq!(p.price, 2.5);
        assert_eq!(p.template_used, names::EUROPEAN);
    }

    #[test]
    fn parenthesized_amount_is_negative() {
        let p = classify("REFUND (5.00)").unwrap();
        assert_eq!(p.name, "REFUND");
        assert_eq!(p.price, -5.0);
        assert_eq!(p.template_used, names::NEGATIVE);
    }

    #[test]
    fn item_code_prefixed() {
        let p = classify("40221 - WHEAT BREAD 2.99").unwrap();
        assert_eq!(p.name, "WHEAT BREAD");
        assert_eq!(p.price, 2.99);
        assert_eq!(p.code.as_deref(), Some("40221"));
        assert_eq!(p.quantity, None);
        assert_eq!(p.template_used, names::ITEM_CODE);

        let p = classify("40221-WHEAT BREAD 2.99").unwrap();
        assert_eq!(p.code.as_deref(), Some("40221"));
    }

    #[test]
    fn thermal_with_tax_flag() {
        let p = classify("EGGS LARGE     4.19 F").unwrap();
        assert_eq!(p.name, "EGGS LARGE");
        assert_eq!(p.price, 4.19);
        assert_eq!(p.template_used, names::THERMAL);

        assert_eq!(template_of("EGGS LARGE     4.19"), names::THERMAL);
    }

    #[test]
    fn price_range_keeps_first_price() {
        let p = classify("TOMATO PLANT 4.99-6.99").unwrap();
        assert_eq!(p.name, "TOMATO PLANT");
        assert_eq!(p.price, 4.99);
        assert_eq!(p.template_used, names::PRICE_RANGE);
    }

    #[test]
    fn thousands_grouped() {
        let p = classify("TV 1,234.56").unwrap();
        assert_eq!(p.name, "TV");
        assert_eq!(p.price, 1234.56);
        assert_eq!(p.template_used, names::THOUSANDS);
    }

    #[test]
    fn integer_fallback() {
        let p = classify("ONIONS 50").unwrap();
        assert_eq!(p.name, "ONIONS");
        assert_eq!(p.price, 50.0);
        assert_eq!(p.template_used, names::INTEGER);
    }

    // ── Priority ─────────────────────────────────────────────────────────────

    #[test]
    fn decimal_price_never_reaches_integer_fallback() {
        assert_eq!(template_of("ONIONS 50.00"), names::BASIC);
        assert_eq!(classify("ONIONS 50.00").unwrap().price, 50.0);
    }

    #[test]
    fn quantity_beats_generic_shapes() {
        for line in ["2 APPLES 3.00", "12 EGGS 4.50"] {
            assert_eq!(template_of(line), names::QUANTITY, "{line}");
        }
    }

    #[test]
    fn ungrouped_decimal_is_not_thousands() {
        assert_eq!(template_of("MILK 3.50"), names::BASIC);
        assert_eq!(template_of("LAPTOP 1234.56"), names::BASIC);
    }

    #[test]
    fn one_decimal_digit_only_matches_lenient_shapes() {
        // The plain shape requires two decimals; thermal spacing still accepts one.
        assert_eq!(classify("MILK 3.5"), None);
        assert_eq!(template_of("MILK  3.5"), names::THERMAL);
    }

    #[test]
    fn unmatched_lines_rejected() {
        assert_eq!(classify("WELCOME TO OUR SHOP"), None);
        assert_eq!(classify("3.50"), None);
        assert_eq!(classify("MILK -3.50"), None);
    }

    // ── Fallthrough ──────────────────────────────────────────────────────────

    #[test]
    fn long_quantity_still_counts_as_quantity() {
        let p = classify("99999999999 APPLES 3.00").unwrap();
        assert_eq!(p.template_used, names::QUANTITY);
        assert_eq!(p.quantity, Some(99_999_999_999));
        assert_eq!(p.name, "APPLES");
    }

    #[test]
    fn unparseable_quantity_falls_through_to_next_template() {
        // Quantity overflows u64, so the quantity template steps aside and a
        // later shape takes the line.
        let p = classify("99999999999999999999 APPLES 3.00").unwrap();
        assert_eq!(p.template_used, names::BASIC);
        assert_eq!(p.name, "99999999999999999999 APPLES");
        assert_eq!(p.quantity, None);
    }

    #[test]
    fn non_ascii_digit_quantity_falls_through() {
        // `\d` matches Arabic-Indic digits but integer parsing does not.
        let p = classify("\u{0662} APPLES 3.00").unwrap();
        assert_eq!(p.template_used, names::BASIC);
        assert_eq!(p.name, "\u{0662} APPLES");
        assert_eq!(p.quantity, None);
    }

    #[test]
    fn optional_group_not_participating_is_a_non_match() {
        let catalog = Catalog::new(vec![
            Template::new("maybe_code", r"(?:#(\d+)\s+)?(.+?)\s+(\d+\.\d{2})", 2, 3).with_code_group(1),
            Template::new("plain", r"(.+?)\s+(\d+\.\d{2})", 1, 2),
        ]);
        let skip = SkipFilter::empty();
        let classifier = LineClassifier::new(&catalog, &skip);

        let with_code = classifier.classify("#77 SOAP 1.99").unwrap();
        assert_eq!(with_code.template_used, "maybe_code");
        assert_eq!(with_code.code.as_deref(), Some("77"));

        let without_code = classifier.classify("SOAP 1.99").unwrap();
        assert_eq!(without_code.template_used, "plain");
    }

    #[test]
    fn custom_skip_filter_is_honored() {
        let skip = SkipFilter::empty();
        let classifier = LineClassifier::new(Catalog::standard(), &skip);
        let p = classifier.classify("TOTAL 45.00").unwrap();
        assert_eq!(p.name, "TOTAL");
    }

    // ── Properties ───────────────────────────────────────────────────────────

    #[test]
    fn surrounding_whitespace_trimmed() {
        let p = classify("   MILK 3.50  \r").unwrap();
        assert_eq!(p.name, "MILK");
        assert_eq!(p.raw_line, "MILK 3.50");
    }

    #[test]
    fn classification_is_idempotent() {
        for line in ["MILK 3.50", "2 APPLES 3.00", "REFUND (5.00)", "TOTAL 1.00", "junk"] {
            assert_eq!(classify(line), classify(line));
        }
    }
}
