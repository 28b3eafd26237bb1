use std::borrow::Cow;

use tracing::debug;

use crate::catalog::{DecimalSeparator, Template};

/// Convert a captured price to a signed amount using `template`'s hints.
///
/// An unparseable price yields `0.0`: one garbled amount must not cost the
/// rest of the receipt.
pub fn normalize_price(raw: &str, template: &Template) -> f64 {
    let mut price = Cow::Borrowed(raw.trim());
    if template.decimal_separator == DecimalSeparator::Comma {
        price = Cow::Owned(price.replace(',', "."));
    }
    if template.strip_thousands_separator {
        price = Cow::Owned(price.replace(',', ""));
    }

    match price.parse::<f64>() {
        Ok(value) if value.is_finite() => value * f64::from(template.currency_multiplier),
        _ => {
            debug!(raw, template = template.name(), "unparseable price, using 0.0");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{names, Catalog};

    fn standard(name: &str) -> &'static Template {
        Catalog::standard().get(name).unwrap()
    }

    #[test]
    fn plain_decimal() {
        assert_eq!(normalize_price("3.50", standard(names::BASIC)), 3.5);
    }

    #[test]
    fn comma_decimal_becomes_dot() {
        assert_eq!(normalize_price("2,50", standard(names::EUROPEAN)), 2.5);
    }

    #[test]
    fn thousands_separators_removed() {
        assert_eq!(normalize_price("1,234.56", standard(names::THOUSANDS)), 1234.56);
        assert_eq!(normalize_price("12,345,678.90", standard(names::THOUSANDS)), 12345678.9);
    }

    #[test]
    fn negated_template_flips_sign() {
        assert_eq!(normalize_price("5.00", standard(names::NEGATIVE)), -5.0);
    }

    #[test]
    fn integer_price() {
        assert_eq!(normalize_price("50", standard(names::INTEGER)), 50.0);
    }

    #[test]
    fn malformed_price_degrades_to_zero() {
        let basic = standard(names::BASIC);
        assert_eq!(normalize_price("3.5.0", basic), 0.0);
        assert_eq!(normalize_price("", basic), 0.0);
        assert_eq!(normalize_price("abc", basic), 0.0);
        // Comma left in place by a template that does not expect one.
        assert_eq!(normalize_price("1,234.56", basic), 0.0);
    }

    #[test]
    fn non_finite_is_treated_as_malformed() {
        let custom = Template::new("words", r"(.+?)\s+(\S+)", 1, 2);
        assert_eq!(normalize_price("inf", &custom), 0.0);
        assert_eq!(normalize_price("NaN", &custom), 0.0);
    }
}
