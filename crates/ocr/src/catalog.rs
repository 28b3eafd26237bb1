//! Ordered catalog of receipt line shapes.
//!
//! Templates overlap, so the catalog is tried top to bottom and the first
//! match wins: restrictive shapes come before permissive ones, and the
//! integer-price shape comes last of all.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Template names of the standard catalog.
pub mod names {
    pub const CURRENCY: &str = "currency_format";
    pub const QUANTITY: &str = "quantity_format";
    pub const TAB: &str = "tab_format";
    pub const EUROPEAN: &str = "european_format";
    pub const NEGATIVE: &str = "negative_format";
    pub const ITEM_CODE: &str = "item_code_format";
    pub const THERMAL: &str = "thermal_format";
    pub const PRICE_RANGE: &str = "price_range_format";
    pub const THOUSANDS: &str = "thousands_format";
    pub const BASIC: &str = "basic_format";
    pub const INTEGER: &str = "integer_format";
}

/// Decimal marker used by a template's captured price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecimalSeparator {
    #[default]
    Dot,
    Comma,
}

/// One recognizable line shape. The matcher always spans the whole line.
#[derive(Debug, Clone)]
pub struct Template {
    pub(crate) name: String,
    pub(crate) matcher: Regex,
    pub(crate) item_group: usize,
    pub(crate) price_group: usize,
    pub(crate) quantity_group: Option<usize>,
    pub(crate) code_group: Option<usize>,
    pub(crate) currency_multiplier: i8,
    pub(crate) decimal_separator: DecimalSeparator,
    pub(crate) strip_thousands_separator: bool,
}

impl Template {
    /// Build a template from an unanchored pattern; it is wrapped in `^(?:…)$`.
    ///
    /// # Panics
    ///
    /// On an invalid pattern or a group index the pattern does not define.
    /// Both are authoring errors in the catalog.
    pub fn new(name: impl Into<String>, pattern: &str, item_group: usize, price_group: usize) -> Self {
        let name = name.into();
        let matcher = Regex::new(&format!("^(?:{pattern})$"))
            .unwrap_or_else(|e| panic!("template {name}: invalid pattern: {e}"));
        check_group(&name, &matcher, "item_group", item_group);
        check_group(&name, &matcher, "price_group", price_group);
        Self {
            name,
            matcher,
            item_group,
            price_group,
            quantity_group: None,
            code_group: None,
            currency_multiplier: 1,
            decimal_separator: DecimalSeparator::Dot,
            strip_thousands_separator: false,
        }
    }

    pub fn with_quantity_group(mut self, group: usize) -> Self {
        check_group(&self.name, &self.matcher, "quantity_group", group);
        self.quantity_group = Some(group);
        self
    }

    pub fn with_code_group(mut self, group: usize) -> Self {
        check_group(&self.name, &self.matcher, "code_group", group);
        self.code_group = Some(group);
        self
    }

    /// Prices captured by this template are amounts off (refunds, discounts).
    pub fn negated(mut self) -> Self {
        self.currency_multiplier = -1;
        self
    }

    pub fn comma_decimal(mut self) -> Self {
        assert!(
            !self.strip_thousands_separator,
            "template {}: comma decimals and thousands stripping are exclusive",
            self.name
        );
        self.decimal_separator = DecimalSeparator::Comma;
        self
    }

    pub fn strip_thousands(mut self) -> Self {
        assert!(
            self.decimal_separator == DecimalSeparator::Dot,
            "template {}: comma decimals and thousands stripping are exclusive",
            self.name
        );
        self.strip_thousands_separator = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn currency_multiplier(&self) -> i8 {
        self.currency_multiplier
    }

    pub fn decimal_separator(&self) -> DecimalSeparator {
        self.decimal_separator
    }

    pub fn strips_thousands_separator(&self) -> bool {
        self.strip_thousands_separator
    }

    pub fn quantity_group(&self) -> Option<usize> {
        self.quantity_group
    }

    pub fn code_group(&self) -> Option<usize> {
        self.code_group
    }

    pub fn captures<'t>(&self, line: &'t str) -> Option<Captures<'t>> {
        self.matcher.captures(line)
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.matcher.is_match(line)
    }
}

fn check_group(name: &str, matcher: &Regex, field: &str, group: usize) {
    // captures_len counts the implicit whole-match group 0.
    assert!(
        group >= 1 && group < matcher.captures_len(),
        "template {name}: {field} {group} does not exist (pattern has {} groups)",
        matcher.captures_len() - 1
    );
}

/// Templates in priority order.
#[derive(Debug, Clone)]
pub struct Catalog {
    templates: Vec<Template>,
}

impl Catalog {
    /// # Panics
    ///
    /// If two templates share a name.
    pub fn new(templates: Vec<Template>) -> Self {
        let mut seen = HashSet::new();
        for template in &templates {
            assert!(seen.insert(template.name.as_str()), "duplicate template name: {}", template.name);
        }
        Self { templates }
    }

    /// The built-in receipt catalog, compiled on first use.
    pub fn standard() -> &'static Catalog {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(|| Catalog::new(standard_templates()))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Template> {
        self.templates.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.templates.iter().map(Template::name).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Template;
    type IntoIter = std::slice::Iter<'a, Template>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn standard_templates() -> Vec<Template> {
    vec![
        // MILK $3.50
        Template::new(names::CURRENCY, r"(.+?)\s+\$(\d+\.\d{1,2})", 1, 2),
        // 2 APPLES 3.00 (item may not start with '-', see item-code shape)
        Template::new(names::QUANTITY, r"(\d+)\s+([^\s\-].*?)\s+(\d+\.\d{1,2})", 2, 3)
            .with_quantity_group(1),
        // MILK<TAB>3.50
        Template::new(names::TAB, r"(.+?)\t+(\d+\.\d{1,2})", 1, 2),
        // BROT 2,50
        Template::new(names::EUROPEAN, r"(.+?)\s+(\d+,\d{1,2})", 1, 2).comma_decimal(),
        // REFUND (5.00)
        Template::new(names::NEGATIVE, r"(.+?)\s+\((\d+\.\d{1,2})\)", 1, 2).negated(),
        // 12345 - BREAD 2.99
        Template::new(names::ITEM_CODE, r"(\d+)\s*-\s*(.+?)\s+(\d+\.\d{1,2})", 2, 3)
            .with_code_group(1),
        // MILK      3.50 F
        Template::new(names::THERMAL, r"(.+?)\s{2,}(\d+\.\d{1,2})\s*[A-Z]?", 1, 2),
        // PLANT 4.99-6.99, first price kept
        Template::new(names::PRICE_RANGE, r"(.+?)\s+(\d+\.\d{1,2})-(\d+\.\d{1,2})", 1, 2),
        // TV 1,234.56
        Template::new(names::THOUSANDS, r"(.+?)\s+(\d{1,3}(?:,\d{3})+\.\d{1,2})", 1, 2)
            .strip_thousands(),
        // MILK 3.50
        Template::new(names::BASIC, r"(.+?)\s+(\d+\.\d{2})", 1, 2),
        // ONIONS 50
        Template::new(names::INTEGER, r"(.+?)\s+(\d+)", 1, 2),
    ]
}
