//! Extraction
//!
//! Total functions that recover structured values from supplier-provided text.
//! None of them fail: unparseable input yields zero or an empty string, which
//! callers treat as "unknown" or "invalid".

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

/// Brands recognised in product names, in precedence order.
pub const BRANDS: &[&str] = &[
    "DeWalt",
    "Makita",
    "Milwaukee",
    "Bosch",
    "Hikoki",
    "Ryobi",
    "Festool",
    "Metabo",
    "Einhell",
    "Hilti",
    "Stanley",
    "Knipex",
    "Wera",
    "Wiha",
    "Fluke",
    "Megger",
    "Kewtech",
    "Martindale",
    "Klein",
    "Draper",
];

/// Keyword to tool-type label map, in precedence order.
///
/// More specific keywords come before the keywords they contain.
pub const TOOL_TYPES: &[(&str, &str)] = &[
    ("impact driver", "Impact Driver"),
    ("screwdriver", "Screwdriver"),
    ("combi drill", "Combi Drill"),
    ("hammer drill", "Hammer Drill"),
    ("sds", "SDS Drill"),
    ("drill", "Drill"),
    ("driver", "Driver"),
    ("multimeter", "Multimeter"),
    ("clamp meter", "Clamp Meter"),
    ("insulation tester", "Insulation Tester"),
    ("voltage tester", "Voltage Tester"),
    ("tester", "Tester"),
    ("circular saw", "Circular Saw"),
    ("jigsaw", "Jigsaw"),
    ("saw", "Saw"),
    ("grinder", "Grinder"),
    ("crimper", "Crimper"),
    ("stripper", "Wire Stripper"),
    ("pliers", "Pliers"),
    ("battery", "Battery"),
    ("charger", "Charger"),
];

/// Highest price accepted from a supplier. Larger amounts are treated as unparseable.
pub const MAX_PRICE: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?").expect("Invalid price regex"));

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static VOLTAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*v(?:olts?)?\b").expect("Invalid voltage regex")
});

/// Parses a display price such as `"£1,249.99"` into a number.
///
/// Currency symbols, thousands separators and whitespace are ignored and the
/// leading decimal number is taken, so trailing text like `"inc VAT"` is
/// tolerated. Anything else, including negative amounts and amounts above
/// [`MAX_PRICE`], yields zero.
pub fn extract_price(price: &str) -> Decimal {
    let cleaned: String = price
        .chars()
        .filter(|ch| !matches!(ch, '£' | '$' | '€' | ',') && !ch.is_whitespace())
        .collect();

    PRICE_RE
        .find(&cleaned)
        .and_then(|digits| digits.as_str().parse::<Decimal>().ok())
        .filter(|amount| *amount <= MAX_PRICE)
        .unwrap_or(Decimal::ZERO)
}

/// Returns the voltage named in a product title, e.g. `"18V"`, or an empty string.
pub fn extract_voltage(name: &str) -> String {
    VOLTAGE_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|volts| format!("{}V", volts.as_str()))
        .unwrap_or_default()
}

/// Returns the first brand in [`BRANDS`] named in a product title, or an empty string.
pub fn extract_brand(name: &str) -> String {
    let name = name.to_lowercase();

    BRANDS
        .iter()
        .find(|brand| name.contains(&brand.to_lowercase()))
        .map(|brand| (*brand).to_string())
        .unwrap_or_default()
}

/// Returns the label of the first keyword in [`TOOL_TYPES`] found in a product title,
/// or an empty string.
pub fn extract_tool_type(name: &str) -> String {
    let name = name.to_lowercase();

    TOOL_TYPES
        .iter()
        .find(|(keyword, _)| name.contains(keyword))
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_default()
}
