//! Products
//!
//! Raw supplier records as returned by the search function, and the derived
//! product records the comparison is built from.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    extract::{extract_brand, extract_price, extract_tool_type, extract_voltage},
    suppliers::SupplierDirectory,
};

/// Stock availability reported by a supplier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StockStatus {
    /// Available to order.
    #[default]
    InStock,

    /// Not currently available.
    OutOfStock,

    /// Available, but few units left.
    LowStock,
}

impl StockStatus {
    /// Parses a supplier stock label such as `"In Stock"`, `"out_of_stock"` or `"lowStock"`.
    ///
    /// Unrecognised labels are treated as in stock.
    pub fn parse(label: &str) -> Self {
        let key: String = label
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();

        match key.as_str() {
            "outofstock" | "unavailable" | "soldout" => Self::OutOfStock,
            "lowstock" | "limitedstock" | "fewleft" => Self::LowStock,
            _ => Self::InStock,
        }
    }

    /// Display label, e.g. `"In Stock"`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::OutOfStock => "Out of Stock",
            Self::LowStock => "Low Stock",
        }
    }

    /// Whether the item can be ordered now.
    pub const fn is_available(self) -> bool {
        !matches!(self, Self::OutOfStock)
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for StockStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for StockStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;

        Ok(label.as_deref().map(Self::parse).unwrap_or_default())
    }
}

/// A product record exactly as returned by the search function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// Supplier product identifier.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,

    /// Product title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Product category.
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,

    /// Display price, e.g. `"£24.99"`.
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: String,

    /// Supplier name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub supplier: String,

    /// Product image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Stock availability.
    #[serde(default)]
    pub stock_status: StockStatus,

    /// Supplier product page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,

    /// Short selling points.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub highlights: Vec<String>,
}

/// A supplier offer with derived price and attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Supplier product identifier.
    pub id: String,

    /// Product title.
    pub name: String,

    /// Product category.
    pub category: String,

    /// Display price as supplied.
    pub price: String,

    /// Supplier name.
    pub supplier: String,

    /// Stock availability.
    pub stock_status: StockStatus,

    /// Price parsed from [`Product::price`]; zero when unparseable.
    #[serde(with = "rust_decimal::serde::float")]
    pub numeric_price: Decimal,

    /// Supplier rating out of five.
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,

    /// Supplier delivery estimate.
    pub delivery: String,

    /// Brand found in the name, or empty.
    pub brand: String,

    /// Voltage found in the name, e.g. `"18V"`, or empty.
    pub voltage: String,

    /// Tool type found in the name, or empty.
    pub tool_type: String,

    /// Product image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Supplier product page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,

    /// Short selling points.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<String>,
}

impl Product {
    /// Derives a product from a raw record, enriching it from the supplier directory.
    pub fn from_raw(raw: RawRecord, suppliers: &SupplierDirectory) -> Self {
        let profile = suppliers.lookup(&raw.supplier);

        Self {
            numeric_price: extract_price(&raw.price),
            rating: profile.rating,
            delivery: profile.delivery.clone(),
            brand: extract_brand(&raw.name),
            voltage: extract_voltage(&raw.name),
            tool_type: extract_tool_type(&raw.name),
            id: raw.id,
            name: raw.name,
            category: raw.category,
            price: raw.price,
            supplier: raw.supplier,
            stock_status: raw.stock_status,
            image: raw.image,
            product_url: raw.product_url,
            highlights: raw.highlights,
        }
    }

    /// Whether the product has a usable (positive) price.
    pub fn has_valid_price(&self) -> bool {
        self.numeric_price > Decimal::ZERO
    }

    /// Whether this and `other` are the same offer from the same supplier.
    pub fn same_offer(&self, other: &Self) -> bool {
        self.id == other.id && self.supplier == other.supplier && self.name == other.name
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

/// Null and missing ids or prices read as empty, which leaves the price invalid.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::String(value)) => value,
        Some(StringOrNumber::Number(value)) => value.to_string(),
        None => String::new(),
    })
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
