//! Bulk orders
//!
//! A multi-line order where each line earns a quantity discount. The tier of a
//! line always follows its cumulative quantity, so merging more units into an
//! existing line can lift it into a higher tier.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::{pricing::fraction_of, products::Product};

/// Errors raised by bulk order changes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BulkOrderError {
    /// Lines must be added with at least one unit.
    #[error("cannot add zero units of {0}")]
    ZeroQuantity(String),

    /// No line at this index (index, number of lines).
    #[error("no order line at index {0}; order has {1} lines")]
    LineOutOfRange(usize, usize),
}

/// Quantity discount tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiscountTier {
    /// Fewer than 5 units.
    #[default]
    None,

    /// 5 to 9 units.
    Five,

    /// 10 to 19 units.
    Ten,

    /// 20 units or more.
    Fifteen,
}

impl DiscountTier {
    /// Tier earned by a quantity.
    pub const fn for_quantity(quantity: u32) -> Self {
        match quantity {
            20.. => Self::Fifteen,
            10..=19 => Self::Ten,
            5..=9 => Self::Five,
            _ => Self::None,
        }
    }

    /// Discount in percent points.
    pub const fn percent(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Five => 5,
            Self::Ten => 10,
            Self::Fifteen => 15,
        }
    }

    /// The next tier up and the quantity that unlocks it.
    pub const fn next(self) -> Option<(Self, u32)> {
        match self {
            Self::None => Some((Self::Five, 5)),
            Self::Five => Some((Self::Ten, 10)),
            Self::Ten => Some((Self::Fifteen, 20)),
            Self::Fifteen => None,
        }
    }

    /// Discount applied to `amount`.
    pub fn discount_on(self, amount: Decimal) -> Decimal {
        amount * Decimal::from(self.percent()) / Decimal::ONE_HUNDRED
    }
}

impl fmt::Display for DiscountTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Bulk discount in percent points for a quantity: 0, 5, 10 or 15.
pub const fn bulk_discount(quantity: u32) -> u32 {
    DiscountTier::for_quantity(quantity).percent()
}

/// One tool in a bulk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkLine {
    tool: Product,
    quantity: u32,
    tier: DiscountTier,
}

impl BulkLine {
    fn new(tool: Product, quantity: u32) -> Self {
        Self {
            tool,
            quantity,
            tier: DiscountTier::for_quantity(quantity),
        }
    }

    fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.tier = DiscountTier::for_quantity(quantity);
    }

    /// The tool ordered.
    pub fn tool(&self) -> &Product {
        &self.tool
    }

    /// Units ordered.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Price of one unit.
    pub fn unit_price(&self) -> Decimal {
        self.tool.numeric_price
    }

    /// Discount tier for the current quantity.
    pub fn tier(&self) -> DiscountTier {
        self.tier
    }

    /// Discount in percent points.
    pub fn discount_percent(&self) -> u32 {
        self.tier.percent()
    }

    /// Unit price times quantity.
    pub fn subtotal(&self) -> Decimal {
        self.unit_price().saturating_mul(Decimal::from(self.quantity))
    }

    /// Discount on this line.
    pub fn discount(&self) -> Decimal {
        self.tier.discount_on(self.subtotal())
    }

    /// Line subtotal less discount.
    pub fn total(&self) -> Decimal {
        self.subtotal() - self.discount()
    }

    /// Extra units needed to reach the next tier, with that tier.
    pub fn units_to_next_tier(&self) -> Option<(u32, DiscountTier)> {
        self.tier
            .next()
            .map(|(tier, threshold)| (threshold.saturating_sub(self.quantity), tier))
    }
}

/// Order totals, recomputed whenever the lines change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkTotals {
    /// Sum of unit price times quantity.
    pub subtotal: Decimal,

    /// Sum of line discounts.
    pub total_discount: Decimal,

    /// Subtotal less discounts.
    pub total: Decimal,

    /// Units across all lines.
    pub units: u32,
}

impl BulkTotals {
    fn from_lines(lines: &[BulkLine]) -> Self {
        let subtotal = lines
            .iter()
            .map(BulkLine::subtotal)
            .fold(Decimal::ZERO, Decimal::saturating_add);
        let total_discount = lines
            .iter()
            .map(BulkLine::discount)
            .fold(Decimal::ZERO, Decimal::saturating_add);

        Self {
            subtotal,
            total_discount,
            total: subtotal - total_discount,
            units: lines
                .iter()
                .map(BulkLine::quantity)
                .fold(0, u32::saturating_add),
        }
    }

    /// Discount as a fraction of the subtotal.
    pub fn savings_percent(&self) -> decimal_percentage::Percentage {
        fraction_of(self.total_discount, self.subtotal)
    }
}

/// A bulk order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOrder {
    lines: Vec<BulkLine>,
    totals: BulkTotals,
}

impl BulkOrder {
    /// Creates an empty order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Order lines, in the order they were first added.
    pub fn lines(&self) -> &[BulkLine] {
        &self.lines
    }

    /// Current totals.
    pub fn totals(&self) -> BulkTotals {
        self.totals
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the order has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds `quantity` units of `tool`.
    ///
    /// If the same offer is already in the order its quantity is increased and
    /// its tier re-evaluated on the combined quantity.
    ///
    /// # Errors
    ///
    /// Returns [`BulkOrderError::ZeroQuantity`] when `quantity` is zero.
    pub fn add(&mut self, tool: Product, quantity: u32) -> Result<(), BulkOrderError> {
        if quantity == 0 {
            return Err(BulkOrderError::ZeroQuantity(tool.name));
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.tool.same_offer(&tool))
        {
            let merged = line.quantity.saturating_add(quantity);

            debug!(tool = %tool.name, quantity = merged, "merged bulk line");

            line.set_quantity(merged);
        } else {
            self.lines.push(BulkLine::new(tool, quantity));
        }

        self.recalculate();

        Ok(())
    }

    /// Sets the quantity of the line at `index`; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`BulkOrderError::LineOutOfRange`] if there is no such line.
    pub fn update_quantity(&mut self, index: usize, quantity: u32) -> Result<(), BulkOrderError> {
        let len = self.lines.len();

        if index >= len {
            return Err(BulkOrderError::LineOutOfRange(index, len));
        }

        if quantity == 0 {
            self.lines.remove(index);
        } else if let Some(line) = self.lines.get_mut(index) {
            line.set_quantity(quantity);
        }

        self.recalculate();

        Ok(())
    }

    /// Adds one unit to the line at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`BulkOrderError::LineOutOfRange`] if there is no such line.
    pub fn increment(&mut self, index: usize) -> Result<(), BulkOrderError> {
        let quantity = self.quantity_at(index)?;

        self.update_quantity(index, quantity.saturating_add(1))
    }

    /// Removes one unit from the line at `index`, removing the line at zero.
    ///
    /// # Errors
    ///
    /// Returns [`BulkOrderError::LineOutOfRange`] if there is no such line.
    pub fn decrement(&mut self, index: usize) -> Result<(), BulkOrderError> {
        let quantity = self.quantity_at(index)?;

        self.update_quantity(index, quantity.saturating_sub(1))
    }

    /// Removes the line at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`BulkOrderError::LineOutOfRange`] if there is no such line.
    pub fn remove(&mut self, index: usize) -> Result<BulkLine, BulkOrderError> {
        if index >= self.lines.len() {
            return Err(BulkOrderError::LineOutOfRange(index, self.lines.len()));
        }

        let line = self.lines.remove(index);

        self.recalculate();

        Ok(line)
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.recalculate();
    }

    fn quantity_at(&self, index: usize) -> Result<u32, BulkOrderError> {
        self.lines
            .get(index)
            .map(BulkLine::quantity)
            .ok_or(BulkOrderError::LineOutOfRange(index, self.lines.len()))
    }

    fn recalculate(&mut self) {
        self.totals = BulkTotals::from_lines(&self.lines);
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        pricing::percent_points,
        products::{RawRecord, StockStatus},
        suppliers::SupplierDirectory,
    };

    use super::*;

    fn tool(id: &str, price: &str) -> Product {
        Product::from_raw(
            RawRecord {
                id: id.to_string(),
                name: format!("Wago 221 connector {id}"),
                category: "Consumables".to_string(),
                price: price.to_string(),
                supplier: "CEF".to_string(),
                image: None,
                stock_status: StockStatus::InStock,
                product_url: None,
                highlights: Vec::new(),
            },
            &SupplierDirectory::default(),
        )
    }

    #[test]
    fn bulk_discount_steps() {
        let expected = [
            (0, 0),
            (1, 0),
            (4, 0),
            (5, 5),
            (9, 5),
            (10, 10),
            (19, 10),
            (20, 15),
            (500, 15),
        ];

        for (quantity, percent) in expected {
            assert_eq!(bulk_discount(quantity), percent, "quantity {quantity}");
        }
    }

    #[test]
    fn bulk_discount_is_monotonic_with_four_levels() {
        let mut levels = Vec::new();
        let mut previous = 0;

        for quantity in 0..100 {
            let percent = bulk_discount(quantity);

            assert!(percent >= previous, "discount dropped at {quantity}");

            if !levels.contains(&percent) {
                levels.push(percent);
            }

            previous = percent;
        }

        assert_eq!(levels, vec![0, 5, 10, 15]);
    }

    #[test]
    fn adding_to_existing_line_uses_cumulative_quantity() -> TestResult {
        let mut order = BulkOrder::new();

        order.add(tool("a", "£10.00"), 4)?;
        assert_eq!(order.lines().first().map(BulkLine::discount_percent), Some(0));

        order.add(tool("a", "£10.00"), 2)?;

        let line = order.lines().first().ok_or("expected a line")?;

        assert_eq!(order.len(), 1);
        assert_eq!(line.quantity(), 6);
        assert_eq!(line.discount_percent(), 5);

        Ok(())
    }

    #[test]
    fn add_zero_is_rejected() {
        let mut order = BulkOrder::new();

        assert!(matches!(
            order.add(tool("a", "£10.00"), 0),
            Err(BulkOrderError::ZeroQuantity(_))
        ));
        assert!(order.is_empty());
    }

    #[test]
    fn update_quantity_to_zero_removes_line() -> TestResult {
        let mut order = BulkOrder::new();

        order.add(tool("a", "£10.00"), 3)?;
        order.add(tool("b", "£2.50"), 12)?;
        order.update_quantity(0, 0)?;

        assert_eq!(order.len(), 1);
        assert_eq!(order.lines().first().map(|l| l.tool().id.as_str()), Some("b"));
        assert_eq!(order.totals().subtotal, Decimal::new(30, 0));

        Ok(())
    }

    #[test]
    fn update_quantity_recomputes_tier() -> TestResult {
        let mut order = BulkOrder::new();

        order.add(tool("a", "£10.00"), 3)?;
        order.update_quantity(0, 25)?;

        assert_eq!(order.lines().first().map(BulkLine::tier), Some(DiscountTier::Fifteen));

        order.update_quantity(0, 9)?;

        assert_eq!(order.lines().first().map(BulkLine::tier), Some(DiscountTier::Five));

        Ok(())
    }

    #[test]
    fn update_quantity_out_of_range() {
        let mut order = BulkOrder::new();

        assert_eq!(
            order.update_quantity(2, 1),
            Err(BulkOrderError::LineOutOfRange(2, 0))
        );
    }

    #[test]
    fn totals_follow_every_change() -> TestResult {
        let mut order = BulkOrder::new();

        order.add(tool("a", "£10.00"), 10)?;
        order.add(tool("b", "£4.00"), 5)?;
        order.add(tool("c", "£100.00"), 1)?;

        // 100 @10% + 20 @5% + 100 @0%
        let totals = order.totals();

        assert_eq!(totals.subtotal, Decimal::new(220, 0));
        assert_eq!(totals.total_discount, Decimal::new(11, 0));
        assert_eq!(totals.total, Decimal::new(209, 0));
        assert_eq!(totals.units, 16);
        assert_eq!(percent_points(totals.savings_percent()), Decimal::new(500, 2));

        order.decrement(1)?;

        assert_eq!(order.totals().total_discount, Decimal::new(10, 0));

        order.clear();

        assert_eq!(order.totals(), BulkTotals::default());

        Ok(())
    }

    #[test]
    fn increment_and_decrement_remove_at_zero() -> TestResult {
        let mut order = BulkOrder::new();

        order.add(tool("a", "£1.00"), 1)?;
        order.increment(0)?;

        assert_eq!(order.lines().first().map(BulkLine::quantity), Some(2));

        order.decrement(0)?;
        order.decrement(0)?;

        assert!(order.is_empty());
        assert_eq!(order.decrement(0), Err(BulkOrderError::LineOutOfRange(0, 0)));

        Ok(())
    }

    #[test]
    fn units_to_next_tier() -> TestResult {
        let mut order = BulkOrder::new();

        order.add(tool("a", "£1.00"), 7)?;
        order.add(tool("b", "£1.00"), 20)?;

        let hints: Vec<Option<(u32, DiscountTier)>> = order
            .lines()
            .iter()
            .map(BulkLine::units_to_next_tier)
            .collect();

        assert_eq!(hints, vec![Some((3, DiscountTier::Ten)), None]);

        Ok(())
    }

    #[test]
    fn remove_returns_line() -> TestResult {
        let mut order = BulkOrder::new();

        order.add(tool("a", "£3.00"), 2)?;

        let line = order.remove(0)?;

        assert_eq!(line.quantity(), 2);
        assert!(order.is_empty());
        assert!(order.remove(0).is_err());

        Ok(())
    }

    #[test]
    fn totals_saturate_units_across_lines() -> TestResult {
        let mut order = BulkOrder::new();

        order.add(tool("a", "£10,000,000"), 3_000_000_000)?;
        order.add(tool("b", "£10,000,000"), 3_000_000_000)?;

        let totals = order.totals();

        assert_eq!(totals.units, u32::MAX);
        assert_eq!(totals.subtotal, Decimal::new(60_000_000_000_000_000, 0));
        assert_eq!(totals.total, totals.subtotal - totals.total_discount);

        Ok(())
    }
}
