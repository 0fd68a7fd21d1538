//! Comparison
//!
//! Aggregates one search's raw supplier records into a price-ordered
//! comparison with summary statistics.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::debug;

use crate::{
    insights::AiInsights,
    pricing::{format_price, fraction_of},
    products::{Product, RawRecord},
    suppliers::SupplierDirectory,
};

/// Errors raised while aggregating search results.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// No record had a positive price (search term).
    #[error("no tools with a valid price found for \"{0}\"")]
    NoResults(String),
}

/// The aggregate result of one search: tools ordered by ascending price plus statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceComparison {
    search_term: String,
    tools: Vec<Product>,
    cheapest_price: Decimal,
    average_price: Decimal,
    highest_price: Decimal,
    insights: Option<AiInsights>,
}

impl PriceComparison {
    /// Search term the comparison was built for.
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Tools ordered by ascending price. Never empty.
    pub fn tools(&self) -> &[Product] {
        &self.tools
    }

    /// Number of tools compared.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Always false; an empty aggregate is reported as [`AggregateError::NoResults`].
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The cheapest offer.
    pub fn cheapest(&self) -> Option<&Product> {
        self.tools.first()
    }

    /// Lowest price.
    pub fn cheapest_price(&self) -> Decimal {
        self.cheapest_price
    }

    /// Arithmetic mean of all prices.
    pub fn average_price(&self) -> Decimal {
        self.average_price
    }

    /// Highest price.
    pub fn highest_price(&self) -> Decimal {
        self.highest_price
    }

    /// Formatted range, e.g. `"£18.50 - £24.99"`.
    pub fn price_range(&self) -> String {
        format!(
            "{} - {}",
            format_price(self.cheapest_price),
            format_price(self.highest_price)
        )
    }

    /// How much `tool` saves against the most expensive offer.
    pub fn savings_for(&self, tool: &Product) -> Decimal {
        (self.highest_price - tool.numeric_price).max(Decimal::ZERO)
    }

    /// Difference between the most and least expensive offers.
    pub fn potential_savings(&self) -> Decimal {
        self.highest_price - self.cheapest_price
    }

    /// Potential savings as a fraction of the highest price.
    pub fn savings_percent(&self) -> Percentage {
        fraction_of(self.potential_savings(), self.highest_price)
    }

    /// The cheapest offer from each supplier, in price order.
    pub fn best_by_supplier(&self) -> Vec<&Product> {
        let mut seen = FxHashSet::default();

        self.tools
            .iter()
            .filter(|tool| seen.insert(tool.supplier.to_lowercase()))
            .collect()
    }

    /// Number of distinct suppliers.
    pub fn supplier_count(&self) -> usize {
        self.best_by_supplier().len()
    }

    /// Tools matching `filter`, in price order.
    pub fn filter(&self, filter: &ComparisonFilter) -> Vec<&Product> {
        self.tools.iter().filter(|tool| filter.matches(tool)).collect()
    }

    /// AI insights merged into this comparison, if they have arrived.
    pub fn insights(&self) -> Option<&AiInsights> {
        self.insights.as_ref()
    }

    pub(crate) fn set_insights(&mut self, insights: AiInsights) {
        self.insights = Some(insights);
    }
}

/// Builds a comparison from raw search records.
///
/// Records whose price does not parse to a positive amount are excluded. The
/// remaining tools are stably sorted by price, so equal prices keep their
/// input order.
///
/// # Errors
///
/// Returns [`AggregateError::NoResults`] if no record has a positive price.
pub fn aggregate(
    search_term: &str,
    records: Vec<RawRecord>,
    suppliers: &SupplierDirectory,
) -> Result<PriceComparison, AggregateError> {
    let received = records.len();

    let mut tools: Vec<Product> = records
        .into_iter()
        .map(|record| Product::from_raw(record, suppliers))
        .filter(Product::has_valid_price)
        .collect();

    debug!(
        search_term,
        received,
        priced = tools.len(),
        "aggregating search results"
    );

    tools.sort_by_key(|tool| tool.numeric_price);

    let (Some(first), Some(last)) = (tools.first(), tools.last()) else {
        return Err(AggregateError::NoResults(search_term.to_string()));
    };

    let cheapest_price = first.numeric_price;
    let highest_price = last.numeric_price;
    let total: Decimal = tools.iter().map(|tool| tool.numeric_price).sum();
    let average_price = total / Decimal::from(tools.len());

    Ok(PriceComparison {
        search_term: search_term.to_string(),
        tools,
        cheapest_price,
        average_price,
        highest_price,
        insights: None,
    })
}

/// Client-side refinement of a comparison. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonFilter {
    /// Case-insensitive text matched against name, category and brand.
    pub text: Option<String>,

    /// Exact brand, ignoring case.
    pub brand: Option<String>,

    /// Exact voltage, ignoring case, e.g. `"18V"`.
    pub voltage: Option<String>,

    /// Exact supplier, ignoring case.
    pub supplier: Option<String>,

    /// Exclude out-of-stock offers.
    pub in_stock_only: bool,
}

impl ComparisonFilter {
    /// Whether `tool` satisfies every criterion.
    pub fn matches(&self, tool: &Product) -> bool {
        let text_matches = self.text.as_deref().is_none_or(|text| {
            let text = text.trim().to_lowercase();

            [&tool.name, &tool.category, &tool.brand]
                .iter()
                .any(|field| field.to_lowercase().contains(&text))
        });

        text_matches
            && matches_exact(self.brand.as_deref(), &tool.brand)
            && matches_exact(self.voltage.as_deref(), &tool.voltage)
            && matches_exact(self.supplier.as_deref(), &tool.supplier)
            && (!self.in_stock_only || tool.stock_status.is_available())
    }
}

fn matches_exact(wanted: Option<&str>, actual: &str) -> bool {
    wanted.is_none_or(|wanted| wanted.trim().eq_ignore_ascii_case(actual))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{pricing::percent_points, products::StockStatus};

    use super::*;

    fn record(id: &str, name: &str, price: &str, supplier: &str) -> RawRecord {
        RawRecord {
            id: id.to_string(),
            name: name.to_string(),
            category: "Power Tools".to_string(),
            price: price.to_string(),
            supplier: supplier.to_string(),
            image: None,
            stock_status: StockStatus::InStock,
            product_url: None,
            highlights: Vec::new(),
        }
    }

    fn drill_results() -> Vec<RawRecord> {
        vec![
            record("1", "DeWalt 18V Combi Drill", "£24.99", "Screwfix"),
            record("2", "DeWalt 18V Combi Drill", "£0.00", "Toolstation"),
            record("3", "DeWalt 18V Combi Drill", "£18.50", "CEF"),
        ]
    }

    #[test]
    fn aggregate_excludes_zero_prices_and_sorts() -> TestResult {
        let comparison = aggregate("combi drill", drill_results(), &SupplierDirectory::default())?;

        let prices: Vec<Decimal> = comparison
            .tools()
            .iter()
            .map(|tool| tool.numeric_price)
            .collect();

        assert_eq!(prices, vec![Decimal::new(1850, 2), Decimal::new(2499, 2)]);
        assert_eq!(comparison.cheapest_price(), Decimal::new(1850, 2));
        assert_eq!(comparison.average_price(), Decimal::new(21_745, 3));
        assert_eq!(comparison.price_range(), "£18.50 - £24.99");

        Ok(())
    }

    #[test]
    fn aggregate_with_no_valid_prices_is_no_results() {
        let records = vec![
            record("1", "Drill", "£0.00", "Screwfix"),
            record("2", "Drill", "POA", "CEF"),
        ];

        let result = aggregate("drill", records, &SupplierDirectory::default());

        assert_eq!(result, Err(AggregateError::NoResults("drill".to_string())));
    }

    #[test]
    fn aggregate_excludes_prices_beyond_ceiling() -> TestResult {
        let records = vec![
            record("1", "Drill", "79228162514264337593543950335", "Screwfix"),
            record("2", "Drill", "79228162514264337593543950335", "CEF"),
            record("3", "Drill", "£10,000,000", "Toolstation"),
            record("4", "Drill", "£9,999,999.99", "TLC Direct"),
        ];

        let comparison = aggregate("drill", records, &SupplierDirectory::default())?;

        assert_eq!(comparison.len(), 2);
        assert_eq!(comparison.highest_price(), Decimal::new(10_000_000, 0));
        assert_eq!(comparison.average_price(), Decimal::new(9_999_999_995, 3));

        Ok(())
    }

    #[test]
    fn aggregate_of_nothing_is_no_results() {
        let result = aggregate("drill", Vec::new(), &SupplierDirectory::default());

        assert!(matches!(result, Err(AggregateError::NoResults(_))));
    }

    #[test]
    fn aggregate_keeps_input_order_for_equal_prices() -> TestResult {
        let records = vec![
            record("a", "Drill A", "£10.00", "Screwfix"),
            record("b", "Drill B", "£5.00", "CEF"),
            record("c", "Drill C", "£10.00", "Amazon"),
            record("d", "Drill D", "£10", "Wickes"),
        ];

        let comparison = aggregate("drill", records, &SupplierDirectory::default())?;
        let ids: Vec<&str> = comparison.tools().iter().map(|t| t.id.as_str()).collect();

        assert_eq!(ids, vec!["b", "a", "c", "d"]);

        Ok(())
    }

    #[test]
    fn aggregate_is_idempotent() -> TestResult {
        let suppliers = SupplierDirectory::default();

        let first = aggregate("combi drill", drill_results(), &suppliers)?;
        let second = aggregate("combi drill", drill_results(), &suppliers)?;

        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn savings_are_measured_against_highest_price() -> TestResult {
        let comparison = aggregate("combi drill", drill_results(), &SupplierDirectory::default())?;
        let cheapest = comparison.cheapest().ok_or("expected a cheapest tool")?;

        assert_eq!(comparison.savings_for(cheapest), Decimal::new(649, 2));
        assert_eq!(comparison.potential_savings(), Decimal::new(649, 2));
        assert_eq!(
            percent_points(comparison.savings_percent()),
            Decimal::new(2597, 2)
        );

        Ok(())
    }

    #[test]
    fn best_by_supplier_keeps_cheapest_per_supplier() -> TestResult {
        let records = vec![
            record("1", "Drill", "£30.00", "Screwfix"),
            record("2", "Drill", "£20.00", "screwfix"),
            record("3", "Drill", "£25.00", "CEF"),
        ];

        let comparison = aggregate("drill", records, &SupplierDirectory::default())?;
        let best: Vec<&str> = comparison
            .best_by_supplier()
            .iter()
            .map(|tool| tool.id.as_str())
            .collect();

        assert_eq!(best, vec!["2", "3"]);
        assert_eq!(comparison.supplier_count(), 2);

        Ok(())
    }

    #[test]
    fn filter_combines_criteria() -> TestResult {
        let mut out_of_stock = record("4", "Makita 18V Impact Driver", "£60.00", "Amazon");
        out_of_stock.stock_status = StockStatus::OutOfStock;

        let records = vec![
            record("1", "Makita 18V Impact Driver", "£75.00", "Screwfix"),
            record("2", "Makita 12V Impact Driver", "£55.00", "CEF"),
            record("3", "DeWalt 18V Impact Driver", "£70.00", "CEF"),
            out_of_stock,
        ];

        let comparison = aggregate("impact driver", records, &SupplierDirectory::default())?;

        let filter = ComparisonFilter {
            brand: Some("makita".to_string()),
            voltage: Some("18v".to_string()),
            in_stock_only: true,
            ..ComparisonFilter::default()
        };

        let ids: Vec<&str> = comparison
            .filter(&filter)
            .iter()
            .map(|tool| tool.id.as_str())
            .collect();

        assert_eq!(ids, vec!["1"]);

        let everything = comparison.filter(&ComparisonFilter::default());

        assert_eq!(everything.len(), 4);

        Ok(())
    }

    #[test]
    fn filter_text_matches_category_case_insensitively() -> TestResult {
        let mut tester = record("1", "Fluke T150", "£150.00", "CEF");
        tester.category = "Test Equipment".to_string();

        let records = vec![tester, record("2", "Bosch Drill", "£80.00", "CEF")];
        let comparison = aggregate("tools", records, &SupplierDirectory::default())?;

        let filter = ComparisonFilter {
            text: Some(" test equip ".to_string()),
            ..ComparisonFilter::default()
        };

        assert_eq!(comparison.filter(&filter).len(), 1);

        Ok(())
    }
}
