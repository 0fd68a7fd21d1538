//! Render
//!
//! Terminal tables for comparisons, AI insights and bulk orders.

use std::{io, sync::LazyLock};

use regex::Regex;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    bulk::BulkOrder,
    comparison::{ComparisonFilter, PriceComparison},
    insights::AiInsights,
    pricing::{format_price, percent_points},
    products::StockStatus,
    session::InsightState,
};

const FRAME: &str = "\x1b[90m";
const RESET: &str = "\x1b[0m";

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static BORDER_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\u{2500}-\u{257F}]+").expect("Invalid border regex"));

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static ANSI_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\x1b\\[[0-9;]*[A-Za-z]").expect("Invalid escape regex"));

/// Errors that can occur when rendering output.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing to the output failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Writes the tools of `comparison` matching `filter`, followed by the price summary.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_comparison(
    mut out: impl io::Write,
    comparison: &PriceComparison,
    filter: &ComparisonFilter,
) -> Result<(), RenderError> {
    let tools = comparison.filter(filter);

    if tools.is_empty() {
        writeln!(out, "\nNo tools match the current filters.\n")?;

        return Ok(());
    }

    let mut builder = Builder::default();
    let mut color_ops = Vec::new();

    builder.push_record([
        "", "Tool", "Supplier", "Stock", "Price", "Savings", "Rating", "Delivery",
    ]);

    for (idx, tool) in tools.iter().enumerate() {
        let row = idx + 1;
        let savings = comparison.savings_for(tool);

        builder.push_record([
            format!("#{row}"),
            tool.name.clone(),
            tool.supplier.clone(),
            tool.stock_status.to_string(),
            format_price(tool.numeric_price),
            if savings.is_zero() {
                String::new()
            } else {
                format!("-{}", format_price(savings))
            },
            format!("{:.1}", tool.rating),
            tool.delivery.clone(),
        ]);

        if tool.numeric_price == comparison.cheapest_price() {
            color_ops.push((row, 4, Color::FG_GREEN));
        }

        match tool.stock_status {
            StockStatus::OutOfStock => color_ops.push((row, 3, Color::FG_RED)),
            StockStatus::LowStock => color_ops.push((row, 3, Color::FG_YELLOW)),
            StockStatus::InStock => {}
        }
    }

    write_table(&mut out, builder, Columns::new(4..7), color_ops)?;

    let savings_percent = percent_points(comparison.savings_percent());
    let lines = [
        (" Results:".to_string(), format!("{} of {}", tools.len(), comparison.len())),
        (" Suppliers:".to_string(), comparison.supplier_count().to_string()),
        (" Cheapest:".to_string(), format_price(comparison.cheapest_price())),
        (" Average:".to_string(), format_price(comparison.average_price())),
        (" Range:".to_string(), comparison.price_range()),
        (
            " \x1b[1mSavings:\x1b[0m".to_string(),
            format!(
                "\x1b[1m({savings_percent:.2}%) {}\x1b[0m",
                format_price(comparison.potential_savings())
            ),
        ),
    ];

    write_summary(&mut out, &lines)
}

/// Writes AI recommendations and market insights.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_insights(mut out: impl io::Write, insights: &AiInsights) -> Result<(), RenderError> {
    if !insights.recommendations.is_empty() {
        let mut builder = Builder::default();

        builder.push_record(["Type", "Recommendation", "Why", "Saves"]);

        for recommendation in &insights.recommendations {
            let detail = if recommendation.description.is_empty() {
                recommendation.title.clone()
            } else {
                format!("{}\n{}", recommendation.title, recommendation.description)
            };

            builder.push_record([
                recommendation.kind.to_string(),
                detail,
                recommendation.reasoning.clone(),
                recommendation.potential_savings.clone().unwrap_or_default(),
            ]);
        }

        write_table(&mut out, builder, Columns::new(3..4), Vec::new())?;
    }

    let market = &insights.insights;

    if let Some(best_value) = &market.best_value {
        writeln!(out, " \x1b[1mBest value:\x1b[0m {best_value}")?;
    }

    if let Some(price_trend) = &market.price_trend {
        writeln!(out, " \x1b[1mPrice trend:\x1b[0m {price_trend}")?;
    }

    if let Some(market_analysis) = &market.market_analysis {
        writeln!(out, " \x1b[1mMarket:\x1b[0m {market_analysis}")?;
    }

    for tip in &market.tips {
        writeln!(out, "  - {tip}")?;
    }

    if insights.recommendations.is_empty() && market.is_empty() {
        writeln!(out, " No AI recommendations for this search.")?;
    }

    writeln!(out)?;

    Ok(())
}

/// Writes a one-line note for insight states that carry no insights.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_insight_state(
    mut out: impl io::Write,
    state: &InsightState,
) -> Result<(), RenderError> {
    match state {
        InsightState::Idle | InsightState::Ready => {}
        InsightState::Loading => writeln!(out, " Fetching AI recommendations...")?,
        InsightState::Failed(message) => writeln!(
            out,
            " \x1b[33mAI recommendations unavailable:\x1b[0m {message}"
        )?,
    }

    Ok(())
}

/// Writes the lines of a bulk order and its totals.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_bulk_order(mut out: impl io::Write, order: &BulkOrder) -> Result<(), RenderError> {
    if order.is_empty() {
        writeln!(out, "\nThe bulk order is empty.\n")?;

        return Ok(());
    }

    let mut builder = Builder::default();
    let mut color_ops = Vec::new();

    builder.push_record([
        "", "Tool", "Supplier", "Qty", "Unit", "Subtotal", "Discount", "Total", "Next tier",
    ]);

    for (idx, line) in order.lines().iter().enumerate() {
        let row = idx + 1;
        let discount = line.discount();

        builder.push_record([
            format!("#{row}"),
            line.tool().name.clone(),
            line.tool().supplier.clone(),
            line.quantity().to_string(),
            format_price(line.unit_price()),
            format_price(line.subtotal()),
            if discount.is_zero() {
                String::new()
            } else {
                format!("({}) -{}", line.tier(), format_price(discount))
            },
            format_price(line.total()),
            line.units_to_next_tier()
                .map(|(units, tier)| format!("+{units} for {tier}"))
                .unwrap_or_default(),
        ]);

        if !discount.is_zero() {
            color_ops.push((row, 7, Color::FG_GREEN));
        }
    }

    write_table(&mut out, builder, Columns::new(3..8), color_ops)?;

    let totals = order.totals();
    let savings_percent = percent_points(totals.savings_percent());
    let lines = [
        (" Units:".to_string(), totals.units.to_string()),
        (" Subtotal:".to_string(), format_price(totals.subtotal)),
        (
            " Discount:".to_string(),
            format!("({savings_percent:.2}%) {}", format_price(totals.total_discount)),
        ),
        (
            " \x1b[1mTotal:\x1b[0m".to_string(),
            format!("\x1b[1m{}\x1b[0m", format_price(totals.total)),
        ),
    ];

    write_summary(&mut out, &lines)
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    right_aligned: Columns<std::ops::Range<usize>>,
    color_ops: Vec<(usize, usize, Color)>,
) -> Result<(), RenderError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(right_aligned, Alignment::right());

    for (row, col, color) in color_ops {
        table.modify((row, col), color);
    }

    writeln!(out, "\n{}", colorize_borders(&table.to_string()))?;

    Ok(())
}

/// Writes label/value pairs as right-aligned summary lines.
fn write_summary(
    out: &mut impl io::Write,
    lines: &[(String, String)],
) -> Result<(), RenderError> {
    let label_width = lines
        .iter()
        .map(|(label, _)| visible_width(label))
        .max()
        .unwrap_or_default();

    let value_width = lines
        .iter()
        .map(|(_, value)| visible_width(value) + 2)
        .max()
        .unwrap_or_default();

    for (label, value) in lines {
        let label_pad = label_width.saturating_sub(visible_width(label));
        let value_pad = value_width.saturating_sub(visible_width(value));

        writeln!(
            out,
            "{}{label}  {}{value}",
            " ".repeat(label_pad),
            " ".repeat(value_pad)
        )?;
    }

    writeln!(out)?;

    Ok(())
}

/// Dims the table frame so prices and savings stand out.
fn colorize_borders(table: &str) -> String {
    BORDER_RUN_RE
        .replace_all(table, format!("{FRAME}${{0}}{RESET}"))
        .into_owned()
}

/// Display width of a summary cell, ignoring the highlight escapes.
fn visible_width(cell: &str) -> usize {
    ANSI_ESCAPE_RE.replace_all(cell, "").chars().count()
}
