//! Toolbench prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    bulk::{BulkLine, BulkOrder, BulkOrderError, BulkTotals, DiscountTier, bulk_discount},
    comparison::{AggregateError, ComparisonFilter, PriceComparison, aggregate},
    export::{ComparisonExport, ExportError},
    extract::{extract_brand, extract_price, extract_tool_type, extract_voltage},
    insights::{AiInsights, MarketInsights, Recommendation, RecommendationKind},
    pricing::format_price,
    products::{Product, RawRecord, StockStatus},
    remote::{
        AnalysisRequest, AnalysisResponse, EdgeFunctionsClient, EdgeFunctionsConfig, RemoteError,
        SearchRequest, SearchResponse, ToolSearchService,
    },
    render::RenderError,
    session::{
        Generation, InsightApplied, InsightOutcome, InsightState, InsightTicket, SearchError,
        SearchQuery, SearchSession,
    },
    suppliers::{SupplierDirectory, SupplierError, SupplierProfile},
};
