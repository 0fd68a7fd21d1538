//! Remote search and analysis functions.
//!
//! The search and recommendation backends are external edge functions that
//! speak JSON. [`ToolSearchService`] is the seam the session talks to;
//! [`EdgeFunctionsClient`] is the HTTP implementation.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    insights::AiInsights,
    products::{Product, RawRecord},
};

mod edge;

pub use edge::{EdgeFunctionsClient, EdgeFunctionsConfig};

/// Maximum number of tools sent for analysis.
pub const MAX_ANALYSIS_TOOLS: usize = 25;

/// Substrings that mark an error message as a connectivity problem.
const NETWORK_MARKERS: &[&str] = &[
    "network",
    "fetch",
    "timed out",
    "timeout",
    "connection",
    "dns",
];

/// Errors that can occur when calling a remote function.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The function returned a non-2xx status (status, body).
    #[error("function returned status {0}: {1}")]
    UnexpectedResponse(u16, String),

    /// The function reported an error in its response body.
    #[error("{0}")]
    Application(String),
}

impl RemoteError {
    /// Whether the failure looks like a connectivity problem rather than a
    /// rejected request.
    pub fn is_network(&self) -> bool {
        if matches!(self, Self::Http(error) if error.is_connect() || error.is_timeout()) {
            return true;
        }

        let message = self.to_string().to_lowercase();

        NETWORK_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
    }
}

/// Body of a search request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Restrict results to this category.
    pub category_filter: Option<String>,

    /// Restrict results to this supplier.
    pub supplier_filter: Option<String>,

    /// Free-text search term.
    pub search_term: String,
}

/// Body of a search response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchResponse {
    /// Raw supplier records.
    #[serde(default, deserialize_with = "crate::products::null_as_default")]
    pub tools: Vec<RawRecord>,

    /// Application error reported by the function.
    #[serde(default)]
    pub error: Option<String>,
}

impl SearchResponse {
    /// Creates a successful response.
    pub fn with_tools(tools: Vec<RawRecord>) -> Self {
        Self { tools, error: None }
    }

    /// Returns the records, or the reported error.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Application`] if the function reported an error.
    pub fn into_tools(self) -> Result<Vec<RawRecord>, RemoteError> {
        match self.error {
            Some(error) if !error.trim().is_empty() => Err(RemoteError::Application(error)),
            _ => Ok(self.tools),
        }
    }
}

/// Body of an analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Search term the tools were found for.
    pub search_query: String,

    /// Up to [`MAX_ANALYSIS_TOOLS`] tools, cheapest first.
    pub tools: Vec<Product>,
}

impl AnalysisRequest {
    /// Creates a request from the cheapest [`MAX_ANALYSIS_TOOLS`] of `tools`.
    pub fn new(search_query: impl Into<String>, tools: &[Product]) -> Self {
        Self {
            search_query: search_query.into(),
            tools: tools.iter().take(MAX_ANALYSIS_TOOLS).cloned().collect(),
        }
    }
}

/// Body of an analysis response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AnalysisResponse {
    /// Whether the analysis succeeded.
    #[serde(default)]
    pub success: bool,

    /// Untyped recommendations.
    #[serde(default)]
    pub recommendations: Vec<Value>,

    /// Untyped market insights.
    #[serde(default)]
    pub insights: Value,

    /// Error reported by the function.
    #[serde(default)]
    pub error: Option<String>,
}

impl AnalysisResponse {
    /// Parses the payload into typed insights.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Application`] if the function reported failure.
    pub fn into_insights(self) -> Result<AiInsights, RemoteError> {
        if !self.success {
            return Err(RemoteError::Application(
                self.error
                    .filter(|error| !error.trim().is_empty())
                    .unwrap_or_else(|| "analysis was not successful".to_string()),
            ));
        }

        Ok(AiInsights::from_payload(self.recommendations, self.insights))
    }
}

/// The remote search and recommendation functions.
#[automock]
#[async_trait]
pub trait ToolSearchService: Send + Sync {
    /// Searches supplier catalogues.
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, RemoteError>;

    /// Requests AI recommendations for a set of tools.
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, RemoteError>;
}
