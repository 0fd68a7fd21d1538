//! Search session
//!
//! Owns the comparison shown to the user and orchestrates the two remote round
//! trips of a search: the price search, which produces the comparison, and the
//! slower recommendation call, which is merged into it later.
//!
//! Every time the displayed comparison is replaced or cleared the session's
//! [`Generation`] advances. Insight requests carry the generation they were
//! issued for and their outcome is discarded if the session has moved on, so a
//! slow response for an older search can never overwrite a newer one. Within a
//! generation each retry supersedes the earlier attempts the same way.

use std::{fmt, sync::Arc};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    comparison::{AggregateError, PriceComparison, aggregate},
    insights::AiInsights,
    remote::{AnalysisRequest, RemoteError, SearchRequest, SearchResponse, ToolSearchService},
    suppliers::SupplierDirectory,
};

/// Errors surfaced by a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The search term was empty or whitespace.
    #[error("enter a tool to search for")]
    EmptyQuery,

    /// The search function could not be reached or reported an error.
    #[error("search failed: {0}")]
    Remote(#[from] RemoteError),

    /// The search returned no tool with a valid price (search term).
    #[error("no results found for \"{0}\"")]
    NoResults(String),
}

impl SearchError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyQuery => "Please enter a tool name to search for.".to_string(),
            Self::Remote(error) if error.is_network() => {
                "Network error: unable to reach the price search service. Check your connection and try again.".to_string()
            }
            Self::Remote(error) => format!("Search failed: {error}"),
            Self::NoResults(term) => {
                format!("No results found for \"{term}\". Try a different search term.")
            }
        }
    }
}

impl From<AggregateError> for SearchError {
    fn from(error: AggregateError) -> Self {
        match error {
            AggregateError::NoResults(term) => Self::NoResults(term),
        }
    }
}

/// Identifies which displayed comparison a request belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The following generation.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Raw counter value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A search term with optional filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    term: String,
    category: Option<String>,
    supplier: Option<String>,
}

impl SearchQuery {
    /// Creates a query for `term`.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    /// Restricts the search to a category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Restricts the search to a supplier.
    #[must_use]
    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    /// The search term as entered.
    pub fn term(&self) -> &str {
        &self.term
    }

    fn into_request(self) -> Result<SearchRequest, SearchError> {
        let term = self.term.trim();

        if term.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        Ok(SearchRequest {
            category_filter: non_blank(self.category),
            supplier_filter: non_blank(self.supplier),
            search_term: term.to_string(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// State of the insight panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InsightState {
    /// No comparison, so nothing requested.
    #[default]
    Idle,

    /// Waiting for the recommendation call.
    Loading,

    /// Insights have been merged into the comparison.
    Ready,

    /// The recommendation call failed (message); the comparison is unaffected.
    Failed(String),
}

/// A pending insight request for one generation.
///
/// The ticket owns everything needed to make the call, so it can be fetched
/// on another task while the session stays usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightTicket {
    generation: Generation,
    attempt: u32,
    request: AnalysisRequest,
}

impl InsightTicket {
    /// Generation the ticket was issued for.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Attempt number within the generation, starting at 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The analysis request to send.
    pub fn request(&self) -> &AnalysisRequest {
        &self.request
    }

    /// Calls the recommendation function.
    pub async fn fetch(self, service: &dyn ToolSearchService) -> InsightOutcome {
        let result = match service.analyze(self.request).await {
            Ok(response) => response.into_insights(),
            Err(error) => Err(error),
        };

        InsightOutcome {
            generation: self.generation,
            attempt: self.attempt,
            result,
        }
    }
}

/// The result of an insight request, to be applied back to the session.
#[derive(Debug)]
pub struct InsightOutcome {
    generation: Generation,
    attempt: u32,
    result: Result<AiInsights, RemoteError>,
}

impl InsightOutcome {
    /// Creates the outcome of `ticket`'s request.
    pub fn new(ticket: &InsightTicket, result: Result<AiInsights, RemoteError>) -> Self {
        Self {
            generation: ticket.generation,
            attempt: ticket.attempt,
            result,
        }
    }

    /// Generation the outcome belongs to.
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// What [`SearchSession::apply_insights`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightApplied {
    /// Insights were merged into the comparison.
    Merged,

    /// The call failed; the insight panel shows the error.
    Failed,

    /// The outcome belonged to an older generation or a superseded attempt
    /// and was discarded.
    Stale,
}

/// Owns one user's comparison and drives searches against a [`ToolSearchService`].
pub struct SearchSession {
    service: Arc<dyn ToolSearchService>,
    suppliers: SupplierDirectory,
    generation: Generation,
    insight_attempt: u32,
    comparison: Option<PriceComparison>,
    insight_state: InsightState,
    last_error: Option<String>,
}

impl fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchSession")
            .field("generation", &self.generation)
            .field("insight_attempt", &self.insight_attempt)
            .field("comparison", &self.comparison)
            .field("insight_state", &self.insight_state)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl SearchSession {
    /// Creates a session with no comparison.
    pub fn new(service: Arc<dyn ToolSearchService>, suppliers: SupplierDirectory) -> Self {
        Self {
            service,
            suppliers,
            generation: Generation::default(),
            insight_attempt: 0,
            comparison: None,
            insight_state: InsightState::Idle,
            last_error: None,
        }
    }

    /// The service this session calls.
    pub fn service(&self) -> Arc<dyn ToolSearchService> {
        Arc::clone(&self.service)
    }

    /// Current generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The comparison currently displayed.
    pub fn comparison(&self) -> Option<&PriceComparison> {
        self.comparison.as_ref()
    }

    /// State of the insight panel.
    pub fn insight_state(&self) -> &InsightState {
        &self.insight_state
    }

    /// User-facing message of the last failed search, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Runs a price search and replaces the displayed comparison.
    ///
    /// Returns a ticket for the follow-up insight request. A blank term is
    /// rejected before any remote call. If the search function fails, the
    /// previous comparison stays displayed. If it returns nothing with a
    /// valid price, the previous comparison is cleared.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] if the term is blank, the search fails or
    /// there are no results.
    #[tracing::instrument(
        name = "session.search",
        skip(self, query),
        fields(search_term = %query.term(), generation = tracing::field::Empty),
        err
    )]
    pub async fn search(&mut self, query: SearchQuery) -> Result<InsightTicket, SearchError> {
        let request = query.into_request().map_err(|error| self.fail(error))?;
        let search_term = request.search_term.clone();

        let records = match self
            .service
            .search(request)
            .await
            .and_then(SearchResponse::into_tools)
        {
            Ok(records) => records,
            Err(error) => return Err(self.fail(error.into())),
        };

        let comparison = match aggregate(&search_term, records, &self.suppliers) {
            Ok(comparison) => comparison,
            Err(error) => {
                self.replace(None);

                return Err(self.fail(error.into()));
            }
        };

        let request = AnalysisRequest::new(comparison.search_term(), comparison.tools());

        info!(results = comparison.len(), "search complete");

        let generation = self.replace(Some(comparison));

        tracing::Span::current().record("generation", generation.value());

        self.last_error = None;

        Ok(self.issue_ticket(request))
    }

    /// Runs a search and then waits for its insights.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] if the search itself fails. Insight failures
    /// are reported through the returned [`InsightApplied`] and
    /// [`SearchSession::insight_state`].
    pub async fn search_with_insights(
        &mut self,
        query: SearchQuery,
    ) -> Result<InsightApplied, SearchError> {
        let ticket = self.search(query).await?;
        let service = self.service();
        let outcome = ticket.fetch(service.as_ref()).await;

        Ok(self.apply_insights(outcome))
    }

    /// Merges an insight outcome into the comparison it was requested for.
    ///
    /// Outcomes for an older generation, or for an attempt that a retry has
    /// superseded, are discarded. A failed outcome only changes the insight
    /// state; the comparison is left as it was.
    pub fn apply_insights(&mut self, outcome: InsightOutcome) -> InsightApplied {
        if outcome.generation != self.generation || outcome.attempt != self.insight_attempt {
            debug!(
                outcome = %outcome.generation,
                current = %self.generation,
                attempt = outcome.attempt,
                latest_attempt = self.insight_attempt,
                "discarding stale insights"
            );

            return InsightApplied::Stale;
        }

        let Some(comparison) = self.comparison.as_mut() else {
            return InsightApplied::Stale;
        };

        match outcome.result {
            Ok(insights) => {
                comparison.set_insights(insights);
                self.insight_state = InsightState::Ready;

                InsightApplied::Merged
            }
            Err(error) => {
                warn!(%error, "insight request failed");

                self.insight_state = InsightState::Failed(error.to_string());

                InsightApplied::Failed
            }
        }
    }

    /// Issues a fresh insight ticket for the displayed comparison.
    ///
    /// Outcomes of earlier tickets for the same comparison are discarded from
    /// now on.
    pub fn retry_insights(&mut self) -> Option<InsightTicket> {
        let request = self
            .comparison
            .as_ref()
            .map(|comparison| AnalysisRequest::new(comparison.search_term(), comparison.tools()))?;

        Some(self.issue_ticket(request))
    }

    fn issue_ticket(&mut self, request: AnalysisRequest) -> InsightTicket {
        self.insight_attempt = self.insight_attempt.saturating_add(1);
        self.insight_state = InsightState::Loading;

        InsightTicket {
            generation: self.generation,
            attempt: self.insight_attempt,
            request,
        }
    }

    fn replace(&mut self, comparison: Option<PriceComparison>) -> Generation {
        self.generation = self.generation.next();
        self.insight_attempt = 0;
        self.comparison = comparison;
        self.insight_state = InsightState::Idle;

        self.generation
    }

    fn fail(&mut self, error: SearchError) -> SearchError {
        self.last_error = Some(error.user_message());

        error
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::always;
    use serde_json::{Value, json};
    use testresult::TestResult;

    use super::*;
    use crate::{products::RawRecord, remote::MockToolSearchService};

    fn record(id: &str, price: &str, supplier: &str) -> TestResult<RawRecord> {
        Ok(serde_json::from_value(json!({
            "id": id,
            "name": "Makita DHP482Z 18V Combi Drill",
            "price": price,
            "supplier": supplier,
        }))?)
    }

    fn session(service: MockToolSearchService) -> SearchSession {
        SearchSession::new(Arc::new(service), SupplierDirectory::default())
    }

    #[tokio::test]
    async fn blank_query_makes_no_remote_call() -> TestResult {
        let mut service = MockToolSearchService::new();
        service.expect_search().never();

        let mut session = session(service);
        let result = session.search(SearchQuery::new("   ")).await;

        assert!(matches!(result, Err(SearchError::EmptyQuery)));
        assert_eq!(session.generation(), Generation::default());
        assert!(session.last_error().is_some());

        Ok(())
    }

    #[tokio::test]
    async fn search_trims_term_and_drops_blank_filters() -> TestResult {
        let tools = vec![record("1", "£20.00", "Screwfix")?];
        let mut service = MockToolSearchService::new();
        service
            .expect_search()
            .withf(|request| {
                request.search_term == "combi drill"
                    && request.category_filter.is_none()
                    && request.supplier_filter.as_deref() == Some("CEF")
            })
            .times(1)
            .returning(move |_| Ok(SearchResponse::with_tools(tools.clone())));

        let mut session = session(service);
        let ticket = session
            .search(
                SearchQuery::new("  combi drill ")
                    .with_category(" ")
                    .with_supplier("CEF"),
            )
            .await?;

        assert_eq!(ticket.generation(), session.generation());
        assert_eq!(ticket.request().search_query, "combi drill");
        assert_eq!(session.insight_state(), &InsightState::Loading);

        Ok(())
    }

    #[tokio::test]
    async fn failed_search_keeps_previous_comparison() -> TestResult {
        let tools = vec![record("1", "£20.00", "Screwfix")?];
        let mut service = MockToolSearchService::new();
        let mut calls = 0;
        service.expect_search().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(SearchResponse::with_tools(tools.clone()))
            } else {
                Err(RemoteError::Application("Failed to fetch".to_string()))
            }
        });

        let mut session = session(service);
        session.search(SearchQuery::new("drill")).await?;
        let generation = session.generation();

        let error = session.search(SearchQuery::new("saw")).await;

        assert!(matches!(error, Err(SearchError::Remote(_))));
        assert_eq!(session.generation(), generation);
        assert_eq!(
            session.comparison().map(PriceComparison::search_term),
            Some("drill")
        );
        assert!(
            session
                .last_error()
                .is_some_and(|message| message.starts_with("Network error"))
        );

        Ok(())
    }

    #[tokio::test]
    async fn no_results_clears_comparison() -> TestResult {
        let tools = vec![record("1", "£20.00", "Screwfix")?];
        let unpriced = vec![record("2", "POA", "CEF")?];
        let mut service = MockToolSearchService::new();
        let mut calls = 0;
        service.expect_search().times(2).returning(move |_| {
            calls += 1;
            Ok(SearchResponse::with_tools(if calls == 1 {
                tools.clone()
            } else {
                unpriced.clone()
            }))
        });

        let mut session = session(service);
        session.search(SearchQuery::new("drill")).await?;

        let error = session.search(SearchQuery::new("grinder")).await;

        assert!(matches!(error, Err(SearchError::NoResults(term)) if term == "grinder"));
        assert!(session.comparison().is_none());
        assert_eq!(session.generation().value(), 2);
        assert_eq!(session.insight_state(), &InsightState::Idle);

        Ok(())
    }

    #[tokio::test]
    async fn failed_insights_leave_comparison_unchanged() -> TestResult {
        let tools = vec![
            record("1", "£24.99", "Screwfix")?,
            record("2", "£18.50", "CEF")?,
        ];
        let mut service = MockToolSearchService::new();
        service
            .expect_search()
            .returning(move |_| Ok(SearchResponse::with_tools(tools.clone())));
        service
            .expect_analyze()
            .with(always())
            .returning(|_| Err(RemoteError::UnexpectedResponse(500, "boom".to_string())));

        let mut session = session(service);
        let ticket = session.search(SearchQuery::new("drill")).await?;
        let before = session.comparison().cloned();

        let outcome = ticket.fetch(session.service().as_ref()).await;
        let applied = session.apply_insights(outcome);

        assert_eq!(applied, InsightApplied::Failed);
        assert_eq!(session.comparison().cloned(), before);
        assert!(matches!(session.insight_state(), InsightState::Failed(_)));

        Ok(())
    }

    #[tokio::test]
    async fn stale_insights_are_discarded() -> TestResult {
        let tools = vec![record("1", "£20.00", "Screwfix")?];
        let mut service = MockToolSearchService::new();
        service
            .expect_search()
            .times(2)
            .returning(move |_| Ok(SearchResponse::with_tools(tools.clone())));

        let mut session = session(service);
        let first = session.search(SearchQuery::new("drill")).await?;
        let second = session.search(SearchQuery::new("driver")).await?;

        let stale = InsightOutcome::new(
            &first,
            Ok(AiInsights::from_payload(
                vec![json!({"type": "bundle", "title": "Old"})],
                Value::Null,
            )),
        );

        assert_eq!(session.apply_insights(stale), InsightApplied::Stale);
        assert!(
            session
                .comparison()
                .is_some_and(|comparison| comparison.insights().is_none())
        );

        let fresh = InsightOutcome::new(&second, Ok(AiInsights::default()));

        assert_eq!(session.apply_insights(fresh), InsightApplied::Merged);
        assert_eq!(session.insight_state(), &InsightState::Ready);

        Ok(())
    }

    #[tokio::test]
    async fn retry_reissues_ticket_for_current_generation() -> TestResult {
        let tools = vec![record("1", "£20.00", "Screwfix")?];
        let mut service = MockToolSearchService::new();
        service
            .expect_search()
            .returning(move |_| Ok(SearchResponse::with_tools(tools.clone())));

        let mut session = session(service);

        assert!(session.retry_insights().is_none());

        let ticket = session.search(SearchQuery::new("drill")).await?;
        session.apply_insights(InsightOutcome::new(
            &ticket,
            Err(RemoteError::Application("rate limited".to_string())),
        ));

        let retry = session.retry_insights();

        assert_eq!(retry.as_ref().map(InsightTicket::generation), Some(session.generation()));
        assert_eq!(retry.as_ref().map(InsightTicket::attempt), Some(2));
        assert_eq!(session.insight_state(), &InsightState::Loading);

        Ok(())
    }

    #[tokio::test]
    async fn late_outcome_of_superseded_attempt_is_discarded() -> TestResult {
        let tools = vec![record("1", "£20.00", "Screwfix")?];
        let mut service = MockToolSearchService::new();
        service
            .expect_search()
            .returning(move |_| Ok(SearchResponse::with_tools(tools.clone())));

        let mut session = session(service);
        let original = session.search(SearchQuery::new("drill")).await?;
        let retry = session.retry_insights().ok_or("expected a retry ticket")?;

        let merged = session.apply_insights(InsightOutcome::new(
            &retry,
            Ok(AiInsights::from_payload(
                vec![json!({"type": "bundle", "title": "Kit"})],
                Value::Null,
            )),
        ));
        let late_failure = session.apply_insights(InsightOutcome::new(
            &original,
            Err(RemoteError::Application("late".to_string())),
        ));
        let late_success =
            session.apply_insights(InsightOutcome::new(&original, Ok(AiInsights::default())));

        assert_eq!(merged, InsightApplied::Merged);
        assert_eq!(late_failure, InsightApplied::Stale);
        assert_eq!(late_success, InsightApplied::Stale);
        assert_eq!(session.insight_state(), &InsightState::Ready);
        assert_eq!(
            session
                .comparison()
                .and_then(PriceComparison::insights)
                .map(|insights| insights.recommendations.len()),
            Some(1)
        );

        Ok(())
    }

    #[tokio::test]
    async fn original_outcome_is_discarded_while_retry_is_pending() -> TestResult {
        let tools = vec![record("1", "£20.00", "Screwfix")?];
        let mut service = MockToolSearchService::new();
        service
            .expect_search()
            .returning(move |_| Ok(SearchResponse::with_tools(tools.clone())));

        let mut session = session(service);
        let original = session.search(SearchQuery::new("drill")).await?;
        let _retry = session.retry_insights().ok_or("expected a retry ticket")?;

        let applied = session.apply_insights(InsightOutcome::new(
            &original,
            Err(RemoteError::Application("rate limited".to_string())),
        ));

        assert_eq!(applied, InsightApplied::Stale);
        assert_eq!(session.insight_state(), &InsightState::Loading);

        Ok(())
    }

    #[tokio::test]
    async fn search_with_insights_merges_payload() -> TestResult {
        let tools = vec![record("1", "£20.00", "Screwfix")?];
        let mut service = MockToolSearchService::new();
        service
            .expect_search()
            .returning(move |_| Ok(SearchResponse::with_tools(tools.clone())));
        service.expect_analyze().times(1).returning(|request| {
            assert_eq!(request.tools.len(), 1, "one priced tool is analysed");

            Ok(serde_json::from_value(json!({
                "success": true,
                "recommendations": [{"type": "accessory", "title": "5Ah battery"}],
                "insights": {"bestValue": "Screwfix"}
            }))
            .unwrap_or_default())
        });

        let mut session = session(service);
        let applied = session.search_with_insights(SearchQuery::new("drill")).await?;

        assert_eq!(applied, InsightApplied::Merged);
        assert_eq!(
            session
                .comparison()
                .and_then(PriceComparison::insights)
                .map(|insights| insights.recommendations.len()),
            Some(1)
        );

        Ok(())
    }

    #[test]
    fn user_message_distinguishes_network_failures() {
        let network = SearchError::Remote(RemoteError::Application("connection reset".to_string()));
        let rejected = SearchError::Remote(RemoteError::Application("bad term".to_string()));

        assert!(network.user_message().starts_with("Network error"));
        assert_eq!(rejected.user_message(), "Search failed: bad term");
    }
}
