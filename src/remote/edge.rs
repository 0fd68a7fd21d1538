//! HTTP client for the Supabase edge functions.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::{
    AnalysisRequest, AnalysisResponse, RemoteError, SearchRequest, SearchResponse,
    ToolSearchService,
};

/// Configuration for connecting to the edge functions.
#[derive(Clone)]
pub struct EdgeFunctionsConfig {
    /// Project URL, e.g. `"https://abc.supabase.co"`.
    pub base_url: String,

    /// Anonymous API key, sent as both bearer token and `apikey` header.
    pub anon_key: String,

    /// Name of the price search function.
    pub search_function: String,

    /// Name of the recommendation function.
    pub analysis_function: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for EdgeFunctionsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeFunctionsConfig")
            .field("base_url", &self.base_url)
            .field("anon_key", &"<redacted>")
            .field("search_function", &self.search_function)
            .field("analysis_function", &self.analysis_function)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// HTTP client that invokes the search and recommendation functions.
#[derive(Debug, Clone)]
pub struct EdgeFunctionsClient {
    config: EdgeFunctionsConfig,
    http: Client,
}

impl EdgeFunctionsClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: EdgeFunctionsConfig) -> Result<Self, RemoteError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }

    /// URL of a named function.
    pub fn function_url(&self, function: &str) -> String {
        format!(
            "{}/functions/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            function.trim_start_matches('/')
        )
    }

    async fn invoke<B, R>(&self, function: &str, body: &B) -> Result<R, RemoteError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.function_url(function);

        debug!(%url, "invoking edge function");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.anon_key)
            .header("apikey", &self.config.anon_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            warn!(function, %status, "edge function failed");

            return Err(RemoteError::UnexpectedResponse(status.as_u16(), text));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ToolSearchService for EdgeFunctionsClient {
    #[tracing::instrument(
        name = "remote.search",
        skip(self, request),
        fields(search_term = %request.search_term),
        err
    )]
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, RemoteError> {
        self.invoke(&self.config.search_function, &request).await
    }

    #[tracing::instrument(
        name = "remote.analyze",
        skip(self, request),
        fields(search_query = %request.search_query, tools = request.tools.len()),
        err
    )]
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, RemoteError> {
        self.invoke(&self.config.analysis_function, &request).await
    }
}
