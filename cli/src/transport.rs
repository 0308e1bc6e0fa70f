//! HTTP transport for the recommendation service.
//!
//! DESIGN
//! ======
//! [`RecommendApi`] is the seam between the form session and the network so
//! the interactive loop can be driven by a mock in tests. [`HttpApi`] is the
//! only real implementation: one request per call, no retries, and no
//! timeout unless one was configured.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::time::Duration;

use recommend::endpoint::{RECOMMEND_PATH, RECOMMEND_TEXT_PATH, RECOMMEND_URL_PATH, endpoint_url};
use recommend::failure::decode_response;
use recommend::types::{TextRequest, UrlRequest};
use recommend::{RecommendRequest, RecommendationResult, RequestFailure};

/// Which service endpoint a submission goes to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Route {
    /// `GET /api/recommend?query=…`
    #[default]
    Query,
    /// `POST /api/recommend/text` with a JSON body.
    Text,
    /// `GET /api/recommend/url?url=…`; the form text is the URL.
    Url,
}

/// Sends one recommendation request and reports its outcome.
#[async_trait::async_trait]
pub trait RecommendApi: Send + Sync {
    async fn send(&self, route: Route, request: &RecommendRequest) -> Result<RecommendationResult, RequestFailure>;
}

/// `reqwest`-backed [`RecommendApi`].
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Build a client for `base_url`. `timeout` of `None` keeps the
    /// transport default.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build(&self, route: Route, request: &RecommendRequest) -> reqwest::RequestBuilder {
        match route {
            Route::Query => self
                .http
                .get(endpoint_url(&self.base_url, RECOMMEND_PATH))
                .query(request),
            Route::Text => self
                .http
                .post(endpoint_url(&self.base_url, RECOMMEND_TEXT_PATH))
                .json(&TextRequest::from(request)),
            Route::Url => {
                let params = UrlRequest { url: request.query.trim().to_owned(), max_results: request.max_results };
                self.http
                    .get(endpoint_url(&self.base_url, RECOMMEND_URL_PATH))
                    .query(&params)
            }
        }
    }
}

#[async_trait::async_trait]
impl RecommendApi for HttpApi {
    async fn send(&self, route: Route, request: &RecommendRequest) -> Result<RecommendationResult, RequestFailure> {
        let response = self
            .build(route, request)
            .send()
            .await
            .map_err(|e| RequestFailure::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RequestFailure::Transport(e.to_string()))?;

        let outcome = decode_response(status, &body);
        match &outcome {
            Ok(result) => tracing::debug!(status, count = result.recommendations.len(), ?route, "recommendations received"),
            Err(error) => tracing::debug!(status, ?route, error = %error, "recommendation request failed"),
        }
        outcome
    }
}
