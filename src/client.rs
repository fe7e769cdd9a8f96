//! Storefront API client
//!
//! [`ApiClient`] issues exactly one request per call and never retries. HTTP
//! is behind the [`GraphqlTransport`] trait so the fetch layer can be driven
//! by a stub in tests.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::query::{build_page_query, FetchParams, CHANNELS_QUERY};
use crate::types::{Channel, EntityType, RawPage};
use crate::{PickerError, Result};

const AUTH_HEADER: &str = "Authorization-Bearer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphqlRequest {
    pub query: String,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }
}

/// Executes one GraphQL document and returns the `data` object of the response
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn execute(&self, request: GraphqlRequest) -> Result<serde_json::Value>;
}

#[derive(Debug, Deserialize)]
struct GraphqlResponseEnvelope {
    data: Option<serde_json::Value>,
    errors: Option<Vec<GraphqlResponseError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponseError {
    message: String,
}

#[derive(Clone)]
pub struct ReqwestGraphqlTransport {
    endpoint: String,
    api_token: String,
    client: reqwest::Client,
}

impl fmt::Debug for ReqwestGraphqlTransport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ReqwestGraphqlTransport")
            .field("endpoint", &self.endpoint)
            .field("api_token", &"<redacted>")
            .field("client", &self.client)
            .finish()
    }
}

impl ReqwestGraphqlTransport {
    pub fn new(endpoint: impl Into<String>, api_token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("saleor-sku-picker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| {
                PickerError::Config(format!("failed to initialize HTTP client: {err}"))
            })?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_token: api_token.into(),
            client,
        })
    }
}

#[async_trait]
impl GraphqlTransport for ReqwestGraphqlTransport {
    async fn execute(&self, request: GraphqlRequest) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(AUTH_HEADER, &self.api_token)
            .json(&json!({ "query": request.query }))
            .send()
            .await
            .map_err(|err| PickerError::remote(format!("failed to call storefront API: {err}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            PickerError::remote(format!("failed to read storefront API response: {err}"))
        })?;

        if !status.is_success() {
            return Err(PickerError::RemoteQuery {
                status: Some(status.as_u16()),
                detail: truncate_for_error(&body),
            });
        }

        parse_envelope(&body)
    }
}

/// Decode a GraphQL response body into its `data` object
pub(crate) fn parse_envelope(body: &str) -> Result<serde_json::Value> {
    let envelope: GraphqlResponseEnvelope = serde_json::from_str(body)
        .map_err(|err| PickerError::remote(format!("failed to parse response JSON: {err}")))?;

    if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
        let message = errors
            .into_iter()
            .map(|error| error.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(PickerError::remote(format!("GraphQL query failed: {message}")));
    }

    envelope
        .data
        .ok_or_else(|| PickerError::remote("response did not include a data payload"))
}

fn truncate_for_error(body: &str) -> String {
    const MAX_LEN: usize = 200;
    if body.chars().count() <= MAX_LEN {
        body.to_owned()
    } else {
        format!("{}...", body.chars().take(MAX_LEN).collect::<String>())
    }
}

/// Storefront client with one operation per query shape
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn GraphqlTransport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client talking HTTP to the configured endpoint
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestGraphqlTransport::new(&config.api_endpoint, &config.api_token)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    pub fn with_transport(transport: Arc<dyn GraphqlTransport>) -> Self {
        Self { transport }
    }

    /// Fetch one page of `entity_type`
    pub async fn fetch_page(
        &self,
        entity_type: EntityType,
        params: &FetchParams,
    ) -> Result<RawPage> {
        let descriptor = entity_type.descriptor();
        debug!(
            entity_type = %entity_type,
            channel = %params.channel,
            search = %params.search,
            ids = params.ids.len(),
            after = %params.after_cursor,
            "fetching entity page"
        );
        let query = build_page_query(entity_type, params);
        self.fetch_field(descriptor.field, query).await
    }

    /// List storefront channels
    pub async fn fetch_channels(&self) -> Result<Vec<Channel>> {
        debug!("fetching channels");
        self.fetch_field("channels", CHANNELS_QUERY.to_owned()).await
    }

    async fn fetch_field<T: DeserializeOwned>(&self, field: &str, query: String) -> Result<T> {
        let mut data = self
            .transport
            .execute(GraphqlRequest::new(query))
            .await
            .inspect_err(|err| warn!(field, error = %err, "storefront query failed"))?;

        let payload = data
            .get_mut(field)
            .map(serde_json::Value::take)
            .filter(|payload| !payload.is_null())
            .ok_or_else(|| PickerError::remote(format!("response is missing '{field}'")))?;

        serde_json::from_value(payload)
            .map_err(|err| PickerError::remote(format!("unexpected '{field}' payload: {err}")))
    }
}
