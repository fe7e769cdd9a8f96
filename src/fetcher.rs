//! Paginated fetching and selection resolution
//!
//! [`PaginatedFetcher`] is what the picker dialog talks to. It keeps a single
//! cursor for whichever (search, channel, entity type) combination was last
//! requested; changing any of the three starts over from the first page.
//!
//! The fetcher does not track request generations. A caller that can fire a
//! new filter change while a page fetch is still in flight must drop the stale
//! response itself.

use std::collections::HashMap;

use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::grouping::partition;
use crate::normalize::normalize;
use crate::query::{FetchParams, ITEMS_PER_PAGE};
use crate::token::{DecodedToken, TokenCodec};
use crate::types::{Channel, EntityType, ItemsPage, Pagination, PickableItem};
use crate::Result;

/// Filter tuple and cursor of the current picker session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    /// Cursor the next page request continues after; empty for the first page
    pub last_cursor: String,
    pub last_search: Option<String>,
    pub last_channel: Option<String>,
    pub last_entity_type: Option<EntityType>,
}

impl PageState {
    fn filter_changed(&self, search: &str, channel: &str, entity_type: EntityType) -> bool {
        self.last_search.as_deref() != Some(search)
            || self.last_channel.as_deref() != Some(channel)
            || self.last_entity_type != Some(entity_type)
    }
}

#[derive(Debug)]
pub struct PaginatedFetcher {
    client: ApiClient,
    channel_filter: bool,
    state: PageState,
}

impl PaginatedFetcher {
    /// Create a fetcher talking HTTP to the configured store
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = ApiClient::new(&config)?;
        Ok(Self::with_client(client, config.enable_channel_filter))
    }

    pub fn with_client(client: ApiClient, channel_filter: bool) -> Self {
        Self {
            client,
            channel_filter,
            state: PageState::default(),
        }
    }

    pub fn page_state(&self) -> &PageState {
        &self.state
    }

    /// Override the cursor the next [`get_page`](Self::get_page) continues after
    pub fn advance_cursor(&mut self, cursor: impl Into<String>) {
        self.state.last_cursor = cursor.into();
    }

    /// Fetch the next page for the given filters.
    ///
    /// If any filter differs from the previous call the cursor restarts from
    /// the first page. On success the returned `endCursor` becomes the cursor
    /// for the next call; on failure the state is left untouched.
    pub async fn get_page(
        &mut self,
        search: &str,
        channel: &str,
        entity_type: EntityType,
    ) -> Result<ItemsPage> {
        let channel = if self.channel_filter { channel } else { "" };

        let cursor = if self.state.filter_changed(search, channel, entity_type) {
            debug!(
                search,
                channel,
                entity_type = %entity_type,
                "filters changed, restarting pagination"
            );
            String::new()
        } else {
            self.state.last_cursor.clone()
        };

        let params = FetchParams::page(search, channel, cursor);
        let raw = self.client.fetch_page(entity_type, &params).await?;

        let items = normalize(&raw, entity_type, channel);
        let pagination = Pagination::from_page(raw.total_count, &raw.page_info);

        self.state = PageState {
            last_cursor: raw.page_info.end_cursor.unwrap_or_default(),
            last_search: Some(search.to_owned()),
            last_channel: Some(channel.to_owned()),
            last_entity_type: Some(entity_type),
        };

        Ok(ItemsPage { items, pagination })
    }

    /// Rebuild items for previously stored selection tokens.
    ///
    /// One id lookup is issued per (entity type, channel) pair. The result
    /// follows the order of `tokens`; tokens that fail to decode or whose
    /// entity no longer exists upstream are left out.
    ///
    /// A lookup returns at most [`ITEMS_PER_PAGE`] entities, so a single
    /// (entity type, channel) group with more distinct ids than that only
    /// resolves the first page's worth.
    pub async fn resolve_by_tokens<S: AsRef<str>>(
        &self,
        tokens: &[S],
    ) -> Result<Vec<PickableItem>> {
        let decoded: Vec<DecodedToken> = tokens
            .iter()
            .filter_map(|token| match TokenCodec::decode(token.as_ref()) {
                Ok(decoded) => Some(decoded),
                Err(err) => {
                    warn!(error = %err, "skipping undecodable selection token");
                    None
                }
            })
            .collect();

        if decoded.is_empty() {
            return Ok(Vec::new());
        }

        let batches = partition(&decoded);
        debug!(tokens = decoded.len(), lookups = batches.len(), "resolving selection");

        // Lookups go out without a channel so entities unpublished in the
        // stored channel still resolve; the stored channel is kept on the item.
        let pages = try_join_all(batches.iter().map(|batch| async move {
            if batch.ids.len() > ITEMS_PER_PAGE {
                warn!(
                    entity_type = %batch.entity_type,
                    channel = %batch.channel,
                    ids = batch.ids.len(),
                    limit = ITEMS_PER_PAGE,
                    "lookup exceeds page size, extra selected items will not resolve"
                );
            }
            let params = FetchParams::ids(batch.ids.clone());
            self.client
                .fetch_page(batch.entity_type, &params)
                .await
                .map(|page| (batch, page))
        }))
        .await?;

        let mut resolved: HashMap<DecodedToken, PickableItem> = HashMap::new();
        for (batch, page) in pages {
            for item in normalize(&page, batch.entity_type, &batch.channel) {
                let key = DecodedToken::new(
                    item.raw_id.clone(),
                    batch.entity_type,
                    batch.channel.clone(),
                );
                resolved.insert(key, item);
            }
        }

        let items: Vec<PickableItem> = decoded
            .iter()
            .filter_map(|token| resolved.get(token).cloned())
            .collect();
        if items.len() < decoded.len() {
            debug!(missing = decoded.len() - items.len(), "some selected entities no longer exist");
        }
        Ok(items)
    }

    pub async fn fetch_channels(&self) -> Result<Vec<Channel>> {
        self.client.fetch_channels().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{page_json, StubTransport};
    use crate::client::{GraphqlRequest, GraphqlTransport};
    use crate::PickerError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn fetcher(stub: &Arc<StubTransport>) -> PaginatedFetcher {
        PaginatedFetcher::with_client(ApiClient::with_transport(stub.clone()), true)
    }

    fn product(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("Product {id}"),
            "images": [{ "url": format!("https://cdn/{id}.png") }]
        })
    }

    fn category(id: &str) -> serde_json::Value {
        json!({ "id": id, "name": format!("Category {id}"), "backgroundImage": null })
    }

    /// Answers by top-level field instead of by arrival order
    #[derive(Default)]
    struct RoutingTransport {
        routes: HashMap<&'static str, serde_json::Value>,
        requests: Mutex<Vec<GraphqlRequest>>,
    }

    impl RoutingTransport {
        fn route(mut self, field: &'static str, response: serde_json::Value) -> Self {
            self.routes.insert(field, response);
            self
        }
    }

    #[async_trait]
    impl GraphqlTransport for RoutingTransport {
        async fn execute(&self, request: GraphqlRequest) -> Result<serde_json::Value> {
            let field = request
                .query
                .trim_start_matches("{ ")
                .split('(')
                .next()
                .unwrap_or_default()
                .to_owned();
            self.requests.lock().await.push(request);
            self.routes
                .get(field.as_str())
                .cloned()
                .ok_or_else(|| PickerError::remote(format!("no route for {field}")))
        }
    }

    #[tokio::test]
    async fn test_get_page_end_to_end_then_continues_after_end_cursor() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(page_json(
            "products",
            vec![product("A"), product("B")],
            true,
            "cursor-1",
        ))
        .await;
        stub.push_response(page_json("products", vec![product("C")], false, "cursor-2"))
            .await;
        let mut fetcher = fetcher(&stub);

        let page = fetcher.get_page("shirt", "us", EntityType::Product).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.pagination.has_next_page);
        assert_eq!(page.items[0].display_label, "Product ID: A");
        assert_eq!(page.items[0].image_url, "https://cdn/A.png");
        assert_eq!(fetcher.page_state().last_cursor, "cursor-1");

        let page = fetcher.get_page("shirt", "us", EntityType::Product).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(!page.pagination.has_next_page);

        let requests = stub.requests().await;
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].query.contains("after:"));
        assert!(requests[1].query.contains(r#"after: "cursor-1""#));
    }

    #[tokio::test]
    async fn test_get_page_accepts_null_media_and_total_count() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(json!({
            "productVariants": {
                "totalCount": null,
                "pageInfo": {
                    "hasNextPage": false,
                    "hasPreviousPage": false,
                    "startCursor": null,
                    "endCursor": null
                },
                "edges": [{ "node": { "id": "V1", "name": "v", "media": null } }]
            }
        }))
        .await;
        let mut fetcher = fetcher(&stub);

        let page = fetcher.get_page("", "us", EntityType::Variant).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].image_url, "");
        assert_eq!(page.items[0].display_label, "Variant ID: V1");
        assert_eq!(page.pagination.total_count, 0);
        assert_eq!(fetcher.page_state().last_cursor, "");
    }

    #[tokio::test]
    async fn test_resolve_oversized_group_still_issues_one_lookup() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(page_json("products", vec![product("P0")], false, "x"))
            .await;
        let fetcher = fetcher(&stub);
        let tokens: Vec<String> = (0..=ITEMS_PER_PAGE)
            .map(|n| TokenCodec::encode(&format!("P{n}"), EntityType::Product, "us"))
            .collect();

        let items = fetcher.resolve_by_tokens(&tokens).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].raw_id, "P0");
        assert_eq!(stub.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_entity_type_switch_resets_cursor() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(page_json("products", vec![product("A")], true, "p-cursor"))
            .await;
        stub.push_response(page_json("productVariants", vec![], false, "v-cursor"))
            .await;
        let mut fetcher = fetcher(&stub);

        fetcher.get_page("", "ch1", EntityType::Product).await.unwrap();
        fetcher.get_page("", "ch1", EntityType::Variant).await.unwrap();

        let requests = stub.requests().await;
        assert!(requests[1].query.starts_with("{ productVariants("));
        assert!(!requests[1].query.contains("after:"));
        assert_eq!(fetcher.page_state().last_entity_type, Some(EntityType::Variant));
        assert_eq!(fetcher.page_state().last_cursor, "v-cursor");
    }

    #[tokio::test]
    async fn test_search_and_channel_changes_reset_cursor() {
        let stub = Arc::new(StubTransport::default());
        for cursor in ["c1", "c2", "c3"] {
            stub.push_response(page_json("collections", vec![], true, cursor)).await;
        }
        let mut fetcher = fetcher(&stub);

        fetcher.get_page("", "us", EntityType::Collection).await.unwrap();
        fetcher.get_page("summer", "us", EntityType::Collection).await.unwrap();
        fetcher.get_page("summer", "eu", EntityType::Collection).await.unwrap();

        let requests = stub.requests().await;
        assert!(requests.iter().all(|request| !request.query.contains("after:")));
        assert_eq!(fetcher.page_state().last_channel.as_deref(), Some("eu"));
    }

    #[tokio::test]
    async fn test_advance_cursor_overrides_next_request() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(page_json("categories", vec![], true, "c1")).await;
        stub.push_response(page_json("categories", vec![], true, "c2")).await;
        let mut fetcher = fetcher(&stub);

        fetcher.get_page("", "", EntityType::Category).await.unwrap();
        fetcher.advance_cursor("manual");
        fetcher.get_page("", "", EntityType::Category).await.unwrap();

        assert!(stub.requests().await[1].query.contains(r#"after: "manual""#));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_state_unchanged() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(page_json("products", vec![product("A")], true, "c1")).await;
        stub.push_error(PickerError::RemoteQuery {
            status: Some(500),
            detail: "boom".to_string(),
        })
        .await;
        let mut fetcher = fetcher(&stub);

        fetcher.get_page("", "us", EntityType::Product).await.unwrap();
        let before = fetcher.page_state().clone();

        let err = fetcher.get_page("", "us", EntityType::Variant).await.unwrap_err();
        assert!(matches!(err, PickerError::RemoteQuery { status: Some(500), .. }));
        assert_eq!(fetcher.page_state(), &before);
    }

    #[tokio::test]
    async fn test_disabled_channel_filter_ignores_channel() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(page_json("products", vec![product("A")], false, "c1")).await;
        let mut fetcher =
            PaginatedFetcher::with_client(ApiClient::with_transport(stub.clone()), false);

        let page = fetcher.get_page("", "us", EntityType::Product).await.unwrap();

        let query = &stub.requests().await[0].query;
        assert!(!query.contains("channel:"));
        assert!(!query.contains("isPublished"));
        assert_eq!(TokenCodec::decode(&page.items[0].token).unwrap().channel, "");
    }

    #[tokio::test]
    async fn test_resolve_groups_lookups_and_keeps_token_order() {
        let token_a = TokenCodec::encode("A", EntityType::Product, "ch1");
        let token_b = TokenCodec::encode("B", EntityType::Product, "ch1");
        let token_c = TokenCodec::encode("C", EntityType::Category, "");

        // Upstream answers in its own order.
        let transport = Arc::new(
            RoutingTransport::default()
                .route(
                    "products",
                    page_json("products", vec![product("B"), product("A")], false, "x"),
                )
                .route("categories", page_json("categories", vec![category("C")], false, "y")),
        );
        let fetcher =
            PaginatedFetcher::with_client(ApiClient::with_transport(transport.clone()), true);

        let items = fetcher
            .resolve_by_tokens(&[token_a.clone(), token_b.clone(), token_c.clone()])
            .await
            .unwrap();

        let tokens: Vec<_> = items.iter().map(|item| item.token.clone()).collect();
        assert_eq!(tokens, [token_a, token_b, token_c]);

        let requests = transport.requests.lock().await;
        assert_eq!(requests.len(), 2);
        let product_query = requests
            .iter()
            .find(|request| request.query.starts_with("{ products("))
            .unwrap();
        assert!(product_query.query.contains("\"A\""));
        assert!(product_query.query.contains("\"B\""));
        assert!(!product_query.query.contains("channel:"));
    }

    #[tokio::test]
    async fn test_resolve_skips_malformed_and_missing_tokens() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(page_json(
            "productVariants",
            vec![json!({ "id": "V1", "name": "v", "media": [] })],
            false,
            "x",
        ))
        .await;
        let fetcher = fetcher(&stub);

        let tokens = vec![
            TokenCodec::encode("V1", EntityType::Variant, "us"),
            "{not json".to_string(),
        ];
        let items = fetcher.resolve_by_tokens(&tokens).await.unwrap();
        assert_eq!(items.len(), tokens.len() - 1);
        assert_eq!(items[0].token, tokens[0]);

        // V2 was deleted upstream: the lookup returns nothing for it.
        stub.push_response(page_json("productVariants", vec![], false, "x")).await;
        let items = fetcher
            .resolve_by_tokens(&[TokenCodec::encode("V2", EntityType::Variant, "us")])
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_same_id_in_two_channels_resolves_separately() {
        let transport = Arc::new(
            RoutingTransport::default()
                .route("products", page_json("products", vec![product("A")], false, "x")),
        );
        let fetcher =
            PaginatedFetcher::with_client(ApiClient::with_transport(transport.clone()), true);
        let tokens = [
            TokenCodec::encode("A", EntityType::Product, "us"),
            TokenCodec::encode("A", EntityType::Product, "eu"),
        ];

        let items = fetcher.resolve_by_tokens(&tokens).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].token, tokens[0]);
        assert_eq!(items[1].token, tokens[1]);
        assert_eq!(transport.requests.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_propagates_remote_failure() {
        let stub = Arc::new(StubTransport::default());
        let fetcher = fetcher(&stub);

        let err = fetcher
            .resolve_by_tokens(&[TokenCodec::encode("A", EntityType::Product, "")])
            .await
            .unwrap_err();
        assert!(matches!(err, PickerError::RemoteQuery { .. }));
    }

    #[test]
    fn test_resolve_without_valid_tokens_makes_no_request() {
        let stub = Arc::new(StubTransport::default());
        let fetcher = fetcher(&stub);

        let items = tokio_test::block_on(fetcher.resolve_by_tokens(&["garbage", ""])).unwrap();
        assert!(items.is_empty());
        assert!(tokio_test::block_on(stub.requests()).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_channels_passes_through() {
        let stub = Arc::new(StubTransport::default());
        stub.push_response(json!({ "channels": [{ "slug": "us", "name": "US" }] })).await;
        let fetcher = fetcher(&stub);

        let channels = fetcher.fetch_channels().await.unwrap();
        assert_eq!(channels, vec![Channel { slug: "us".to_string(), name: "US".to_string() }]);
    }
}
