//! # saleor-sku-picker
//!
//! Fetch-and-map core behind a CMS field extension that picks Saleor
//! categories, collections, products and variants.
//!
//! ## Features
//!
//! - **Selection tokens** - Stable string encoding of (id, entity type, channel)
//! - **Entity queries** - One GraphQL query shape per entity type, 100 items per page
//! - **Normalization** - Every entity mapped onto a single [`PickableItem`]
//! - **Cursor pagination** - Filter-aware cursor reset and "load more" paging
//! - **Selection resolution** - Stored tokens grouped by type and channel, resolved in order
//!
//! ## Usage
//!
//! ```rust,no_run
//! use saleor_sku_picker::{ClientConfig, EntityType, PaginatedFetcher};
//!
//! # async fn example() -> saleor_sku_picker::Result<()> {
//! let config = ClientConfig::new("https://shop.example.com/graphql/", "secret");
//! let mut fetcher = PaginatedFetcher::new(config)?;
//!
//! let page = fetcher.get_page("shirt", "default-channel", EntityType::Product).await?;
//! let restored = fetcher.resolve_by_tokens(&[page.items[0].token.clone()]).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod fetcher;
pub mod grouping;
pub mod normalize;
pub mod query;
pub mod selection;
pub mod token;
pub mod types;

pub use client::{ApiClient, GraphqlRequest, GraphqlTransport, ReqwestGraphqlTransport};
pub use config::ClientConfig;
pub use fetcher::{PageState, PaginatedFetcher};
pub use grouping::{group_by_channel, partition, ChannelGroups, LookupBatch};
pub use normalize::normalize;
pub use query::{FetchParams, ITEMS_PER_PAGE};
pub use selection::{call_to_action, save_button_text, Noun, SelectionConstraints};
pub use token::{DecodedToken, TokenCodec};
pub use types::{Channel, EntityType, ItemsPage, PageInfo, Pagination, PickableItem, RawPage};

use thiserror::Error;

/// Picker errors
///
/// None of these are fatal: the presentation layer reports them and lets the
/// editor retry.
#[derive(Error, Debug)]
pub enum PickerError {
    #[error("Malformed selection token: {0}")]
    MalformedToken(String),

    #[error("Remote query failed{}: {detail}", status_suffix(.status))]
    RemoteQuery { status: Option<u16>, detail: String },

    #[error("Invalid selection: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PickerError {
    pub(crate) fn remote(detail: impl Into<String>) -> Self {
        Self::RemoteQuery {
            status: None,
            detail: detail.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

/// Result type for picker operations
pub type Result<T> = std::result::Result<T, PickerError>;
