//! Entity types, wire shapes and picker-facing types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::query::ITEMS_PER_PAGE;

/// The closed set of pickable entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    Category,
    Collection,
    Product,
    Variant,
}

impl EntityType {
    /// All entity types, in the order the type selector lists them.
    pub const ALL: [EntityType; 4] = [
        EntityType::Category,
        EntityType::Collection,
        EntityType::Product,
        EntityType::Variant,
    ];

    /// Name used inside selection tokens and display labels
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Category => "Category",
            EntityType::Collection => "Collection",
            EntityType::Product => "Product",
            EntityType::Variant => "Variant",
        }
    }

    /// Label for the entity-type selector
    pub fn plural_label(self) -> &'static str {
        match self {
            EntityType::Category => "Categories",
            EntityType::Collection => "Collections",
            EntityType::Product => "Products",
            EntityType::Variant => "Variants",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = crate::PickerError;

    fn from_str(s: &str) -> crate::Result<Self> {
        EntityType::ALL
            .into_iter()
            .find(|entity_type| entity_type.as_str() == s)
            .ok_or_else(|| crate::PickerError::MalformedToken(format!("unknown entity type '{s}'")))
    }
}

/// Page information as returned by the storefront API
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    #[serde(default)]
    pub start_cursor: Option<String>,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// Edge in a connection
#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    #[serde(default)]
    pub cursor: Option<String>,
    pub node: T,
}

// The storefront schema marks list and count fields nullable; an explicit
// null reads the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Image {
    pub url: String,
}

/// One entity node.
///
/// All four entity queries deserialize into this shape; which image field is
/// populated depends on the entity type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub background_image: Option<Image>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Image>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub media: Vec<Image>,
}

/// Connection payload of a paginated entity query
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_count: u64,
    pub page_info: PageInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<Edge<RawNode>>,
}

/// Storefront channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub slug: String,
    pub name: String,
}

/// Canonical item handed to the presentation layer.
///
/// Serializes with the field names the host picker widget expects
/// (`sku`, `displaySKU`, `image`, `id`, `name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickableItem {
    #[serde(rename = "sku")]
    pub token: String,
    #[serde(rename = "displaySKU")]
    pub display_label: String,
    #[serde(rename = "image")]
    pub image_url: String,
    #[serde(rename = "id")]
    pub raw_id: String,
    pub name: String,
}

/// Pagination metadata for page controls.
///
/// API fields are passed through untouched; `offset` and `limit` always hold
/// the fixed page size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
    #[serde(rename = "total")]
    pub total_count: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

impl Pagination {
    pub fn from_page(total_count: u64, page_info: &PageInfo) -> Self {
        Self {
            offset: ITEMS_PER_PAGE,
            limit: ITEMS_PER_PAGE,
            total_count,
            has_next_page: page_info.has_next_page,
            has_previous_page: page_info.has_previous_page,
            start_cursor: page_info.start_cursor.clone(),
            end_cursor: page_info.end_cursor.clone(),
        }
    }
}

/// One normalized page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemsPage {
    #[serde(rename = "products")]
    pub items: Vec<PickableItem>,
    pub pagination: Pagination,
}
