//! GraphQL query construction
//!
//! Each entity type is a distinct top-level field in the storefront schema and
//! the four fields differ in which filters they accept. Those differences live
//! in one [`EntityDescriptor`] per type; [`build_page_query`] is generic over
//! the descriptor.

use std::fmt::Write as _;

use async_graphql::{Name, Value};

use crate::types::EntityType;

/// Page size requested for every entity query
pub const ITEMS_PER_PAGE: usize = 100;

const PAGE_INFO_SELECTION: &str =
    "totalCount pageInfo { hasNextPage hasPreviousPage startCursor endCursor }";

pub const CHANNELS_QUERY: &str = "{ channels { slug name } }";

/// Where an entity keeps its preview image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// `backgroundImage { url }`, possibly null
    BackgroundImage,
    /// First element of `images`
    Images,
    /// First element of `media`
    Media,
}

/// Filter applied only when a channel is specified, hiding unpublished entities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishedGate {
    None,
    /// `isPublished: true`
    IsPublished,
    /// `published: PUBLISHED`
    PublishedEnum,
}

/// Query shape of one entity type
#[derive(Debug)]
pub struct EntityDescriptor {
    pub entity_type: EntityType,
    /// Top-level query field, also the key of the payload in `data`
    pub field: &'static str,
    pub node_selection: &'static str,
    /// Whether the field takes a `channel` argument
    pub channel_argument: bool,
    /// Whether ids go inside `filter` rather than as a top-level argument
    pub ids_in_filter: bool,
    pub published_gate: PublishedGate,
    pub image: ImageSource,
}

static CATEGORY: EntityDescriptor = EntityDescriptor {
    entity_type: EntityType::Category,
    field: "categories",
    node_selection: "id name backgroundImage { url }",
    channel_argument: false,
    ids_in_filter: true,
    published_gate: PublishedGate::None,
    image: ImageSource::BackgroundImage,
};

static COLLECTION: EntityDescriptor = EntityDescriptor {
    entity_type: EntityType::Collection,
    field: "collections",
    node_selection: "id name backgroundImage { url }",
    channel_argument: true,
    ids_in_filter: true,
    published_gate: PublishedGate::PublishedEnum,
    image: ImageSource::BackgroundImage,
};

static PRODUCT: EntityDescriptor = EntityDescriptor {
    entity_type: EntityType::Product,
    field: "products",
    node_selection: "id name images { url }",
    channel_argument: true,
    ids_in_filter: true,
    published_gate: PublishedGate::IsPublished,
    image: ImageSource::Images,
};

static VARIANT: EntityDescriptor = EntityDescriptor {
    entity_type: EntityType::Variant,
    field: "productVariants",
    node_selection: "id name media { url }",
    channel_argument: true,
    ids_in_filter: false,
    published_gate: PublishedGate::None,
    image: ImageSource::Media,
};

impl EntityType {
    pub fn descriptor(self) -> &'static EntityDescriptor {
        match self {
            EntityType::Category => &CATEGORY,
            EntityType::Collection => &COLLECTION,
            EntityType::Product => &PRODUCT,
            EntityType::Variant => &VARIANT,
        }
    }
}

/// Arguments of one entity page request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchParams {
    /// Restrict to these ids; empty means no id filter
    pub ids: Vec<String>,
    /// Channel slug; empty means not channel scoped
    pub channel: String,
    pub search: String,
    /// Cursor to continue after; empty starts from the first page
    pub after_cursor: String,
}

impl FetchParams {
    /// Parameters for a search page
    pub fn page(
        search: impl Into<String>,
        channel: impl Into<String>,
        after_cursor: impl Into<String>,
    ) -> Self {
        Self {
            ids: Vec::new(),
            channel: channel.into(),
            search: search.into(),
            after_cursor: after_cursor.into(),
        }
    }

    /// Parameters for an unscoped id lookup
    pub fn ids(ids: Vec<String>) -> Self {
        Self {
            ids,
            ..Self::default()
        }
    }
}

fn string_list(values: &[String]) -> Value {
    Value::List(values.iter().cloned().map(Value::String).collect())
}

fn filter_value(descriptor: &EntityDescriptor, params: &FetchParams) -> Option<Value> {
    let mut fields: Vec<(Name, Value)> = Vec::new();

    if !params.search.is_empty() {
        fields.push((Name::new("search"), Value::String(params.search.clone())));
    }
    if descriptor.ids_in_filter && !params.ids.is_empty() {
        fields.push((Name::new("ids"), string_list(&params.ids)));
    }
    if !params.channel.is_empty() {
        match descriptor.published_gate {
            PublishedGate::None => {}
            PublishedGate::IsPublished => {
                fields.push((Name::new("isPublished"), Value::Boolean(true)));
            }
            PublishedGate::PublishedEnum => {
                fields.push((Name::new("published"), Value::Enum(Name::new("PUBLISHED"))));
            }
        }
    }

    if fields.is_empty() {
        None
    } else {
        Some(Value::Object(fields.into_iter().collect()))
    }
}

/// Render the query document for one page of `entity_type`
pub fn build_page_query(entity_type: EntityType, params: &FetchParams) -> String {
    let descriptor = entity_type.descriptor();

    let mut arguments = vec![format!("first: {ITEMS_PER_PAGE}")];
    if !params.after_cursor.is_empty() {
        arguments.push(format!("after: {}", Value::String(params.after_cursor.clone())));
    }
    if descriptor.channel_argument && !params.channel.is_empty() {
        arguments.push(format!("channel: {}", Value::String(params.channel.clone())));
    }
    if !descriptor.ids_in_filter && !params.ids.is_empty() {
        arguments.push(format!("ids: {}", string_list(&params.ids)));
    }
    if let Some(filter) = filter_value(descriptor, params) {
        arguments.push(format!("filter: {filter}"));
    }

    let mut query = String::new();
    let _ = write!(
        query,
        "{{ {}({}) {{ {} edges {{ cursor node {{ {} }} }} }} }}",
        descriptor.field,
        arguments.join(", "),
        PAGE_INFO_SELECTION,
        descriptor.node_selection,
    );
    query
}
