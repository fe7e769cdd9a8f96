//! Mapping of raw entity nodes onto [`PickableItem`]

use crate::query::ImageSource;
use crate::token::TokenCodec;
use crate::types::{EntityType, PickableItem, RawNode, RawPage};

/// Normalize every node of `page`, preserving edge order.
///
/// `channel` is the channel of the call, not of the node; it is what ends up
/// in each item's token.
pub fn normalize(page: &RawPage, entity_type: EntityType, channel: &str) -> Vec<PickableItem> {
    page.edges
        .iter()
        .map(|edge| normalize_node(&edge.node, entity_type, channel))
        .collect()
}

pub fn normalize_node(node: &RawNode, entity_type: EntityType, channel: &str) -> PickableItem {
    PickableItem {
        token: TokenCodec::encode(&node.id, entity_type, channel),
        display_label: format!("{} ID: {}", entity_type.as_str(), node.id),
        image_url: image_url(node, entity_type.descriptor().image),
        raw_id: node.id.clone(),
        name: node.name.clone(),
    }
}

fn image_url(node: &RawNode, source: ImageSource) -> String {
    let image = match source {
        ImageSource::BackgroundImage => node.background_image.as_ref(),
        ImageSource::Images => node.images.first(),
        ImageSource::Media => node.media.first(),
    };
    image.map(|image| image.url.clone()).unwrap_or_default()
}
