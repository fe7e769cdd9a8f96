//! Grouping of decoded tokens into lookup batches

use std::collections::HashMap;

use crate::token::DecodedToken;
use crate::types::EntityType;

/// Tokens keyed by channel, channels in first-seen order
pub type ChannelGroups<'a> = Vec<(&'a str, Vec<&'a DecodedToken>)>;

/// Group tokens by channel. Order within each group follows input order.
pub fn group_by_channel<'a, I>(tokens: I) -> ChannelGroups<'a>
where
    I: IntoIterator<Item = &'a DecodedToken>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: ChannelGroups<'a> = Vec::new();

    for token in tokens {
        let slot = *index.entry(token.channel.as_str()).or_insert_with(|| {
            groups.push((token.channel.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(token);
    }

    groups
}

/// One id lookup: all ids of a single entity type within a single channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupBatch {
    pub entity_type: EntityType,
    pub channel: String,
    /// Distinct raw ids, first-seen order
    pub ids: Vec<String>,
}

/// Split tokens into one batch per (entity type, channel) pair.
///
/// Entity types appear in first-seen order, and channels in first-seen order
/// within each type.
pub fn partition<'a, I>(tokens: I) -> Vec<LookupBatch>
where
    I: IntoIterator<Item = &'a DecodedToken>,
{
    let mut by_type: Vec<(EntityType, Vec<&'a DecodedToken>)> = Vec::new();
    for token in tokens {
        match by_type.iter_mut().find(|(entity_type, _)| *entity_type == token.entity_type) {
            Some((_, group)) => group.push(token),
            None => by_type.push((token.entity_type, vec![token])),
        }
    }

    let mut batches = Vec::new();
    for (entity_type, tokens) in by_type {
        for (channel, tokens) in group_by_channel(tokens) {
            let mut ids: Vec<String> = Vec::with_capacity(tokens.len());
            for token in tokens {
                if !ids.contains(&token.raw_id) {
                    ids.push(token.raw_id.clone());
                }
            }
            batches.push(LookupBatch {
                entity_type,
                channel: channel.to_owned(),
                ids,
            });
        }
    }
    batches
}
