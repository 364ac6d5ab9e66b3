//! Search Resolver
//!
//! Name filter over the active ranking and the virtual row that holds a
//! chosen match, so the caller can scroll there and highlight it.

use crate::models::{Item, ItemId, Zone};
use crate::zones::{zone_for_position, VirtualRow};

/// Zone summary attached to a search hit
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneTag {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub item: Item,
    /// 1-based rank in the collection
    pub position: usize,
    pub zone: Option<ZoneTag>,
}

/// Row to scroll to, plus the item to highlight once there
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTarget {
    pub row_index: usize,
    pub item_id: ItemId,
}

/// Case-insensitive substring match on the display name.
///
/// A blank (or whitespace-only) query returns nothing rather than the whole
/// list. Otherwise the query is matched as typed, surrounding spaces included.
pub fn search(query: &str, items: &[Item], zones: &[Zone]) -> Vec<SearchResult> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.name.to_lowercase().contains(&needle))
        .map(|(index, item)| {
            let position = index + 1;
            SearchResult {
                item: item.clone(),
                position,
                zone: zone_for_position(position, zones).map(|zone| ZoneTag {
                    name: zone.name.clone(),
                    color: zone.color.clone(),
                }),
            }
        })
        .collect()
}

/// Locate the row holding `item_id`.
///
/// With `rows` (zone-grouped view) the data row covering the item's rank is
/// used, header rows included in the index. Without, the plain grid row is
/// `index / column_count`. `None` when the item is gone, or sits in a gap the
/// grouped view does not render.
pub fn resolve_scroll_target(
    item_id: &str,
    items: &[Item],
    column_count: usize,
    rows: Option<&[VirtualRow<Item>]>,
) -> Option<ScrollTarget> {
    let index = items.iter().position(|item| item.id == item_id)?;
    let row_index = match rows {
        Some(rows) => rows.iter().position(|row| row.contains_position(index + 1))?,
        None => index / column_count.max(1),
    };
    Some(ScrollTarget {
        row_index,
        item_id: item_id.to_string(),
    })
}
