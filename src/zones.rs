//! Zone Index
//!
//! Pure helpers mapping an ordered collection onto tiers and flattening it
//! into header/data rows for a virtualized grid. Positions are 1-based
//! ranks into the whole collection, never reset per zone.

use crate::models::Zone;

/// Items of one zone, with the rank of the first item
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneGroup<T> {
    pub zone: Zone,
    pub start_position: usize,
    pub items: Vec<T>,
}

/// A render unit of the virtualized list
#[derive(Debug, Clone, PartialEq)]
pub enum VirtualRow<T> {
    Header {
        zone: Zone,
        items: Vec<T>,
    },
    Items {
        items: Vec<T>,
        /// Rank of `items[0]`
        start_position: usize,
        color: String,
    },
}

impl<T> VirtualRow<T> {
    /// Whether this is a data row holding the given 1-based position
    pub fn contains_position(&self, position: usize) -> bool {
        match self {
            VirtualRow::Header { .. } => false,
            VirtualRow::Items { items, start_position, .. } => {
                position >= *start_position && position < start_position + items.len()
            }
        }
    }
}

/// First zone, in ascending `start` order, containing `position`.
///
/// Gaps between zones are legal and yield `None`. Unsorted input is
/// tolerated; the lowest matching `start` wins.
pub fn zone_for_position(position: usize, zones: &[Zone]) -> Option<&Zone> {
    let mut best: Option<&Zone> = None;
    for zone in zones.iter().filter(|zone| zone.contains(position)) {
        match best {
            Some(current) if current.start() <= zone.start() => {}
            _ => best = Some(zone),
        }
    }
    best
}

/// Slice `items` per zone; zones that select nothing are omitted.
///
/// Bounds are clamped to the collection, so an `end` past the last item (or
/// a non-positive `start`) never panics.
pub fn group_by_zones<T: Clone>(items: &[T], zones: &[Zone]) -> Vec<ZoneGroup<T>> {
    let len = items.len() as i64;
    let mut groups = Vec::new();
    for zone in zones {
        let start = zone.start().saturating_sub(1).clamp(0, len);
        let end = zone.end().unwrap_or(len).clamp(0, len);
        if start >= end {
            continue;
        }
        groups.push(ZoneGroup {
            zone: zone.clone(),
            start_position: start as usize + 1,
            items: items[start as usize..end as usize].to_vec(),
        });
    }
    groups
}

/// One header per group, then `ceil(len / column_count)` data rows.
///
/// `column_count` below 1 is treated as 1.
pub fn build_virtual_rows<T: Clone>(groups: &[ZoneGroup<T>], column_count: usize) -> Vec<VirtualRow<T>> {
    let columns = column_count.max(1);
    let mut rows = Vec::new();
    for group in groups {
        rows.push(VirtualRow::Header {
            zone: group.zone.clone(),
            items: group.items.clone(),
        });
        for (row_offset, chunk) in group.items.chunks(columns).enumerate() {
            rows.push(VirtualRow::Items {
                items: chunk.to_vec(),
                start_position: group.start_position + row_offset * columns,
                color: group.zone.color.clone(),
            });
        }
    }
    rows
}
