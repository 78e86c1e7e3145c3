//! Display-order maintenance for sections within a form and fields
//! within a section.
//!
//! `order` values are unique and strictly increasing within their
//! parent scope at read time. Deletions leave gaps; nothing re-compacts
//! them, so consumers sort ascending and never assume contiguity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One `(child, new position)` pair in a bulk reorder request.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OrderUpdate {
    pub id: Uuid,
    pub order: i32,
}

/// Next append position for a scope: max existing + 1, or 0 when empty.
pub fn next_order<I>(existing: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    existing.into_iter().max().map(|max| max + 1).unwrap_or(0)
}

/// Converts a reorder request body into the pair list the store takes.
pub fn to_pairs(updates: &[OrderUpdate]) -> Vec<(Uuid, i32)> {
    updates.iter().map(|u| (u.id, u.order)).collect()
}
