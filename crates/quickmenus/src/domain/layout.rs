//! Radial slot assignment for marking menu items.

use crate::domain::errors::{QuickMenusError, Result};
use crate::domain::model::RadialPosition;

use RadialPosition::{E, N, S, W};

/// Most items a single marking menu can hold: the eight slots plus the overflow list.
pub const MAX_MENU_ITEMS: i64 = 256;

/// Hand-picked layouts that keep small menus evenly spread around the cursor.
const SPARSE_LAYOUTS: [&[RadialPosition]; 5] = [&[], &[N], &[N, S], &[N, E, W], &[N, E, S, W]];

/// Return one radial slot per item.
///
/// Counts below five use a sparse symmetric layout. Larger counts walk the compass clockwise from
/// north; items past the eighth get `None` and belong in the overflow list. Negative counts and
/// counts above [`MAX_MENU_ITEMS`] are rejected.
pub fn radial_positions(count: i64) -> Result<Vec<Option<RadialPosition>>> {
    if count < 0 {
        return Err(QuickMenusError::invalid_argument(format!(
            "item count cannot be negative (got {count})"
        )));
    }

    if count > MAX_MENU_ITEMS {
        return Err(QuickMenusError::invalid_argument(format!(
            "item count {count} exceeds the menu limit of {MAX_MENU_ITEMS}"
        )));
    }

    let count = count as usize;
    if let Some(sparse) = SPARSE_LAYOUTS.get(count) {
        return Ok(sparse.iter().copied().map(Some).collect());
    }

    Ok((0..count)
        .map(|index| RadialPosition::ALL.get(index).copied())
        .collect())
}

/// First slot in clockwise order that is not already taken.
pub fn first_free_position<I>(used: I) -> Option<RadialPosition>
where
    I: IntoIterator<Item = RadialPosition>,
{
    let used: Vec<RadialPosition> = used.into_iter().collect();
    RadialPosition::ALL
        .into_iter()
        .find(|position| !used.contains(position))
}
