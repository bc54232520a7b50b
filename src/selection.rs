//! Selection policy for an ordered collection: which item is "current",
//! and how that survives initial load and deletion.

use crate::store::Keyed;

/// Returns the selection after the default-selection rule is applied: the
/// first item becomes selected when nothing is, and an empty collection has
/// no selection. Idempotent.
pub fn ensure_default_selection<T: Keyed>(items: &[T], current: Option<&str>) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    match current {
        Some(id) => Some(id.to_string()),
        None => Some(items[0].id().to_string()),
    }
}

/// Returns the selection after `deleted_id` is removed from `items`.
///
/// `items` is the collection *before* removal. When the deleted item was the
/// selected one, the neighbor keeps focus near the user's last position: the
/// preceding item, or the new first item when the head was deleted. The
/// deleted-vs-selected check compares list positions, not ids.
pub fn selection_after_delete<T: Keyed>(
    items: &[T],
    selected: Option<&str>,
    deleted_id: &str,
) -> Option<String> {
    let deleted_idx = items.iter().position(|item| item.id() == deleted_id);
    let selected_idx = selected.and_then(|id| items.iter().position(|item| item.id() == id));

    if deleted_idx != selected_idx {
        // Deleted item was not the selected one; selection stands.
        return selected.map(str::to_string);
    }

    let deleted_idx = deleted_idx?;
    if items.len() > 1 {
        if deleted_idx == 0 {
            Some(items[1].id().to_string())
        } else {
            Some(items[deleted_idx - 1].id().to_string())
        }
    } else {
        None
    }
}
