//! Ordered-collection container with a single mutation entry point.

use crate::selection;

/// Items with a stable string identity.
pub trait Keyed {
    fn id(&self) -> &str;
}

#[derive(Debug)]
pub enum StoreAction<T> {
    /// A fetch started; front-ends show a skeleton list.
    LoadStarted,
    /// Replace the collection with freshly fetched items.
    Loaded(Vec<T>),
    /// Explicit user pick, or `None` to clear.
    Select(Option<String>),
    /// Create/update completion: replace by id, or append.
    Upserted(T),
    /// Delete completion. Removal only; re-selection is the caller's job.
    Removed(String),
}

/// Holds the ordered items, the current selection, and the loading flag.
/// All mutation flows through [`Store::dispatch`], which re-establishes the
/// default-selection invariant after every action.
pub struct Store<T> {
    items: Vec<T>,
    selected: Option<String>,
    loading: bool,
}

impl<T: Keyed> Store<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            loading: false,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&T> {
        let id = self.selected.as_deref()?;
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn dispatch(&mut self, action: StoreAction<T>) {
        match action {
            StoreAction::LoadStarted => self.loading = true,
            StoreAction::Loaded(items) => {
                self.items = items;
                self.loading = false;
                // A selection that no longer exists must not dangle across a refresh.
                if let Some(id) = &self.selected {
                    if !self.items.iter().any(|item| item.id() == *id) {
                        self.selected = None;
                    }
                }
            }
            StoreAction::Select(id) => self.selected = id,
            StoreAction::Upserted(item) => {
                if let Some(existing) = self.items.iter_mut().find(|i| i.id() == item.id()) {
                    *existing = item;
                } else {
                    self.items.push(item);
                }
            }
            StoreAction::Removed(id) => self.items.retain(|item| item.id() != id),
        }
        self.selected =
            selection::ensure_default_selection(&self.items, self.selected.as_deref());
    }

    /// Clears the loading flag without touching the collection, for fetches
    /// that failed before producing items.
    pub fn end_loading(&mut self) {
        self.loading = false;
    }
}

impl<T: Keyed> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}
