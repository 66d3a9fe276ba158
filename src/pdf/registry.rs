//! Page views of the current document, keyed by page number
//!
//! Pages are materialized asynchronously and arrive in any order; iteration
//! is always ascending by page number.

use std::collections::BTreeMap;
use std::collections::btree_map;

use super::types::RenderingState;
use super::visibility::CanvasPlacement;

/// A page of the current document and its drawing state
#[derive(Debug)]
pub struct PageView<S> {
    page_number: u32,
    pub render_state: RenderingState,
    pub surface: S,
    /// Where the last finished draw was placed
    pub placement: Option<CanvasPlacement>,
}

impl<S> PageView<S> {
    /// New view for a 1-based `page_number`, nothing drawn yet
    pub fn new(page_number: u32, surface: S) -> Self {
        Self {
            page_number,
            render_state: RenderingState::Initial,
            surface,
            placement: None,
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn is_finished(&self) -> bool {
        self.render_state == RenderingState::Finished
    }

    /// Forget drawing progress, the next render pass draws from scratch
    pub fn invalidate(&mut self) {
        self.render_state = RenderingState::Initial;
        self.placement = None;
    }
}

/// Ordered map of page number to page view
#[derive(Debug)]
pub struct PageRegistry<S> {
    views: BTreeMap<u32, PageView<S>>,
}

impl<S> Default for PageRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> PageRegistry<S> {
    pub fn new() -> Self {
        Self {
            views: BTreeMap::new(),
        }
    }

    /// Insert or replace the view for its page number. Returns the replaced view.
    pub fn put(&mut self, view: PageView<S>) -> Option<PageView<S>> {
        self.views.insert(view.page_number, view)
    }

    pub fn get(&self, page_number: u32) -> Option<&PageView<S>> {
        self.views.get(&page_number)
    }

    pub fn get_mut(&mut self, page_number: u32) -> Option<&mut PageView<S>> {
        self.views.get_mut(&page_number)
    }

    pub fn remove(&mut self, page_number: u32) -> Option<PageView<S>> {
        self.views.remove(&page_number)
    }

    pub fn contains(&self, page_number: u32) -> bool {
        self.views.contains_key(&page_number)
    }

    /// Views in ascending page order
    pub fn values(&self) -> btree_map::Values<'_, u32, PageView<S>> {
        self.views.values()
    }

    pub fn values_mut(&mut self) -> btree_map::ValuesMut<'_, u32, PageView<S>> {
        self.views.values_mut()
    }

    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.views.keys().copied()
    }

    /// Remove all views, yielding them in page order so the caller can
    /// release their resources
    pub fn drain(&mut self) -> impl Iterator<Item = PageView<S>> {
        std::mem::take(&mut self.views).into_values()
    }

    pub fn clear(&mut self) {
        self.views.clear();
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_ordered_regardless_of_insertion_order() {
        let mut registry = PageRegistry::new();
        for page in [3, 1, 2] {
            registry.put(PageView::new(page, format!("surface-{page}")));
        }

        let pages: Vec<u32> = registry.values().map(PageView::page_number).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn put_overwrites_same_page() {
        let mut registry = PageRegistry::new();
        assert!(registry.put(PageView::new(1, "old")).is_none());
        let replaced = registry.put(PageView::new(1, "new"));

        assert_eq!(replaced.map(|view| view.surface), Some("old"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(1).map(|view| view.surface), Some("new"));
    }

    #[test]
    fn missing_pages_are_absent() {
        let mut registry: PageRegistry<()> = PageRegistry::new();
        registry.put(PageView::new(2, ()));
        assert!(registry.get(1).is_none());
        assert!(registry.get_mut(3).is_none());
        assert!(registry.contains(2));
    }

    #[test]
    fn drain_empties_in_page_order() {
        let mut registry = PageRegistry::new();
        for page in [5, 4] {
            registry.put(PageView::new(page, page * 10));
        }

        let drained: Vec<u32> = registry.drain().map(|view| view.surface).collect();
        assert_eq!(drained, vec![40, 50]);
        assert!(registry.is_empty());
    }

    #[test]
    fn new_views_start_initial() {
        let view = PageView::new(7, ());
        assert_eq!(view.render_state, RenderingState::Initial);
        assert!(!view.is_finished());
    }
}
