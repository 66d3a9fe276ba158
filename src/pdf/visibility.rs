//! Viewport tracking: which pages are visible and by how much, which way
//! the user scrolls, and where a drawn canvas sits inside its container.

use super::types::{Rect, Size};

/// A page intersecting the viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisiblePage {
    pub page: u32,
    /// Visible share of the page area, 0..=100
    pub percent: u32,
    pub x: f32,
    pub y: f32,
}

/// Pages intersecting the viewport.
///
/// `first` and `last` are in document order, `views` is sorted by visible
/// percent, highest first.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibleRange {
    pub first: VisiblePage,
    pub last: VisiblePage,
    pub views: Vec<VisiblePage>,
}

impl VisibleRange {
    pub fn contains(&self, page: u32) -> bool {
        self.views.iter().any(|view| view.page == page)
    }
}

/// Intersect each page with the viewport. `pages` must be in document order.
///
/// Returns `None` when no page is visible.
pub fn visible_pages(viewport: Rect, pages: impl IntoIterator<Item = (u32, Rect)>) -> Option<VisibleRange> {
    let mut views: Vec<VisiblePage> = pages
        .into_iter()
        .filter_map(|(page, bounds)| {
            let overlap = bounds.overlap(viewport);
            if bounds.size().is_empty() || overlap.is_empty() {
                return None;
            }
            let percent = (overlap.area() * 100.0 / bounds.size().area()).floor().clamp(0.0, 100.0) as u32;
            Some(VisiblePage {
                page,
                percent,
                x: bounds.x,
                y: bounds.y,
            })
        })
        .collect();

    let first = *views.first()?;
    let last = *views.last()?;
    views.sort_by(|a, b| b.percent.cmp(&a.percent).then(a.page.cmp(&b.page)));

    Some(VisibleRange { first, last, views })
}

/// Last observed scroll movement
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollState {
    pub down: bool,
    pub last_offset: f32,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            down: true,
            last_offset: 0.0,
        }
    }
}

/// Derives the scroll direction from successive vertical offsets
#[derive(Clone, Copy, Debug, Default)]
pub struct ScrollWatcher {
    state: ScrollState,
}

impl ScrollWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new offset. The direction only changes when the offset does.
    pub fn observe(&mut self, offset: f32) -> ScrollState {
        if offset != self.state.last_offset {
            self.state.down = offset > self.state.last_offset;
            self.state.last_offset = offset;
        }
        self.state
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }
}

/// Where a drawn canvas (and its text layer) goes inside the container
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CanvasPlacement {
    pub left: f32,
    pub top: f32,
    /// Canvas fits inside the container both ways and is drawn with a shadow
    pub shadow: bool,
}

impl CanvasPlacement {
    /// Center a canvas smaller than the container, pin it to the edge otherwise
    pub fn compute(canvas: Size, container: Size) -> Self {
        let fits_width = canvas.width < container.width;
        let fits_height = canvas.height < container.height;

        let left = if fits_width {
            container.width / 2.0 - canvas.width / 2.0
        } else {
            0.0
        };
        let top = if fits_height {
            container.height / 2.0 - canvas.height / 2.0
        } else {
            0.0
        };

        Self {
            left,
            top,
            shadow: fits_width && fits_height,
        }
    }
}
