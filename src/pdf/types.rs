//! Core geometry and state types shared by the viewer components

/// Width/height pair in CSS pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, negative or not a number
    #[must_use]
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    #[must_use]
    pub fn area(self) -> f32 {
        self.width * self.height
    }
}

/// Axis-aligned rectangle, origin at the top-left corner of the scroll content
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(self) -> f32 {
        self.y + self.height
    }

    #[must_use]
    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Width and height of the overlap with `other`, zero when disjoint
    #[must_use]
    pub fn overlap(self, other: Rect) -> Size {
        let width = (self.right().min(other.right()) - self.x.max(other.x)).max(0.0);
        let height = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0);
        Size::new(width, height)
    }
}

/// Drawing progress of a single page view.
///
/// Mirrors the states a page surface goes through: nothing drawn yet,
/// draw in flight, draw suspended by the surface, fully painted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderingState {
    #[default]
    Initial,
    Running,
    Paused,
    Finished,
}

impl RenderingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderingState::Initial => "initial",
            RenderingState::Running => "running",
            RenderingState::Paused => "paused",
            RenderingState::Finished => "finished",
        }
    }
}

/// Page rotation in clockwise quarter turns
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarters,
}

impl Rotation {
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarters => 270,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_of_disjoint_rects_is_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 5.0, 5.0);
        assert!(a.overlap(b).is_empty());
    }

    #[test]
    fn overlap_clips_to_both_rects() {
        let page = Rect::new(0.0, 100.0, 400.0, 300.0);
        let viewport = Rect::new(0.0, 250.0, 800.0, 600.0);
        assert_eq!(page.overlap(viewport), Size::new(400.0, 150.0));
    }

    #[test]
    fn nan_size_is_empty() {
        assert!(Size::new(f32::NAN, 10.0).is_empty());
        assert!(!Size::new(1.0, 1.0).is_empty());
    }
}
