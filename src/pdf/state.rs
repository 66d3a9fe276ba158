//! Viewer state management

use super::visibility::{ScrollState, ScrollWatcher};
use super::wheel::{WheelStep, WheelThrottle};
use super::zoom::{Zoom, ZoomConfig, ZoomMode};

/// User-facing view state of the viewer
#[derive(Clone, Debug)]
pub struct ViewState {
    pub zoom: Zoom,

    /// Current page (1-based, 0 before anything was shown)
    pub current_page: u32,

    /// Page count of the last shown document
    pub page_count: u32,

    /// A display task has completed, so there is a document state to re-show
    pub has_document: bool,

    /// The current page's canvas fits the container, wheel pages instead of scrolling
    pub canvas_fits: bool,

    wheel: WheelThrottle,
    scroll: ScrollWatcher,
}

impl ViewState {
    #[must_use]
    pub fn new(zoom: ZoomConfig) -> Self {
        Self {
            zoom: Zoom::new(zoom),
            current_page: 0,
            page_count: 0,
            has_document: false,
            canvas_fits: false,
            wheel: WheelThrottle::new(),
            scroll: ScrollWatcher::new(),
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::Resize => {
                if self.has_document {
                    vec![Effect::Redisplay { resize: true }]
                } else {
                    vec![]
                }
            }

            Command::ZoomIn => {
                if self.has_document && self.zoom.zoom_in() {
                    vec![Effect::Redisplay { resize: false }]
                } else {
                    vec![]
                }
            }

            Command::ZoomOut => {
                if self.has_document && self.zoom.zoom_out() {
                    vec![Effect::Redisplay { resize: false }]
                } else {
                    vec![]
                }
            }

            Command::FitWidth => self.fit(ZoomMode::FitWidth),

            Command::FitPage => self.fit(ZoomMode::FitPage),

            Command::ZoomPreset(scale) => {
                self.zoom.set_preset(scale);
                self.redisplay()
            }

            Command::PageUp => {
                if self.current_page > 1 {
                    self.current_page -= 1;
                    vec![Effect::ScrollToPage(self.current_page)]
                } else {
                    vec![]
                }
            }

            Command::PageDown => {
                if self.current_page < self.page_count {
                    self.current_page += 1;
                    vec![Effect::ScrollToPage(self.current_page)]
                } else {
                    vec![]
                }
            }

            Command::GoToPage(page) => {
                if self.page_count == 0 {
                    return vec![];
                }
                let clamped = page.clamp(1, self.page_count);
                if self.current_page != clamped {
                    self.current_page = clamped;
                    vec![Effect::ScrollToPage(clamped)]
                } else {
                    vec![]
                }
            }

            Command::Scroll { offset } => {
                self.scroll.observe(offset);
                vec![Effect::UpdateVisible]
            }

            Command::Wheel {
                delta,
                zoom_modifier,
            } => {
                if zoom_modifier {
                    match self.wheel.process(delta) {
                        WheelStep::Backward => self.apply(Command::ZoomIn),
                        WheelStep::Forward => self.apply(Command::ZoomOut),
                        WheelStep::Absorbed => vec![],
                    }
                } else if self.canvas_fits {
                    match self.wheel.process(delta) {
                        WheelStep::Backward => self.apply(Command::PageUp),
                        WheelStep::Forward => self.apply(Command::PageDown),
                        WheelStep::Absorbed => vec![],
                    }
                } else {
                    vec![]
                }
            }
        }
    }

    fn fit(&mut self, mode: ZoomMode) -> Vec<Effect> {
        if self.zoom.set_fitting(mode) {
            self.redisplay()
        } else {
            vec![]
        }
    }

    fn redisplay(&self) -> Vec<Effect> {
        if self.has_document {
            vec![Effect::Redisplay { resize: false }]
        } else {
            vec![]
        }
    }

    #[must_use]
    pub fn scroll(&self) -> ScrollState {
        self.scroll.state()
    }

    #[must_use]
    pub fn wheel_threshold(&self) -> f32 {
        self.wheel.threshold()
    }
}

/// Commands that modify viewer state
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// The container changed size
    Resize,
    ZoomIn,
    ZoomOut,
    FitWidth,
    FitPage,
    /// Switch to a preset scale; unknown scales keep the zoom as is
    ZoomPreset(f32),
    PageUp,
    PageDown,
    /// Go to a 1-based page, clamped to the document
    GoToPage(u32),
    /// The container scrolled to a new vertical offset
    Scroll { offset: f32 },
    /// Normalized wheel delta, see [`super::wheel::normalize`]
    Wheel { delta: f32, zoom_modifier: bool },
}

/// Effects produced by state changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Show the last completed document again with the current zoom and geometry
    Redisplay { resize: bool },
    /// Bring a page into view
    ScrollToPage(u32),
    /// Recompute visible pages and schedule drawing
    UpdateVisible,
}
