//! Visibility-driven render scheduling
//!
//! Decides for each visible (or about to become visible) page whether to
//! start, resume or skip drawing, and tracks draw progress reported by the
//! page surfaces. Progress events carry the document generation they were
//! started under; events from a replaced document are dropped.

use std::time::Duration;

use flume::{Receiver, Sender};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::backend::{DrawEvent, DrawEventKind, DrawReply, Host, PageSurface, message_keys};
use super::busy::{BusyGate, Clock, DEFAULT_CALM_DOWN};
use super::registry::{PageRegistry, PageView};
use super::request::DrawError;
use super::types::{RenderingState, Size};
use super::visibility::{CanvasPlacement, ScrollState, VisibleRange};

/// Visible percent a page must exceed to become the current page
pub const DEFAULT_CURRENT_PAGE_THRESHOLD: u32 = 75;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub current_page_threshold: u32,
    #[serde(with = "millis")]
    pub calm_down: Duration,
    /// Draw the page adjacent to the visible range in scroll direction
    pub prefetch: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            current_page_threshold: DEFAULT_CURRENT_PAGE_THRESHOLD,
            calm_down: DEFAULT_CALM_DOWN,
            prefetch: true,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

pub type PageReadyListener = Box<dyn FnMut(u32)>;

pub struct RenderScheduler {
    config: SchedulerConfig,
    generation: u64,
    /// Document being drawn, for error reports
    document_url: Option<String>,
    current_page: u32,
    busy: BusyGate,
    draw_tx: Sender<DrawEvent>,
    draw_rx: Receiver<DrawEvent>,
    page_ready: Vec<PageReadyListener>,
}

impl RenderScheduler {
    pub fn new(config: SchedulerConfig, clock: impl Clock + 'static) -> Self {
        let (draw_tx, draw_rx) = flume::unbounded();
        Self {
            config,
            generation: 0,
            document_url: None,
            current_page: 0,
            busy: BusyGate::new(clock, config.calm_down),
            draw_tx,
            draw_rx,
            page_ready: Vec::new(),
        }
    }

    /// Start drawing a new document state. Draws started before are not
    /// tracked anymore.
    pub fn begin_generation(&mut self, document_url: &str) -> u64 {
        self.generation += 1;
        self.document_url = Some(document_url.to_string());
        self.busy.reset();
        debug!("Render generation {} for {document_url}", self.generation);
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start, resume or skip drawing a page depending on its state.
    /// Returns true when the surface was asked to do something.
    pub fn render_page<S: PageSurface>(&mut self, view: &mut PageView<S>) -> bool {
        match view.render_state {
            RenderingState::Finished | RenderingState::Running => false,
            RenderingState::Paused => {
                view.surface.resume();
                true
            }
            RenderingState::Initial => {
                let reply = DrawReply::new(self.generation, view.page_number(), self.draw_tx.clone());
                view.render_state = RenderingState::Running;
                self.busy.start();
                view.surface.draw(reply);
                true
            }
        }
    }

    /// Render what is visible, update the current page and prefetch the
    /// page adjacent to the visible range in scroll direction.
    pub fn update<S: PageSurface>(
        &mut self,
        visible: &VisibleRange,
        scroll: ScrollState,
        registry: &mut PageRegistry<S>,
    ) -> u32 {
        for page in &visible.views {
            if let Some(view) = registry.get_mut(page.page) {
                self.render_page(view);
            }
        }

        if let Some(page) = visible
            .views
            .iter()
            .filter(|view| view.percent > self.config.current_page_threshold)
            .map(|view| view.page)
            .min()
        {
            self.current_page = page;
        }

        if self.config.prefetch {
            let adjacent = if scroll.down {
                visible.last.page.checked_add(1)
            } else {
                visible.first.page.checked_sub(1)
            };
            if let Some(page) = adjacent {
                if let Some(view) = registry.get_mut(page).filter(|view| !view.is_finished()) {
                    debug!("Prefetching page {page}");
                    self.render_page(view);
                }
            }
        }

        self.current_page
    }

    /// Apply draw progress reported since the last call. Returns the number
    /// of events applied.
    pub fn poll<S: PageSurface>(
        &mut self,
        registry: &mut PageRegistry<S>,
        container: Size,
        host: &mut dyn Host,
    ) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.draw_rx.try_recv() {
            if event.generation != self.generation {
                debug!(
                    "Dropping draw event for page {} of generation {}",
                    event.page_number, event.generation
                );
                continue;
            }
            let Some(view) = registry.get_mut(event.page_number) else {
                warn!("Draw event for unknown page {}", event.page_number);
                continue;
            };
            applied += 1;

            match event.kind {
                DrawEventKind::Paused => {
                    if view.render_state == RenderingState::Running {
                        view.render_state = RenderingState::Paused;
                    }
                }
                DrawEventKind::Resumed => {
                    if view.render_state == RenderingState::Paused {
                        view.render_state = RenderingState::Running;
                    }
                }
                DrawEventKind::Finished => {
                    view.render_state = RenderingState::Finished;
                    let placement = CanvasPlacement::compute(view.surface.canvas_size(), container);
                    view.surface.place(placement);
                    view.placement = Some(placement);
                    self.busy.stop();
                    for listener in &mut self.page_ready {
                        listener(event.page_number);
                    }
                }
                DrawEventKind::Failed(DrawError::Cancelled) => {
                    view.render_state = RenderingState::Initial;
                    self.busy.stop();
                }
                DrawEventKind::Failed(error) => {
                    view.render_state = RenderingState::Initial;
                    self.busy.stop();
                    let url = self.document_url.as_deref().unwrap_or("<unknown>");
                    host.log_error(&format!(
                        "Failed to render page {} from url={url}, got error: {error}",
                        event.page_number
                    ));
                    // nothing of the document made it to the screen
                    if self.busy.running() == 0 && !registry.values().any(PageView::is_finished) {
                        let message = host.text(
                            message_keys::PAGE_RENDER_FAILURE,
                            &[event.page_number.to_string(), error.to_string()],
                        );
                        host.alert_error(&message);
                    }
                }
            }
        }
        applied
    }

    pub fn add_page_ready_listener(&mut self, listener: impl FnMut(u32) + 'static) {
        self.page_ready.push(Box::new(listener));
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn set_current_page(&mut self, page: u32) {
        self.current_page = page;
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Mark non-draw work (document loading) as in progress
    pub fn start_busy(&mut self) {
        self.busy.start();
    }

    pub fn stop_busy(&mut self) {
        self.busy.stop();
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}
