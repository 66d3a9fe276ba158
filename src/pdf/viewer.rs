//! Document viewer - wires the task queue, page registry and render scheduler
//! to a document backend

use flume::{Receiver, Sender};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::backend::{
    DataSource, DocumentBackend, DocumentReply, Host, LoaderEvent, PageHandle, PageReply, PageSurface,
    message_keys,
};
use super::busy::Clock;
use super::queue::{ActiveTask, CompletionHandle, PullStrategy, PushOutcome, TaskQueue};
use super::registry::{PageRegistry, PageView};
use super::request::{DisplayRequest, DisplayTask, PageGeometry, TaskKind, TaskOutcome, TransportError};
use super::scheduler::{RenderScheduler, SchedulerConfig};
use super::state::{Command, Effect, ViewState};
use super::visibility::visible_pages;
use super::zoom::ZoomConfig;

/// Tunables of a [`PdfViewer`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewerConfig {
    pub zoom: ZoomConfig,
    pub scheduler: SchedulerConfig,
    pub pull_strategy: PullStrategy,
}

/// Snapshot of what the viewer shows, for status displays
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerStatus {
    pub document: Option<String>,
    pub current_page: u32,
    pub page_count: u32,
    pub zoom_percent: u32,
    pub pages_drawn: usize,
    pub pending_tasks: usize,
}

/// Display task being processed
struct InFlight {
    task: DisplayTask,
    handle: CompletionHandle,
    /// Pages requested but not settled yet
    pending_pages: u32,
    /// First user-visible failure while processing
    failure: Option<String>,
}

/// Shows paginated documents, drawing pages as they become visible
pub struct PdfViewer<B: DocumentBackend, D, H> {
    backend: B,
    data_source: D,
    host: H,
    state: ViewState,
    queue: TaskQueue,
    registry: PageRegistry<B::Surface>,
    scheduler: RenderScheduler,
    task_rx: Receiver<ActiveTask>,
    loader_tx: Sender<LoaderEvent<B::Page>>,
    loader_rx: Receiver<LoaderEvent<B::Page>>,
    current: Option<InFlight>,
    /// Page count of the document currently opened in the backend
    opened_pages: Option<u32>,
}

impl<B, D, H> PdfViewer<B, D, H>
where
    B: DocumentBackend,
    D: DataSource,
    H: Host,
{
    pub fn new(backend: B, data_source: D, host: H, config: ViewerConfig, clock: impl Clock + 'static) -> Self {
        let (task_tx, task_rx) = flume::unbounded();
        let (loader_tx, loader_rx) = flume::unbounded();
        let queue = TaskQueue::new(
            move |task: ActiveTask| {
                let _ = task_tx.send(task);
            },
            config.pull_strategy,
        );

        Self {
            backend,
            data_source,
            host,
            state: ViewState::new(config.zoom),
            queue,
            registry: PageRegistry::new(),
            scheduler: RenderScheduler::new(config.scheduler, clock),
            task_rx,
            loader_tx,
            loader_rx,
            current: None,
            opened_pages: None,
        }
    }

    /// Queue a document state for display.
    ///
    /// Switching to another target drops everything queued for the previous
    /// one, including the task in progress.
    pub fn show(&mut self, request: DisplayRequest) -> PushOutcome {
        let switches_target = self
            .queue
            .latest()
            .is_some_and(|latest| latest.document.target_id != request.document.target_id);
        if switches_target {
            info!("Switching to target {}", request.document.target_id);
            self.queue.clear();
            if self.current.take().is_some() {
                self.scheduler.stop_busy();
            }
        }
        self.queue.push(request)
    }

    /// Apply a command to the view state
    pub fn apply_command(&mut self, cmd: Command) {
        if matches!(cmd, Command::Wheel { .. }) && self.scheduler.is_busy() {
            debug!("Ignoring wheel while rendering");
            return;
        }
        let effects = self.state.apply(cmd);
        self.execute_effects(effects);
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Redisplay { resize } => self.redisplay(resize),

                Effect::ScrollToPage(page) => {
                    if let Some(view) = self.registry.get_mut(page) {
                        view.surface.scroll_into_view();
                    }
                    self.scheduler.set_current_page(page);
                    self.update_visible();
                }

                Effect::UpdateVisible => self.update_visible(),
            }
        }
    }

    /// Show the most recent document state again with the current zoom and
    /// container geometry
    fn redisplay(&mut self, resize: bool) {
        let Some(latest) = self.queue.latest() else {
            return;
        };
        let container = self.backend.container_size();
        let geometry = PageGeometry::new(container.width, container.height, self.state.zoom.descriptor());
        let mut request = DisplayRequest::new(latest.document.clone(), geometry);
        if resize {
            request = request.resize();
        }
        self.queue.push(request);
    }

    /// Process everything that happened since the last call: queue
    /// completions, loader replies and draw progress. Returns the number of
    /// messages handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let mut progressed = self.queue.pump();

            while let Ok(active) = self.task_rx.try_recv() {
                self.start_task(active);
                progressed += 1;
            }

            while let Ok(event) = self.loader_rx.try_recv() {
                self.on_loader_event(event);
                progressed += 1;
            }

            let container = self.backend.container_size();
            progressed += self.scheduler.poll(&mut self.registry, container, &mut self.host);

            if progressed == 0 {
                break;
            }
            handled += progressed;
        }
        self.sync_canvas_fits();
        handled
    }

    fn start_task(&mut self, active: ActiveTask) {
        let ActiveTask { task, handle } = active;
        info!("Processing {} ({}) for {}", task.id, task.kind.as_str(), task.document.url);

        match task.kind {
            TaskKind::FreshLoad { rebuild } => {
                if rebuild {
                    self.destroy_views();
                    self.state.current_page = 1;
                }
                self.opened_pages = None;
                self.state.zoom.on_geometry_change();
            }
            TaskKind::ResizeOnly => self.state.zoom.on_geometry_change(),
            TaskKind::ZoomOnly => {}
        }
        self.scheduler.begin_generation(&task.document.url);
        self.scheduler.start_busy();

        let id = task.id;
        let url = task.document.url.clone();
        self.current = Some(InFlight {
            task,
            handle,
            pending_pages: 0,
            failure: None,
        });

        match self.opened_pages {
            Some(total_pages) => self.fetch_pages(total_pages),
            None => match self.data_source.load(&url) {
                Ok(data) => self.backend.open(data, DocumentReply::new(id, self.loader_tx.clone())),
                Err(error) => self.document_failed(error),
            },
        }
    }

    fn on_loader_event(&mut self, event: LoaderEvent<B::Page>) {
        let Some(current) = &self.current else {
            debug!("Ignoring loader event of {} with no task in progress", event.task());
            return;
        };
        if event.task() != current.task.id {
            debug!("Ignoring loader event of stale {}", event.task());
            return;
        }

        match event {
            LoaderEvent::Opened { total_pages, .. } => {
                self.opened_pages = Some(total_pages);
                self.fetch_pages(total_pages);
            }
            LoaderEvent::OpenFailed { error, .. } => self.document_failed(error),
            LoaderEvent::Page { page_number, page, .. } => {
                self.attach_page(page_number, page);
                self.settle_page();
            }
            LoaderEvent::PageFailed { page_number, error, .. } => {
                self.page_failed(page_number, error);
                self.settle_page();
            }
        }
    }

    fn fetch_pages(&mut self, total_pages: u32) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        current.handle.set_total_pages(total_pages);
        current.pending_pages = total_pages;
        let id = current.task.id;

        let extra: Vec<u32> = self
            .registry
            .page_numbers()
            .filter(|&page| page > total_pages)
            .collect();
        for page in extra {
            if let Some(mut view) = self.registry.remove(page) {
                view.surface.destroy();
            }
        }

        if total_pages == 0 {
            self.finish_task();
            return;
        }
        for page_number in 1..=total_pages {
            self.backend
                .fetch_page(page_number, PageReply::new(id, page_number, self.loader_tx.clone()));
        }
    }

    fn attach_page(&mut self, page_number: u32, page: B::Page) {
        let container = self.backend.container_size();
        let scale = self.state.zoom.factor(page.intrinsic_size(), container);

        match self.registry.get_mut(page_number) {
            Some(view) => {
                view.surface.update(scale, None);
                view.surface.set_page(page);
                view.invalidate();
            }
            None => {
                let surface = self.backend.create_surface(page_number, page, scale);
                self.registry.put(PageView::new(page_number, surface));
            }
        }
    }

    fn settle_page(&mut self) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        current.pending_pages = current.pending_pages.saturating_sub(1);
        if current.pending_pages == 0 {
            self.finish_task();
        }
    }

    fn document_failed(&mut self, error: TransportError) {
        let Some(url) = self.current.as_ref().map(|c| c.task.document.url.clone()) else {
            return;
        };
        self.host
            .log_error(&format!("Failed to fetch url={url}, got error: {error}"));
        let message = self
            .host
            .text(message_keys::DOCUMENT_FAILURE, &[error.to_string()]);
        self.record_failure(message);
        self.finish_task();
    }

    fn page_failed(&mut self, page_number: u32, error: TransportError) {
        let Some(url) = self.current.as_ref().map(|c| c.task.document.url.clone()) else {
            return;
        };
        self.host.log_error(&format!(
            "Failed to fetch page {page_number} from url={url}, got error: {error}"
        ));
        // whatever the view holds belongs to an earlier document state
        if let Some(mut view) = self.registry.remove(page_number) {
            view.surface.destroy();
        }
        let message = self.host.text(
            message_keys::PAGE_GET_FAILURE,
            &[page_number.to_string(), error.to_string()],
        );
        self.record_failure(message);
    }

    fn record_failure(&mut self, message: String) {
        if let Some(current) = self.current.as_mut() {
            current.failure.get_or_insert(message);
        }
    }

    fn finish_task(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        self.scheduler.stop_busy();

        let outcome = match current.failure {
            Some(message) => {
                // a queued follow-up task supersedes the failed one
                if self.queue.len() <= 1 {
                    self.host.alert_error(&message);
                }
                TaskOutcome::Failed { message }
            }
            None => TaskOutcome::Completed,
        };

        self.state.has_document = self.opened_pages.is_some();
        self.state.page_count = self.opened_pages.unwrap_or(0);
        self.state.current_page = if self.state.page_count == 0 {
            0
        } else {
            self.state.current_page.clamp(1, self.state.page_count)
        };
        self.scheduler.set_current_page(self.state.current_page);

        debug!("Finished {} with {:?}", current.task.id, outcome);
        current.handle.complete(outcome);
        self.update_visible();
    }

    fn update_visible(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        let viewport = self.backend.viewport();
        let pages = self
            .registry
            .values()
            .map(|view| (view.page_number(), view.surface.bounds()));
        let Some(visible) = visible_pages(viewport, pages) else {
            return;
        };
        self.state.current_page = self
            .scheduler
            .update(&visible, self.state.scroll(), &mut self.registry);
        self.sync_canvas_fits();
    }

    fn sync_canvas_fits(&mut self) {
        self.state.canvas_fits = self
            .registry
            .get(self.state.current_page)
            .and_then(|view| view.placement)
            .is_some_and(|placement| placement.shadow);
    }

    fn destroy_views(&mut self) {
        for mut view in self.registry.drain() {
            view.surface.destroy();
        }
    }

    /// Drop all pages and queued work
    pub fn reset(&mut self) {
        self.destroy_views();
        self.queue.clear();
        if self.current.take().is_some() {
            self.scheduler.stop_busy();
        }
        self.opened_pages = None;
        self.state.has_document = false;
        self.state.page_count = 0;
        self.state.current_page = 0;
    }

    pub fn add_page_ready_listener(&mut self, listener: impl FnMut(u32) + 'static) {
        self.scheduler.add_page_ready_listener(listener);
    }

    pub fn zoom_percent(&self) -> u32 {
        self.state.zoom.current_percent()
    }

    pub fn preset_scales(&self) -> &[f32] {
        self.state.zoom.presets()
    }

    pub fn current_page(&self) -> u32 {
        self.state.current_page
    }

    pub fn page_count(&self) -> u32 {
        self.state.page_count
    }

    /// Rendering in progress or calming down after it
    pub fn is_busy(&self) -> bool {
        self.scheduler.is_busy()
    }

    /// At least one page is drawn
    pub fn is_shown(&self) -> bool {
        self.registry.values().any(PageView::is_finished)
    }

    pub fn status(&self) -> ViewerStatus {
        ViewerStatus {
            document: self.queue.latest().map(|task| task.document.url.clone()),
            current_page: self.state.current_page,
            page_count: self.state.page_count,
            zoom_percent: self.zoom_percent(),
            pages_drawn: self.registry.values().filter(|view| view.is_finished()).count(),
            pending_tasks: self.queue.len(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn registry(&self) -> &PageRegistry<B::Surface> {
        &self.registry
    }

    pub fn last_completed(&self) -> Option<&DisplayTask> {
        self.queue.last_completed()
    }

    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}
