pub mod test_helpers {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use crate::pdf::{
        Command, DisplayRequest, DocumentBackend, DocumentRef, ManualClock, PageGeometry, PassThrough, PdfViewer, PresetScales,
        PullStrategy, PushOutcome, Size, TaskOutcome, ViewerConfig,
    };
    use crate::sim::{RecordingHost, SimBackend, SimControl, SimDocument};

    pub const MAIN_TARGET: &str = "main";

    pub type SimViewer = PdfViewer<SimBackend, PassThrough, RecordingHost>;

    /// Builder for a viewer over the in-memory backend
    pub struct ViewerBuilder {
        container: Size,
        documents: Vec<(String, SimDocument)>,
        manual_loading: bool,
        manual_drawing: bool,
        config: ViewerConfig,
    }

    impl ViewerBuilder {
        pub fn new() -> Self {
            let config = ViewerConfig {
                pull_strategy: PullStrategy::Immediate,
                ..ViewerConfig::default()
            };
            Self {
                container: Size::new(800.0, 600.0),
                documents: Vec::new(),
                manual_loading: false,
                manual_drawing: false,
                config,
            }
        }

        pub fn container(mut self, width: f32, height: f32) -> Self {
            self.container = Size::new(width, height);
            self
        }

        /// Make a document of `pages` letter-sized pages available under `url`
        pub fn document(self, url: &str, pages: u32) -> Self {
            self.sim_document(url, SimDocument::new(pages))
        }

        pub fn sim_document(mut self, url: &str, document: SimDocument) -> Self {
            self.documents.push((url.to_string(), document));
            self
        }

        /// Hold loader replies until `control.resolve_all()`
        pub fn manual_loading(mut self) -> Self {
            self.manual_loading = true;
            self
        }

        /// Hold draws until finished through the control
        pub fn manual_drawing(mut self) -> Self {
            self.manual_drawing = true;
            self
        }

        pub fn presets(mut self, scales: &[f32]) -> Self {
            self.config.zoom.presets = PresetScales::new(scales.to_vec()).expect("valid presets");
            self
        }

        pub fn strategy(mut self, strategy: PullStrategy) -> Self {
            self.config.pull_strategy = strategy;
            self
        }

        pub fn threshold(mut self, percent: u32) -> Self {
            self.config.scheduler.current_page_threshold = percent;
            self
        }

        pub fn prefetch(mut self, prefetch: bool) -> Self {
            self.config.scheduler.prefetch = prefetch;
            self
        }

        pub fn build(self) -> ViewerFixture {
            let mut backend = SimBackend::new(self.container);
            for (url, document) in self.documents {
                backend = backend.with_document(url, document);
            }
            if self.manual_loading {
                backend = backend.manual_loading();
            }
            if self.manual_drawing {
                backend = backend.manual_drawing();
            }

            let control = backend.control();
            let clock = ManualClock::new();
            let calm_down = self.config.scheduler.calm_down;
            let viewer = PdfViewer::new(
                backend,
                PassThrough,
                RecordingHost::default(),
                self.config,
                clock.clone(),
            );

            ViewerFixture {
                viewer,
                control,
                clock,
                calm_down,
            }
        }
    }

    impl Default for ViewerBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    /// A viewer together with the handles that drive it
    pub struct ViewerFixture {
        pub viewer: SimViewer,
        pub control: SimControl,
        pub clock: ManualClock,
        calm_down: Duration,
    }

    impl ViewerFixture {
        /// Request for `url` on the main target with the current container
        /// and zoom
        pub fn request(&self, url: &str, modified_ts: i64) -> DisplayRequest {
            self.request_for(url, modified_ts, MAIN_TARGET)
        }

        pub fn request_for(&self, url: &str, modified_ts: i64, target: &str) -> DisplayRequest {
            let container = self.viewer.backend().container_size();
            let geometry = PageGeometry::new(
                container.width,
                container.height,
                self.viewer.state().zoom.descriptor(),
            );
            DisplayRequest::new(DocumentRef::new(url, modified_ts, target), geometry)
        }

        /// Show `url` and process everything that follows
        pub fn show(&mut self, url: &str, modified_ts: i64) -> PushOutcome {
            let request = self.request(url, modified_ts);
            let outcome = self.viewer.show(request);
            self.viewer.poll();
            outcome
        }

        pub fn show_target(&mut self, url: &str, modified_ts: i64, target: &str) -> PushOutcome {
            let request = self.request_for(url, modified_ts, target);
            let outcome = self.viewer.show(request);
            self.viewer.poll();
            outcome
        }

        /// Show `url` and collect the completion outcomes of the task
        pub fn show_recorded(&mut self, url: &str, modified_ts: i64) -> (PushOutcome, Rc<RefCell<Vec<TaskOutcome>>>) {
            let outcomes = Rc::new(RefCell::new(Vec::new()));
            let sink = outcomes.clone();
            let request = self
                .request(url, modified_ts)
                .on_complete(move |outcome| sink.borrow_mut().push(outcome.clone()));
            let outcome = self.viewer.show(request);
            self.viewer.poll();
            (outcome, outcomes)
        }

        pub fn command(&mut self, cmd: Command) {
            self.viewer.apply_command(cmd);
            self.viewer.poll();
        }

        /// Change the container size and tell the viewer
        pub fn resize(&mut self, width: f32, height: f32) {
            self.control.set_container(width, height);
            self.command(Command::Resize);
        }

        /// Scroll the container and tell the viewer
        pub fn scroll_to(&mut self, offset: f32) {
            self.control.scroll_to(offset);
            self.command(Command::Scroll { offset });
        }

        /// Answer held loader requests and process the replies
        pub fn resolve(&mut self) -> usize {
            let answered = self.control.resolve_all();
            self.viewer.poll();
            answered
        }

        /// Keep answering loader requests until none are left
        pub fn resolve_all(&mut self) -> usize {
            let mut answered = 0;
            loop {
                let round = self.resolve();
                if round == 0 {
                    return answered;
                }
                answered += round;
            }
        }

        pub fn finish_draws(&mut self) -> usize {
            let finished = self.control.finish_all_draws();
            self.viewer.poll();
            finished
        }

        /// Let the calm-down period after the last draw pass
        pub fn calm_down(&self) {
            self.clock.advance(self.calm_down + Duration::from_millis(1));
        }

        pub fn alerts(&self) -> &[String] {
            &self.viewer.host().alerts
        }

        pub fn errors(&self) -> &[String] {
            &self.viewer.host().errors
        }
    }
}
