//! In-memory document backend
//!
//! Documents are described by page count and page size, pages are stacked
//! vertically in one scroll container. Loader replies and draws complete
//! either right away or when driven through a [`SimControl`].

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::pdf::{
    CanvasPlacement, DEFAULT_UNIT_CONVERSION, DocumentBackend, DocumentData, DocumentReply, DrawError, DrawReply,
    Host, PageHandle, PageReply, PageSurface, Rect, Rotation, Size, TransportError, backend::message_keys,
};

/// Vertical space between pages
pub const PAGE_GAP: f32 = 10.0;

/// A scripted document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimDocument {
    pub pages: u32,
    #[serde(default = "default_page_width")]
    pub page_width: f32,
    #[serde(default = "default_page_height")]
    pub page_height: f32,
    /// Pages whose fetch fails
    #[serde(default)]
    pub failing_pages: Vec<u32>,
}

fn default_page_width() -> f32 {
    612.0
}

fn default_page_height() -> f32 {
    792.0
}

impl SimDocument {
    /// Document of `pages` US letter pages
    pub fn new(pages: u32) -> Self {
        Self {
            pages,
            page_width: default_page_width(),
            page_height: default_page_height(),
            failing_pages: Vec::new(),
        }
    }

    #[must_use]
    pub fn page_size(mut self, width: f32, height: f32) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    #[must_use]
    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing_pages.push(page);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimPage {
    pub number: u32,
    size: Size,
}

impl PageHandle for SimPage {
    fn intrinsic_size(&self) -> Size {
        self.size
    }
}

struct World {
    documents: HashMap<String, SimDocument>,
    opened: Option<SimDocument>,
    container: Size,
    scroll_top: f32,
    auto_resolve: bool,
    auto_draw: bool,
    pending_opens: VecDeque<(Result<SimDocument, TransportError>, DocumentReply<SimPage>)>,
    pending_pages: VecDeque<PageReply<SimPage>>,
    draws: BTreeMap<u32, DrawReply>,
    /// Displayed page sizes by page number
    layout: BTreeMap<u32, Size>,
    placements: BTreeMap<u32, CanvasPlacement>,
    draw_log: Vec<u32>,
    resume_log: Vec<u32>,
    destroyed: Vec<u32>,
    opens: usize,
}

impl World {
    fn bounds(&self, page: u32) -> Rect {
        let Some(size) = self.layout.get(&page) else {
            return Rect::default();
        };
        let top: f32 = self
            .layout
            .range(..page)
            .map(|(_, size)| size.height + PAGE_GAP)
            .sum();
        Rect::new(0.0, top, size.width, size.height)
    }

    fn answer_page(&self, reply: PageReply<SimPage>) {
        let page_number = reply.page_number();
        match &self.opened {
            Some(doc) if doc.failing_pages.contains(&page_number) => reply.failed(TransportError::Status(500)),
            Some(doc) if (1..=doc.pages).contains(&page_number) => reply.resolve(SimPage {
                number: page_number,
                size: Size::new(doc.page_width, doc.page_height),
            }),
            Some(_) => reply.failed(TransportError::generic(format!("no page {page_number}"))),
            None => reply.failed(TransportError::generic("no document opened")),
        }
    }
}

/// Document backend over an in-memory set of documents
pub struct SimBackend {
    world: Rc<RefCell<World>>,
}

impl SimBackend {
    pub fn new(container: Size) -> Self {
        Self {
            world: Rc::new(RefCell::new(World {
                documents: HashMap::new(),
                opened: None,
                container,
                scroll_top: 0.0,
                auto_resolve: true,
                auto_draw: true,
                pending_opens: VecDeque::new(),
                pending_pages: VecDeque::new(),
                draws: BTreeMap::new(),
                layout: BTreeMap::new(),
                placements: BTreeMap::new(),
                draw_log: Vec::new(),
                resume_log: Vec::new(),
                destroyed: Vec::new(),
                opens: 0,
            })),
        }
    }

    /// Make `document` available under `url`
    #[must_use]
    pub fn with_document(self, url: impl Into<String>, document: SimDocument) -> Self {
        self.world.borrow_mut().documents.insert(url.into(), document);
        self
    }

    /// Hold loader replies until [`SimControl::resolve_all`]
    #[must_use]
    pub fn manual_loading(self) -> Self {
        self.world.borrow_mut().auto_resolve = false;
        self
    }

    /// Hold draws until finished through the control
    #[must_use]
    pub fn manual_drawing(self) -> Self {
        self.world.borrow_mut().auto_draw = false;
        self
    }

    pub fn control(&self) -> SimControl {
        SimControl {
            world: self.world.clone(),
        }
    }

    fn resolve(&self, data: DocumentData) -> Result<SimDocument, TransportError> {
        match data {
            DocumentData::Url(url) => self
                .world
                .borrow()
                .documents
                .get(&url)
                .cloned()
                .ok_or(TransportError::Status(404)),
            DocumentData::Bytes(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| TransportError::generic(format!("malformed document: {e}"))),
        }
    }
}

impl DocumentBackend for SimBackend {
    type Page = SimPage;
    type Surface = SimSurface;

    fn open(&mut self, data: DocumentData, reply: DocumentReply<SimPage>) {
        let document = self.resolve(data);
        let mut world = self.world.borrow_mut();
        world.opens += 1;
        if world.auto_resolve {
            match document {
                Ok(doc) => {
                    let pages = doc.pages;
                    world.opened = Some(doc);
                    reply.opened(pages);
                }
                Err(error) => reply.failed(error),
            }
        } else {
            world.pending_opens.push_back((document, reply));
        }
    }

    fn fetch_page(&mut self, _page_number: u32, reply: PageReply<SimPage>) {
        let mut world = self.world.borrow_mut();
        if world.auto_resolve {
            world.answer_page(reply);
        } else {
            world.pending_pages.push_back(reply);
        }
    }

    fn create_surface(&mut self, page_number: u32, page: SimPage, scale: f32) -> SimSurface {
        let mut surface = SimSurface {
            world: self.world.clone(),
            page_number,
            page,
            scale,
        };
        surface.publish_layout();
        surface
    }

    fn container_size(&self) -> Size {
        self.world.borrow().container
    }

    fn viewport(&self) -> Rect {
        let world = self.world.borrow();
        Rect::new(0.0, world.scroll_top, world.container.width, world.container.height)
    }
}

/// Page surface of the in-memory backend
pub struct SimSurface {
    world: Rc<RefCell<World>>,
    page_number: u32,
    page: SimPage,
    scale: f32,
}

impl SimSurface {
    fn displayed_size(&self) -> Size {
        let factor = self.scale * DEFAULT_UNIT_CONVERSION;
        Size::new(self.page.size.width * factor, self.page.size.height * factor)
    }

    fn publish_layout(&mut self) {
        let size = self.displayed_size();
        self.world.borrow_mut().layout.insert(self.page_number, size);
    }

    /// Drop the draw in flight, which reports it as cancelled
    fn cancel_draw(&mut self) {
        let reply = self.world.borrow_mut().draws.remove(&self.page_number);
        drop(reply);
    }
}

impl PageSurface for SimSurface {
    type Page = SimPage;

    fn set_page(&mut self, page: SimPage) {
        self.page = page;
        self.publish_layout();
    }

    fn update(&mut self, scale: f32, _rotation: Option<Rotation>) {
        self.cancel_draw();
        self.scale = scale;
        self.publish_layout();
    }

    fn draw(&mut self, reply: DrawReply) {
        let mut world = self.world.borrow_mut();
        world.draw_log.push(self.page_number);
        if world.auto_draw {
            reply.finished();
        } else {
            world.draws.insert(self.page_number, reply);
        }
    }

    fn resume(&mut self) {
        let mut world = self.world.borrow_mut();
        world.resume_log.push(self.page_number);
        if let Some(reply) = world.draws.get(&self.page_number) {
            reply.resumed();
        }
    }

    fn bounds(&self) -> Rect {
        self.world.borrow().bounds(self.page_number)
    }

    fn canvas_size(&self) -> Size {
        self.displayed_size()
    }

    fn place(&mut self, placement: CanvasPlacement) {
        self.world.borrow_mut().placements.insert(self.page_number, placement);
    }

    fn scroll_into_view(&mut self) {
        let mut world = self.world.borrow_mut();
        world.scroll_top = world.bounds(self.page_number).y;
    }

    fn destroy(&mut self) {
        self.cancel_draw();
        let mut world = self.world.borrow_mut();
        world.layout.remove(&self.page_number);
        world.placements.remove(&self.page_number);
        world.destroyed.push(self.page_number);
    }
}

/// Drives and inspects a [`SimBackend`] from the outside
#[derive(Clone)]
pub struct SimControl {
    world: Rc<RefCell<World>>,
}

impl SimControl {
    /// Answer every held loader request. Returns how many were answered.
    pub fn resolve_all(&self) -> usize {
        let mut answered = 0;
        loop {
            let open = self.world.borrow_mut().pending_opens.pop_front();
            let Some((document, reply)) = open else {
                break;
            };
            match document {
                Ok(doc) => {
                    let pages = doc.pages;
                    self.world.borrow_mut().opened = Some(doc);
                    reply.opened(pages);
                }
                Err(error) => reply.failed(error),
            }
            answered += 1;
        }
        loop {
            let page = self.world.borrow_mut().pending_pages.pop_front();
            let Some(reply) = page else {
                break;
            };
            self.world.borrow().answer_page(reply);
            answered += 1;
        }
        answered
    }

    pub fn pending_requests(&self) -> usize {
        let world = self.world.borrow();
        world.pending_opens.len() + world.pending_pages.len()
    }

    pub fn finish_draw(&self, page: u32) -> bool {
        let reply = self.world.borrow_mut().draws.remove(&page);
        match reply {
            Some(reply) => {
                reply.finished();
                true
            }
            None => false,
        }
    }

    pub fn finish_all_draws(&self) -> usize {
        let replies = std::mem::take(&mut self.world.borrow_mut().draws);
        let count = replies.len();
        for reply in replies.into_values() {
            reply.finished();
        }
        count
    }

    pub fn pause_draw(&self, page: u32) -> bool {
        let world = self.world.borrow();
        match world.draws.get(&page) {
            Some(reply) => {
                reply.paused();
                true
            }
            None => false,
        }
    }

    pub fn fail_draw(&self, page: u32, error: DrawError) -> bool {
        let reply = self.world.borrow_mut().draws.remove(&page);
        match reply {
            Some(reply) => {
                reply.failed(error);
                true
            }
            None => false,
        }
    }

    pub fn set_container(&self, width: f32, height: f32) {
        self.world.borrow_mut().container = Size::new(width, height);
    }

    pub fn scroll_to(&self, offset: f32) {
        self.world.borrow_mut().scroll_top = offset;
    }

    pub fn scroll_top(&self) -> f32 {
        self.world.borrow().scroll_top
    }

    /// Pages in draw order, repeated draws included
    pub fn draw_log(&self) -> Vec<u32> {
        self.world.borrow().draw_log.clone()
    }

    pub fn resume_log(&self) -> Vec<u32> {
        self.world.borrow().resume_log.clone()
    }

    pub fn drawing(&self) -> Vec<u32> {
        self.world.borrow().draws.keys().copied().collect()
    }

    pub fn destroyed(&self) -> Vec<u32> {
        self.world.borrow().destroyed.clone()
    }

    pub fn placement(&self, page: u32) -> Option<CanvasPlacement> {
        self.world.borrow().placements.get(&page).copied()
    }

    pub fn page_bounds(&self, page: u32) -> Rect {
        self.world.borrow().bounds(page)
    }

    /// Number of documents opened so far
    pub fn opens(&self) -> usize {
        self.world.borrow().opens
    }
}

/// Host that logs and keeps every alert and error
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub alerts: Vec<String>,
    pub errors: Vec<String>,
}

impl Host for RecordingHost {
    fn alert_error(&mut self, message: &str) {
        warn!("Alert: {message}");
        self.alerts.push(message.to_string());
    }

    fn log_error(&mut self, message: &str) {
        error!("{message}");
        self.errors.push(message.to_string());
    }

    fn text(&self, key: &str, args: &[String]) -> String {
        let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or("?");
        match key {
            message_keys::DOCUMENT_FAILURE => format!("Could not load the document: {}", arg(0)),
            message_keys::PAGE_GET_FAILURE => format!("Could not load page {}: {}", arg(0), arg(1)),
            message_keys::PAGE_RENDER_FAILURE => format!("Could not render page {}: {}", arg(0), arg(1)),
            _ => {
                debug!("No text for {key}");
                format!("{key} {}", args.join(" "))
            }
        }
    }
}
