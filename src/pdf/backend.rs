//! Collaborators the viewer drives: document backend, page surfaces, host
//!
//! Every asynchronous answer travels back as a message. The backend gets a
//! reply handle per request and answers through it whenever the work is done;
//! the viewer drains the messages in `poll()`. A reply handle dropped without
//! an answer reports a failure, so no request can stay pending forever.

use std::fmt;
use std::sync::Arc;

use flume::Sender;
use log::{error, warn};

use super::request::{DrawError, TaskId, TransportError};
use super::types::{Rect, Rotation, Size};
use super::visibility::CanvasPlacement;

/// Localized message keys the viewer asks the host for
pub mod message_keys {
    /// Args: transport error
    pub const DOCUMENT_FAILURE: &str = "pdf.failure.document";
    /// Args: page number, transport error
    pub const PAGE_GET_FAILURE: &str = "pdf.failure.page_get";
    /// Args: page number, render error
    pub const PAGE_RENDER_FAILURE: &str = "pdf.failure.page_render";
}

/// A fetched page of an opened document
pub trait PageHandle {
    /// Page size at scale 1, in document units
    fn intrinsic_size(&self) -> Size;
}

/// Drawing target for one page
pub trait PageSurface {
    type Page: PageHandle;

    /// Attach a (new) page to draw
    fn set_page(&mut self, page: Self::Page);

    /// Reconfigure geometry before the next draw. Drops anything drawn so far.
    fn update(&mut self, scale: f32, rotation: Option<Rotation>);

    /// Start drawing. Progress is reported through `reply`.
    fn draw(&mut self, reply: DrawReply);

    /// Continue a paused draw
    fn resume(&mut self);

    /// Position of the page in the scroll content
    fn bounds(&self) -> Rect;

    /// Size of the drawn canvas
    fn canvas_size(&self) -> Size;

    fn place(&mut self, placement: CanvasPlacement);

    fn scroll_into_view(&mut self);

    /// Release drawing resources. An unfinished draw reports cancellation.
    fn destroy(&mut self);
}

/// Document bytes, or where to get them
#[derive(Clone, PartialEq, Eq)]
pub enum DocumentData {
    Url(String),
    Bytes(Arc<[u8]>),
}

impl fmt::Debug for DocumentData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentData::Url(url) => f.debug_tuple("Url").field(url).finish(),
            DocumentData::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// Resolves a document URL into something the backend can open.
///
/// Must return the same bytes for the same URL, task de-duplication relies on it.
pub trait DataSource {
    fn load(&mut self, url: &str) -> Result<DocumentData, TransportError>;
}

/// Hands the URL to the backend untouched
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThrough;

impl DataSource for PassThrough {
    fn load(&mut self, url: &str) -> Result<DocumentData, TransportError> {
        Ok(DocumentData::Url(url.to_string()))
    }
}

/// Parses documents and creates page surfaces
pub trait DocumentBackend {
    type Page: PageHandle;
    type Surface: PageSurface<Page = Self::Page>;

    /// Open a document, replacing the previously opened one
    fn open(&mut self, data: DocumentData, reply: DocumentReply<Self::Page>);

    /// Fetch a 1-based page of the opened document
    fn fetch_page(&mut self, page_number: u32, reply: PageReply<Self::Page>);

    fn create_surface(&mut self, page_number: u32, page: Self::Page, scale: f32) -> Self::Surface;

    /// Size of the scroll container
    fn container_size(&self) -> Size;

    /// Currently visible part of the scroll content
    fn viewport(&self) -> Rect;
}

/// Embedding application services
pub trait Host {
    /// Show an error to the user
    fn alert_error(&mut self, message: &str);

    fn log_error(&mut self, message: &str) {
        error!("{message}");
    }

    /// Localized text for `key`
    fn text(&self, key: &str, args: &[String]) -> String {
        if args.is_empty() {
            key.to_string()
        } else {
            format!("{key}: {}", args.join(", "))
        }
    }
}

/// Loader messages, tagged with the task that asked for them
#[derive(Debug)]
pub enum LoaderEvent<P> {
    Opened {
        task: TaskId,
        total_pages: u32,
    },
    OpenFailed {
        task: TaskId,
        error: TransportError,
    },
    Page {
        task: TaskId,
        page_number: u32,
        page: P,
    },
    PageFailed {
        task: TaskId,
        page_number: u32,
        error: TransportError,
    },
}

impl<P> LoaderEvent<P> {
    pub fn task(&self) -> TaskId {
        match self {
            LoaderEvent::Opened { task, .. }
            | LoaderEvent::OpenFailed { task, .. }
            | LoaderEvent::Page { task, .. }
            | LoaderEvent::PageFailed { task, .. } => *task,
        }
    }
}

/// Answer slot for [`DocumentBackend::open`]
pub struct DocumentReply<P> {
    task: TaskId,
    tx: Option<Sender<LoaderEvent<P>>>,
}

impl<P> DocumentReply<P> {
    pub(crate) fn new(task: TaskId, tx: Sender<LoaderEvent<P>>) -> Self {
        Self { task, tx: Some(tx) }
    }

    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn opened(mut self, total_pages: u32) {
        let task = self.task;
        self.send(LoaderEvent::Opened { task, total_pages });
    }

    pub fn failed(mut self, error: TransportError) {
        let task = self.task;
        self.send(LoaderEvent::OpenFailed { task, error });
    }

    fn send(&mut self, event: LoaderEvent<P>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(event);
        }
    }
}

impl<P> Drop for DocumentReply<P> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!("Document reply for {} dropped unanswered", self.task);
            let task = self.task;
            self.send(LoaderEvent::OpenFailed {
                task,
                error: TransportError::generic("document request dropped"),
            });
        }
    }
}

impl<P> fmt::Debug for DocumentReply<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentReply").field("task", &self.task).finish()
    }
}

/// Answer slot for [`DocumentBackend::fetch_page`]
pub struct PageReply<P> {
    task: TaskId,
    page_number: u32,
    tx: Option<Sender<LoaderEvent<P>>>,
}

impl<P> PageReply<P> {
    pub(crate) fn new(task: TaskId, page_number: u32, tx: Sender<LoaderEvent<P>>) -> Self {
        Self {
            task,
            page_number,
            tx: Some(tx),
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn resolve(mut self, page: P) {
        let (task, page_number) = (self.task, self.page_number);
        self.send(LoaderEvent::Page {
            task,
            page_number,
            page,
        });
    }

    pub fn failed(mut self, error: TransportError) {
        let (task, page_number) = (self.task, self.page_number);
        self.send(LoaderEvent::PageFailed {
            task,
            page_number,
            error,
        });
    }

    fn send(&mut self, event: LoaderEvent<P>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(event);
        }
    }
}

impl<P> Drop for PageReply<P> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!("Page {} reply for {} dropped unanswered", self.page_number, self.task);
            let (task, page_number) = (self.task, self.page_number);
            self.send(LoaderEvent::PageFailed {
                task,
                page_number,
                error: TransportError::generic("page request dropped"),
            });
        }
    }
}

impl<P> fmt::Debug for PageReply<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageReply")
            .field("task", &self.task)
            .field("page_number", &self.page_number)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawEventKind {
    Paused,
    Resumed,
    Finished,
    Failed(DrawError),
}

/// Draw progress of one page, tagged with the document generation it belongs to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawEvent {
    pub generation: u64,
    pub page_number: u32,
    pub kind: DrawEventKind,
}

/// Progress channel handed to [`PageSurface::draw`].
///
/// `paused`/`resumed` may be reported any number of times; `finished` and
/// `failed` end the draw. Dropping the reply before that reports
/// [`DrawError::Cancelled`].
#[derive(Debug)]
pub struct DrawReply {
    generation: u64,
    page_number: u32,
    tx: Option<Sender<DrawEvent>>,
}

impl DrawReply {
    pub(crate) fn new(generation: u64, page_number: u32, tx: Sender<DrawEvent>) -> Self {
        Self {
            generation,
            page_number,
            tx: Some(tx),
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn paused(&self) {
        self.emit(DrawEventKind::Paused);
    }

    pub fn resumed(&self) {
        self.emit(DrawEventKind::Resumed);
    }

    pub fn finished(mut self) {
        self.emit(DrawEventKind::Finished);
        self.tx = None;
    }

    pub fn failed(mut self, error: DrawError) {
        self.emit(DrawEventKind::Failed(error));
        self.tx = None;
    }

    fn emit(&self, kind: DrawEventKind) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(DrawEvent {
                generation: self.generation,
                page_number: self.page_number,
                kind,
            });
        }
    }
}

impl Drop for DrawReply {
    fn drop(&mut self) {
        if self.tx.is_some() {
            self.emit(DrawEventKind::Failed(DrawError::Cancelled));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_page_reply_reports_failure() {
        let (tx, rx) = flume::unbounded::<LoaderEvent<()>>();
        drop(PageReply::new(TaskId::new(4), 2, tx));

        match rx.try_recv() {
            Ok(LoaderEvent::PageFailed { task, page_number, .. }) => {
                assert_eq!(task, TaskId::new(4));
                assert_eq!(page_number, 2);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn answered_reply_sends_once() {
        let (tx, rx) = flume::unbounded::<LoaderEvent<()>>();
        DocumentReply::new(TaskId::new(1), tx).opened(3);

        assert!(matches!(rx.try_recv(), Ok(LoaderEvent::Opened { total_pages: 3, .. })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn draw_reply_reports_progress_then_end() {
        let (tx, rx) = flume::unbounded();
        let reply = DrawReply::new(7, 1, tx);
        reply.paused();
        reply.resumed();
        reply.finished();

        let kinds: Vec<DrawEventKind> = rx.try_iter().map(|event| event.kind).collect();
        assert_eq!(
            kinds,
            vec![DrawEventKind::Paused, DrawEventKind::Resumed, DrawEventKind::Finished]
        );
    }

    #[test]
    fn dropped_draw_reply_is_cancelled() {
        let (tx, rx) = flume::unbounded();
        drop(DrawReply::new(2, 5, tx));

        let event = rx.try_recv().ok();
        assert_eq!(
            event,
            Some(DrawEvent {
                generation: 2,
                page_number: 5,
                kind: DrawEventKind::Failed(DrawError::Cancelled),
            })
        );
    }

    #[test]
    fn default_text_lists_args() {
        struct Silent;
        impl Host for Silent {
            fn alert_error(&mut self, _message: &str) {}
        }

        assert_eq!(Silent.text("key", &[]), "key");
        assert_eq!(
            Silent.text(message_keys::PAGE_GET_FAILURE, &["3".into(), "timeout".into()]),
            "pdf.failure.page_get: 3, timeout"
        );
    }
}
