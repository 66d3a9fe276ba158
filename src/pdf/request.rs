//! Display request and task types

use std::fmt;

use super::zoom::ZoomDescriptor;

/// Unique identifier for accepted display tasks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl TaskId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Which document a request shows
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    /// Where the document bytes come from
    pub url: String,
    /// Modification timestamp of the document behind `url`
    pub modified_ts: i64,
    /// Logical document id; distinct documents may share a URL slot
    pub target_id: String,
}

impl DocumentRef {
    pub fn new(url: impl Into<String>, modified_ts: i64, target_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            modified_ts,
            target_id: target_id.into(),
        }
    }

    /// Same bytes: url and timestamp match
    pub fn same_data(&self, other: &DocumentRef) -> bool {
        self.url == other.url && self.modified_ts == other.modified_ts
    }
}

/// Container size and zoom selection at the time of the request
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub zoom: ZoomDescriptor,
}

impl PageGeometry {
    #[must_use]
    pub const fn new(width: f32, height: f32, zoom: ZoomDescriptor) -> Self {
        Self {
            width,
            height,
            zoom,
        }
    }

    pub fn same_size(&self, other: &PageGeometry) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// How much of the view a task has to rebuild, resolved when the task is queued
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// New document data. `rebuild` drops all page views first, otherwise
    /// existing views are handed the new pages.
    FreshLoad { rebuild: bool },
    /// Same document, container geometry changed
    ResizeOnly,
    /// Same document and container, different zoom
    ZoomOnly,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::FreshLoad { rebuild: true } => "fresh-load(rebuild)",
            TaskKind::FreshLoad { rebuild: false } => "fresh-load",
            TaskKind::ResizeOnly => "resize",
            TaskKind::ZoomOnly => "zoom",
        }
    }
}

/// Final result reported to the requester
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    /// The document could not be shown; carries the user-visible message
    Failed { message: String },
    /// The worker dropped the task without reporting a result
    Abandoned,
}

impl TaskOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

pub type CompletionCallback = Box<dyn FnOnce(&TaskOutcome)>;

/// A request to show a document state
pub struct DisplayRequest {
    pub document: DocumentRef,
    pub geometry: PageGeometry,
    /// Set for re-layout requests caused by container resizes
    pub is_resize: bool,
    on_complete: Option<CompletionCallback>,
}

impl DisplayRequest {
    pub fn new(document: DocumentRef, geometry: PageGeometry) -> Self {
        Self {
            document,
            geometry,
            is_resize: false,
            on_complete: None,
        }
    }

    #[must_use]
    pub fn resize(mut self) -> Self {
        self.is_resize = true;
        self
    }

    /// Callback invoked exactly once when the accepted task completes.
    /// Never invoked when the request is coalesced.
    #[must_use]
    pub fn on_complete(mut self, callback: impl FnOnce(&TaskOutcome) + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub(crate) fn into_parts(self) -> (DocumentRef, PageGeometry, bool, Option<CompletionCallback>) {
        (self.document, self.geometry, self.is_resize, self.on_complete)
    }
}

impl fmt::Debug for DisplayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayRequest")
            .field("document", &self.document)
            .field("geometry", &self.geometry)
            .field("is_resize", &self.is_resize)
            .field("has_callback", &self.on_complete.is_some())
            .finish()
    }
}

/// Task data as owned by the queue and handed to the consumer
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayTask {
    pub id: TaskId,
    pub document: DocumentRef,
    pub geometry: PageGeometry,
    pub is_resize: bool,
    pub kind: TaskKind,
    /// Known once the document was opened
    pub total_pages: Option<u32>,
}

impl DisplayTask {
    /// Pushing `document`/`geometry` after this task would change nothing
    pub fn is_equivalent(&self, document: &DocumentRef, geometry: &PageGeometry, is_resize: bool) -> bool {
        if is_resize && !self.is_resize {
            return false;
        }
        self.document.same_data(document) && self.geometry == *geometry
    }

    /// Resolve what a new request needs relative to `reference`
    pub fn resolve_kind(
        reference: Option<&DisplayTask>,
        document: &DocumentRef,
        geometry: &PageGeometry,
        is_resize: bool,
    ) -> TaskKind {
        let Some(reference) = reference else {
            return TaskKind::FreshLoad { rebuild: true };
        };
        if reference.document.target_id != document.target_id {
            return TaskKind::FreshLoad { rebuild: true };
        }
        if !reference.document.same_data(document) {
            return TaskKind::FreshLoad { rebuild: false };
        }
        if is_resize || !reference.geometry.same_size(geometry) {
            TaskKind::ResizeOnly
        } else {
            TaskKind::ZoomOnly
        }
    }
}

/// Errors fetching the document or one of its pages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("{detail}")]
    Generic { detail: String },
}

impl TransportError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Errors reported by a page surface when drawing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    /// A newer document replaced the one being drawn; expected, not reported
    #[error("rendering cancelled")]
    Cancelled,

    #[error("{detail}")]
    Failed { detail: String },
}

impl DrawError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed { detail: msg.into() }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(url: &str, ts: i64, target: &str, width: f32) -> DisplayTask {
        DisplayTask {
            id: TaskId::new(1),
            document: DocumentRef::new(url, ts, target),
            geometry: PageGeometry::new(width, 600.0, ZoomDescriptor::FitPage),
            is_resize: false,
            kind: TaskKind::FreshLoad { rebuild: true },
            total_pages: None,
        }
    }

    #[test]
    fn equivalent_requires_same_data_and_geometry() {
        let last = task("/a.pdf", 100, "main", 800.0);
        let geometry = PageGeometry::new(800.0, 600.0, ZoomDescriptor::FitPage);

        assert!(last.is_equivalent(&DocumentRef::new("/a.pdf", 100, "main"), &geometry, false));
        assert!(!last.is_equivalent(&DocumentRef::new("/a.pdf", 101, "main"), &geometry, false));
        assert!(!last.is_equivalent(
            &DocumentRef::new("/a.pdf", 100, "main"),
            &PageGeometry::new(800.0, 600.0, ZoomDescriptor::Preset(3)),
            false
        ));
    }

    #[test]
    fn resize_request_is_not_equivalent_to_plain_task() {
        let last = task("/a.pdf", 100, "main", 800.0);
        let geometry = PageGeometry::new(800.0, 600.0, ZoomDescriptor::FitPage);
        let document = DocumentRef::new("/a.pdf", 100, "main");

        assert!(!last.is_equivalent(&document, &geometry, true));

        let mut resized = last.clone();
        resized.is_resize = true;
        assert!(resized.is_equivalent(&document, &geometry, true));
    }

    #[test]
    fn kind_resolution() {
        let last = task("/a.pdf", 100, "main", 800.0);
        let same = PageGeometry::new(800.0, 600.0, ZoomDescriptor::FitPage);
        let wider = PageGeometry::new(1000.0, 600.0, ZoomDescriptor::FitPage);
        let zoomed = PageGeometry::new(800.0, 600.0, ZoomDescriptor::Preset(2));

        assert_eq!(
            DisplayTask::resolve_kind(None, &last.document, &same, false),
            TaskKind::FreshLoad { rebuild: true }
        );
        assert_eq!(
            DisplayTask::resolve_kind(Some(&last), &DocumentRef::new("/a.pdf", 100, "other"), &same, false),
            TaskKind::FreshLoad { rebuild: true }
        );
        assert_eq!(
            DisplayTask::resolve_kind(Some(&last), &DocumentRef::new("/a.pdf", 200, "main"), &same, false),
            TaskKind::FreshLoad { rebuild: false }
        );
        assert_eq!(
            DisplayTask::resolve_kind(Some(&last), &last.document, &wider, false),
            TaskKind::ResizeOnly
        );
        assert_eq!(
            DisplayTask::resolve_kind(Some(&last), &last.document, &same, true),
            TaskKind::ResizeOnly
        );
        assert_eq!(
            DisplayTask::resolve_kind(Some(&last), &last.document, &zoomed, false),
            TaskKind::ZoomOnly
        );
    }

    #[test]
    fn cancelled_is_distinguished() {
        assert!(DrawError::Cancelled.is_cancelled());
        assert!(!DrawError::failed("boom").is_cancelled());
        assert_eq!(TransportError::Status(404).to_string(), "HTTP status 404");
    }
}
