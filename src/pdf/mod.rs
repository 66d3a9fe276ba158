//! Paginated document viewing infrastructure

pub mod backend;
mod busy;
mod cache;
mod queue;
mod registry;
mod request;
mod scheduler;
mod state;
mod types;
pub mod visibility;
pub mod wheel;
mod viewer;
mod zoom;

pub use backend::{
    DataSource, DocumentBackend, DocumentData, DocumentReply, DrawEvent, DrawEventKind, DrawReply, Host,
    LoaderEvent, PageHandle, PageReply, PageSurface, PassThrough,
};
pub use busy::{BusyGate, Clock, DEFAULT_CALM_DOWN, ManualClock, SystemClock};
pub use cache::{ByteCache, CachingDataSource, DEFAULT_CACHE_SIZE, Fetch, FileFetch};
pub use queue::{ActiveTask, CompletionHandle, PullStrategy, PushOutcome, TaskConsumer, TaskQueue};
pub use registry::{PageRegistry, PageView};
pub use request::{
    CompletionCallback, DisplayRequest, DisplayTask, DocumentRef, DrawError, PageGeometry, TaskId, TaskKind,
    TaskOutcome, TransportError,
};
pub use scheduler::{DEFAULT_CURRENT_PAGE_THRESHOLD, PageReadyListener, RenderScheduler, SchedulerConfig};
pub use state::{Command, Effect, ViewState};
pub use types::*;
pub use viewer::{PdfViewer, ViewerConfig, ViewerStatus};
pub use visibility::{CanvasPlacement, ScrollState, ScrollWatcher, VisiblePage, VisibleRange, visible_pages};
pub use wheel::{WheelStep, WheelThrottle};
pub use zoom::*;
