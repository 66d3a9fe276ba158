//! Display task queue
//!
//! Serializes "show this document state" requests. Normally it holds a single
//! task which is handed to the consumer right away, but document loads,
//! container resizes and zoom changes may pile up while a task is being
//! processed. Requests that would not change anything relative to the most
//! recent task are dropped at push time.
//!
//! Completion is a message: the consumer gets a [`CompletionHandle`] and
//! reports through it; the queue picks the reports up in [`TaskQueue::pump`].

use std::collections::VecDeque;

use flume::{Receiver, Sender};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::request::{CompletionCallback, DisplayRequest, DisplayTask, TaskId, TaskOutcome};

/// When the next task is handed out after a push into an empty queue or
/// after a completion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullStrategy {
    /// Dispatch inside the call that made the task eligible
    Immediate,
    /// Dispatch on the next `pump()`
    #[default]
    Deferred,
}

/// Receives tasks from the queue, one at a time
pub trait TaskConsumer {
    fn consume(&mut self, task: ActiveTask);
}

impl<F> TaskConsumer for F
where
    F: FnMut(ActiveTask),
{
    fn consume(&mut self, task: ActiveTask) {
        self(task)
    }
}

/// A dispatched task together with the handle used to report its completion
#[derive(Debug)]
pub struct ActiveTask {
    pub task: DisplayTask,
    pub handle: CompletionHandle,
}

#[derive(Debug)]
struct Completion {
    id: TaskId,
    outcome: TaskOutcome,
    total_pages: Option<u32>,
}

/// One-shot completion channel for a dispatched task.
///
/// `complete` consumes the handle. Dropping it unreported completes the task
/// as [`TaskOutcome::Abandoned`].
#[derive(Debug)]
pub struct CompletionHandle {
    id: TaskId,
    total_pages: Option<u32>,
    tx: Option<Sender<Completion>>,
}

impl CompletionHandle {
    fn new(id: TaskId, tx: Sender<Completion>) -> Self {
        Self {
            id,
            total_pages: None,
            tx: Some(tx),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Page count to record on the task once it completes
    pub fn set_total_pages(&mut self, total_pages: u32) {
        self.total_pages = Some(total_pages);
    }

    pub fn complete(mut self, outcome: TaskOutcome) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: TaskOutcome) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Completion {
                id: self.id,
                outcome,
                total_pages: self.total_pages,
            });
        }
    }
}

impl Drop for CompletionHandle {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!("{} dropped without completion", self.id);
            self.send(TaskOutcome::Abandoned);
        }
    }
}

/// Result of [`TaskQueue::push`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    /// Equivalent to the most recent task; dropped without callback
    Coalesced,
    Queued(TaskId),
}

struct QueuedTask {
    task: DisplayTask,
    on_complete: Option<CompletionCallback>,
    dispatched: bool,
}

/// FIFO of display tasks with at most one task in flight
pub struct TaskQueue {
    tasks: VecDeque<QueuedTask>,
    /// Kept to skip requests which need no re-rendering
    last_completed: Option<DisplayTask>,
    consumer: Box<dyn TaskConsumer>,
    strategy: PullStrategy,
    pull_requested: bool,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    next_task_id: u64,
}

impl TaskQueue {
    pub fn new(consumer: impl TaskConsumer + 'static, strategy: PullStrategy) -> Self {
        let (completion_tx, completion_rx) = flume::unbounded();
        Self {
            tasks: VecDeque::new(),
            last_completed: None,
            consumer: Box::new(consumer),
            strategy,
            pull_requested: false,
            completion_tx,
            completion_rx,
            next_task_id: 1,
        }
    }

    /// Push a new display request.
    ///
    /// The reference for de-duplication is the newest pending task, or the
    /// last completed one when nothing is pending.
    pub fn push(&mut self, request: DisplayRequest) -> PushOutcome {
        let (document, geometry, is_resize, on_complete) = request.into_parts();

        let reference = self.latest();
        if let Some(last) = reference {
            if last.is_equivalent(&document, &geometry, is_resize) {
                debug!(
                    "Coalesced request for {} (ts={}, resize={is_resize})",
                    document.url, document.modified_ts
                );
                return PushOutcome::Coalesced;
            }
        }
        let kind = DisplayTask::resolve_kind(reference, &document, &geometry, is_resize);

        let id = TaskId::new(self.next_task_id);
        self.next_task_id += 1;
        debug!("Queued {id} {} for {}", kind.as_str(), document.url);

        let was_empty = self.tasks.is_empty();
        self.tasks.push_back(QueuedTask {
            task: DisplayTask {
                id,
                document,
                geometry,
                is_resize,
                kind,
                total_pages: None,
            },
            on_complete,
            dispatched: false,
        });
        if was_empty {
            self.schedule_pull();
        }
        PushOutcome::Queued(id)
    }

    /// Hand the head task to the consumer unless it is already in flight.
    ///
    /// # Panics
    ///
    /// Pulling an empty queue is a caller bug.
    pub fn pull(&mut self) {
        let Some(head) = self.tasks.front_mut() else {
            panic!("task queue is expected to be non-empty in pull()");
        };
        if head.dispatched {
            return;
        }
        head.dispatched = true;
        let active = ActiveTask {
            task: head.task.clone(),
            handle: CompletionHandle::new(head.task.id, self.completion_tx.clone()),
        };
        debug!("Dispatching {}", active.task.id);
        self.consumer.consume(active);
    }

    /// Process completion reports and deferred pulls. Returns the number of
    /// tasks completed.
    pub fn pump(&mut self) -> usize {
        if std::mem::take(&mut self.pull_requested) && !self.tasks.is_empty() {
            self.pull();
        }

        let mut completed = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self.finish(completion) {
                completed += 1;
            }
        }
        completed
    }

    fn finish(&mut self, completion: Completion) -> bool {
        let is_head = self
            .tasks
            .front()
            .is_some_and(|head| head.dispatched && head.task.id == completion.id);
        if !is_head {
            debug!("Ignoring completion of stale {}", completion.id);
            return false;
        }
        let Some(mut finished) = self.tasks.pop_front() else {
            return false;
        };

        if completion.total_pages.is_some() {
            finished.task.total_pages = completion.total_pages;
        }
        debug!("Completed {} with {:?}", finished.task.id, completion.outcome);
        if let Some(callback) = finished.on_complete.take() {
            callback(&completion.outcome);
        }
        self.last_completed = Some(finished.task);
        self.schedule_pull();
        true
    }

    fn schedule_pull(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        match self.strategy {
            PullStrategy::Immediate => self.pull(),
            PullStrategy::Deferred => self.pull_requested = true,
        }
    }

    /// Drop all pending tasks without invoking their callbacks and forget the
    /// last completed task.
    pub fn clear(&mut self) {
        if !self.tasks.is_empty() {
            debug!("Clearing {} pending task(s)", self.tasks.len());
        }
        self.tasks.clear();
        self.last_completed = None;
        self.pull_requested = false;
    }

    pub fn last_completed(&self) -> Option<&DisplayTask> {
        self.last_completed.as_ref()
    }

    /// Newest pending task, or the last completed one
    pub fn latest(&self) -> Option<&DisplayTask> {
        self.tasks
            .back()
            .map(|queued| &queued.task)
            .or(self.last_completed.as_ref())
    }

    /// Task currently handed to the consumer
    pub fn in_flight(&self) -> Option<TaskId> {
        self.tasks
            .front()
            .filter(|head| head.dispatched)
            .map(|head| head.task.id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// A task is pending or in flight
    pub fn is_busy(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn strategy(&self) -> PullStrategy {
        self.strategy
    }
}
