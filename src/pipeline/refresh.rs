use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::InkpadError;

use super::request::{ApiResponse, Attempt};

pub type Outcome = Result<ApiResponse, InkpadError>;

/// What a refresh cycle hands to callers that asked for the token itself.
pub type RefreshOutcome = Result<String, Arc<InkpadError>>;

/// A request that failed authentication and waits for a fresh token.
#[derive(Debug)]
pub struct PendingRequest {
    pub attempt: Attempt,
    responder: oneshot::Sender<Outcome>,
}

impl PendingRequest {
    /// Pair an attempt with the receiver its caller will await.
    pub fn new(attempt: Attempt) -> (Self, oneshot::Receiver<Outcome>) {
        let (responder, rx) = oneshot::channel();
        (Self { attempt, responder }, rx)
    }

    /// Settle the caller. A caller that already went away is ignored.
    pub fn resolve(self, outcome: Outcome) {
        let _ = self.responder.send(outcome);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    Idle,
    Refreshing,
}

/// What the caller must do after handing its failed request to the state.
#[derive(Debug)]
pub enum Admission {
    /// No refresh was running; the caller owns the new refresh cycle and the
    /// request is its trigger.
    Start(PendingRequest),
    /// A refresh is in flight; the request waits at this queue position.
    Queued(usize),
}

/// Everything a settling refresh cycle owes an answer to.
#[derive(Debug, Default)]
pub struct Drained {
    /// Requests to replay (or reject), in arrival order.
    pub queue: VecDeque<PendingRequest>,
    /// Explicit refresh callers waiting for the token.
    pub watchers: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// `{status, queue}` for the single-flight refresh.
///
/// The queue is only non-empty while `Refreshing`; `settle` resets the status
/// and drains the queue in one step.
#[derive(Debug)]
pub struct RefreshState {
    status: RefreshStatus,
    queue: VecDeque<PendingRequest>,
    watchers: Vec<oneshot::Sender<RefreshOutcome>>,
}

impl Default for RefreshState {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshState {
    pub fn new() -> Self {
        Self {
            status: RefreshStatus::Idle,
            queue: VecDeque::new(),
            watchers: Vec::new(),
        }
    }

    pub fn status(&self) -> RefreshStatus {
        self.status
    }

    pub fn is_refreshing(&self) -> bool {
        self.status == RefreshStatus::Refreshing
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn admit(&mut self, pending: PendingRequest) -> Admission {
        match self.status {
            RefreshStatus::Idle => {
                self.status = RefreshStatus::Refreshing;
                Admission::Start(pending)
            }
            RefreshStatus::Refreshing => {
                self.queue.push_back(pending);
                Admission::Queued(self.queue.len())
            }
        }
    }

    /// Register a caller that wants the next token without a request to
    /// replay. Returns `true` when no refresh was running and the caller must
    /// start one.
    pub fn watch(&mut self, watcher: oneshot::Sender<RefreshOutcome>) -> bool {
        self.watchers.push(watcher);
        match self.status {
            RefreshStatus::Idle => {
                self.status = RefreshStatus::Refreshing;
                true
            }
            RefreshStatus::Refreshing => false,
        }
    }

    /// Return to `Idle` and hand back every queued request in arrival order,
    /// along with the token watchers.
    pub fn settle(&mut self) -> Drained {
        self.status = RefreshStatus::Idle;
        Drained {
            queue: std::mem::take(&mut self.queue),
            watchers: std::mem::take(&mut self.watchers),
        }
    }
}
