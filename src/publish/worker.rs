//! Background publish
//!
//! Runs a [`Publisher`] on its own thread and turns the observer callbacks
//! into [`PublishEvent`]s on a channel, so a front-end can render progress
//! and request cancellation while the copy runs.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::error;

use super::{PublishObserver, PublishOptions, PublishOutcome, PublishRequest, PublishStats, Publisher};
use crate::engine::{CancellationToken, EngineError, WipeOutcome};
use crate::store::TagStore;
use crate::tags::Tag;

/// Progress of a running publish, in callback order
#[derive(Debug)]
pub enum PublishEvent {
    BeginTag(Tag),
    FileCompleted(PublishOutcome),
    FileDeleted(WipeOutcome),
    DirectoryDeleted(WipeOutcome),
    /// Always the last event of a job
    Finished(Result<PublishStats, EngineError>),
}

/// Forwards callbacks to a channel
struct ChannelObserver {
    tx: Sender<PublishEvent>,
}

impl ChannelObserver {
    fn send(&self, event: PublishEvent) {
        // A dropped receiver only means nobody is watching any more
        let _ = self.tx.send(event);
    }
}

impl PublishObserver for ChannelObserver {
    fn on_begin_tag(&mut self, tag: &Tag) {
        self.send(PublishEvent::BeginTag(tag.clone()));
    }

    fn on_file_completed(&mut self, outcome: &PublishOutcome) {
        self.send(PublishEvent::FileCompleted(outcome.clone()));
    }

    fn on_file_deleted(&mut self, outcome: &WipeOutcome) {
        self.send(PublishEvent::FileDeleted(outcome.clone()));
    }

    fn on_directory_deleted(&mut self, outcome: &WipeOutcome) {
        self.send(PublishEvent::DirectoryDeleted(outcome.clone()));
    }
}

/// Sends `Finished` when dropped unless a result was already sent
struct FinishGuard {
    tx: Sender<PublishEvent>,
    sent: bool,
}

impl FinishGuard {
    fn finish(mut self, result: Result<PublishStats, EngineError>) {
        self.sent = true;
        let _ = self.tx.send(PublishEvent::Finished(result));
    }
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        if !self.sent {
            error!("publish worker ended without a result");
            let _ = self.tx.send(PublishEvent::Finished(Err(EngineError::WorkerLost)));
        }
    }
}

/// A publish running on a dedicated thread
pub struct PublishJob {
    events: Receiver<PublishEvent>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PublishJob {
    /// Start publishing `store` according to `request`
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Io` if the worker thread cannot be spawned.
    pub fn spawn<S>(store: S, request: PublishRequest, options: PublishOptions) -> Result<Self, EngineError>
    where
        S: TagStore + Send + 'static,
    {
        let (tx, events) = mpsc::channel();
        let target = request.target_folder.clone();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = thread::Builder::new()
            .name("fanout-publish".to_string())
            .spawn(move || {
                let guard = FinishGuard {
                    tx: tx.clone(),
                    sent: false,
                };
                let mut observer = ChannelObserver { tx };
                let result = Publisher::new(options).publish(&store, &request, &mut observer, &token);
                guard.finish(result);
            })
            .map_err(|e| EngineError::io(target, e))?;

        Ok(Self {
            events,
            cancel,
            handle: Some(handle),
        })
    }

    /// Ask the worker to stop at its next poll point
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token shared with the worker, for wiring to e.g. a Ctrl-C handler
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Blocking iterator over events; ends after `Finished`
    pub fn events(&self) -> mpsc::Iter<'_, PublishEvent> {
        self.events.iter()
    }

    /// Drain all events and return the final result
    ///
    /// # Errors
    ///
    /// Returns the publish error, or `EngineError::WorkerLost` if the worker
    /// vanished without reporting.
    pub fn wait(mut self) -> Result<PublishStats, EngineError> {
        let mut result = Err(EngineError::WorkerLost);
        for event in self.events.iter() {
            if let PublishEvent::Finished(finished) = event {
                result = finished;
            }
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        result
    }
}

impl Drop for PublishJob {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel.cancel();
            let _ = handle.join();
        }
    }
}
