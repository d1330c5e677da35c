#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(unreachable_pub, clippy::all, clippy::pedantic, clippy::nursery)]

//! Status and progress event stream for the conversion pipeline.
//!
//! The bus provides a typed event enum, sequential identifiers, and replay of
//! recent events for subscribers that attach late (a presentation layer that
//! mounts after engine initialisation started, for example). Internally it uses
//! `tokio::broadcast` with a bounded buffer; when the channel overflows the
//! oldest events are dropped, so publishers never wait on slow consumers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::{Receiver, Sender};
use uuid::Uuid;

/// Identifier assigned to each published event.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 256;

/// Phases a run passes through after it leaves `Idle`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Input bytes are being copied into the engine filesystem.
    Staging,
    /// The engine is executing the assembled command.
    Running,
    /// The engine finished; the filesystem is being diffed.
    Reconciling,
    /// Produced files are being read and bundled.
    Packaging,
}

impl RunPhase {
    /// Machine-friendly label for logs and consumers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staging => "staging",
            Self::Running => "running",
            Self::Reconciling => "reconciling",
            Self::Packaging => "packaging",
        }
    }
}

/// Typed events surfaced to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Engine runtime load started.
    EngineLoading,
    /// Engine runtime finished loading; operations are accepted.
    EngineReady,
    /// Engine runtime failed to load.
    EngineFailed {
        /// Rendered failure description.
        message: String,
    },
    /// A run left `Idle`.
    RunStarted {
        /// Identifier of the run.
        run_id: Uuid,
        /// Display form of the assembled command.
        command: String,
        /// Names of the staged inputs.
        inputs: Vec<String>,
    },
    /// A run entered a new phase.
    PhaseChanged {
        /// Identifier of the run.
        run_id: Uuid,
        /// Phase that was entered.
        phase: RunPhase,
    },
    /// Engine progress ratio, clamped to `0.0..=1.0` and non-decreasing per run.
    Progress {
        /// Identifier of the run.
        run_id: Uuid,
        /// Fraction of work completed.
        ratio: f64,
    },
    /// A run finished successfully.
    RunCompleted {
        /// Identifier of the run.
        run_id: Uuid,
        /// Names that appeared in the engine filesystem during the run.
        produced: Vec<String>,
        /// Suggested download name of the bundle, when one was produced.
        download: Option<String>,
    },
    /// A run failed.
    RunFailed {
        /// Identifier of the run.
        run_id: Uuid,
        /// Rendered failure description.
        message: String,
    },
    /// A manual fetch request finished.
    FetchCompleted {
        /// Names that were retrieved.
        fetched: Vec<String>,
        /// Names that failed lookup.
        failed: Vec<String>,
    },
}

impl Event {
    /// Machine-friendly discriminator for consumers.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EngineLoading => "engine_loading",
            Self::EngineReady => "engine_ready",
            Self::EngineFailed { .. } => "engine_failed",
            Self::RunStarted { .. } => "run_started",
            Self::PhaseChanged { .. } => "phase_changed",
            Self::Progress { .. } => "progress",
            Self::RunCompleted { .. } => "run_completed",
            Self::RunFailed { .. } => "run_failed",
            Self::FetchCompleted { .. } => "fetch_completed",
        }
    }

    /// Run identifier carried by run-scoped events.
    #[must_use]
    pub const fn run_id(&self) -> Option<Uuid> {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::PhaseChanged { run_id, .. }
            | Self::Progress { run_id, .. }
            | Self::RunCompleted { run_id, .. }
            | Self::RunFailed { run_id, .. } => Some(*run_id),
            Self::EngineLoading
            | Self::EngineReady
            | Self::EngineFailed { .. }
            | Self::FetchCompleted { .. } => None,
        }
    }
}

/// Metadata wrapper around events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventEnvelope {
    /// Sequential identifier.
    pub id: EventId,
    /// Emission timestamp.
    pub timestamp: DateTime<Utc>,
    /// Event payload.
    pub event: Event,
}

/// Shared event bus built on top of `tokio::broadcast`.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    buffer: Arc<Mutex<VecDeque<EventEnvelope>>>,
    next_id: Arc<AtomicU64>,
    replay_capacity: usize,
}

impl EventBus {
    /// Construct a new bus with the provided broadcast capacity.
    ///
    /// The broadcast channel uses the same capacity as the replay buffer, so
    /// dropped events impact both structures consistently. A zero capacity is
    /// raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            next_id: Arc::new(AtomicU64::new(1)),
            replay_capacity: capacity,
        }
    }

    /// Construct a bus with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Publish an event, assigning it a sequential identifier.
    pub fn publish(&self, event: Event) -> EventId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };

        {
            let mut buffer = self.lock_buffer();
            if buffer.len() == self.replay_capacity {
                buffer.pop_front();
            }
            buffer.push_back(envelope.clone());
        }

        let _ = self.sender.send(envelope);
        id
    }

    /// Subscribe to the bus, replaying buffered events newer than `since_id`.
    #[must_use]
    pub fn subscribe(&self, since_id: Option<EventId>) -> EventStream {
        let receiver = self.sender.subscribe();
        let mut backlog = VecDeque::new();
        if let Some(since) = since_id {
            let buffer = self.lock_buffer();
            backlog.extend(buffer.iter().filter(|item| item.id > since).cloned());
        }

        EventStream {
            backlog,
            receiver,
            high_water: since_id.unwrap_or(0),
        }
    }

    /// Returns the last assigned identifier, if any events have been published.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        self.lock_buffer().back().map(|event| event.id)
    }

    fn lock_buffer(&self) -> MutexGuard<'_, VecDeque<EventEnvelope>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream that yields events from the replay backlog first, then from the live channel.
pub struct EventStream {
    backlog: VecDeque<EventEnvelope>,
    receiver: Receiver<EventEnvelope>,
    high_water: EventId,
}

impl EventStream {
    /// Receive the next event. Returns `None` once every bus handle is dropped.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        if let Some(event) = self.backlog.pop_front() {
            self.high_water = event.id;
            return Some(event);
        }

        loop {
            match self.receiver.recv().await {
                // Events published between subscribe and the backlog copy arrive twice.
                Ok(event) if event.id <= self.high_water => {}
                Ok(event) => {
                    self.high_water = event.id;
                    return Some(event);
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive an event if one is immediately available.
    pub fn try_next(&mut self) -> Option<EventEnvelope> {
        if let Some(event) = self.backlog.pop_front() {
            self.high_water = event.id;
            return Some(event);
        }

        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.id <= self.high_water => {}
                Ok(event) => {
                    self.high_water = event.id;
                    return Some(event);
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }
}
