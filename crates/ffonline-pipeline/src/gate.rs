//! Engine initialisation gate.
//!
//! # Design
//! - The engine loads once; every pipeline operation checks the gate first.
//! - A failed load leaves the gate in `Failed` until a user-initiated retry.
//! - State is a `watch` channel so collaborators can defer work until ready.

use std::sync::Arc;

use ffonline_core::MediaEngine;
use ffonline_events::{Event, EventBus};
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use crate::error::{PipelineError, PipelineResult, describe_error};

/// Lifecycle of the engine runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// `load` has not been called.
    Uninitialised,
    /// `load` is in flight.
    Loading,
    /// The engine accepts operations.
    Ready,
    /// The last load attempt failed.
    Failed {
        /// Rendered failure description.
        message: String,
    },
}

impl EngineState {
    /// Machine-friendly label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialised => "uninitialised",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed { .. } => "failed",
        }
    }
}

struct GateInner {
    engine: Arc<dyn MediaEngine>,
    state: watch::Sender<EngineState>,
    load_lock: Mutex<()>,
    events: EventBus,
}

/// Shared handle that owns the engine and tracks its readiness.
#[derive(Clone)]
pub struct EngineGate {
    inner: Arc<GateInner>,
}

impl EngineGate {
    /// Wrap `engine`; it starts `Uninitialised`.
    #[must_use]
    pub fn new(engine: Arc<dyn MediaEngine>, events: EventBus) -> Self {
        let (state, _) = watch::channel(EngineState::Uninitialised);
        Self {
            inner: Arc::new(GateInner {
                engine,
                state,
                load_lock: Mutex::new(()),
                events,
            }),
        }
    }

    /// Load the engine runtime. Concurrent callers share one attempt; calling
    /// again after success is a no-op, after failure it retries.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Initialization`] when the engine fails to load.
    pub async fn load(&self) -> PipelineResult<()> {
        let _guard = self.inner.load_lock.lock().await;
        if self.state() == EngineState::Ready {
            return Ok(());
        }

        self.inner.state.send_replace(EngineState::Loading);
        let _ = self.inner.events.publish(Event::EngineLoading);
        info!("loading engine runtime");

        match self.inner.engine.load().await {
            Ok(()) => {
                self.inner.state.send_replace(EngineState::Ready);
                let _ = self.inner.events.publish(Event::EngineReady);
                info!("engine runtime ready");
                Ok(())
            }
            Err(source) => {
                let err = PipelineError::Initialization { source };
                let message = describe_error(&err);
                warn!(error = %message, "engine runtime failed to load");
                self.inner.state.send_replace(EngineState::Failed {
                    message: message.clone(),
                });
                let _ = self.inner.events.publish(Event::EngineFailed { message });
                Err(err)
            }
        }
    }

    /// Reject the call unless the engine is ready.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EngineNotReady`] naming the current state.
    pub fn ensure_ready(&self) -> PipelineResult<()> {
        let state = self.inner.state.borrow();
        if *state == EngineState::Ready {
            Ok(())
        } else {
            Err(PipelineError::EngineNotReady {
                state: state.as_str(),
            })
        }
    }

    /// Wait until a load attempt settles. Never resolves while nobody calls
    /// [`EngineGate::load`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EngineNotReady`] when the attempt failed.
    pub async fn wait_ready(&self) -> PipelineResult<()> {
        let mut receiver = self.inner.state.subscribe();
        let settled = receiver
            .wait_for(|state| matches!(state, EngineState::Ready | EngineState::Failed { .. }))
            .await
            .map_err(|_| PipelineError::EngineNotReady { state: "closed" })?;
        if *settled == EngineState::Ready {
            Ok(())
        } else {
            Err(PipelineError::EngineNotReady {
                state: settled.as_str(),
            })
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.inner.state.borrow().clone()
    }

    /// The wrapped engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn MediaEngine> {
        &self.inner.engine
    }

    /// Event bus the gate publishes to.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }
}
