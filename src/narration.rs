//! Radio-style narration for points of interest
//!
//! The text source is an external collaborator behind the [`Narrator`]
//! trait. Requests are fire-and-forget from the simulation's point of view:
//! - [`NarrationDispatcher::request`] spawns the call on a tokio runtime
//! - failures and timeouts are replaced by a deterministic fallback
//! - results come back over a channel drained once per tick
//!
//! Every result is tagged with the session generation that asked for it so
//! a restarted session can drop stale texts.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Default upper bound on a single narration call
pub const DEFAULT_NARRATION_TIMEOUT: Duration = Duration::from_millis(4000);

pub const WELCOME_FALLBACK: &str = "Welcome. Use Arrow Keys to drive.";

const WELCOME_UNAVAILABLE: &str = "Welcome to the road. Use Arrow Keys to drive.";
const WELCOME_EMPTY: &str = "Buckle up. Use Left/Right keys to explore.";

/// Shown in place of a greeting when a session restarts
pub const RESTART_MESSAGE: &str = "Restarting Journey...";

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("narration service unavailable")]
    Unavailable,

    #[error("narration request timed out after {0:?}")]
    Timeout(Duration),

    #[error("narration service returned an empty response")]
    Empty,

    #[error("narration request failed: {0}")]
    Request(String),
}

/// Deterministic text used whenever the narrator cannot answer
pub fn fallback_narration(title: &str) -> String {
    format!("You're listening to {}.", title)
}

/// Source of narration text.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// One-sentence intro for a point of interest.
    async fn summarize(&self, title: &str, description: &str) -> Result<String, NarrationError>;

    /// Greeting shown when a session starts.
    async fn welcome(&self) -> Result<String, NarrationError>;
}

/// Narrator that never calls out and always answers with the fallbacks
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackNarrator;

#[async_trait]
impl Narrator for FallbackNarrator {
    async fn summarize(&self, title: &str, _description: &str) -> Result<String, NarrationError> {
        Ok(fallback_narration(title))
    }

    async fn welcome(&self) -> Result<String, NarrationError> {
        Ok(WELCOME_FALLBACK.to_string())
    }
}

/// What a narration is about
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationRequest {
    Welcome,
    Poi {
        id: String,
        title: String,
        description: String,
    },
}

impl NarrationRequest {
    pub fn fallback_text(&self) -> String {
        match self {
            NarrationRequest::Welcome => WELCOME_FALLBACK.to_string(),
            NarrationRequest::Poi { title, .. } => fallback_narration(title),
        }
    }

    /// Fallback picked by why the narrator could not answer
    pub fn fallback_for(&self, error: &NarrationError) -> String {
        match (self, error) {
            (NarrationRequest::Welcome, NarrationError::Unavailable) => WELCOME_UNAVAILABLE.to_string(),
            (NarrationRequest::Welcome, NarrationError::Empty) => WELCOME_EMPTY.to_string(),
            (NarrationRequest::Poi { title, .. }, NarrationError::Unavailable) => {
                format!("Now playing: {}. It's a cool project.", title)
            }
            (NarrationRequest::Poi { title, .. }, NarrationError::Empty) => {
                format!("Coming up next, we have {}.", title)
            }
            _ => self.fallback_text(),
        }
    }

    pub fn poi_id(&self) -> Option<&str> {
        match self {
            NarrationRequest::Welcome => None,
            NarrationRequest::Poi { id, .. } => Some(id),
        }
    }
}

/// A resolved narration waiting to be shown
#[derive(Debug, Clone, PartialEq)]
pub struct Narration {
    pub generation: u64,
    pub poi_id: Option<String>,
    pub text: String,
}

pub struct NarrationDispatcher {
    narrator: Arc<dyn Narrator>,
    runtime: Option<Handle>,
    timeout: Duration,
    enabled: bool,
    tx: UnboundedSender<Narration>,
    rx: UnboundedReceiver<Narration>,
}

impl NarrationDispatcher {
    /// Create a dispatcher bound to the current tokio runtime, if any.
    pub fn new(narrator: Arc<dyn Narrator>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            narrator,
            runtime: Handle::try_current().ok(),
            timeout,
            enabled: true,
            tx,
            rx,
        }
    }

    /// Dispatcher that answers every request with the fallback text
    pub fn offline() -> Self {
        Self::new(Arc::new(FallbackNarrator), DEFAULT_NARRATION_TIMEOUT).without_runtime()
    }

    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Resolve every request synchronously with its fallback text
    pub fn without_runtime(mut self) -> Self {
        self.runtime = None;
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Ask for narration without waiting for it.
    ///
    /// The answer shows up in a later [`drain`](Self::drain). Disabled
    /// dispatchers drop the request.
    pub fn request(&self, generation: u64, request: NarrationRequest) {
        if !self.enabled {
            return;
        }

        let poi_id = request.poi_id().map(str::to_string);

        let Some(runtime) = &self.runtime else {
            let _ = self.tx.send(Narration {
                generation,
                poi_id,
                text: request.fallback_text(),
            });
            return;
        };

        let narrator = Arc::clone(&self.narrator);
        let tx = self.tx.clone();
        let timeout = self.timeout;
        runtime.spawn(async move {
            let call = async {
                match &request {
                    NarrationRequest::Welcome => narrator.welcome().await,
                    NarrationRequest::Poi {
                        title, description, ..
                    } => narrator.summarize(title, description).await,
                }
            };
            let result = match tokio::time::timeout(timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(NarrationError::Timeout(timeout)),
            };

            let text = match result.and_then(|text| {
                let text = text.trim();
                if text.is_empty() {
                    Err(NarrationError::Empty)
                } else {
                    Ok(text.to_string())
                }
            }) {
                Ok(text) => text,
                Err(e) => {
                    debug!(poi = ?poi_id, error = %e, "Using fallback narration");
                    request.fallback_for(&e)
                }
            };

            // Receiver gone means the session ended; nothing to deliver
            let _ = tx.send(Narration {
                generation,
                poi_id,
                text,
            });
        });
    }

    /// Post a fixed text without asking the narrator
    pub fn announce(&self, generation: u64, text: &str) {
        if !self.enabled {
            return;
        }
        let _ = self.tx.send(Narration {
            generation,
            poi_id: None,
            text: text.to_string(),
        });
    }

    /// Take every narration resolved so far, in arrival order
    pub fn drain(&mut self) -> Vec<Narration> {
        let mut resolved = Vec::new();
        while let Ok(narration) = self.rx.try_recv() {
            resolved.push(narration);
        }
        resolved
    }
}
