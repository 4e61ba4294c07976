//! Cancellable duplicate-id check run before mounting a preview.

use super::{BoxFuture, PreviewIndex, PreviewResult};

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Handle for one lookup. Results are accepted only for the latest ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    generation: u64,
    id: String,
}

impl LookupTicket {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// What a completed lookup found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateOutcome {
    Unique,
    Duplicate,
    /// The index could not be reached; the check is best-effort.
    Unavailable(String),
}

#[derive(Debug, Clone)]
struct Pending {
    generation: u64,
    started: Instant,
}

/// Tracks at most one in-flight lookup.
#[derive(Debug, Clone)]
pub struct DuplicateCheck {
    generation: u64,
    pending: Option<Pending>,
    spinner_delay: Duration,
}

impl DuplicateCheck {
    pub fn new(spinner_delay: Duration) -> Self {
        Self {
            generation: 0,
            pending: None,
            spinner_delay,
        }
    }

    /// Start a lookup, superseding any pending one.
    pub fn start(&mut self, id: &str, now: Instant) -> LookupTicket {
        self.generation += 1;
        self.pending = Some(Pending {
            generation: self.generation,
            started: now,
        });
        LookupTicket {
            generation: self.generation,
            id: id.to_string(),
        }
    }

    /// Issue the lookup for a ticket against an index.
    pub fn lookup<'a, I: PreviewIndex + ?Sized>(
        index: &'a I,
        ticket: &LookupTicket,
    ) -> BoxFuture<'a, PreviewResult<bool>> {
        index.exists(&ticket.id)
    }

    pub fn spinner_delay(&self) -> Duration {
        self.spinner_delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The mount action is disabled while a lookup is pending.
    pub fn can_mount(&self) -> bool {
        self.pending.is_none()
    }

    /// Show the spinner only once the lookup has run past the delay.
    pub fn should_show_spinner(&self, now: Instant) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| now.saturating_duration_since(p.started) >= self.spinner_delay)
    }

    /// Abandon the pending lookup; its result will be discarded.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            log::debug!("Duplicate check cancelled");
        }
        self.generation += 1;
    }

    /// Deliver a lookup result. Returns `None` if the ticket is stale.
    pub fn complete(
        &mut self,
        ticket: &LookupTicket,
        result: PreviewResult<bool>,
    ) -> Option<DuplicateOutcome> {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|p| p.generation == ticket.generation);
        if !current {
            log::debug!("Discarding stale duplicate check for {}", ticket.id);
            return None;
        }
        self.pending = None;
        Some(match result {
            Ok(true) => DuplicateOutcome::Duplicate,
            Ok(false) => DuplicateOutcome::Unique,
            Err(e) => {
                log::warn!("Duplicate check for {} failed: {e}", ticket.id);
                DuplicateOutcome::Unavailable(e.to_string())
            }
        })
    }
}

impl Default for DuplicateCheck {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}
