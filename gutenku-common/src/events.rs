//! Event types for the GutenKu event system
//!
//! Generation and evolution code writes progress into an [`EventSink`]; a
//! subscription adapter (SSE, websocket, CLI printer) drains it. [`EventBus`]
//! is the broadcast-backed sink shared by a process.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

/// GutenKu event types
///
/// Events are broadcast via EventBus and can be serialized for transmission
/// to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HaikuEvent {
    /// A candidate line was considered during generation
    QuoteConsidered {
        /// Generation request this quote belongs to
        request_id: Uuid,
        /// Candidate line text
        quote: String,
        /// Summed syllable count of the line
        syllables: usize,
        /// Position of the line in its chapter
        source_index: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One generation of a genetic search finished
    EvolutionProgress {
        request_id: Uuid,
        generation: usize,
        max_generations: usize,
        best_fitness: f64,
        average_fitness: f64,
        /// Verses of the best individual so far
        best_verses: Vec<String>,
        is_complete: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A haiku was produced for a request
    HaikuGenerated {
        request_id: Uuid,
        verses: Vec<String>,
        book_title: String,
        total_score: f64,
        /// True when the haiku was sampled from the cache
        cache_used: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A request ran out of attempts without producing a haiku
    GenerationExhausted {
        request_id: Uuid,
        attempts: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl HaikuEvent {
    /// Request id carried by every event variant
    pub fn request_id(&self) -> Uuid {
        match self {
            HaikuEvent::QuoteConsidered { request_id, .. }
            | HaikuEvent::EvolutionProgress { request_id, .. }
            | HaikuEvent::HaikuGenerated { request_id, .. }
            | HaikuEvent::GenerationExhausted { request_id, .. } => *request_id,
        }
    }
}

/// Destination for progress events.
///
/// Emitting never fails from the producer's point of view: a sink without
/// listeners drops events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: HaikuEvent);
}

/// Sink that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: HaikuEvent) {}
}

impl EventSink for mpsc::UnboundedSender<HaikuEvent> {
    fn emit(&self, event: HaikuEvent) {
        let _ = self.send(event);
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast so multiple subscribers receive every event. Slow
/// subscribers lag and lose the oldest events rather than blocking producers.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HaikuEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use gutenku_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<HaikuEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn try_emit(
        &self,
        event: HaikuEvent,
    ) -> Result<usize, broadcast::error::SendError<HaikuEvent>> {
        self.tx.send(event)
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: HaikuEvent) {
        let _ = self.tx.send(event);
    }
}
