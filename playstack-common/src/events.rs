//! Event types for the PlayStack event system
//!
//! Pipeline progress is broadcast through an [`EventBus`] so that the
//! `/events` SSE stream can show operator messages while a run is still
//! executing. The same messages are collected into the run report.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Which pipeline a run belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// Audio → MIDI → score → re-synthesized audio
    Transcription,
    /// Audio → channel-subtracted instrumental
    Instrumental,
}

/// Pipeline stage that produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Acquire,
    Transcribe,
    Engrave,
    Synthesize,
    RemoveVocals,
    Present,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Acquire => "acquire",
            PipelineStage::Transcribe => "transcribe",
            PipelineStage::Engrave => "engrave",
            PipelineStage::Synthesize => "synthesize",
            PipelineStage::RemoveVocals => "remove_vocals",
            PipelineStage::Present => "present",
        }
    }
}

/// Severity of an operator-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One operator-facing progress or diagnostic line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageMessage {
    pub stage: PipelineStage,
    pub level: MessageLevel,
    pub text: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl StageMessage {
    pub fn new(stage: PipelineStage, level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            stage,
            level,
            text: text.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// PlayStack event types
///
/// Serialized with a `type` tag for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlaystackEvent {
    /// A run acquired the run lock and allocated its workspace
    RunStarted {
        run_id: Uuid,
        pipeline: PipelineKind,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Progress or diagnostic message from a stage
    StageMessage { run_id: Uuid, message: StageMessage },

    /// Run finished; `artifacts` lists the offered download file names
    RunCompleted {
        run_id: Uuid,
        artifacts: Vec<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Run aborted with a fatal error (verbatim text)
    RunFailed {
        run_id: Uuid,
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlaystackEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            PlaystackEvent::RunStarted { .. } => "RunStarted",
            PlaystackEvent::StageMessage { .. } => "StageMessage",
            PlaystackEvent::RunCompleted { .. } => "RunCompleted",
            PlaystackEvent::RunFailed { .. } => "RunFailed",
        }
    }

    pub fn run_id(&self) -> Uuid {
        match self {
            PlaystackEvent::RunStarted { run_id, .. }
            | PlaystackEvent::StageMessage { run_id, .. }
            | PlaystackEvent::RunCompleted { run_id, .. }
            | PlaystackEvent::RunFailed { run_id, .. } => *run_id,
        }
    }
}

/// Broadcast channel for [`PlaystackEvent`]s
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlaystackEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before slow subscribers
    /// start missing the oldest ones.
    ///
    /// # Examples
    ///
    /// ```
    /// use playstack_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaystackEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Progress events are informational; a run never fails because nobody
    /// is watching the SSE stream.
    pub fn emit_lossy(&self, event: PlaystackEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_stage_message() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let run_id = Uuid::new_v4();

        bus.emit_lossy(PlaystackEvent::StageMessage {
            run_id,
            message: StageMessage::new(
                PipelineStage::Transcribe,
                MessageLevel::Warning,
                "primary attempt failed",
            ),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "StageMessage");
        assert_eq!(event.run_id(), run_id);
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.emit_lossy(PlaystackEvent::RunFailed {
            run_id: Uuid::new_v4(),
            error: "boom".to_string(),
            timestamp: chrono::Utc::now(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = PlaystackEvent::RunStarted {
            run_id: Uuid::nil(),
            pipeline: PipelineKind::Instrumental,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RunStarted");
        assert_eq!(json["pipeline"], "instrumental");
    }
}
