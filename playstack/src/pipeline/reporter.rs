//! Operator-facing progress reporting
//!
//! Each message is logged through `tracing`, broadcast on the EventBus for
//! live SSE display, and kept for the final run report.

use playstack_common::events::{
    EventBus, MessageLevel, PipelineStage, PlaystackEvent, StageMessage,
};
use uuid::Uuid;

pub struct ProgressReporter {
    run_id: Uuid,
    event_bus: Option<EventBus>,
    messages: Vec<StageMessage>,
}

impl ProgressReporter {
    pub fn new(run_id: Uuid, event_bus: EventBus) -> Self {
        Self {
            run_id,
            event_bus: Some(event_bus),
            messages: Vec::new(),
        }
    }

    /// Reporter that only collects messages
    pub fn detached(run_id: Uuid) -> Self {
        Self {
            run_id,
            event_bus: None,
            messages: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn info(&mut self, stage: PipelineStage, text: impl Into<String>) {
        self.push(stage, MessageLevel::Info, text.into());
    }

    pub fn success(&mut self, stage: PipelineStage, text: impl Into<String>) {
        self.push(stage, MessageLevel::Success, text.into());
    }

    pub fn warning(&mut self, stage: PipelineStage, text: impl Into<String>) {
        self.push(stage, MessageLevel::Warning, text.into());
    }

    pub fn error(&mut self, stage: PipelineStage, text: impl Into<String>) {
        self.push(stage, MessageLevel::Error, text.into());
    }

    pub fn messages(&self) -> &[StageMessage] {
        &self.messages
    }

    pub fn has_warnings(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Warning)
    }

    pub fn into_messages(self) -> Vec<StageMessage> {
        self.messages
    }

    pub(crate) fn emit(&self, event: PlaystackEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }

    fn push(&mut self, stage: PipelineStage, level: MessageLevel, text: String) {
        let stage_name = stage.as_str();
        match level {
            MessageLevel::Info | MessageLevel::Success => {
                tracing::info!(run_id = %self.run_id, stage = stage_name, "{}", text)
            }
            MessageLevel::Warning => {
                tracing::warn!(run_id = %self.run_id, stage = stage_name, "{}", text)
            }
            MessageLevel::Error => {
                tracing::error!(run_id = %self.run_id, stage = stage_name, "{}", text)
            }
        }

        let message = StageMessage::new(stage, level, text);
        self.emit(PlaystackEvent::StageMessage {
            run_id: self.run_id,
            message: message.clone(),
        });
        self.messages.push(message);
    }
}
