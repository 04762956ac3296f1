use std::sync::mpsc::Sender;

use super::report::{AttemptResult, GenerationReport};

/// Receives generation and attempt summaries as the search runs.
pub trait ProgressSink: Send {
    fn on_generation(&mut self, report: &GenerationReport);
    fn on_attempt(&mut self, result: &AttemptResult);
}

/// Drops everything; for callers that only want the final report.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn on_generation(&mut self, _report: &GenerationReport) {}
    fn on_attempt(&mut self, _result: &AttemptResult) {}
}

pub enum ProgressMessage {
    Generation(GenerationReport),
    Attempt(AttemptResult),
}

/// Forwards summaries over a channel, e.g. to a display thread.
pub struct ChannelProgress {
    sender: Sender<ProgressMessage>,
}

impl ChannelProgress {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelProgress {
    fn on_generation(&mut self, report: &GenerationReport) {
        let _ = self.sender.send(ProgressMessage::Generation(report.clone()));
    }

    fn on_attempt(&mut self, result: &AttemptResult) {
        let _ = self.sender.send(ProgressMessage::Attempt(result.clone()));
    }
}
