use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;

enum Scripted {
    Batch(Vec<Detection>),
    Failure(String),
}

/// Backend that replays queued detection batches, one per `detect` call.
///
/// Used by tests and dry runs. Once the queue is drained every call reports
/// no detections.
#[derive(Default)]
pub struct ScriptedBackend {
    queue: VecDeque<Scripted>,
    calls: u64,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(mut self, batch: Vec<Detection>) -> Self {
        self.push_batch(batch);
        self
    }

    pub fn with_failure(mut self, message: &str) -> Self {
        self.push_failure(message);
        self
    }

    pub fn push_batch(&mut self, batch: Vec<Detection>) {
        self.queue.push_back(Scripted::Batch(batch));
    }

    pub fn push_failure(&mut self, message: &str) {
        self.queue.push_back(Scripted::Failure(message.to_string()));
    }

    /// Number of `detect` calls served so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        self.calls += 1;
        match self.queue.pop_front() {
            Some(Scripted::Batch(batch)) => Ok(batch),
            Some(Scripted::Failure(message)) => Err(anyhow!(message)),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_backend_replays_in_order() {
        let mut backend = ScriptedBackend::new()
            .with_batch(vec![Detection::new(0.0, 0.0, 150.0, 95.0, 0.95)])
            .with_failure("model not ready")
            .with_batch(Vec::new());
        let frame = Frame::blank(8, 8);

        let first = backend.detect(&frame).unwrap();
        assert_eq!(first.len(), 1);

        let err = backend.detect(&frame).unwrap_err();
        assert!(err.to_string().contains("model not ready"));

        assert!(backend.detect(&frame).unwrap().is_empty());
        assert!(backend.detect(&frame).unwrap().is_empty());
        assert_eq!(backend.calls(), 4);
        assert_eq!(backend.remaining(), 0);
    }
}
