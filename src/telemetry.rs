//! Telemetry sink for soft errors
//!
//! Indexing defects that must not block a learner (unknown vocabulary ids,
//! out-of-range step indices, dangling review references) are reported here
//! and nowhere else.

use std::sync::Mutex;
use tracing::warn;

/// Receiver of non-fatal warnings
pub trait Telemetry: Send + Sync {
    fn warn(&self, context: &str, details: &str);
}

/// Forwards warnings to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn warn(&self, context: &str, details: &str) {
        warn!(context = context, "{}", details);
    }
}

/// A warning captured by [`RecordingTelemetry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub context: String,
    pub details: String,
}

/// Keeps warnings in memory (tests, `curidx check`) and forwards them to tracing
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    warnings: Mutex<Vec<Warning>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, context: &str) -> usize {
        self.warnings
            .lock()
            .map(|w| w.iter().filter(|w| w.context == context).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.lock().map(|w| w.is_empty()).unwrap_or(true)
    }
}

impl Telemetry for RecordingTelemetry {
    fn warn(&self, context: &str, details: &str) {
        TracingTelemetry.warn(context, details);
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(Warning {
                context: context.to_string(),
                details: details.to_string(),
            });
        }
    }
}

/// Contexts used by this crate when reporting
pub mod contexts {
    pub const UNKNOWN_VOCABULARY: &str = "unknown-vocabulary";
    pub const STEP_INDEX_CLAMPED: &str = "step-index-clamped";
    pub const UNKNOWN_REVIEW_REFERENCE: &str = "unknown-review-reference";
    pub const UNKNOWN_LESSON: &str = "unknown-lesson";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_counts_by_context() {
        let sink = RecordingTelemetry::new();
        assert!(sink.is_empty());

        sink.warn(contexts::UNKNOWN_VOCABULARY, "word-x in module1/lesson1#0");
        sink.warn(contexts::UNKNOWN_VOCABULARY, "word-y in module1/lesson1#2");
        sink.warn(contexts::STEP_INDEX_CLAMPED, "-5 -> 0");

        assert_eq!(sink.count(contexts::UNKNOWN_VOCABULARY), 2);
        assert_eq!(sink.count(contexts::STEP_INDEX_CLAMPED), 1);
        assert_eq!(sink.warnings()[2].details, "-5 -> 0");
    }
}
