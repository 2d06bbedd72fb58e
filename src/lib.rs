//! curriculum-index - curriculum knowledge-state index
//!
//! Precomputes, for every step of every lesson, the vocabulary, grammar
//! suffixes and connector words a learner has already met.
//!
//! Architecture:
//! - curriculum: typed content tree and its loader
//! - index: Lexicon builder and per-step introduction resolver
//! - learned: per-lesson snapshot computation and memoization
//! - facade: `KnowledgeIndex`, the only query surface consumers use

pub mod audit;
pub mod bench;
pub mod config;
pub mod curriculum;
pub mod error;
pub mod facade;
pub mod index;
pub mod learned;
pub mod telemetry;
pub mod watch;

pub use config::IndexConfig;
pub use curriculum::{Curriculum, LessonId, LessonKey, ModuleId, Step};
pub use error::IndexError;
pub use facade::{learned_state_for_step, KnowledgeIndex};
pub use index::Lexicon;
pub use learned::LearnedSnapshot;
pub use telemetry::{RecordingTelemetry, Telemetry, TracingTelemetry};
