//! Content-integrity errors
//!
//! These are the fatal, build-time failures of the index. Anything a learner
//! could trip over mid-lesson is a soft error and goes through telemetry
//! instead (see [`crate::telemetry`]).

use thiserror::Error;

/// Fatal errors raised while parsing identifiers or building the lexicon
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Identifier does not carry a trailing ordinal (`module3`, `lesson5`)
    #[error("invalid {kind} identifier '{raw}': expected '{kind}<number>'")]
    InvalidIdentifier { kind: &'static str, raw: String },

    /// The same vocabulary id is declared by two lessons (or twice by one)
    #[error("duplicate vocabulary id '{id}' declared in {second} (first declared in {first})")]
    DuplicateVocabulary {
        id: String,
        first: String,
        second: String,
    },

    /// Two modules resolve to the same ordinal
    #[error("modules '{first}' and '{second}' share ordinal {ordinal}")]
    DuplicateModuleOrdinal {
        ordinal: u32,
        first: String,
        second: String,
    },

    /// Two lessons of one module resolve to the same ordinal
    #[error("lessons '{first}' and '{second}' in {module} share ordinal {ordinal}")]
    DuplicateLessonOrdinal {
        module: String,
        ordinal: u32,
        first: String,
        second: String,
    },
}
