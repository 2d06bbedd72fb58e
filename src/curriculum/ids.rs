//! Typed curriculum identifiers and ordering
//!
//! Content authors name modules and lessons `module3`, `lesson5`, ... and the
//! trailing integer decides their order. The ordinal is parsed exactly once,
//! when the identifier is constructed (usually while deserializing the
//! curriculum), so ordering comparisons never touch the string again.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::IndexError;

/// `<prefix><number>` with an optional `-`/`_` separator
static ORDINAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]+)[-_]?(\d{1,9})$").unwrap());

/// Extract the trailing ordinal of an identifier that must start with `kind`
fn parse_ordinal(kind: &'static str, raw: &str) -> Result<u32, IndexError> {
    let invalid = || IndexError::InvalidIdentifier {
        kind,
        raw: raw.to_string(),
    };

    let caps = ORDINAL_PATTERN.captures(raw).ok_or_else(invalid)?;
    if &caps[1] != kind {
        return Err(invalid());
    }
    caps[2].parse::<u32>().map_err(|_| invalid())
}

macro_rules! ordinal_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        ///
        /// Equality, hashing and order go by ordinal alone, so `module1` and
        /// `module-1` name the same module.
        #[derive(Debug, Clone, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name {
            raw: String,
            ordinal: u32,
        }

        impl $name {
            pub const KIND: &'static str = $kind;

            /// Parse an identifier, failing loudly when it carries no ordinal
            pub fn parse(raw: &str) -> Result<Self, IndexError> {
                let ordinal = parse_ordinal(Self::KIND, raw)?;
                Ok(Self {
                    raw: raw.to_string(),
                    ordinal,
                })
            }

            pub fn ordinal(&self) -> u32 {
                self.ordinal
            }

            pub fn as_str(&self) -> &str {
                &self.raw
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.ordinal == other.ordinal
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.ordinal.hash(state);
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.ordinal.cmp(&other.ordinal)
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl TryFrom<String> for $name {
            type Error = IndexError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                let ordinal = parse_ordinal(Self::KIND, &raw)?;
                Ok(Self { raw, ordinal })
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.raw
            }
        }

        impl FromStr for $name {
            type Err = IndexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.raw)
            }
        }
    };
}

ordinal_id!(
    /// Identifier of a curriculum module (`module1`, `module2`, ...)
    ModuleId,
    "module"
);

ordinal_id!(
    /// Identifier of a lesson, unique within its module (`lesson1`, ...)
    LessonId,
    "lesson"
);

/// Strictly-before test between two modules
pub fn is_module_before(a: &ModuleId, b: &ModuleId) -> bool {
    a.ordinal < b.ordinal
}

/// Strictly-before test between two lessons of the same module
pub fn is_lesson_before(a: &LessonId, b: &LessonId) -> bool {
    a.ordinal < b.ordinal
}

/// String-level module comparison; malformed identifiers are an error, never `false`
pub fn is_module_before_str(a: &str, b: &str) -> Result<bool, IndexError> {
    Ok(is_module_before(&ModuleId::parse(a)?, &ModuleId::parse(b)?))
}

/// String-level lesson comparison; malformed identifiers are an error, never `false`
pub fn is_lesson_before_str(a: &str, b: &str) -> Result<bool, IndexError> {
    Ok(is_lesson_before(&LessonId::parse(a)?, &LessonId::parse(b)?))
}

/// A lesson addressed by its module, ordered module-first
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LessonKey {
    pub module: ModuleId,
    pub lesson: LessonId,
}

impl LessonKey {
    pub fn new(module: ModuleId, lesson: LessonId) -> Self {
        Self { module, lesson }
    }

    /// True when this lesson comes strictly before `other` in the curriculum
    pub fn is_before(&self, other: &LessonKey) -> bool {
        is_module_before(&self.module, &other.module)
            || (self.module.ordinal == other.module.ordinal
                && is_lesson_before(&self.lesson, &other.lesson))
    }
}

impl fmt::Display for LessonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module, self.lesson)
    }
}

/// One step position inside a lesson
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepKey {
    pub lesson: LessonKey,
    pub index: usize,
}

impl StepKey {
    pub fn new(module: &ModuleId, lesson: &LessonId, index: usize) -> Self {
        Self {
            lesson: LessonKey::new(module.clone(), lesson.clone()),
            index,
        }
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.lesson, self.index)
    }
}
