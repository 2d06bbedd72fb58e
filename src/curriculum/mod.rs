//! Curriculum content tree
//!
//! The immutable snapshot handed over by the content store: modules holding
//! lessons holding steps and the vocabulary each lesson declares.

use serde::{Deserialize, Serialize};

pub mod ids;
pub mod loader;
pub mod step;

pub use ids::{
    is_lesson_before, is_lesson_before_str, is_module_before, is_module_before_str, LessonId,
    LessonKey, ModuleId, StepKey,
};
pub use loader::{load, parse_json, parse_toml};
pub use step::{Blank, ChoiceOption, MatchPair, Step, StepKind, StoryLine};

/// A vocabulary item, owned by the lesson that declares it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub id: String,
    #[serde(default)]
    pub semantic_group: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl VocabularyItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            semantic_group: None,
            text: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Vocabulary this lesson owns
    #[serde(default)]
    pub vocabulary: Vec<VocabularyItem>,
    /// Vocabulary owned elsewhere that this lesson practises
    #[serde(default)]
    pub review: Vec<String>,
}

impl Lesson {
    pub fn ordinal(&self) -> u32 {
        self.id.ordinal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Module {
    pub fn ordinal(&self) -> u32 {
        self.id.ordinal()
    }

    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|l| &l.id == id)
    }
}

/// The whole curriculum, modules in authoring order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curriculum {
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl Curriculum {
    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| &m.id == id)
    }

    pub fn lesson(&self, module: &ModuleId, lesson: &LessonId) -> Option<&Lesson> {
        self.module(module).and_then(|m| m.lesson(lesson))
    }

    /// Every lesson with its key, in authoring order
    pub fn lessons(&self) -> impl Iterator<Item = (LessonKey, &Lesson)> {
        self.modules.iter().flat_map(|m| {
            m.lessons
                .iter()
                .map(move |l| (LessonKey::new(m.id.clone(), l.id.clone()), l))
        })
    }

    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    pub fn step_count(&self) -> usize {
        self.lessons().map(|(_, l)| l.steps.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Curriculum {
        serde_json::from_str(
            r#"{"modules": [
                {"id": "module1", "lessons": [
                    {"id": "lesson1", "steps": [{"type": "welcome"}], "vocabulary": [{"id": "word-su"}]},
                    {"id": "lesson2", "steps": [{"type": "final"}, {"type": "quiz"}]}
                ]},
                {"id": "module2", "lessons": [{"id": "lesson1"}]}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_and_counts() {
        let c = sample();
        let m2 = ModuleId::parse("module2").unwrap();
        let l1 = LessonId::parse("lesson1").unwrap();
        assert!(c.lesson(&m2, &l1).unwrap().steps.is_empty());
        assert!(c.lesson(&m2, &LessonId::parse("lesson7").unwrap()).is_none());
        assert_eq!(c.lesson_count(), 3);
        assert_eq!(c.step_count(), 3);

        let keys: Vec<String> = c.lessons().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["module1/lesson1", "module1/lesson2", "module2/lesson1"]);
    }

    #[test]
    fn test_bad_identifier_fails_deserialization() {
        let err = serde_json::from_str::<Curriculum>(r#"{"modules": [{"id": "basics"}]}"#);
        assert!(err.is_err());
    }
}
