//! Learned-state computation
//!
//! For one lesson, derives a snapshot per step of everything the learner has
//! met so far: all content of earlier modules and earlier lessons (the base),
//! then whatever the lesson's own steps introduce, in order. Nothing of the
//! lesson itself is in the base; nothing of later lessons ever appears.

use std::sync::Arc;

use crate::curriculum::{
    is_lesson_before, is_module_before, LessonId, LessonKey, ModuleId, Step, StepKey,
};
use crate::index::{resolve, Lexicon};
use crate::telemetry::{contexts, Telemetry};

mod cache;
mod snapshot;

pub use cache::LearnedStateCache;
pub use snapshot::LearnedSnapshot;

/// All snapshots of one lesson
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonStates {
    pub key: LessonKey,
    /// State before the first step
    pub base: LearnedSnapshot,
    pub snapshots: Vec<Arc<LearnedSnapshot>>,
}

impl LessonStates {
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Arc<LearnedSnapshot>> {
        self.snapshots.get(index).cloned()
    }

    /// Snapshot at `index`, or the last one when `index` runs past the end
    pub fn at_clamped(&self, index: usize) -> Arc<LearnedSnapshot> {
        match self.snapshots.get(index).or_else(|| self.snapshots.last()) {
            Some(snapshot) => Arc::clone(snapshot),
            None => Arc::new(LearnedSnapshot::default()),
        }
    }
}

/// Everything known on entering `key`, excluding the lesson's own content
pub fn base_state(key: &LessonKey, lexicon: &Lexicon) -> LearnedSnapshot {
    let mut base = LearnedSnapshot::default();

    for module in lexicon.modules() {
        if is_module_before(module, &key.module) {
            base.vocab_ids.extend(lexicon.module_vocabulary(module).iter().cloned());
        }
    }

    for lesson in lexicon.lessons() {
        let same_module_earlier =
            lesson.module == key.module && is_lesson_before(&lesson.lesson, &key.lesson);
        if same_module_earlier {
            base.vocab_ids.extend(lexicon.lesson_vocabulary(lesson).iter().cloned());
        }
        if same_module_earlier || is_module_before(&lesson.module, &key.module) {
            base.suffixes.extend(lexicon.lesson_suffixes(lesson).iter().cloned());
            base.connectors.extend(lexicon.lesson_connectors(lesson).iter().cloned());
        }
    }

    base
}

/// Build the snapshots of one lesson
///
/// Never fails: a step naming vocabulary the lexicon does not know keeps the
/// id and reports it through telemetry.
pub fn build(
    module: &ModuleId,
    lesson: &LessonId,
    steps: &[Step],
    lexicon: &Lexicon,
    telemetry: &dyn Telemetry,
) -> LessonStates {
    let key = LessonKey::new(module.clone(), lesson.clone());
    let base = base_state(&key, lexicon);

    let mut running = base.clone();
    let mut snapshots = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        let intro = resolve(step, lexicon, module, lesson, index);
        for id in &intro.vocab_ids {
            if !lexicon.contains_vocabulary(id) {
                let at = StepKey {
                    lesson: key.clone(),
                    index,
                };
                telemetry.warn(
                    contexts::UNKNOWN_VOCABULARY,
                    &format!("{} introduces '{}' which is not in the lexicon", at, id),
                );
            }
        }
        running.absorb(&intro);
        snapshots.push(Arc::new(running.clone()));
    }

    LessonStates {
        key,
        base,
        snapshots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::parse_json;
    use crate::index::{build as build_lexicon, BuildOptions};
    use crate::telemetry::RecordingTelemetry;

    const CURRICULUM: &str = r#"{"modules": [
        {"id": "module1", "lessons": [
            {"id": "lesson1", "vocabulary": [{"id": "word-su"}],
             "steps": [{"type": "flashcard", "vocabulary_id": "word-su"},
                       {"type": "grammar-fill-blank", "blanks": [{"options": [{"id": "suffix-lar"}]}]}]},
            {"id": "lesson2", "vocabulary": [{"id": "word-ev"}, {"id": "ve"}],
             "steps": [{"type": "flashcard", "vocabulary_id": "word-ev"},
                       {"type": "flashcard", "vocabulary_id": "ve"}]}
        ]},
        {"id": "module2", "lessons": [
            {"id": "lesson1", "vocabulary": [{"id": "word-araba"}],
             "steps": [{"type": "quiz"}, {"type": "flashcard", "vocabulary_id": "word-araba"}]}
        ]}
    ]}"#;

    fn setup() -> (crate::curriculum::Curriculum, Lexicon) {
        let curriculum = parse_json(CURRICULUM).unwrap();
        let lexicon =
            build_lexicon(&curriculum, &BuildOptions::default(), &RecordingTelemetry::new())
                .unwrap();
        (curriculum, lexicon)
    }

    fn key(m: &str, l: &str) -> LessonKey {
        LessonKey::new(ModuleId::parse(m).unwrap(), LessonId::parse(l).unwrap())
    }

    #[test]
    fn test_base_excludes_own_and_later_content() {
        let (_, lexicon) = setup();

        let first = base_state(&key("module1", "lesson1"), &lexicon);
        assert!(first.is_empty());

        let second = base_state(&key("module1", "lesson2"), &lexicon);
        assert!(second.knows_vocabulary("word-su"));
        assert!(second.knows_suffix("lar"));
        assert!(!second.knows_vocabulary("word-ev"));
        assert!(!second.knows_connector("ve"));

        let next_module = base_state(&key("module2", "lesson1"), &lexicon);
        assert_eq!(next_module.vocab_ids.len(), 3);
        assert!(next_module.knows_connector("ve"));
        assert!(!next_module.knows_vocabulary("word-araba"));
    }

    #[test]
    fn test_base_agrees_with_review_set_for_spelling_variants() {
        let (_, lexicon) = setup();
        let variant = key("module-1", "lesson_2");

        let base = base_state(&variant, &lexicon);
        assert_eq!(base, base_state(&key("module1", "lesson2"), &lexicon));
        assert!(base.knows_vocabulary("word-su"));
        assert!(!base.knows_vocabulary("word-ev"));

        let before = key("module-1", "lesson1");
        for id in lexicon.vocabulary_through(&before) {
            assert!(base.knows_vocabulary(&id), "base misses {}", id);
        }
    }

    #[test]
    fn test_snapshots_grow_step_by_step() {
        let (curriculum, lexicon) = setup();
        let m = ModuleId::parse("module1").unwrap();
        let l = LessonId::parse("lesson2").unwrap();
        let steps = &curriculum.lesson(&m, &l).unwrap().steps;
        let telemetry = RecordingTelemetry::new();

        let states = build(&m, &l, steps, &lexicon, &telemetry);
        assert_eq!(states.len(), 2);
        assert!(states.snapshots[0].knows_vocabulary("word-ev"));
        assert!(!states.snapshots[0].knows_connector("ve"));
        assert!(states.snapshots[1].knows_connector("ve"));
        assert!(states.snapshots[0].is_superset_of(&states.base));
        assert!(states.snapshots[1].is_superset_of(&states.snapshots[0]));
        assert!(telemetry.is_empty());
    }

    #[test]
    fn test_unknown_vocabulary_is_reported_not_fatal() {
        let (_, lexicon) = setup();
        let m = ModuleId::parse("module2").unwrap();
        let l = LessonId::parse("lesson1").unwrap();
        let telemetry = RecordingTelemetry::new();

        let states = build(&m, &l, &[Step::flashcard("word-ghost")], &lexicon, &telemetry);
        assert!(states.snapshots[0].knows_vocabulary("word-ghost"));
        assert_eq!(telemetry.count(contexts::UNKNOWN_VOCABULARY), 1);
        assert!(telemetry.warnings()[0].details.contains("module2/lesson1#0"));
    }

    #[test]
    fn test_at_clamped() {
        let (_, lexicon) = setup();
        let m = ModuleId::parse("module1").unwrap();
        let l = LessonId::parse("lesson1").unwrap();
        let telemetry = RecordingTelemetry::new();
        let states = build(&m, &l, &[Step::flashcard("word-su")], &lexicon, &telemetry);

        assert_eq!(states.at_clamped(7), states.at_clamped(0));
        let empty = build(&m, &l, &[], &lexicon, &RecordingTelemetry::new());
        assert!(empty.at_clamped(0).is_empty());
    }
}
