//! The Lexicon: global, immutable index of everything the curriculum introduces

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::curriculum::{LessonKey, ModuleId, StepKey, VocabularyItem};

/// A vocabulary item together with the lesson that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub item: VocabularyItem,
    pub origin: LessonKey,
}

/// Counters gathered while building
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LexiconStats {
    pub modules: usize,
    pub lessons: usize,
    pub steps: usize,
    pub vocabulary: usize,
    pub suffix_steps: usize,
    pub distinct_suffixes: usize,
    pub distinct_connectors: usize,
    pub review_references: usize,
    pub steps_by_kind: BTreeMap<String, usize>,
}

/// Precomputed vocabulary/suffix/connector introductions
///
/// Built once by [`super::build`]; nothing mutates it afterwards, so it can be
/// shared across threads behind an `Arc` without locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    pub(crate) vocabulary: HashMap<String, VocabularyEntry>,
    pub(crate) module_vocabulary: BTreeMap<ModuleId, Vec<String>>,
    /// Every lesson of the curriculum, including those declaring no vocabulary
    pub(crate) lesson_vocabulary: BTreeMap<LessonKey, Vec<String>>,
    pub(crate) suffix_intros: HashMap<StepKey, Vec<String>>,
    pub(crate) step_connectors: HashMap<StepKey, Vec<String>>,
    pub(crate) lesson_suffixes: BTreeMap<LessonKey, Vec<String>>,
    pub(crate) connector_intros: BTreeMap<LessonKey, Vec<String>>,
    pub(crate) connector_vocabulary: BTreeSet<String>,
    pub(crate) stats: LexiconStats,
}

impl Lexicon {
    pub fn vocabulary(&self, id: &str) -> Option<&VocabularyEntry> {
        self.vocabulary.get(id)
    }

    pub fn contains_vocabulary(&self, id: &str) -> bool {
        self.vocabulary.contains_key(id)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Vocabulary ids owned by a module, in declaration order
    pub fn module_vocabulary(&self, module: &ModuleId) -> &[String] {
        self.module_vocabulary
            .get(module)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Vocabulary ids owned by a lesson, in declaration order
    pub fn lesson_vocabulary(&self, lesson: &LessonKey) -> &[String] {
        self.lesson_vocabulary
            .get(lesson)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Suffix tokens introduced by the step at `key`
    pub fn suffixes_at(&self, key: &StepKey) -> &[String] {
        self.suffix_intros
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Connector tokens the step at `key` introduces through its options
    pub fn step_connectors_at(&self, key: &StepKey) -> &[String] {
        self.step_connectors
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All suffix tokens introduced anywhere in a lesson
    pub fn lesson_suffixes(&self, lesson: &LessonKey) -> &[String] {
        self.lesson_suffixes
            .get(lesson)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Connector tokens attributed to a lesson
    pub fn lesson_connectors(&self, lesson: &LessonKey) -> &[String] {
        self.connector_intros
            .get(lesson)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_connector_vocabulary(&self, id: &str) -> bool {
        self.connector_vocabulary.contains(id)
    }

    /// Modules in curriculum order
    pub fn modules(&self) -> impl Iterator<Item = &ModuleId> {
        self.module_vocabulary.keys()
    }

    /// Lessons in curriculum order
    pub fn lessons(&self) -> impl Iterator<Item = &LessonKey> {
        self.lesson_vocabulary.keys()
    }

    /// Every vocabulary id owned by `through` or any lesson before it
    ///
    /// Aggregate query for review-set assembly; step-level questions go through
    /// the facade instead.
    pub fn vocabulary_through(&self, through: &LessonKey) -> Vec<String> {
        self.lesson_vocabulary
            .iter()
            .filter(|(key, _)| *key == through || key.is_before(through))
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect()
    }

    /// Every vocabulary id owned by `through` or any module before it
    pub fn vocabulary_through_module(&self, through: &ModuleId) -> Vec<String> {
        self.module_vocabulary
            .iter()
            .filter(|(module, _)| module.ordinal() <= through.ordinal())
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect()
    }

    pub fn stats(&self) -> &LexiconStats {
        &self.stats
    }
}
