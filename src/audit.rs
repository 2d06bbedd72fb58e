//! Curriculum audit
//!
//! Walks every lesson through the index and reports authoring problems:
//! practice of vocabulary the learner has not met, grammar exercised before
//! it was introduced, vocabulary no flashcard ever teaches. It also re-checks
//! the snapshot invariants, which would point at a bug in the index itself.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::curriculum::{LessonKey, Step};
use crate::error::IndexError;
use crate::facade::KnowledgeIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    /// A step names vocabulary no lesson declares
    UnknownVocabulary,
    /// A flashcard teaches vocabulary owned by a later lesson
    FutureVocabulary,
    /// A practice step uses vocabulary the learner has not been shown
    PracticeBeforeIntroduction,
    /// A fill-blank introduces a suffix with no grammar-intro before it in the lesson
    GrammarBeforeIntro,
    /// Declared vocabulary that no flashcard in its lesson introduces
    NeverIntroduced,
    /// A snapshot lost something its predecessor had
    MonotonicityViolation,
    /// A lesson's base state already contains its own vocabulary
    SelfExclusionViolation,
}

impl FindingKind {
    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::MonotonicityViolation | FindingKind::SelfExclusionViolation => {
                Severity::Error
            }
            FindingKind::UnknownVocabulary
            | FindingKind::FutureVocabulary
            | FindingKind::PracticeBeforeIntroduction
            | FindingKind::GrammarBeforeIntro
            | FindingKind::NeverIntroduced => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub lesson: String,
    pub step: Option<usize>,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Some(step) => write!(f, "{}#{}: {}", self.lesson, step, self.message),
            None => write!(f, "{}: {}", self.lesson, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub lessons_checked: usize,
    pub steps_checked: usize,
    pub findings: Vec<Finding>,
}

impl AuditReport {
    fn push(
        &mut self,
        kind: FindingKind,
        lesson: &LessonKey,
        step: Option<usize>,
        message: String,
    ) {
        self.findings.push(Finding {
            kind,
            severity: kind.severity(),
            lesson: lesson.to_string(),
            step,
            message,
        });
    }

    pub fn count(&self, kind: FindingKind) -> usize {
        self.findings.iter().filter(|f| f.kind == kind).count()
    }

    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }
}

/// Audit every lesson of the index's current curriculum
pub fn audit(index: &KnowledgeIndex) -> Result<AuditReport, IndexError> {
    let lexicon = index.lexicon()?;
    let curriculum = index.curriculum();
    let mut report = AuditReport::default();

    for (key, lesson) in curriculum.lessons() {
        let Some(states) = index.lesson_states(&key.module, &key.lesson)? else {
            continue;
        };
        report.lessons_checked += 1;
        report.steps_checked += lesson.steps.len();

        for id in lexicon.lesson_vocabulary(&key) {
            if states.base.knows_vocabulary(id) {
                report.push(
                    FindingKind::SelfExclusionViolation,
                    &key,
                    None,
                    format!("base state already contains own vocabulary '{}'", id),
                );
            }
        }

        let mut previous = &states.base;
        for (index, snapshot) in states.snapshots.iter().enumerate() {
            if !snapshot.is_superset_of(previous) {
                report.push(
                    FindingKind::MonotonicityViolation,
                    &key,
                    Some(index),
                    "snapshot is not a superset of the previous one".to_string(),
                );
            }
            previous = &**snapshot;
        }

        // Cached by a caller with different steps for the same lesson
        if states.len() != lesson.steps.len() {
            continue;
        }

        let mut taught: BTreeSet<&str> = BTreeSet::new();
        let mut intro_seen = false;
        for (index, step) in lesson.steps.iter().enumerate() {
            let known_before = if index == 0 {
                &states.base
            } else {
                &*states.snapshots[index - 1]
            };

            match step {
                Step::Flashcard {
                    vocabulary_id: Some(id),
                } => {
                    taught.insert(id.as_str());
                    match lexicon.vocabulary(id) {
                        None => report.push(
                            FindingKind::UnknownVocabulary,
                            &key,
                            Some(index),
                            format!("flashcard introduces unknown vocabulary '{}'", id),
                        ),
                        Some(entry) if key.is_before(&entry.origin) => report.push(
                            FindingKind::FutureVocabulary,
                            &key,
                            Some(index),
                            format!(
                                "flashcard teaches '{}' owned by later lesson {}",
                                id, entry.origin
                            ),
                        ),
                        Some(_) => {}
                    }
                }
                Step::AudioMeaning {
                    vocabulary_id: Some(id),
                    ..
                }
                | Step::ReverseQuiz {
                    vocabulary_id: Some(id),
                    ..
                } => {
                    if !lexicon.contains_vocabulary(id) {
                        report.push(
                            FindingKind::UnknownVocabulary,
                            &key,
                            Some(index),
                            format!("{} practises unknown vocabulary '{}'", step.kind(), id),
                        );
                    } else if !known_before.knows_vocabulary(id) {
                        report.push(
                            FindingKind::PracticeBeforeIntroduction,
                            &key,
                            Some(index),
                            format!("{} practises '{}' before it is introduced", step.kind(), id),
                        );
                    }
                }
                Step::GrammarIntro { .. } => intro_seen = true,
                Step::GrammarFillBlank { .. } => {
                    let new_suffixes: Vec<&String> = states.snapshots[index]
                        .suffixes
                        .iter()
                        .filter(|s| !known_before.knows_suffix(s))
                        .collect();
                    if !intro_seen && !new_suffixes.is_empty() {
                        let tokens: Vec<&str> = new_suffixes.iter().map(|s| s.as_str()).collect();
                        report.push(
                            FindingKind::GrammarBeforeIntro,
                            &key,
                            Some(index),
                            format!(
                                "fill-blank exercises new suffix(es) {} with no grammar-intro before it",
                                tokens.join(", ")
                            ),
                        );
                    }
                }
                _ => {}
            }
        }

        for id in lexicon.lesson_vocabulary(&key) {
            if !taught.contains(id.as_str()) {
                report.push(
                    FindingKind::NeverIntroduced,
                    &key,
                    None,
                    format!("vocabulary '{}' is declared but no flashcard introduces it", id),
                );
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::curriculum::parse_json;

    fn audit_json(json: &str) -> AuditReport {
        let index = KnowledgeIndex::new(parse_json(json).unwrap(), &IndexConfig::default());
        audit(&index).unwrap()
    }

    #[test]
    fn test_clean_curriculum() {
        let report = audit_json(
            r#"{"modules": [{"id": "module1", "lessons": [{"id": "lesson1",
                "vocabulary": [{"id": "word-su"}],
                "steps": [
                    {"type": "flashcard", "vocabulary_id": "word-su"},
                    {"type": "audio-meaning", "vocabulary_id": "word-su"},
                    {"type": "grammar-intro", "title": "Plural"},
                    {"type": "grammar-fill-blank", "blanks": [{"options": [{"id": "suffix-lar"}]}]}
                ]}]}]}"#,
        );
        assert_eq!(report.lessons_checked, 1);
        assert_eq!(report.steps_checked, 4);
        assert!(report.findings.is_empty(), "{:?}", report.findings);
    }

    #[test]
    fn test_authoring_problems_are_reported() {
        let report = audit_json(
            r#"{"modules": [
                {"id": "module1", "lessons": [{"id": "lesson1",
                    "vocabulary": [{"id": "word-su"}, {"id": "word-ekmek"}],
                    "steps": [
                        {"type": "reverse-quiz", "vocabulary_id": "word-su"},
                        {"type": "flashcard", "vocabulary_id": "word-su"},
                        {"type": "flashcard", "vocabulary_id": "word-araba"},
                        {"type": "flashcard", "vocabulary_id": "word-hayal"},
                        {"type": "grammar-fill-blank", "blanks": [{"options": [{"id": "suffix-lar"}]}]}
                    ]}]},
                {"id": "module2", "lessons": [{"id": "lesson1",
                    "vocabulary": [{"id": "word-araba"}],
                    "steps": [{"type": "flashcard", "vocabulary_id": "word-araba"}]}]}
            ]}"#,
        );

        assert_eq!(report.count(FindingKind::PracticeBeforeIntroduction), 1);
        assert_eq!(report.count(FindingKind::FutureVocabulary), 1);
        assert_eq!(report.count(FindingKind::UnknownVocabulary), 1);
        assert_eq!(report.count(FindingKind::GrammarBeforeIntro), 1);
        assert_eq!(report.count(FindingKind::NeverIntroduced), 1);
        assert!(!report.has_errors());

        let grammar = report
            .findings
            .iter()
            .find(|f| f.kind == FindingKind::GrammarBeforeIntro)
            .unwrap();
        assert_eq!(
            grammar.to_string(),
            "module1/lesson1#4: fill-blank exercises new suffix(es) lar with no grammar-intro before it"
        );
    }
}
