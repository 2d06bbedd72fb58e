//! Content index builder
//!
//! One ordered pass over modules → lessons → (vocabulary, steps). Integrity
//! problems that would corrupt the ordering or ownership guarantees stop the
//! build; dangling review references are only reported.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::config::IndexConfig;
use crate::curriculum::{Curriculum, LessonKey, Step, StepKey};
use crate::error::IndexError;
use crate::telemetry::{contexts, Telemetry};

use super::lexicon::{Lexicon, VocabularyEntry};

/// Conventions the builder applies to content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub connector_vocabulary: BTreeSet<String>,
    pub suffix_prefix: String,
    pub connector_prefix: String,
    pub intro_registers_forms: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from(&IndexConfig::default())
    }
}

impl From<&IndexConfig> for BuildOptions {
    fn from(config: &IndexConfig) -> Self {
        Self {
            connector_vocabulary: config.lexicon.connector_vocabulary.iter().cloned().collect(),
            suffix_prefix: config.lexicon.suffix_prefix.clone(),
            connector_prefix: config.lexicon.connector_prefix.clone(),
            intro_registers_forms: config.grammar.intro_registers_forms,
        }
    }
}

impl BuildOptions {
    /// Whether a step's option tokens count as introduced at that step
    fn registers_tokens(&self, step: &Step) -> bool {
        match step {
            Step::GrammarFillBlank { .. } => true,
            Step::GrammarIntro { .. } => self.intro_registers_forms,
            Step::Flashcard { .. }
            | Step::Quiz { .. }
            | Step::Matching { .. }
            | Step::AudioMeaning { .. }
            | Step::AudioSequence { .. }
            | Step::Input { .. }
            | Step::ReverseQuiz { .. }
            | Step::Final { .. }
            | Step::Welcome { .. }
            | Step::StoryConversation { .. }
            | Step::TextSequence { .. } => false,
        }
    }
}

fn push_unique(list: &mut Vec<String>, token: &str) {
    if !list.iter().any(|t| t == token) {
        list.push(token.to_string());
    }
}

/// Build the lexicon for a curriculum
pub fn build(
    curriculum: &Curriculum,
    options: &BuildOptions,
    telemetry: &dyn Telemetry,
) -> Result<Lexicon, IndexError> {
    let mut lexicon = Lexicon {
        connector_vocabulary: options.connector_vocabulary.clone(),
        ..Lexicon::default()
    };
    let mut module_ordinals: HashMap<u32, &str> = HashMap::new();
    let mut review_refs: Vec<(LessonKey, &str)> = Vec::new();
    let mut distinct_suffixes: BTreeSet<&str> = BTreeSet::new();
    let mut distinct_connectors: BTreeSet<String> = BTreeSet::new();

    for module in &curriculum.modules {
        if let Some(first) = module_ordinals.insert(module.ordinal(), module.id.as_str()) {
            return Err(IndexError::DuplicateModuleOrdinal {
                ordinal: module.ordinal(),
                first: first.to_string(),
                second: module.id.to_string(),
            });
        }
        lexicon.module_vocabulary.entry(module.id.clone()).or_default();
        lexicon.stats.modules += 1;

        let mut lesson_ordinals: HashMap<u32, &str> = HashMap::new();
        for lesson in &module.lessons {
            if let Some(first) = lesson_ordinals.insert(lesson.ordinal(), lesson.id.as_str()) {
                return Err(IndexError::DuplicateLessonOrdinal {
                    module: module.id.to_string(),
                    ordinal: lesson.ordinal(),
                    first: first.to_string(),
                    second: lesson.id.to_string(),
                });
            }

            let key = LessonKey::new(module.id.clone(), lesson.id.clone());
            lexicon.lesson_vocabulary.entry(key.clone()).or_default();
            lexicon.stats.lessons += 1;

            for item in &lesson.vocabulary {
                if let Some(existing) = lexicon.vocabulary.get(&item.id) {
                    return Err(IndexError::DuplicateVocabulary {
                        id: item.id.clone(),
                        first: existing.origin.to_string(),
                        second: key.to_string(),
                    });
                }
                lexicon.vocabulary.insert(
                    item.id.clone(),
                    VocabularyEntry {
                        item: item.clone(),
                        origin: key.clone(),
                    },
                );
                lexicon
                    .module_vocabulary
                    .entry(module.id.clone())
                    .or_default()
                    .push(item.id.clone());
                lexicon
                    .lesson_vocabulary
                    .entry(key.clone())
                    .or_default()
                    .push(item.id.clone());

                if options.connector_vocabulary.contains(&item.id) {
                    push_unique(lexicon.connector_intros.entry(key.clone()).or_default(), &item.id);
                    distinct_connectors.insert(item.id.clone());
                }
            }

            for (index, step) in lesson.steps.iter().enumerate() {
                lexicon.stats.steps += 1;
                *lexicon
                    .stats
                    .steps_by_kind
                    .entry(step.kind().to_string())
                    .or_default() += 1;

                let registers = options.registers_tokens(step);
                let step_key = StepKey {
                    lesson: key.clone(),
                    index,
                };

                let mut suffixes: Vec<String> = Vec::new();
                let mut connectors: Vec<String> = Vec::new();
                for option in step.option_entries() {
                    if registers {
                        if let Some(token) = option.token_after(&options.suffix_prefix) {
                            push_unique(&mut suffixes, token);
                        }
                    }
                    if let Some(token) = option.token_after(&options.connector_prefix) {
                        push_unique(
                            lexicon.connector_intros.entry(key.clone()).or_default(),
                            token,
                        );
                        distinct_connectors.insert(token.to_string());
                        if registers {
                            push_unique(&mut connectors, token);
                        }
                    }
                }

                if !suffixes.is_empty() {
                    let lesson_suffixes = lexicon.lesson_suffixes.entry(key.clone()).or_default();
                    for token in &suffixes {
                        push_unique(lesson_suffixes, token);
                    }
                    lexicon.stats.suffix_steps += 1;
                    lexicon.suffix_intros.insert(step_key.clone(), suffixes);
                }
                if !connectors.is_empty() {
                    lexicon.step_connectors.insert(step_key, connectors);
                }
            }

            review_refs.extend(lesson.review.iter().map(|id| (key.clone(), id.as_str())));
        }
    }

    for tokens in lexicon.suffix_intros.values() {
        distinct_suffixes.extend(tokens.iter().map(String::as_str));
    }
    lexicon.stats.vocabulary = lexicon.vocabulary.len();
    lexicon.stats.distinct_suffixes = distinct_suffixes.len();
    lexicon.stats.distinct_connectors = distinct_connectors.len();
    lexicon.stats.review_references = review_refs.len();

    for (key, id) in review_refs {
        if !lexicon.contains_vocabulary(id) {
            telemetry.warn(
                contexts::UNKNOWN_REVIEW_REFERENCE,
                &format!("{} reviews '{}' which no lesson declares", key, id),
            );
        }
    }

    debug!(
        "Built lexicon: {} modules, {} lessons, {} steps, {} vocabulary items",
        lexicon.stats.modules, lexicon.stats.lessons, lexicon.stats.steps, lexicon.stats.vocabulary
    );
    Ok(lexicon)
}
