//! Step introduction resolver
//!
//! Maps a single step to the tokens it newly introduces. Lookups only: the
//! expensive scanning already happened in the builder.

use crate::curriculum::{LessonId, ModuleId, Step, StepKey};

use super::lexicon::Lexicon;

/// Tokens a single step introduces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Introduction {
    pub vocab_ids: Vec<String>,
    pub suffixes: Vec<String>,
    pub connectors: Vec<String>,
}

impl Introduction {
    pub fn is_empty(&self) -> bool {
        self.vocab_ids.is_empty() && self.suffixes.is_empty() && self.connectors.is_empty()
    }
}

/// Resolve what `step`, sitting at `step_index` of `module/lesson`, introduces
///
/// Only flashcards introduce vocabulary. Unknown vocabulary ids are passed
/// through unchanged; reporting them is the caller's business.
pub fn resolve(
    step: &Step,
    lexicon: &Lexicon,
    module: &ModuleId,
    lesson: &LessonId,
    step_index: usize,
) -> Introduction {
    match step {
        Step::Flashcard { vocabulary_id } => {
            let mut intro = Introduction::default();
            if let Some(id) = vocabulary_id {
                if lexicon.is_connector_vocabulary(id) {
                    intro.connectors.push(id.clone());
                }
                intro.vocab_ids.push(id.clone());
            }
            intro
        }
        // Intro steps only have entries here when configured to register their forms
        Step::GrammarFillBlank { .. } | Step::GrammarIntro { .. } => {
            let key = StepKey::new(module, lesson, step_index);
            Introduction {
                vocab_ids: Vec::new(),
                suffixes: lexicon.suffixes_at(&key).to_vec(),
                connectors: lexicon.step_connectors_at(&key).to_vec(),
            }
        }
        Step::Quiz { .. }
        | Step::Matching { .. }
        | Step::AudioMeaning { .. }
        | Step::AudioSequence { .. }
        | Step::Input { .. }
        | Step::ReverseQuiz { .. }
        | Step::Final { .. }
        | Step::Welcome { .. }
        | Step::StoryConversation { .. }
        | Step::TextSequence { .. } => Introduction::default(),
    }
}
