//! Lesson steps
//!
//! A step is one screen of a lesson. The set of kinds is closed: adding a kind
//! means adding a variant here, and every `match` over [`Step`] (the resolver,
//! the builder, the audit) has to decide what the new kind introduces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A selectable option of an exercise (`suffix-am`, `conn-ve`, `word-kitab`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

impl ChoiceOption {
    /// Token following `prefix` in the option id, if the id uses that convention
    pub fn token_after<'a>(&'a self, prefix: &str) -> Option<&'a str> {
        self.id
            .strip_prefix(prefix)
            .filter(|token| !token.is_empty())
    }
}

/// One blank of a fill-in-the-blank sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blank {
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryLine {
    pub speaker: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
}

/// One unit of lesson content, tagged by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Step {
    Flashcard {
        #[serde(default)]
        vocabulary_id: Option<String>,
    },
    Quiz {
        #[serde(default)]
        prompt: String,
        #[serde(default)]
        options: Vec<ChoiceOption>,
        #[serde(default)]
        answer: Option<String>,
    },
    GrammarFillBlank {
        #[serde(default)]
        sentence: String,
        #[serde(default)]
        blanks: Vec<Blank>,
    },
    GrammarIntro {
        #[serde(default)]
        title: String,
        /// Forms shown on the intro card, in the same id convention as options
        #[serde(default)]
        forms: Vec<ChoiceOption>,
    },
    Matching {
        #[serde(default)]
        pairs: Vec<MatchPair>,
    },
    AudioMeaning {
        #[serde(default)]
        vocabulary_id: Option<String>,
        #[serde(default)]
        options: Vec<ChoiceOption>,
    },
    AudioSequence {
        #[serde(default)]
        tokens: Vec<String>,
    },
    Input {
        #[serde(default)]
        prompt: String,
        #[serde(default)]
        answers: Vec<String>,
    },
    ReverseQuiz {
        #[serde(default)]
        vocabulary_id: Option<String>,
        #[serde(default)]
        options: Vec<ChoiceOption>,
    },
    Final {
        #[serde(default)]
        title: Option<String>,
    },
    Welcome {
        #[serde(default)]
        title: Option<String>,
    },
    StoryConversation {
        #[serde(default)]
        lines: Vec<StoryLine>,
    },
    TextSequence {
        #[serde(default)]
        options: Vec<ChoiceOption>,
        #[serde(default)]
        answer: Vec<String>,
    },
}

/// Payload-free discriminant of [`Step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepKind {
    Flashcard,
    Quiz,
    GrammarFillBlank,
    GrammarIntro,
    Matching,
    AudioMeaning,
    AudioSequence,
    Input,
    ReverseQuiz,
    Final,
    Welcome,
    StoryConversation,
    TextSequence,
}

impl StepKind {
    pub const ALL: [StepKind; 13] = [
        StepKind::Flashcard,
        StepKind::Quiz,
        StepKind::GrammarFillBlank,
        StepKind::GrammarIntro,
        StepKind::Matching,
        StepKind::AudioMeaning,
        StepKind::AudioSequence,
        StepKind::Input,
        StepKind::ReverseQuiz,
        StepKind::Final,
        StepKind::Welcome,
        StepKind::StoryConversation,
        StepKind::TextSequence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Flashcard => "flashcard",
            StepKind::Quiz => "quiz",
            StepKind::GrammarFillBlank => "grammar-fill-blank",
            StepKind::GrammarIntro => "grammar-intro",
            StepKind::Matching => "matching",
            StepKind::AudioMeaning => "audio-meaning",
            StepKind::AudioSequence => "audio-sequence",
            StepKind::Input => "input",
            StepKind::ReverseQuiz => "reverse-quiz",
            StepKind::Final => "final",
            StepKind::Welcome => "welcome",
            StepKind::StoryConversation => "story-conversation",
            StepKind::TextSequence => "text-sequence",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::Flashcard { .. } => StepKind::Flashcard,
            Step::Quiz { .. } => StepKind::Quiz,
            Step::GrammarFillBlank { .. } => StepKind::GrammarFillBlank,
            Step::GrammarIntro { .. } => StepKind::GrammarIntro,
            Step::Matching { .. } => StepKind::Matching,
            Step::AudioMeaning { .. } => StepKind::AudioMeaning,
            Step::AudioSequence { .. } => StepKind::AudioSequence,
            Step::Input { .. } => StepKind::Input,
            Step::ReverseQuiz { .. } => StepKind::ReverseQuiz,
            Step::Final { .. } => StepKind::Final,
            Step::Welcome { .. } => StepKind::Welcome,
            Step::StoryConversation { .. } => StepKind::StoryConversation,
            Step::TextSequence { .. } => StepKind::TextSequence,
        }
    }

    /// Shorthand for a flashcard introducing `vocabulary_id`
    pub fn flashcard(vocabulary_id: impl Into<String>) -> Self {
        Step::Flashcard {
            vocabulary_id: Some(vocabulary_id.into()),
        }
    }

    /// Every option entry the step carries, in declaration order
    pub fn option_entries(&self) -> Vec<&ChoiceOption> {
        match self {
            Step::Quiz { options, .. }
            | Step::AudioMeaning { options, .. }
            | Step::ReverseQuiz { options, .. }
            | Step::TextSequence { options, .. } => options.iter().collect(),
            Step::GrammarFillBlank { blanks, .. } => {
                blanks.iter().flat_map(|b| b.options.iter()).collect()
            }
            Step::GrammarIntro { forms, .. } => forms.iter().collect(),
            Step::StoryConversation { lines } => {
                lines.iter().flat_map(|l| l.options.iter()).collect()
            }
            Step::Flashcard { .. }
            | Step::Matching { .. }
            | Step::AudioSequence { .. }
            | Step::Input { .. }
            | Step::Final { .. }
            | Step::Welcome { .. } => Vec::new(),
        }
    }

    /// Vocabulary the step points at, whether introducing it or practising it
    pub fn referenced_vocabulary(&self) -> Option<&str> {
        match self {
            Step::Flashcard { vocabulary_id }
            | Step::AudioMeaning { vocabulary_id, .. }
            | Step::ReverseQuiz { vocabulary_id, .. } => vocabulary_id.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tagged_steps() {
        let json = r#"[
            {"type": "flashcard", "vocabulary_id": "word-su"},
            {"type": "grammar-fill-blank", "sentence": "Ben ev__", "blanks": [
                {"options": [{"id": "suffix-de", "text": "-de"}, {"id": "suffix-da"}], "answer": "suffix-de"}
            ]},
            {"type": "welcome"},
            {"type": "story-conversation", "lines": [{"speaker": "Ali", "options": [{"id": "conn-ve"}]}]}
        ]"#;
        let steps: Vec<Step> = serde_json::from_str(json).unwrap();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0], Step::flashcard("word-su"));
        assert_eq!(steps[1].kind(), StepKind::GrammarFillBlank);
        assert_eq!(steps[1].option_entries().len(), 2);
        assert_eq!(steps[2].kind().to_string(), "welcome");
        assert_eq!(steps[3].option_entries()[0].id, "conn-ve");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = serde_json::from_str::<Step>(r#"{"type": "hologram"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_kind_names_match_tags() {
        for kind in StepKind::ALL {
            let json = format!(r#"{{"type": "{}"}}"#, kind.as_str());
            let step: Step = serde_json::from_str(&json).unwrap();
            assert_eq!(step.kind(), kind);
        }
    }

    #[test]
    fn test_token_after_prefix() {
        let opt = ChoiceOption { id: "suffix-lar".to_string(), text: String::new() };
        assert_eq!(opt.token_after("suffix-"), Some("lar"));
        assert_eq!(opt.token_after("conn-"), None);

        let bare = ChoiceOption { id: "suffix-".to_string(), text: String::new() };
        assert_eq!(bare.token_after("suffix-"), None);
    }

    #[test]
    fn test_referenced_vocabulary() {
        let step = Step::AudioMeaning {
            vocabulary_id: Some("word-ev".to_string()),
            options: vec![],
        };
        assert_eq!(step.referenced_vocabulary(), Some("word-ev"));
        assert_eq!(Step::Welcome { title: None }.referenced_vocabulary(), None);
    }
}
