//! Content index
//!
//! Turns the curriculum tree into a [`Lexicon`] and resolves what each step
//! introduces against it.
//!
//! Architecture:
//! - builder: one-time scan of the curriculum producing the Lexicon
//! - lexicon: immutable vocabulary/suffix/connector registry
//! - resolver: per-step introduction lookups

mod builder;
mod lexicon;
mod resolver;

pub use builder::{build, BuildOptions};
pub use lexicon::{Lexicon, LexiconStats, VocabularyEntry};
pub use resolver::{resolve, Introduction};
