//! `lingua`-backed language classification.
//!
//! The detector is restricted to Korean and English, the two languages the
//! target channels publish in. Short inputs and low-confidence guesses report
//! `None` ("unknown") instead of a language, so they never exclude an item.

use clap::ValueEnum;
use lingua::{Language, LanguageDetector, LanguageDetectorBuilder};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum confidence for a classification to count.
pub const MIN_CONFIDENCE: f64 = 0.65;

/// Titles must be longer than this (in characters) to be classified.
pub const MIN_TITLE_CHARS: usize = 5;

/// Descriptions must be longer than this (in characters) to be classified.
pub const MIN_DESCRIPTION_CHARS: usize = 20;

static DETECTOR: Lazy<LanguageDetector> = Lazy::new(|| {
    LanguageDetectorBuilder::from_languages(&[Language::Korean, Language::English])
        .with_minimum_relative_distance(0.01)
        .build()
});

/// Languages the pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    Ko,
    En,
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LanguageCode::Ko => "ko",
            LanguageCode::En => "en",
        })
    }
}

/// A best-guess language classifier.
pub trait LanguageClassifier: Send + Sync {
    /// Classify `text`, or return `None` when the input is too short or the
    /// guess is not confident enough.
    fn classify(&self, text: &str, min_chars: usize) -> Option<LanguageCode>;
}

/// Classifier over the shared `lingua` detector.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinguaClassifier;

impl LanguageClassifier for LinguaClassifier {
    fn classify(&self, text: &str, min_chars: usize) -> Option<LanguageCode> {
        let text = text.trim();
        if text.chars().count() <= min_chars {
            return None;
        }
        let language = DETECTOR.detect_language_of(text)?;
        let confidence = DETECTOR
            .compute_language_confidence_values(text)
            .iter()
            .find(|(l, _)| *l == language)
            .map_or(0.0, |(_, c)| *c);
        if confidence < MIN_CONFIDENCE {
            return None;
        }
        match language {
            Language::Korean => Some(LanguageCode::Ko),
            Language::English => Some(LanguageCode::En),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

/// Whether an item should be excluded as non-target language.
///
/// Both title and description must be classified, confidently, as the same
/// language other than `target`. Unknown on either side keeps the item.
pub fn is_foreign(
    classifier: &dyn LanguageClassifier,
    title: &str,
    description: &str,
    target: LanguageCode,
) -> bool {
    let title_lang = classifier.classify(title, MIN_TITLE_CHARS);
    let description_lang = classifier.classify(description, MIN_DESCRIPTION_CHARS);
    match (title_lang, description_lang) {
        (Some(t), Some(d)) => t == d && t != target,
        _ => false,
    }
}
