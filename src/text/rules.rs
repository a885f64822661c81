//! Ordered rewrite rules and the generic machinery that applies them.
//!
//! Every cleaning routine in [`crate::text`] is expressed as a table of
//! [`Step`]s consumed by [`apply_steps`], so the rule set is data: each rule can
//! be tested on its own and new rules slot in without touching control flow.

use once_cell::sync::Lazy;
use regex::Regex;

/// One rewrite in a cleaning table.
pub enum Step {
    /// Replace every match of the pattern with the replacement text.
    Replace(Regex, &'static str),
    /// Run a rewrite the regex engine cannot express (e.g. backreferences).
    Apply(fn(&str) -> String),
}

impl Step {
    /// Compile a replace step.
    ///
    /// Rule tables are static, so an invalid pattern is a programming error
    /// caught by the table tests.
    pub fn replace(pattern: &str, replacement: &'static str) -> Self {
        Step::Replace(compile(pattern), replacement)
    }

    /// Remove every match of the pattern.
    pub fn remove(pattern: &str) -> Self {
        Step::replace(pattern, "")
    }

    /// Replace every match of the pattern with a single space.
    pub fn blank(pattern: &str) -> Self {
        Step::replace(pattern, " ")
    }

    pub fn run(&self, text: &str) -> String {
        match self {
            Step::Replace(re, with) => re.replace_all(text, *with).into_owned(),
            Step::Apply(f) => f(text),
        }
    }
}

pub(crate) fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("invalid cleaning pattern {pattern:?}: {e}"),
    }
}

/// Apply a rule table in order.
pub fn apply_steps(steps: &[Step], text: &str) -> String {
    steps
        .iter()
        .fold(text.to_string(), |acc, step| step.run(&acc))
}

/// Upper bound on fixpoint passes. Real inputs settle in two or three, but
/// nested repeats (`가나나가`) peel one level per pass.
const MAX_PASSES: usize = 64;

/// Re-apply a single cleaning pass until the output stops changing.
///
/// Cleaning passes can expose new matches (removing an interjection can leave
/// two identical syllables adjacent), so a single pass is not idempotent. The
/// fixpoint is.
pub fn converge(text: &str, mut pass: impl FnMut(&str) -> String) -> String {
    let mut current = pass(text);
    for _ in 1..MAX_PASSES {
        let next = pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
    tracing::debug!(
        preview = %crate::utils::truncate_for_log(&current, 80),
        "Cleaning did not settle within pass limit"
    );
    current
}

/// Hangul syllables and vowel jamo that are dropped when repeated back to back.
fn is_repeatable_glyph(c: char) -> bool {
    ('가'..='힣').contains(&c) || ('ㅏ'..='ㅣ').contains(&c)
}

/// Remove runs of two or more identical Hangul syllables or vowel jamo.
///
/// This is the `([가-힣ㅏ-ㅣ])\1+` rewrite, which needs a backreference.
pub fn strip_repeated_glyphs(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let mut j = i + 1;
        while j < chars.len() && chars[j] == c {
            j += 1;
        }
        if !(is_repeatable_glyph(c) && j - i >= 2) {
            out.extend(&chars[i..j]);
        }
        i = j;
    }
    out
}

static LAUGHTER_GLYPHS: Lazy<Regex> = Lazy::new(|| compile(r"[ㅋㅎㅠㅜ]{2,}"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| compile(r"\s+"));

/// Remove `ㅋㅋ`, `ㅠㅠ` style glyph spam.
pub fn strip_laughter(text: &str) -> String {
    LAUGHTER_GLYPHS.replace_all(text, "").into_owned()
}

/// Collapse whitespace runs to one space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
