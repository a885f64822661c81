//! Title cleaning.

use super::OUTLETS;
use super::rules::{Step, apply_steps, collapse_whitespace, converge, strip_laughter, strip_repeated_glyphs};
use once_cell::sync::Lazy;

static TITLE_STEPS: Lazy<Vec<Step>> = Lazy::new(|| {
    vec![
        // "... / KBS 2025.06.13." style outlet suffix
        Step::remove(&format!(r"\s*/\s*(?:{OUTLETS}).*")),
        Step::remove(r"\([^)]*\)"),
        Step::remove(r"\[[^\]]*\]"),
        Step::remove(r"\{[^}]*\}"),
        Step::remove(r"【[^】]*】"),
        Step::Apply(strip_repeated_glyphs),
        Step::Apply(strip_laughter),
        Step::remove(
            r"\b(?:앗|헉|윽|흥|풉|에구|읏|으음|아악|끼야|푸하하|하하하|히히히|헤헤헤|흐흐흐|낄낄|깔깔|콜록콜록|훌쩍|쉿)\b",
        ),
        Step::blank(r"[^\w\s가-힣.%]"),
        Step::blank(r"[·•]{3,}|\.{3,}|…"),
        Step::Apply(collapse_whitespace),
    ]
});

/// Produce a display-clean title.
///
/// Strips the outlet suffix, bracketed annotations, glyph spam, interjections
/// and punctuation other than `.` and `%`. Idempotent.
pub fn clean_title(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    converge(raw, |s| apply_steps(&TITLE_STEPS, s))
}
