//! Content-token extraction for downstream vectorization.
//!
//! [`tokenize_for_vector`] runs [`clean_body`], segments the result with a
//! part-of-speech segmenter, keeps nouns, verbs, adjectives and adverbs in
//! their stemmed form, and drops short tokens and stopwords. Output order
//! follows the source text.
//!
//! Segmenters may hold per-instance state and are not shared between
//! concurrent workers: each worker builds its own through a
//! [`SegmenterFactory`].

use super::body::clean_body;
use super::rules::{collapse_whitespace, compile, converge};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// Coarse part-of-speech classes a segmenter reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosTag {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Number,
    Foreign,
    Other,
}

impl PosTag {
    /// Whether tokens with this tag carry content worth vectorizing.
    pub fn is_content(self) -> bool {
        matches!(
            self,
            PosTag::Noun | PosTag::Verb | PosTag::Adjective | PosTag::Adverb
        )
    }
}

/// Segmenter option flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOptions {
    /// Normalize colloquial spellings.
    pub normalize: bool,
    /// Reduce predicates to their dictionary form (`발표했다` → `발표` + `하다`).
    pub stem: bool,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            stem: true,
        }
    }
}

/// A part-of-speech segmenter.
pub trait PosSegmenter {
    /// Split text into `(surface, tag)` pairs in source order.
    fn segment(&mut self, text: &str, options: SegmentOptions) -> Vec<(String, PosTag)>;
}

/// Builds a fresh segmenter for one worker.
pub type SegmenterFactory = Arc<dyn Fn() -> Box<dyn PosSegmenter> + Send + Sync>;

/// The segmenter used when none is configured.
///
/// With the `ko-dic` feature this is the dictionary-backed
/// [`kodic::KoDicSegmenter`], falling back to [`HeuristicSegmenter`] when the
/// dictionary cannot be loaded.
pub fn default_segmenter_factory() -> SegmenterFactory {
    Arc::new(|| -> Box<dyn PosSegmenter> {
        #[cfg(feature = "ko-dic")]
        if let Some(seg) = kodic::KoDicSegmenter::new() {
            return Box::new(seg);
        }
        Box::new(HeuristicSegmenter::default())
    })
}

static KOREAN_STOPWORDS: &[&str] = &[
    "오늘", "이번", "지난", "되다", "하다", "있다", "이다", "것", "수", "그", "더", "좀", "잘",
    "가장", "다", "또", "많이", "그리고", "그러나", "하지만", "따라", "등", "등등", "통해",
    "까지", "부터", "대한", "으로", "에서", "에게", "에게서", "보다", "때문",
    "습니다", "합니다", "합니다만", "입니다만", "이라고", "이었습니다", "였습니다",
    "년", "월", "일", "시", "분", "초", "오전", "오후", "이번주", "지난주", "다음주", "이달",
    "지난달", "다음달", "올해", "지난해", "내년",
    "명", "원", "씨", "보시", "하시", "들어보시", "확인해보시", "시키", "알아보시", "해보시",
    "어서", "으니", "으면", "어도", "으러",
    "앱", "설치", "뉴스", "제보", "채널", "구독", "라이브", "모바일", "24", "홈페이지",
    "카카오톡", "페이스북", "이메일", "문자", "전화", "친구", "채팅", "메시지", "전송", "스프",
    "토론", "구독하기", "만나다", "보기", "검색", "누르다", "뜨겁다", "이슈", "함께", "기사",
    "모으다", "실시간", "문의", "연락처", "연결", "링크", "클릭", "자세하다",
];

static STOPWORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| KOREAN_STOPWORDS.iter().copied().collect());

static NON_SEGMENTABLE: Lazy<Regex> = Lazy::new(|| compile(r"[^\w\s가-힣.]"));

/// Whether a token is in the stopword inventory.
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

fn tokenize_pass(text: &str, segmenter: &mut dyn PosSegmenter) -> String {
    let cleaned = clean_body(text);
    let cleaned = collapse_whitespace(&NON_SEGMENTABLE.replace_all(&cleaned, " "));
    if cleaned.is_empty() {
        return String::new();
    }
    segmenter
        .segment(&cleaned, SegmentOptions::default())
        .into_iter()
        .filter(|(_, tag)| tag.is_content())
        .map(|(surface, _)| surface)
        .filter(|w| w.chars().count() > 1 && !is_stopword(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reduce raw text to space-joined content tokens. Idempotent for a given
/// segmenter.
pub fn tokenize_for_vector(raw: &str, segmenter: &mut dyn PosSegmenter) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    converge(raw, |s| tokenize_pass(s, segmenter))
}

/// Light-verb endings: `(suffix, lemma)`.
const LIGHT_VERB_ENDINGS: &[(&str, &str)] = &[
    ("했습니다", "하다"),
    ("합니다", "하다"),
    ("했는데", "하다"),
    ("했다", "하다"),
    ("한다", "하다"),
    ("하는", "하다"),
    ("하고", "하다"),
    ("해서", "하다"),
    ("하며", "하다"),
    ("했고", "하다"),
    ("하기", "하다"),
    ("하다", "하다"),
    ("됐습니다", "되다"),
    ("됩니다", "되다"),
    ("됐다", "되다"),
    ("된다", "되다"),
    ("되는", "되다"),
    ("되고", "되다"),
    ("되어", "되다"),
    ("되다", "되다"),
];

/// Generic predicate endings replaced by `다`.
const PREDICATE_ENDINGS: &[&str] = &["었습니다", "았습니다", "습니다", "었다", "았다", "겠다", "는다"];

/// Case particles, longest first.
const PARTICLES: &[&str] = &[
    "에서는", "에게서", "으로는", "이라고", "으로", "에서", "에게", "까지", "부터", "처럼", "보다",
    "라고", "께서", "와의", "과의", "에는", "에도", "은", "는", "이", "가", "을", "를", "에", "의",
    "와", "과", "도", "만", "로",
];

const ADVERBS: &[&str] = &[
    "매우", "가장", "다시", "이미", "아직", "계속", "함께", "모두", "특히", "결국", "먼저", "또한",
    "바로", "더욱", "많이", "크게", "새로", "즉시", "곧", "점차", "여전히", "처음",
];

/// Dictionary-free segmenter built from ending and particle tables.
///
/// Splits on whitespace, stems `-하다`/`-되다` predicates into a noun plus the
/// light verb, reduces other predicates to their `-다` form, and strips one
/// trailing particle from nouns.
#[derive(Debug, Default, Clone)]
pub struct HeuristicSegmenter;

impl HeuristicSegmenter {
    fn segment_word(word: &str, options: SegmentOptions, out: &mut Vec<(String, PosTag)>) {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric());
        if word.is_empty() {
            return;
        }
        if word.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
            out.push((word.to_string(), PosTag::Number));
            return;
        }
        if !word.chars().any(is_hangul) {
            out.push((word.to_string(), PosTag::Foreign));
            return;
        }
        if ADVERBS.contains(&word) {
            out.push((word.to_string(), PosTag::Adverb));
            return;
        }
        if options.stem {
            if let Some((suffix, lemma)) = LIGHT_VERB_ENDINGS.iter().find(|(s, _)| word.ends_with(s)) {
                let root = &word[..word.len() - suffix.len()];
                if !root.is_empty() {
                    out.push((root.to_string(), PosTag::Noun));
                }
                out.push((lemma.to_string(), PosTag::Verb));
                return;
            }
            if let Some(suffix) = PREDICATE_ENDINGS.iter().find(|s| word.ends_with(*s)) {
                let root = &word[..word.len() - suffix.len()];
                if !root.is_empty() {
                    out.push((format!("{root}다"), PosTag::Verb));
                    return;
                }
            }
        }
        out.push((strip_particle(word).to_string(), PosTag::Noun));
    }
}

impl PosSegmenter for HeuristicSegmenter {
    fn segment(&mut self, text: &str, options: SegmentOptions) -> Vec<(String, PosTag)> {
        let mut out = Vec::new();
        for word in text.split_whitespace() {
            Self::segment_word(word, options, &mut out);
        }
        out
    }
}

fn is_hangul(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

fn strip_particle(word: &str) -> &str {
    for particle in PARTICLES {
        if let Some(stem) = word.strip_suffix(particle) {
            if stem.chars().count() >= 2 {
                return stem;
            }
        }
    }
    word
}

/// `lindera` adapter over the ko-dic dictionary.
#[cfg(feature = "ko-dic")]
pub mod kodic {
    use super::{PosSegmenter, PosTag, SegmentOptions};
    use lindera::mode::Mode;
    use lindera::tokenizer::{Tokenizer, TokenizerConfig};
    use lindera::{DictionaryConfig, DictionaryKind};

    pub struct KoDicSegmenter {
        tokenizer: Tokenizer,
    }

    impl KoDicSegmenter {
        pub fn new() -> Option<Self> {
            let config = TokenizerConfig {
                dictionary: DictionaryConfig {
                    kind: Some(DictionaryKind::KoDic),
                    path: None,
                },
                user_dictionary: None,
                mode: Mode::Normal,
            };
            Tokenizer::from_config(config)
                .ok()
                .map(|tokenizer| Self { tokenizer })
        }
    }

    impl std::fmt::Debug for KoDicSegmenter {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("KoDicSegmenter").finish()
        }
    }

    /// Map a ko-dic (Sejong) tag to a coarse class.
    fn classify(tag: &str) -> PosTag {
        match tag {
            "NNG" | "NNP" | "NNB" | "NR" | "NP" => PosTag::Noun,
            "VV" | "VX" => PosTag::Verb,
            "VA" => PosTag::Adjective,
            "MAG" | "MAJ" => PosTag::Adverb,
            "SN" => PosTag::Number,
            "SL" | "SH" => PosTag::Foreign,
            _ => PosTag::Other,
        }
    }

    impl PosSegmenter for KoDicSegmenter {
        fn segment(&mut self, text: &str, options: SegmentOptions) -> Vec<(String, PosTag)> {
            let Ok(tokens) = self.tokenizer.tokenize(text) else {
                return Vec::new();
            };
            let mut out = Vec::with_capacity(tokens.len());
            for mut token in tokens {
                let surface = token.get_text().trim().to_string();
                if surface.is_empty() {
                    continue;
                }
                let details: Vec<String> = token
                    .get_details()
                    .map(|d| d.iter().map(|s| s.to_string()).collect())
                    .unwrap_or_default();
                let full_tag = details.first().map(String::as_str).unwrap_or("");
                // Inflected forms carry compound tags such as "VV+EP"; the
                // expression column holds the base morpheme.
                let head_tag = full_tag.split('+').next().unwrap_or("");
                let tag = classify(head_tag);
                let base = if full_tag.contains('+') {
                    details
                        .get(7)
                        .and_then(|expr| expr.split('+').next())
                        .and_then(|m| m.split('/').next())
                        .map(str::to_string)
                        .unwrap_or_else(|| surface.clone())
                } else {
                    surface.clone()
                };
                let form = if options.stem && matches!(tag, PosTag::Verb | PosTag::Adjective) {
                    format!("{base}다")
                } else {
                    base
                };
                out.push((form, tag));
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristic() -> HeuristicSegmenter {
        HeuristicSegmenter
    }

    #[test]
    fn test_heuristic_light_verbs() {
        let tags = heuristic().segment("정부가 대책을 발표했다", SegmentOptions::default());
        assert_eq!(
            tags,
            vec![
                ("정부".to_string(), PosTag::Noun),
                ("대책".to_string(), PosTag::Noun),
                ("발표".to_string(), PosTag::Noun),
                ("하다".to_string(), PosTag::Verb),
            ]
        );
    }

    #[test]
    fn test_heuristic_predicates_numbers_and_foreign() {
        let tags = heuristic().segment("피해가 있었다 2025 COVID 매우", SegmentOptions::default());
        assert_eq!(
            tags,
            vec![
                ("피해".to_string(), PosTag::Noun),
                ("있다".to_string(), PosTag::Verb),
                ("2025".to_string(), PosTag::Number),
                ("COVID".to_string(), PosTag::Foreign),
                ("매우".to_string(), PosTag::Adverb),
            ]
        );
    }

    #[test]
    fn test_particle_needs_two_char_stem() {
        assert_eq!(strip_particle("아이가"), "아이");
        assert_eq!(strip_particle("나이"), "나이");
        assert_eq!(strip_particle("대통령은"), "대통령");
    }

    #[test]
    fn test_tokenize_keeps_content_in_order() {
        let mut seg = heuristic();
        let out = tokenize_for_vector(
            "정부가 오늘 폭염 대책을 발표했습니다.\n영상편집: 김영희",
            &mut seg,
        );
        assert_eq!(out, "정부 폭염 대책 발표");
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_short_tokens() {
        let mut seg = heuristic();
        let out = tokenize_for_vector("뉴스 이슈 수 그 물가 상승", &mut seg);
        assert_eq!(out, "물가 상승");
    }

    #[test]
    fn test_tokenize_empty() {
        let mut seg = heuristic();
        assert_eq!(tokenize_for_vector("", &mut seg), "");
        assert_eq!(tokenize_for_vector("ㅋㅋㅋ !!", &mut seg), "");
    }

    #[test]
    fn test_tokenize_idempotent() {
        let samples = [
            "정부가 오늘 폭염 대책을 발표했습니다.\n영상편집: 김영희",
            "고양이를 구조한 시민이 화제가 됐다",
            "경찰은 사고 원인을 조사하고 있습니다 KBS 뉴스 홍길동입니다.",
        ];
        for s in samples {
            let mut seg = heuristic();
            let once = tokenize_for_vector(s, &mut seg);
            assert_eq!(tokenize_for_vector(&once, &mut seg), once, "input: {s}");
        }
    }

    #[test]
    fn test_default_factory_builds_fresh_segmenters() {
        let factory = default_segmenter_factory();
        let mut a = factory();
        let mut b = factory();
        let opts = SegmentOptions::default();
        assert_eq!(a.segment("물가 상승", opts), b.segment("물가 상승", opts));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn tokenize_is_idempotent(s in "[가-힣a-zA-Z0-9 .,:!?()#\n]{0,80}") {
                let mut seg = HeuristicSegmenter;
                let once = tokenize_for_vector(&s, &mut seg);
                prop_assert_eq!(tokenize_for_vector(&once, &mut seg), once);
            }

            #[test]
            fn tokenize_is_idempotent_on_inflected_words(
                words in proptest::collection::vec(
                    ("[가-힣]{1,4}", "(했습니다|했다|됐다|었다|습니다|에서는|으로|을|는|가)?"),
                    0..8,
                )
            ) {
                let raw = words
                    .iter()
                    .map(|(stem, ending)| format!("{stem}{ending}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                let mut seg = HeuristicSegmenter;
                let once = tokenize_for_vector(&raw, &mut seg);
                prop_assert_eq!(tokenize_for_vector(&once, &mut seg), once);
            }
        }
    }
}
