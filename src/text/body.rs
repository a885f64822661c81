//! Description cleaning.
//!
//! Broadcaster descriptions carry fixed structural boilerplate: sign-offs,
//! bylines, credit blocks, tip-line and subscribe footers, copyright notices.
//! Cleaning is a priority-ordered grammar:
//!
//! 1. If a boilerplate anchor is present, cut the text at the earliest one.
//! 2. Otherwise drop every physical line that is junk in its entirety and
//!    join the survivors with single spaces.
//! 3. Run the [`BODY_STEPS`] table regardless of the branch taken, re-run to
//!    a fixpoint by [`clean_body`].

use super::OUTLETS;
use super::rules::{
    Step, apply_steps, collapse_whitespace, compile, converge, strip_laughter,
    strip_repeated_glyphs,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Markers after which everything is trailer text.
static ANCHORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        compile(r"※\s*['‘]?\s*당신의\s*제보가\s*뉴스가\s*됩니다"),
        compile(r"☞\s*더\s*자세한\s*정보"),
        compile(&format!(r"(?:{OUTLETS})\s*뉴스\s*[가-힣]{{2,5}}니다\.?")),
        compile(&format!(
            r"(?:{OUTLETS})\s*기사\s*원문\s*보기\s*[:：]\s*https?://\S+"
        )),
        // "YTN 유투권 (r2kwon@ytn.co.kr)"
        compile(&format!(
            r"(?m)^\s*(?:{OUTLETS})\s*[가-힣]{{2,4}}\s*\([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{{2,}}\)"
        )),
    ]
});

/// Whole-line junk: credits, calls to action, notices, bare links, hashtags.
///
/// Every pattern spans the entire trimmed line. Prose that merely ends in a
/// call to action or a notice is kept; [`BODY_STEPS`] strips the phrase.
static JUNK_LINES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // copyright notices
        compile(&format!(
            r"(?i)^(?:copyright\s*[ⓒⒸ©]?\s*(?:{OUTLETS})|[ⓒⒸ©]\s*(?:{OUTLETS}))\.?(?:\s*(?:all\s*rights\s*reserved|무단\s*전재|재배포|및|이용|AI\s*학습|포함|금지|[.,]))*$"
        )),
        compile(
            r"(?i)^(?:all\s*rights\s*reserved\.?|(?:all\s*rights\s*reserved\.?\s*)?무단\s*전재(?:\s*(?:,|및)?\s*(?:재배포|이용|AI\s*학습|포함))*\s*금지\.?)$",
        ),
        // credit blocks: "영상편집: 김영희", "(영상취재: 이상욱)", "촬영기자 | 김OO"
        compile(
            r"(?i)^[\(\[]?\s*(?:영상취재|촬영기자|촬영|영상편집|편집|그래픽|디자인|화면제공|자료제공|기자|앵커|특파원|기상캐스터|진행|리포터|논설위원|구성|제작|작가|CG|자막뉴스)\s*[:：|].*$",
        ),
        // a reporter's name alone on a line
        compile(r"^[가-힣]{2,4}\s*(?:기자|앵커|특파원|기상캐스터)$"),
        // tip line / contact lines
        compile(
            r"(?i)^(?:홈페이지|애플리케이션|앱|카카오톡|페이스북|인스타그램|이메일|메일|문자|전화)\s*[:：]?.*(?:제보|친구\s*맺고\s*채팅|메시지\s*전송|@(?:sbs|kbs|ytn)\.co\.kr|\d{2,4}-\d{3,4}-\d{4}|앱\s*설치|채널\s*추가|구독|https?://).*$",
        ),
        compile(
            r"^(?:[☞▶▷※■]\s*)?(?:제보|문의)(?:\s*(?:전화|메일|이메일))?\s*[:：]?\s*(?:(?:\d{2,4}-\d{3,4}-\d{4}|[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})[\s,/]*)+$",
        ),
        // promotional lines led by a marker glyph
        compile(
            r"(?i)^(?:☞|▶|▷|♨|▣|※|■)\s*(?:더\s*자세한\s*정보|기사\s*모아보기|지금\s*뜨거운\s*이슈|기사\s*원문|제보\s*하기|채널\s*추가|(?:KBS|SBS|YTN)\s*(?:뉴스|제보|검색)|당신의\s*제보가\s*뉴스가\s*됩니다|함께\s*토론하기|클릭|보기|.*구독|.*https?://|.*\.co\.kr|.*goo\.gl|.*pf\.kakao\.com).*$",
        ),
        // calls to action standing alone: "구독과 좋아요 부탁드립니다", "SBS 뉴스 채널 구독하기"
        compile(&format!(
            r"^(?:[☞▶▷■※]\s*)?(?:(?:{OUTLETS})\s*)?(?:뉴스\s*)?(?:채널\s*)?(?:구독|좋아요|알림\s*설정)(?:\s*(?:과|와|,|및|하기|하고|부탁(?:\s*드립니다|\s*드려요|해요)?|해\s*주세요|눌러\s*주세요|구독|좋아요|알림\s*설정|[!.~]))*$"
        )),
        // bare domains and urls
        compile(r"^(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}(?:/\S*)?$"),
        compile(r"^https?://\S+$"),
        // hashtag-only lines
        compile(r"^#[\w가-힣]+(?:[\s,]*#[\w가-힣]+)*$"),
    ]
});

/// Rewrites applied after truncation or line filtering, in order.
pub static BODY_STEPS: Lazy<Vec<Step>> = Lazy::new(|| {
    vec![
        // brackets and parentheses
        Step::blank(r"\([^()]*\)"),
        Step::blank(r"\{[^{}]*\}"),
        Step::blank(r"\[[^\[\]]*\]"),
        Step::blank(r"【[^】]*】"),
        Step::blank(r"<[^<>]*>"),
        // hashtags
        Step::blank(r"#[\w가-힣]+"),
        // trailing notices and calls to action inside prose
        Step::blank(
            r"(?i)all\s*rights\s*reserved|무단\s*전재(?:\s*(?:,|및)?\s*(?:재배포|이용|AI\s*학습|포함))*\s*금지",
        ),
        Step::blank(
            r"(?:구독과\s*좋아요|좋아요와\s*구독)(?:\s*(?:부탁\s*(?:드립니다|드려요|해요)|눌러\s*주세요|해\s*주세요))?",
        ),
        // sign-off sentences
        Step::blank(&format!(
            r"지금까지\s*(?:[가-힣]{{2,5}}부에서\s*)?(?:(?:{OUTLETS})\s*)?[가-힣]{{2,5}}입니다\.?"
        )),
        Step::blank(&format!(r"(?:{OUTLETS})\s*[가-힣]{{2,5}}\s*입니다\.?")),
        Step::blank(r"[가-힣]{2,5}\s*기자(?:의)?\s*(?:보도(?:입니다)?|보돕니다)\.?"),
        Step::blank(r"[가-힣]{2,5}\s*(?:특파원|기자|앵커|리포터)(?:입니다|였습니다)\.?"),
        Step::blank(r"뉴스\s?[가-힣]{1,10}입니다\.?|기자입니다\.?|기잡니다\.?|보도합니다\.?|전해드립니다\.?|전해드렸습니다\.?"),
        // quoted speaker: "시민 김모씨: 너무 힘들어요"
        Step::blank(r"[가-힣A-Za-z]{2,10}(?:\s+[가-힣]{2,6})?\s*[:：]\s*[가-힣\s]{2,200}"),
        // interview citation: [홍길동 교수: "..."]
        Step::blank(r#"\[[^\]]+[:：]\s*["“][^"”]+["”]\s*\]"#),
        // job titles standing alone
        Step::blank(r"\b(?:앵커|기자|특파원|리포터|기상캐스터|논설위원|해설위원)\b"),
        // quotation marks
        Step::blank(r#"["“”‘’'`]"#),
        // numbers with an attached unit, then stray numbering
        Step::blank(r"\b\d[\d,]*(?:\.\d+)?[가-힣a-zA-Z]*"),
        Step::blank(r"#\s*\d+"),
        Step::Apply(strip_repeated_glyphs),
        Step::Apply(strip_laughter),
        Step::blank(r"[^\w\s가-힣]"),
        Step::Apply(collapse_whitespace),
    ]
});

/// Byte offset of the earliest boilerplate anchor, if any.
pub fn find_anchor(text: &str) -> Option<usize> {
    ANCHORS
        .iter()
        .filter_map(|re| re.find(text).map(|m| m.start()))
        .min()
}

/// Whether a (trimmed) line is boilerplate.
pub fn is_junk_line(line: &str) -> bool {
    JUNK_LINES.iter().any(|re| re.is_match(line))
}

fn drop_junk_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_junk_line(line))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut at the earliest anchor, or else drop junk lines.
fn strip_boilerplate(text: &str) -> String {
    match find_anchor(text) {
        Some(idx) => text[..idx].to_string(),
        None => drop_junk_lines(text),
    }
}

/// Clean a description into plain content text. Idempotent.
///
/// Physical lines are filtered once, on the raw input. Later passes only see
/// the joined single line, so the line filter can reject it only as a whole.
pub fn clean_body(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let joined = strip_boilerplate(raw);
    converge(&joined, |text| apply_steps(&BODY_STEPS, &strip_boilerplate(text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_at_sign_off_anchor() {
        let raw = "폭우로 피해가 컸습니다.\nKBS 뉴스 홍길동입니다.\n촬영기자: 김철수\n추가 안내 문구";
        let out = clean_body(raw);
        assert_eq!(out, "폭우로 피해가 컸습니다");
        assert!(!out.contains("김철수"));
        assert!(!out.contains("안내"));
    }

    #[test]
    fn test_truncates_at_earliest_anchor() {
        let raw = "태풍이 북상하고 있습니다.\nYTN 유투권 (r2kwon@ytn.co.kr)\n※ '당신의 제보가 뉴스가 됩니다'\n[카카오톡] YTN 검색해 채널 추가";
        assert_eq!(clean_body(raw), "태풍이 북상하고 있습니다");
    }

    #[test]
    fn test_truncates_at_article_link() {
        let raw = "정상회담이 열렸습니다 KBS 기사 원문보기 : https://news.kbs.co.kr/news/view.do?ncd=123 이어지는 광고";
        assert_eq!(clean_body(raw), "정상회담이 열렸습니다");
    }

    #[test]
    fn test_drops_junk_lines() {
        let raw = "폭우로 도로가 잠겼습니다.\n영상편집: 김영희\n#폭우 #침수\nhttps://news.kbs.co.kr/123\nCopyright ⓒ SBS. All rights reserved.";
        assert_eq!(clean_body(raw), "폭우로 도로가 잠겼습니다");
    }

    #[test]
    fn test_junk_line_patterns() {
        assert!(is_junk_line("(영상취재: 이상욱)"));
        assert!(is_junk_line("촬영기자:김철수/영상편집:이영희"));
        assert!(is_junk_line("▶ 기사 모아보기 https://n.sbs.co.kr/abc"));
        assert!(is_junk_line("news.kbs.co.kr"));
        assert!(is_junk_line("#속보, #KBS"));
        assert!(is_junk_line("전화 02-781-1234"));
        assert!(is_junk_line("홍길동 기자"));
        assert!(!is_junk_line("진행된 회의에서 합의가 이뤄졌습니다."));
        assert!(!is_junk_line("기자회견이 열렸습니다."));
        assert!(is_junk_line("구독과 좋아요 부탁드립니다"));
        assert!(is_junk_line("SBS 뉴스 채널 구독하기"));
        assert!(is_junk_line("무단 전재 및 재배포 금지"));
        assert!(is_junk_line("제보: 02-781-1234"));
        assert!(!is_junk_line("구독자 백만 명 돌파 소식입니다"));
        assert!(!is_junk_line("서울에 폭우가 쏟아졌습니다. 구독과 좋아요 부탁드립니다"));
        assert!(!is_junk_line("제보 내용을 확인하고 있습니다"));
    }

    #[test]
    fn test_single_line_with_trailing_call_to_action() {
        assert_eq!(
            clean_body("서울에 폭우가 쏟아져 도로가 잠겼습니다. 구독과 좋아요 부탁드립니다"),
            "서울에 폭우가 쏟아져 도로가 잠겼습니다"
        );
    }

    #[test]
    fn test_single_line_with_trailing_notice() {
        assert_eq!(
            clean_body("정부가 새 대책을 발표했습니다. 무단 전재 및 재배포 금지"),
            "정부가 새 대책을 발표했습니다"
        );
    }

    #[test]
    fn test_joined_lines_are_not_refiltered() {
        assert_eq!(
            clean_body("우리 채널\n구독자 백만 명 돌파 소식입니다"),
            "우리 채널 구독자 백만 명 돌파 소식입니다"
        );
    }

    #[test]
    fn test_standalone_call_to_action_line_dropped() {
        assert_eq!(
            clean_body("폭염 특보가 내려졌습니다.\n구독과 좋아요 부탁드립니다\n알림 설정"),
            "폭염 특보가 내려졌습니다"
        );
    }

    #[test]
    fn test_removes_quoted_speaker() {
        let raw = "정부는 대책을 발표했다. 시민 김모씨: 너무 힘들어요. 이후 조치가 이어졌다";
        assert_eq!(clean_body(raw), "정부는 대책을 발표했다 이후 조치가 이어졌다");
    }

    #[test]
    fn test_removes_numbers_and_brackets() {
        let raw = "[앵커] 서울 기온이 35도를 넘었습니다 (자료화면)";
        assert_eq!(clean_body(raw), "서울 기온이 넘었습니다");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_body(""), "");
        assert_eq!(clean_body("\n\n  "), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "폭우로 피해가 컸습니다.\nKBS 뉴스 홍길동입니다.\n촬영기자: 김철수",
            "진행 상황을 점검했습니다. 하하 그렇군요\n#뉴스",
            "시민 김모씨: 너무 힘들어요. \"정말로\" 2025년 3명이 다쳤다",
            "Breaking news in English, 3 people hurt.",
        ];
        for s in samples {
            let once = clean_body(s);
            assert_eq!(clean_body(&once), once, "input: {s}");
        }
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn clean_body_is_idempotent(s in "[가-힣ㅋㅎa-zA-Z0-9 .,:!?()\\[\\]#/@\n-]{0,80}") {
                let once = clean_body(&s);
                prop_assert_eq!(clean_body(&once), once);
            }

            #[test]
            fn clean_body_is_idempotent_on_boilerplate(
                lines in proptest::collection::vec(
                    prop_oneof![
                        "[가-힣 .]{1,30}",
                        Just("구독과 좋아요 부탁드립니다".to_string()),
                        Just("영상편집: 김영희".to_string()),
                        Just("채널".to_string()),
                        Just("구독자".to_string()),
                        Just("KBS 뉴스 홍길동입니다.".to_string()),
                        Just("#속보 #폭우".to_string()),
                    ],
                    0..6,
                )
            ) {
                let raw = lines.join("\n");
                let once = clean_body(&raw);
                prop_assert_eq!(clean_body(&once), once);
            }
        }
    }
}
