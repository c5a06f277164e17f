//! School name extraction from backend denial reasons.

use regex::Regex;
use std::sync::LazyLock;

/// Shown when no known phrasing matches
pub const SCHOOL_PLACEHOLDER: &str = "해당 학교";

/// Known phrasings, most specific first
static SCHOOL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(\S+)의 학교 정보가",
        r"(\S+)의 이용 기간이",
        r"(\S+)의 이용 기간\(",
        r"(\S+)의",
    ]
    .iter()
    .filter_map(|pattern| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            log::error!("Invalid school pattern {}: {}", pattern, e);
            None
        }
    })
    .collect()
});

/// Pull the school name out of a denial reason, first matching pattern wins
pub fn extract_school_name(reason: Option<&str>) -> String {
    let Some(reason) = reason else {
        return SCHOOL_PLACEHOLDER.to_string();
    };

    SCHOOL_PATTERNS
        .iter()
        .find_map(|re| re.captures(reason))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| SCHOOL_PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_period_phrasing() {
        assert_eq!(
            extract_school_name(Some("한밭고의 이용 기간이 아직 설정되지 않았습니다")),
            "한밭고"
        );
    }

    #[test]
    fn test_school_info_phrasing() {
        assert_eq!(
            extract_school_name(Some("대전고의 학교 정보가 없습니다")),
            "대전고"
        );
    }

    #[test]
    fn test_parenthesised_period_phrasing() {
        assert_eq!(
            extract_school_name(Some("서울고의 이용 기간(2025-03-01 ~ 2025-07-31)이 아닙니다")),
            "서울고"
        );
    }

    #[test]
    fn test_specific_pattern_beats_generic() {
        // Generic pattern alone would pick the first "의"
        assert_eq!(
            extract_school_name(Some("안내: 학생의 소속 한밭고의 이용 기간이 끝났습니다")),
            "한밭고"
        );
    }

    #[test]
    fn test_generic_fallback_and_placeholder() {
        assert_eq!(extract_school_name(Some("충남고의 요청")), "충남고");
        assert_eq!(extract_school_name(Some("access denied")), SCHOOL_PLACEHOLDER);
        assert_eq!(extract_school_name(None), SCHOOL_PLACEHOLDER);
    }

    proptest! {
        #[test]
        fn prop_period_phrasing_recovers_name(name in "[가-힣]{1,8}") {
            let reason = format!("{name}의 이용 기간이 아직 설정되지 않았습니다");
            prop_assert_eq!(extract_school_name(Some(&reason)), name);
        }

        #[test]
        fn prop_never_empty(reason in ".*") {
            prop_assert!(!extract_school_name(Some(&reason)).is_empty());
        }
    }
}
