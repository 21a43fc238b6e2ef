use std::sync::OnceLock;

use regex::Regex;

const VERSION: &str = r"\d+(?:\.\d+(?:\.\d+)?)?";

fn range_regex() -> &'static Regex {
    static RANGE: OnceLock<Regex> = OnceLock::new();
    RANGE.get_or_init(|| {
        let pattern = format!(
            r"^\s*(?:(?P<open>[\[\(])\s*(?:(?P<first>{VERSION})\s*,\s*(?P<second>{VERSION})?|(?P<comma>,)?\s*(?P<only>{VERSION})?)\s*(?P<close>[\]\)])|(?P<bare>{VERSION}))\s*$"
        );
        Regex::new(&pattern).expect("range pattern is valid")
    })
}

/// Translates a bracketed range expression into the canonical constraint
/// dialect. Multiple bracketed ranges in one string are unioned with
/// ` || `; a bare version becomes `>= version`; `unspecified` and `LATEST`
/// accept anything. Input that matches no range pattern is returned
/// unchanged so the downstream parser can decide its fate.
pub fn translate(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "unspecified" || trimmed == "LATEST" {
        return ">= 0.0.0".to_string();
    }

    let mut segments = Vec::new();
    let mut open = None;
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '[' | '(' => open = Some(idx),
            ']' | ')' => {
                if let Some(start) = open.take() {
                    segments.push(&trimmed[start..=idx]);
                }
            }
            _ => {}
        }
    }

    if segments.is_empty() {
        return translate_range(trimmed).unwrap_or_else(|| raw.to_string());
    }
    segments
        .iter()
        .map(|segment| translate_range(segment).unwrap_or_else(|| (*segment).to_string()))
        .collect::<Vec<_>>()
        .join(" || ")
}

fn translate_range(range: &str) -> Option<String> {
    let caps = range_regex().captures(range)?;

    if let Some(bare) = caps.name("bare") {
        return Some(format!(">= {}", bare.as_str()));
    }

    let open = caps.name("open")?.as_str();
    let close = caps.name("close")?.as_str();

    if let Some(only) = caps.name("only") {
        let translated = if caps.name("comma").is_some() {
            match close {
                "]" => format!("<= {}", only.as_str()),
                _ => format!("< {}", only.as_str()),
            }
        } else {
            format!("= {}", only.as_str())
        };
        return Some(translated);
    }

    let first = caps.name("first")?;
    let lower = match open {
        "[" => format!(">= {}", first.as_str()),
        _ => format!("> {}", first.as_str()),
    };
    Some(match caps.name("second") {
        Some(second) => {
            let upper = match close {
                "]" => format!("<= {}", second.as_str()),
                _ => format!("< {}", second.as_str()),
            };
            format!("{lower}, {upper}")
        }
        None => lower,
    })
}

#[cfg(test)]
mod tests {
    use crate::core::interval::translate;

    #[test]
    fn closed_and_open_endpoints_translate() {
        assert_eq!(translate("[1.0.0,2.0.0]"), ">= 1.0.0, <= 2.0.0");
        assert_eq!(translate("[1.0.0,2.0.0)"), ">= 1.0.0, < 2.0.0");
        assert_eq!(translate("(1.0.0,2.0.0]"), "> 1.0.0, <= 2.0.0");
        assert_eq!(translate("(1.0.0,2.0.0)"), "> 1.0.0, < 2.0.0");
    }

    #[test]
    fn lower_bound_only_ranges_translate() {
        assert_eq!(translate("[1.0,]"), ">= 1.0");
        assert_eq!(translate("[1.0,)"), ">= 1.0");
        assert_eq!(translate("(1.0,]"), "> 1.0");
        assert_eq!(translate("(1.0,)"), "> 1.0");
    }

    #[test]
    fn upper_bound_only_ranges_translate() {
        assert_eq!(translate("[,2.0]"), "<= 2.0");
        assert_eq!(translate("(,2.0]"), "<= 2.0");
        assert_eq!(translate("[,2.0)"), "< 2.0");
        assert_eq!(translate("(,2.0)"), "< 2.0");
    }

    #[test]
    fn single_version_brackets_pin_exactly() {
        assert_eq!(translate("[1.4.1]"), "= 1.4.1");
        assert_eq!(translate("(1.4.1)"), "= 1.4.1");
    }

    #[test]
    fn bare_version_becomes_lower_bound() {
        assert_eq!(translate("1.2.3"), ">= 1.2.3");
        assert_eq!(translate("1"), ">= 1");
    }

    #[test]
    fn keyword_versions_accept_anything() {
        assert_eq!(translate("unspecified"), ">= 0.0.0");
        assert_eq!(translate("LATEST"), ">= 0.0.0");
    }

    #[test]
    fn multiple_ranges_union() {
        assert_eq!(translate("[1.0],[2.0]"), "= 1.0 || = 2.0");
        assert_eq!(
            translate("[1.0,2.0)(3.0,]"),
            ">= 1.0, < 2.0 || > 3.0"
        );
    }

    #[test]
    fn versions_with_zero_digits_are_understood() {
        assert_eq!(translate("[1.10,2.20]"), ">= 1.10, <= 2.20");
        assert_eq!(translate("10.0.0"), ">= 10.0.0");
    }

    #[test]
    fn unmatched_input_passes_through() {
        assert_eq!(translate("nonsense"), "nonsense");
        assert_eq!(translate("[]"), "[]");
        assert_eq!(translate("[,]"), "[,]");
        assert_eq!(translate(">= 1.0.0"), ">= 1.0.0");
    }

    #[test]
    fn whitespace_inside_brackets_is_tolerated() {
        assert_eq!(translate(" [ 1.0 , 2.0 ] "), ">= 1.0, <= 2.0");
    }
}
