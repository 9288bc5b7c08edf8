use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use super::ArtifactKind;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Upper bound, in bytes, on the topic part of a file name.
pub const MAX_TOPIC_BYTES: usize = 100;

/// Filesystem-safe form of a topic: word characters, hyphens and underscores only,
/// at most [`MAX_TOPIC_BYTES`] long.
///
/// Returns `None` when nothing survives.
pub fn sanitize_topic(topic: &str) -> Option<String> {
    let stripped = NON_WORD.replace_all(topic, "");
    let sanitized = WHITESPACE.replace_all(stripped.trim(), "_");
    let capped =
        truncate_at_char_boundary(&sanitized, MAX_TOPIC_BYTES).trim_end_matches(['_', '-']);
    (!capped.is_empty()).then(|| capped.to_string())
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// `{kind}_{topic-or-placeholder}_{YYYYMMDD_HHMMSS}`, without extension.
pub fn artifact_stem(kind: ArtifactKind, topic: &str, at: NaiveDateTime) -> String {
    let topic = sanitize_topic(topic).unwrap_or_else(|| kind.placeholder().to_string());
    format!("{}_{}_{}", kind.prefix(), topic, at.format("%Y%m%d_%H%M%S"))
}

/// Name of the plain-text file a finished assignment is exported to.
pub fn export_file_name(topic: &str) -> String {
    let topic = sanitize_topic(topic).unwrap_or_else(|| "untitled".to_string());
    format!("theology_assignment_{topic}.txt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn strips_punctuation_and_joins_words() {
        let name = sanitize_topic("Grace & Free Will?!").unwrap();
        assert_eq!(name, "Grace_Free_Will");
        assert!(name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn keeps_hyphens_and_unicode_letters() {
        assert_eq!(sanitize_topic("  Neo-Orthodoxy in Barth ").unwrap(), "Neo-Orthodoxy_in_Barth");
        assert_eq!(sanitize_topic("Théologie  de\tla grâce").unwrap(), "Théologie_de_la_grâce");
    }

    #[test]
    fn empty_or_symbol_only_topics_have_no_name() {
        assert_eq!(sanitize_topic(""), None);
        assert_eq!(sanitize_topic("!!!"), None);
        assert_eq!(sanitize_topic("   "), None);
    }

    #[test]
    fn stem_uses_placeholder_when_needed() {
        assert_eq!(
            artifact_stem(ArtifactKind::Plan, "!!!", at()),
            "plan_untitled_plan_20260314_090507"
        );
        assert_eq!(
            artifact_stem(ArtifactKind::Draft, "", at()),
            "draft_untitled_draft_20260314_090507"
        );
        assert_eq!(
            artifact_stem(ArtifactKind::Plan, "Predestination", at()),
            "plan_Predestination_20260314_090507"
        );
    }

    #[test]
    fn long_topics_are_capped() {
        let name = sanitize_topic(&"Grace ".repeat(60)).unwrap();
        assert!(name.len() <= MAX_TOPIC_BYTES);
        assert!(name.starts_with("Grace_Grace"));
        assert!(!name.ends_with('_'));

        let stem = artifact_stem(ArtifactKind::Draft, &"x".repeat(300), at());
        assert!(format!("{stem}_99.md").len() <= 255);
    }

    #[test]
    fn multibyte_topics_are_cut_on_char_boundaries() {
        let name = sanitize_topic(&"grâce".repeat(40)).unwrap();
        assert!(name.len() <= MAX_TOPIC_BYTES);
        assert!(name.chars().all(|c| "grâce".contains(c)));

        let name = sanitize_topic(&"恩典".repeat(100)).unwrap();
        assert!(name.len() <= MAX_TOPIC_BYTES);
        assert_eq!(name.chars().count(), MAX_TOPIC_BYTES / 3);
    }

    #[test]
    fn export_name() {
        assert_eq!(export_file_name("Grace & Works"), "theology_assignment_Grace_Works.txt");
        assert_eq!(export_file_name("?"), "theology_assignment_untitled.txt");
    }
}
