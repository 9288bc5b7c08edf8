//! On-disk layout of an artifact file.
//!
//! ```text
//! # Theology Assignment Draft: {topic}
//! ## Created: 2026-03-14 09:05:07
//! ## Academic Level: undergraduate
//! ## Length: 1500-2000 words
//! ## Tone: Academic
//!
//! <!-- draftsmith:body -->
//! {body, verbatim}
//! ```
//!
//! Everything after the first delimiter line is the body, byte for byte.
//! Files written before the delimiter existed are read by recognising their
//! header lines instead.

use chrono::NaiveDateTime;

use super::{ArtifactKind, META_LENGTH, META_LEVEL, META_TONE, Metadata};

pub const BODY_DELIMITER: &str = "<!-- draftsmith:body -->";
pub const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CREATED_PREFIX: &str = "## Created: ";
const LEGACY_META_KEYS: [&str; 3] = [META_LEVEL, META_LENGTH, META_TONE];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub topic: String,
    pub created_at: Option<NaiveDateTime>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub header: Header,
    pub body: String,
}

pub fn render(
    kind: ArtifactKind,
    topic: &str,
    created_at: NaiveDateTime,
    metadata: &Metadata,
    body: &str,
) -> String {
    let mut out = String::with_capacity(body.len() + 256);
    out.push_str(&format!("# {}: {}\n", kind.title(), one_line(topic)));
    out.push_str(&format!("{CREATED_PREFIX}{}\n", created_at.format(CREATED_FORMAT)));
    for (key, value) in metadata {
        out.push_str(&format!("## {}: {}\n", one_line(key), one_line(value)));
    }
    out.push('\n');
    out.push_str(BODY_DELIMITER);
    out.push('\n');
    out.push_str(body);
    out
}

pub fn parse(kind: ArtifactKind, content: &str) -> Document {
    if let Some((header, body)) = split_at_delimiter(content) {
        return Document {
            header: parse_header(kind, header),
            body: body.to_string(),
        };
    }
    parse_legacy(kind, content)
}

/// Header and body around the first delimiter line, provided only header
/// lines and blank lines precede it.
fn split_at_delimiter(content: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\r', '\n']);
        if bare == BODY_DELIMITER {
            return Some((&content[..offset], &content[offset + line.len()..]));
        }
        if !(bare.is_empty() || bare.starts_with('#')) {
            return None;
        }
        offset += line.len();
    }
    None
}

fn parse_legacy(kind: ArtifactKind, content: &str) -> Document {
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Document {
            header: Header::default(),
            body: String::new(),
        };
    };
    if !first.starts_with(&format!("# {}:", kind.title())) {
        return Document {
            header: Header::default(),
            body: content.to_string(),
        };
    }

    let mut offset = first.len();
    for line in lines {
        let bare = line.trim_end_matches(['\r', '\n']);
        let is_header = bare.starts_with(CREATED_PREFIX)
            || LEGACY_META_KEYS
                .iter()
                .any(|key| bare.starts_with(&format!("## {key}:")));
        if !is_header && !bare.is_empty() {
            break;
        }
        offset += line.len();
    }

    let body = &content[offset..];
    // The old writer appended a single trailing newline.
    let body = body.strip_suffix('\n').unwrap_or(body);
    Document {
        header: parse_header(kind, &content[..offset]),
        body: body.to_string(),
    }
}

fn parse_header(kind: ArtifactKind, header: &str) -> Header {
    let mut parsed = Header::default();
    let title_prefix = format!("# {}: ", kind.title());

    for line in header.lines() {
        if let Some(topic) = line.strip_prefix(&title_prefix) {
            parsed.topic = topic.trim().to_string();
        } else if let Some(created) = line.strip_prefix(CREATED_PREFIX) {
            parsed.created_at = NaiveDateTime::parse_from_str(created.trim(), CREATED_FORMAT).ok();
        } else if let Some(rest) = line.strip_prefix("## ")
            && let Some((key, value)) = rest.split_once(": ")
        {
            parsed
                .metadata
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    parsed
}

fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
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

    fn draft_meta() -> Metadata {
        let mut meta = Metadata::new();
        meta.insert(META_LEVEL.into(), "undergraduate".into());
        meta.insert(META_LENGTH.into(), "1500-2000 words".into());
        meta.insert(META_TONE.into(), "Academic".into());
        meta
    }

    #[test]
    fn render_plan_layout() {
        let text = render(ArtifactKind::Plan, "Predestination", at(), &Metadata::new(), "Body");
        assert_eq!(
            text,
            "# Theology Assignment Plan: Predestination\n\
             ## Created: 2026-03-14 09:05:07\n\
             \n\
             <!-- draftsmith:body -->\n\
             Body"
        );
    }

    #[test]
    fn render_draft_lists_metadata_lines_in_order() {
        let text = render(ArtifactKind::Draft, "Grace", at(), &draft_meta(), "x");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "## Academic Level: undergraduate");
        assert_eq!(lines[3], "## Length: 1500-2000 words");
        assert_eq!(lines[4], "## Tone: Academic");
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], BODY_DELIMITER);
    }

    #[test]
    fn parse_recovers_header_and_exact_body() {
        let body = "Intro\n\nSecond paragraph\n\n\nThird\n";
        let text = render(ArtifactKind::Draft, "Grace\nand Works", at(), &draft_meta(), body);
        let doc = parse(ArtifactKind::Draft, &text);
        assert_eq!(doc.body, body);
        assert_eq!(doc.header.topic, "Grace and Works");
        assert_eq!(doc.header.created_at, Some(at()));
        assert_eq!(doc.header.metadata, draft_meta());
    }

    #[test]
    fn body_that_looks_like_a_header_is_kept_verbatim() {
        let body = "# Theology Assignment Plan: Fake\n## Created: 2000-01-01 00:00:00\n\n\
                    <!-- draftsmith:body -->\nstill body";
        let text = render(ArtifactKind::Plan, "Real", at(), &Metadata::new(), body);
        let doc = parse(ArtifactKind::Plan, &text);
        assert_eq!(doc.body, body);
        assert_eq!(doc.header.topic, "Real");
    }

    #[test]
    fn empty_body() {
        let text = render(ArtifactKind::Plan, "Empty", at(), &Metadata::new(), "");
        assert_eq!(parse(ArtifactKind::Plan, &text).body, "");
    }

    #[test]
    fn legacy_plan_file() {
        let content = "# Theology Assignment Plan: Grace\n\
                       ## Created: 2025-01-02 03:04:05\n\
                       \n\
                       I. Thesis\n\nII. Sources\n";
        let doc = parse(ArtifactKind::Plan, content);
        assert_eq!(doc.body, "I. Thesis\n\nII. Sources");
        assert_eq!(doc.header.topic, "Grace");
        assert!(doc.header.created_at.is_some());
    }

    #[test]
    fn legacy_draft_file_with_blank_line_after_title() {
        let content = "# Theology Assignment Draft: Grace\n\
                       \n\
                       ## Created: 2025-01-02 03:04:05\n\
                       ## Academic Level: thesis\n\
                       ## Length: 750-1000 words\n\
                       ## Tone: Critical\n\
                       \n\
                       Para one.\n\nPara two.\n";
        let doc = parse(ArtifactKind::Draft, content);
        assert_eq!(doc.body, "Para one.\n\nPara two.");
        assert_eq!(doc.header.metadata.get(META_TONE).map(String::as_str), Some("Critical"));
    }

    #[test]
    fn unrecognised_content_is_all_body() {
        let content = "just some notes\n\nwith paragraphs";
        let doc = parse(ArtifactKind::Plan, content);
        assert_eq!(doc.body, content);
        assert_eq!(doc.header, Header::default());
    }
}
