use std::sync::LazyLock;

use regex::Regex;

use crate::model::TocEntry;

static OUTLINE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<outline>|</outline>|<item(?:\s+page="(\d+)")?\s*>(.*?)</item>"#)
        .expect("valid outline token regex")
});

static INNER_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid inner tag regex"));

/// Reads the nested `<outline>` section of `pdftohtml -xml` output. Nesting
/// depth becomes the entry level; items without a page target are skipped.
pub fn parse_outline_xml(xml: &str) -> Vec<TocEntry> {
    let mut entries = Vec::<TocEntry>::new();
    let mut depth = 0u32;

    for captures in OUTLINE_TOKEN.captures_iter(xml) {
        let Some(token) = captures.get(0) else {
            continue;
        };

        match token.as_str() {
            "<outline>" => depth += 1,
            "</outline>" => depth = depth.saturating_sub(1),
            _ => {
                let Some(page) = captures
                    .get(1)
                    .and_then(|value| value.as_str().parse::<u32>().ok())
                else {
                    continue;
                };
                let raw_label = captures.get(2).map(|value| value.as_str()).unwrap_or("");
                let title = normalize_outline_label(raw_label);
                if title.is_empty() {
                    continue;
                }

                entries.push(TocEntry {
                    level: depth.max(1),
                    title,
                    page,
                });
            }
        }
    }

    entries
}

fn normalize_outline_label(raw_label: &str) -> String {
    INNER_TAG
        .replace_all(raw_label, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#160;", " ")
        .replace("&amp;", "&")
        .replace(['\u{00a0}', '\u{3000}'], " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}
