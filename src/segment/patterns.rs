use regex::Regex;
use tracing::trace;

use crate::error::Result;
use crate::model::HeadingCandidate;

/// Lines longer than this are treated as prose.
pub const MAX_HEADING_CHARS: usize = 160;

/// A candidate closer than this to the previously accepted one is dropped.
pub const MIN_CANDIDATE_GAP_CHARS: usize = 120;

#[derive(Debug, Clone, Copy)]
pub struct HeadingRule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub weight: f64,
}

/// Tested in order against every trimmed line; the first matching rule wins.
pub const HEADING_RULES: &[HeadingRule] = &[
    HeadingRule {
        name: "cjk_chapter",
        pattern: r"^第\s*[零〇一二两三四五六七八九十百千0-9]+\s*(?:章|节|篇|部分|卷)",
        weight: 3.0,
    },
    HeadingRule {
        name: "english_chapter",
        pattern: r"^(?:Chapter|CHAPTER|Part|PART|Section|SECTION)\s+(?:[0-9]+|[IVXLC]+)\b",
        weight: 3.0,
    },
    HeadingRule {
        name: "cjk_enumeration",
        pattern: r"^[零〇一二两三四五六七八九十百]+\s*[、.．]\s*\S",
        weight: 2.0,
    },
    HeadingRule {
        name: "decimal_outline",
        pattern: r"^[0-9]+(?:\.[0-9]+){0,2}\s+\S",
        weight: 2.5,
    },
    HeadingRule {
        name: "capitalized_number",
        pattern: r"^[A-Z][A-Za-z]+\s+[0-9]+(?:\.[0-9]+)?\b",
        weight: 1.5,
    },
];

#[derive(Debug)]
struct CompiledRule {
    name: &'static str,
    regex: Regex,
    weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleMatch {
    pub rule: &'static str,
    pub weight: f64,
}

#[derive(Debug)]
pub struct HeadingMatcher {
    rules: Vec<CompiledRule>,
}

impl HeadingMatcher {
    pub fn new() -> Result<Self> {
        Self::from_rules(HEADING_RULES)
    }

    pub fn from_rules(rules: &[HeadingRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                Ok(CompiledRule {
                    name: rule.name,
                    regex: Regex::new(rule.pattern)?,
                    weight: rule.weight,
                })
            })
            .collect::<Result<Vec<CompiledRule>>>()?;

        Ok(Self { rules })
    }

    /// Expects a trimmed line.
    pub fn match_line(&self, line: &str) -> Option<RuleMatch> {
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(line))
            .map(|rule| RuleMatch {
                rule: rule.name,
                weight: rule.weight,
            })
    }

    pub fn collect_candidates(&self, text: &str) -> Vec<HeadingCandidate> {
        let mut candidates = Vec::<HeadingCandidate>::new();
        let mut cursor = 0usize;

        for raw_line in text.split_inclusive('\n') {
            let line_start = cursor;
            cursor += raw_line.len();

            let line = raw_line.trim();
            if line.is_empty() || line.chars().count() > MAX_HEADING_CHARS {
                continue;
            }

            let Some(matched) = self.match_line(line) else {
                continue;
            };

            if let Some(previous) = candidates.last() {
                let gap = text[previous.offset..line_start].chars().count();
                if gap < MIN_CANDIDATE_GAP_CHARS {
                    continue;
                }
            }

            trace!(rule = matched.rule, offset = line_start, title = line, "heading candidate");
            candidates.push(HeadingCandidate {
                offset: line_start,
                title: line.to_string(),
                weight: matched.weight,
            });
        }

        candidates
    }
}
