use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PrepError, Result};

const CJK_NUMERAL_CHARS: &str = "零〇一二两三四五六七八九十百千";

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid digit run regex"));

static CJK_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"第\s*([零〇一二两三四五六七八九十百千]+)").expect("valid cjk marker regex")
});

static CJK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[零〇一二两三四五六七八九十百千]+").expect("valid cjk numeral regex"));

static TOC_CHAPTER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)第\s*([0-9]+|[零〇一二两三四五六七八九十百千]+)\s*章|\bchapter\s+([0-9]+)\b")
        .expect("valid toc chapter marker regex")
});

/// Resolves a caller-supplied chapter identifier ("5", "第2章 线性表", "第十二章").
pub fn parse_chapter_identifier(raw: &str) -> Result<u32> {
    parse_chapter_number(raw).ok_or_else(|| PrepError::InvalidChapterIdentifier(raw.to_string()))
}

/// Plain digits first, then the first digit run, then a CJK numeral.
pub fn parse_chapter_number(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.chars().all(|character| character.is_ascii_digit()) {
        return trimmed.parse::<u32>().ok();
    }

    if let Some(found) = DIGIT_RUN.find(trimmed) {
        return found.as_str().parse::<u32>().ok();
    }

    let numeral = CJK_MARKER
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .or_else(|| CJK_RUN.find(trimmed))?;

    cjk_numeral_value(numeral.as_str())
}

/// Only "第X章" and "Chapter N" titles count as chapter entries.
pub fn toc_chapter_number(title: &str) -> Option<u32> {
    let captures = TOC_CHAPTER_MARKER.captures(title)?;

    if let Some(value) = captures.get(1) {
        let value = value.as_str();
        if value.chars().all(|character| character.is_ascii_digit()) {
            return value.parse::<u32>().ok();
        }
        return cjk_numeral_value(value);
    }

    captures
        .get(2)
        .and_then(|value| value.as_str().parse::<u32>().ok())
}

pub fn cjk_numeral_value(numeral: &str) -> Option<u32> {
    if numeral.is_empty() || !numeral.chars().all(|c| CJK_NUMERAL_CHARS.contains(c)) {
        return None;
    }

    let mut total = 0u32;
    let mut pending: Option<u32> = None;

    for character in numeral.chars() {
        match cjk_digit(character) {
            Some(digit) => pending = Some(digit),
            None => {
                let unit = cjk_unit(character)?;
                // A bare unit ("十二") means one of that unit.
                let multiplier = pending.take().unwrap_or(1);
                total = total.checked_add(multiplier.checked_mul(unit)?)?;
            }
        }
    }

    total.checked_add(pending.unwrap_or(0))
}

fn cjk_digit(character: char) -> Option<u32> {
    let value = match character {
        '零' | '〇' => 0,
        '一' => 1,
        '二' | '两' => 2,
        '三' => 3,
        '四' => 4,
        '五' => 5,
        '六' => 6,
        '七' => 7,
        '八' => 8,
        '九' => 9,
        _ => return None,
    };
    Some(value)
}

fn cjk_unit(character: char) -> Option<u32> {
    match character {
        '十' => Some(10),
        '百' => Some(100),
        '千' => Some(1000),
        _ => None,
    }
}
