//! Cosmetic cleanup of page-range text pulled from scanned or typeset books.

use std::sync::LazyLock;

use regex::Regex;

const CODE_MARKERS: &[&str] = &[";", "{", "}", "->", "==", "!=", "//", "/*", "*/", "#include"];

const SENTENCE_TERMINALS: &[char] = &[
    '、', '。', '！', '？', '；', '：', ':', '.', '!', '?', ')', ']', '}', '）', '】', '」', '』',
    '》', '〉',
];

const VERTICAL_BLOCK_MIN_LINES: usize = 5;
const VERTICAL_LINE_MAX_CHARS: usize = 2;

static CODE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:(?:int|char|float|double|void|long|short|unsigned|struct|union|enum|typedef|const|static|bool)\s+[A-Za-z_*]",
        r"|(?:if|while|for|switch)\s*\(",
        r"|(?:return|else|break|continue|case|default)\b",
        r"|#\s*(?:define|include|ifndef|ifdef|endif))",
    ))
    .expect("valid code keyword regex")
});

pub fn clean_text(raw: &str) -> String {
    let normalized = raw.replace(['\u{3000}', '\u{00a0}'], " ");

    let lines = normalized
        .lines()
        .filter(|line| !is_page_number_line(line))
        .collect::<Vec<&str>>();

    let lines = drop_vertical_blocks(lines);
    let lines = merge_wrapped_lines(&lines);

    collapse_blank_runs(&lines).trim().to_string()
}

fn is_page_number_line(line: &str) -> bool {
    let trimmed = line.trim();
    (1..=3).contains(&trimmed.len()) && trimmed.chars().all(|c| c.is_ascii_digit())
}

/// Drops blank-line separated blocks made mostly of one- or two-character
/// lines, the shape vertical typesetting takes after text extraction. A block
/// is judged both as extracted and as it reads once wrapped lines merge, so a
/// second pass over cleaned text drops nothing new.
fn drop_vertical_blocks(lines: Vec<&str>) -> Vec<&str> {
    let mut kept = Vec::<&str>::with_capacity(lines.len());
    let mut block = Vec::<&str>::new();

    for line in lines {
        if line.trim().is_empty() {
            flush_block(&mut block, &mut kept);
            kept.push(line);
        } else {
            block.push(line);
        }
    }
    flush_block(&mut block, &mut kept);

    kept
}

fn flush_block<'a>(block: &mut Vec<&'a str>, kept: &mut Vec<&'a str>) {
    let merged = merge_wrapped_lines(block);
    let merged = merged.iter().map(String::as_str).collect::<Vec<&str>>();

    if !is_vertical_block(block) && !is_vertical_block(&merged) {
        kept.extend(block.iter().copied());
    }
    block.clear();
}

fn is_vertical_block(block: &[&str]) -> bool {
    if block.len() < VERTICAL_BLOCK_MIN_LINES {
        return false;
    }

    let non_empty = block
        .iter()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>();
    let short = non_empty
        .iter()
        .filter(|line| line.trim().chars().count() <= VERTICAL_LINE_MAX_CHARS)
        .count();

    // More than 70% short lines.
    short * 10 > non_empty.len() * 7
}

fn merge_wrapped_lines(lines: &[&str]) -> Vec<String> {
    let mut merged = Vec::<String>::with_capacity(lines.len());
    let mut prose_open = false;

    for line in lines {
        if line.trim().is_empty() {
            merged.push(String::new());
            prose_open = false;
            continue;
        }

        if is_code_like(line) {
            merged.push(line.trim_end().to_string());
            prose_open = false;
            continue;
        }

        let text = line.trim();
        if prose_open {
            if let Some(previous) = merged.last_mut() {
                if !ends_sentence(previous) {
                    previous.push(' ');
                    previous.push_str(text);
                    continue;
                }
            }
        }

        merged.push(text.to_string());
        prose_open = true;
    }

    merged
}

fn is_code_like(line: &str) -> bool {
    line.starts_with([' ', '\t'])
        || CODE_MARKERS.iter().any(|marker| line.contains(marker))
        || CODE_KEYWORD.is_match(line)
}

fn ends_sentence(line: &str) -> bool {
    line.trim_end()
        .chars()
        .last()
        .map(|last| SENTENCE_TERMINALS.contains(&last))
        .unwrap_or(false)
}

fn collapse_blank_runs(lines: &[String]) -> String {
    let mut out = Vec::<&str>::with_capacity(lines.len());
    let mut previous_blank = false;

    for line in lines {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        out.push(if blank { "" } else { line.as_str() });
        previous_blank = blank;
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_numbers_and_odd_spaces_are_removed() {
        let raw = "第2章\u{3000}线性表。\n12\n  7  \n1234\n线性表\u{00a0}的定义。";

        let cleaned = clean_text(raw);

        assert_eq!(cleaned, "第2章 线性表。\n1234 线性表 的定义。");
    }

    #[test]
    fn mostly_single_character_block_is_dropped() {
        let raw = "前一段正文内容。\n\n数\n据\n结\n这一行明显比较长的正文\n构\n篇\n\n后一段正文内容。";

        let cleaned = clean_text(raw);

        assert_eq!(cleaned, "前一段正文内容。\n\n后一段正文内容。");
    }

    #[test]
    fn block_with_half_short_lines_is_kept() {
        let raw = "这是第一行较长的文字\n甲\n这是第三行较长的文字\n乙\n这是第五行较长的文字\n丙";

        let cleaned = clean_text(raw);

        for fragment in ["这是第一行较长的文字", "甲", "乙", "丙", "这是第五行较长的文字"] {
            assert!(cleaned.contains(fragment), "missing {fragment:?} in {cleaned:?}");
        }
    }

    #[test]
    fn block_that_turns_vertical_once_merged_is_dropped_in_one_pass() {
        let raw = "前文。\n\n甲。\n乙。\n丙。\n丁。\n戊。\n这是一段没有结束的文字\n这是一段没有结束的文字\n这是一段没有结束的文字\n\n后文。";

        let once = clean_text(raw);

        assert_eq!(once, "前文。\n\n后文。");
        assert_eq!(clean_text(&once), once);
    }

    #[test]
    fn short_blocks_are_never_treated_as_vertical() {
        let raw = "甲\n乙\n丙\n丁";
        assert_eq!(clean_text(raw), "甲 乙 丙 丁");
    }

    #[test]
    fn wrapped_prose_is_rejoined_until_sentence_end() {
        let raw = "A linear list is a finite sequence\nof data elements.\nEach element has\none predecessor.";

        let cleaned = clean_text(raw);

        assert_eq!(
            cleaned,
            "A linear list is a finite sequence of data elements.\nEach element has one predecessor."
        );
    }

    #[test]
    fn code_lines_are_kept_verbatim() {
        let raw = "顺序表的定义如下：\ntypedef struct {\n    ElemType *elem;\n    int length;\n} SqList;\nint main\nreturn 0\n说明文字到此\n结束。";

        let cleaned = clean_text(raw);

        assert_eq!(
            cleaned,
            "顺序表的定义如下：\ntypedef struct {\n    ElemType *elem;\n    int length;\n} SqList;\nint main\nreturn 0\n说明文字到此 结束。"
        );
    }

    #[test]
    fn closing_bracket_ends_a_sentence() {
        let raw = "见图 2-1（线性表的逻辑结构）\n下一句从这里开始";
        assert_eq!(clean_text(raw), "见图 2-1（线性表的逻辑结构）\n下一句从这里开始");
    }

    #[test]
    fn blank_runs_collapse_and_edges_are_trimmed() {
        let raw = "\n\n第一段。\n\n\n\n第二段。\n\n\n";
        assert_eq!(clean_text(raw), "第一段。\n\n第二段。");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let raw = "第2章\u{3000}线性表\n\n2.1 线性表的定义\n线性表是具有相同数据类型的n个\n数据元素的有限序列。\n15\n\n线\n性\n表\n的\n定\n义\n\nStatus InitList(SqList &L)\n{\n    L.elem = new ElemType[MAXSIZE];\n    return OK;\n}\n\n\n以上算法的时间复杂度为 O(1)。";

        let once = clean_text(raw);
        let twice = clean_text(&once);

        assert_eq!(once, twice);
        assert!(once.contains("线性表是具有相同数据类型的n个 数据元素的有限序列。"));
        assert!(!once.contains("\n线\n"));
    }
}
