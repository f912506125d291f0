use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{PrepError, Result};

const DOCX_BODY: &str = "word/document.xml";
const SLIDE_PREFIX: &str = "ppt/slides/slide";

/// Non-empty paragraphs of the main document part, one per line.
pub fn docx_text(path: &Path) -> Result<String> {
    let archive = open_archive(path)?;
    docx_text_from(archive).map_err(|reason| PrepError::extraction(path, reason))
}

/// Non-empty shape text across slides, in slide number order.
pub fn pptx_text(path: &Path) -> Result<String> {
    let archive = open_archive(path)?;
    pptx_text_from(archive).map_err(|reason| PrepError::extraction(path, reason))
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|err| PrepError::extraction(path, err))?;
    ZipArchive::new(file).map_err(|err| {
        PrepError::extraction(path, format!("not a valid OOXML archive: {}", err))
    })
}

pub(super) fn docx_text_from<R: Read + Seek>(
    mut archive: ZipArchive<R>,
) -> std::result::Result<String, String> {
    let xml = read_entry(&mut archive, DOCX_BODY)?;
    let paragraphs =
        xml_paragraphs(&xml, None).map_err(|err| format!("{}: {}", DOCX_BODY, err))?;
    Ok(paragraphs.join("\n"))
}

pub(super) fn pptx_text_from<R: Read + Seek>(
    mut archive: ZipArchive<R>,
) -> std::result::Result<String, String> {
    let mut slides = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|number| (number, name.to_string())))
        .collect::<Vec<(u32, String)>>();
    slides.sort();
    debug!(slides = slides.len(), "reading presentation slides");

    let mut texts = Vec::<String>::new();
    for (_, name) in &slides {
        let xml = read_entry(&mut archive, name)?;
        let shapes = xml_paragraphs(&xml, Some(b"sp".as_slice()))
            .map_err(|err| format!("{}: {}", name, err))?;
        texts.extend(shapes);
    }

    Ok(texts.join("\n"))
}

/// `ppt/slides/slide12.xml` -> 12. Slide layouts and rels do not match.
fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix(SLIDE_PREFIX)?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> std::result::Result<String, String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|err| format!("missing {}: {}", name, err))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|err| format!("failed to read {}: {}", name, err))?;
    Ok(xml)
}

/// Collects trimmed, non-empty text blocks from WordprocessingML or
/// DrawingML. With `group` set, paragraphs inside each `group` element are
/// joined with newlines and the group is one block; otherwise every `p` is.
fn xml_paragraphs(xml: &str, group: Option<&[u8]>) -> std::result::Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut blocks = Vec::<String>::new();
    let mut paragraphs = Vec::<String>::new();
    let mut group_texts = Vec::<Vec<String>>::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => match element.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"t" => in_text = true,
                name if Some(name) == group => group_texts.push(Vec::new()),
                _ => {}
            },
            Ok(Event::Empty(element)) => {
                let separator = match element.local_name().as_ref() {
                    b"tab" => Some('\t'),
                    b"br" | b"cr" => Some('\n'),
                    _ => None,
                };
                if let (Some(separator), Some(paragraph)) = (separator, paragraphs.last_mut()) {
                    paragraph.push(separator);
                }
            }
            Ok(Event::Text(text)) if in_text => {
                let text = text.unescape().map_err(|err| err.to_string())?;
                if let Some(paragraph) = paragraphs.last_mut() {
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::End(element)) => match element.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let Some(paragraph) = paragraphs.pop() else {
                        continue;
                    };
                    match group_texts.last_mut() {
                        Some(current) if group.is_some() => current.push(paragraph),
                        _ if group.is_none() => push_block(&mut blocks, &paragraph),
                        _ => {}
                    }
                }
                name if Some(name) == group => {
                    if let Some(current) = group_texts.pop() {
                        push_block(&mut blocks, &current.join("\n"));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(format!(
                    "malformed XML at byte {}: {}",
                    reader.error_position(),
                    err
                ));
            }
            _ => {}
        }
    }

    Ok(blocks)
}

fn push_block(blocks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        blocks.push(trimmed.to_string());
    }
}
