//! DOCX paragraph text.
//!
//! A `.docx` is a zip archive; the body lives in `word/document.xml`. We stream
//! that part and collect the text of each top-level body paragraph. Paragraphs
//! nested in tables or text boxes are not body paragraphs and are skipped.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;
use zip::result::ZipError;

use super::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract paragraph text from a DOCX file on disk.
pub fn extract_docx_text(path: &Path) -> Result<String, ExtractError> {
    let file = File::open(path)?;
    read_docx(file)
}

/// Extract paragraph text from any seekable DOCX byte source.
pub fn read_docx<R: Read + Seek>(reader: R) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(reader)?;
    let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| match e {
        ZipError::FileNotFound => ExtractError::MissingPart(DOCUMENT_PART),
        other => ExtractError::Zip(other),
    })?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)?;

    Ok(body_paragraphs(&xml)?.join("\n"))
}

/// Text of every body paragraph in document order.
///
/// Within a paragraph, `w:t` runs are concatenated, `w:tab` becomes a tab and
/// `w:br` / `w:cr` become a newline (only inside runs; `w:tab` also appears in
/// paragraph properties as a tab-stop definition). Text-box content is left
/// out, and of an `mc:AlternateContent` pair only the `mc:Choice` is read.
fn body_paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut table_depth = 0usize;
    let mut para_depth = 0usize;
    let mut run_depth = 0usize;
    let mut fallback_depth = 0usize;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractError::Xml(e.to_string()))?;

        if fallback_depth > 0 {
            match &event {
                Event::Start(e) if e.local_name().as_ref() == b"Fallback" => fallback_depth += 1,
                Event::End(e) if e.local_name().as_ref() == b"Fallback" => fallback_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => table_depth += 1,
                b"p" => {
                    para_depth += 1;
                    if para_depth == 1 && table_depth == 0 {
                        current = Some(String::new());
                    }
                }
                b"r" => run_depth += 1,
                b"t" => in_text = true,
                b"Fallback" => fallback_depth = 1,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" if para_depth == 0 && table_depth == 0 => paragraphs.push(String::new()),
                b"tab" if in_body_run(para_depth, run_depth) => push_char(&mut current, '\t'),
                b"br" | b"cr" if in_body_run(para_depth, run_depth) => {
                    push_char(&mut current, '\n')
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                b"p" => {
                    if para_depth == 1 && table_depth == 0 {
                        if let Some(text) = current.take() {
                            paragraphs.push(text);
                        }
                    }
                    para_depth = para_depth.saturating_sub(1);
                }
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Text(t) if in_text && para_depth == 1 => {
                if let Some(text) = current.as_mut() {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| ExtractError::Xml(e.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

// Runs of a paragraph nested inside the body paragraph (text boxes) don't count.
fn in_body_run(para_depth: usize, run_depth: usize) -> bool {
    para_depth == 1 && run_depth > 0
}

fn push_char(current: &mut Option<String>, ch: char) {
    if let Some(text) = current.as_mut() {
        text.push(ch);
    }
}
