//! Paragraph-level placeholder substitution inside a WordprocessingML part.
//!
//! Each `w:p` is buffered, its `w:t` texts are concatenated, and tokens are
//! replaced in the concatenation. A paragraph that changes gets its whole text
//! in the first text run; later runs are emptied, which drops their character
//! formatting. Paragraphs without a recognized token pass through untouched.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use contractgen_shared::{ContractGenError, Result};

use crate::substitute_tokens;

const PARAGRAPH: &[u8] = b"w:p";
const TEXT: &[u8] = b"w:t";
const BREAK: &[u8] = b"w:br";
const TAB: &[u8] = b"w:tab";

/// Rewrite one XML part. Returns the new XML and the number of replacements.
pub(crate) fn substitute_part(xml: &str, values: &BTreeMap<String, String>) -> Result<(String, usize)> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    // One buffer per open paragraph; nested paragraphs (text boxes) get
    // their own buffer and are spliced into the parent once processed.
    let mut stack: Vec<Vec<Event<'static>>> = Vec::new();
    let mut replaced = 0;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_error(&reader, e))?
            .into_owned();

        match classify(&event) {
            Kind::Eof => break,
            Kind::Open => {
                stack.push(vec![event]);
            }
            Kind::Close => {
                let Some(mut buffer) = stack.pop() else {
                    return Err(ContractGenError::Render(
                        "unbalanced </w:p> in document part".into(),
                    ));
                };
                buffer.push(event);
                let (events, count) = rewrite_paragraph(buffer, values);
                replaced += count;
                match stack.last_mut() {
                    Some(parent) => parent.extend(events),
                    None => {
                        for ev in events {
                            write(&mut writer, ev)?;
                        }
                    }
                }
            }
            Kind::Other => match stack.last_mut() {
                Some(buffer) => buffer.push(event),
                None => write(&mut writer, event)?,
            },
        }
    }

    if !stack.is_empty() {
        return Err(ContractGenError::Render(
            "unterminated <w:p> in document part".into(),
        ));
    }

    let xml = String::from_utf8(writer.into_inner())
        .map_err(|e| ContractGenError::Render(format!("rewritten part is not UTF-8: {e}")))?;
    Ok((xml, replaced))
}

/// Collect the visible text of every paragraph in a part, in document order.
///
/// Line breaks become `\n` and tabs `\t`. Text of a nested paragraph is
/// reported separately from its parent.
pub(crate) fn paragraph_texts(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<String> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut in_text = false;

    loop {
        let event = reader.read_event().map_err(|e| xml_error(&reader, e))?;
        match event {
            Event::Eof => break,
            Event::Start(e) if e.name().as_ref() == PARAGRAPH => stack.push(String::new()),
            Event::End(e) if e.name().as_ref() == PARAGRAPH => {
                if let Some(text) = stack.pop() {
                    paragraphs.push(text);
                }
            }
            Event::Start(e) if e.name().as_ref() == TEXT => in_text = true,
            Event::End(e) if e.name().as_ref() == TEXT => in_text = false,
            Event::Empty(e) if e.name().as_ref() == BREAK => {
                if let Some(text) = stack.last_mut() {
                    text.push('\n');
                }
            }
            Event::Empty(e) if e.name().as_ref() == TAB => {
                if let Some(text) = stack.last_mut() {
                    text.push('\t');
                }
            }
            Event::Text(t) if in_text => {
                let decoded = t.unescape().map_err(|e| xml_error(&reader, e))?;
                if let Some(text) = stack.last_mut() {
                    text.push_str(&decoded);
                }
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

enum Kind {
    Eof,
    Open,
    Close,
    Other,
}

fn classify(event: &Event<'_>) -> Kind {
    match event {
        Event::Eof => Kind::Eof,
        Event::Start(e) if e.name().as_ref() == PARAGRAPH => Kind::Open,
        Event::End(e) if e.name().as_ref() == PARAGRAPH => Kind::Close,
        _ => Kind::Other,
    }
}

/// A text node directly inside one of this paragraph's `w:t` elements.
struct TextSlot {
    /// Index of the `Text` event.
    text_index: usize,
    /// Index of the owning `<w:t>` start event.
    start_index: usize,
    decoded: String,
}

/// Substitute tokens in one buffered paragraph (own `w:p` start to end).
fn rewrite_paragraph(
    events: Vec<Event<'static>>,
    values: &BTreeMap<String, String>,
) -> (Vec<Event<'static>>, usize) {
    let slots = text_slots(&events);
    if slots.is_empty() {
        return (events, 0);
    }

    let joined: String = slots.iter().map(|s| s.decoded.as_str()).collect();
    let (new_text, count) = substitute_tokens(&joined, values);
    if count == 0 {
        return (events, 0);
    }

    let first = &slots[0];
    let (first_start, first_text) = (first.start_index, first.text_index);
    let cleared: Vec<usize> = slots[1..].iter().map(|s| s.text_index).collect();

    let mut out = Vec::with_capacity(events.len() + 4);
    for (i, event) in events.into_iter().enumerate() {
        if i == first_start {
            out.push(Event::Start(preserved_text_start()));
        } else if i == first_text {
            push_lines(&mut out, &new_text);
        } else if cleared.contains(&i) {
            // Later runs keep their (now empty) w:t element.
        } else {
            out.push(event);
        }
    }

    (out, count)
}

/// Find `w:t` text nodes belonging to this paragraph, skipping nested ones.
fn text_slots(events: &[Event<'static>]) -> Vec<TextSlot> {
    let mut slots = Vec::new();
    let mut level = 0usize;
    let mut open_text: Option<usize> = None;

    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(e) if e.name().as_ref() == PARAGRAPH => level += 1,
            Event::End(e) if e.name().as_ref() == PARAGRAPH => level = level.saturating_sub(1),
            Event::Start(e) if level == 1 && e.name().as_ref() == TEXT => open_text = Some(i),
            Event::End(e) if level == 1 && e.name().as_ref() == TEXT => open_text = None,
            Event::Text(t) if level == 1 => {
                if let Some(start_index) = open_text {
                    // Undecodable entities are kept raw rather than failing the render.
                    let decoded = t
                        .unescape()
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(t).into_owned());
                    slots.push(TextSlot {
                        text_index: i,
                        start_index,
                        decoded,
                    });
                }
            }
            _ => {}
        }
    }

    slots
}

fn preserved_text_start() -> BytesStart<'static> {
    BytesStart::new("w:t").with_attributes([("xml:space", "preserve")])
}

/// Emit `text` inside an already-open `w:t`, turning newlines into `w:br`.
fn push_lines(out: &mut Vec<Event<'static>>, text: &str) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push(Event::End(BytesEnd::new("w:t")));
            out.push(Event::Empty(BytesStart::new("w:br")));
            out.push(Event::Start(preserved_text_start()));
        }
        out.push(Event::Text(BytesText::new(line).into_owned()));
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| ContractGenError::Render(format!("XML write failed: {e}")))
}

fn xml_error(reader: &Reader<&[u8]>, e: impl std::fmt::Display) -> ContractGenError {
    ContractGenError::Render(format!(
        "malformed XML at byte {}: {e}",
        reader.buffer_position()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("CLIENT_NAME".to_string(), "Acme & Co".to_string()),
            ("FEES_AMOUNT".to_string(), "2,000.00".to_string()),
            ("SERVICES_BLOCK".to_string(), "IT / SOFTWARE\n\nSupport.".to_string()),
        ])
    }

    fn doc(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
    }

    #[test]
    fn replaces_token_in_single_run() {
        let xml = doc("<w:p><w:r><w:t>Client: {{CLIENT_NAME}}</w:t></w:r></w:p>");
        let (out, count) = substitute_part(&xml, &values()).unwrap();
        assert_eq!(count, 1);
        assert_eq!(paragraph_texts(&out).unwrap(), vec!["Client: Acme & Co"]);
        assert!(out.contains("Acme &amp; Co"));
    }

    #[test]
    fn token_split_across_runs_collapses_into_first_run() {
        let xml = doc(
            "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Fee {{FEES_</w:t></w:r>\
             <w:r><w:rPr><w:i/></w:rPr><w:t>AMOUNT}} due</w:t></w:r></w:p>",
        );
        let (out, count) = substitute_part(&xml, &values()).unwrap();
        assert_eq!(count, 1);
        assert_eq!(paragraph_texts(&out).unwrap(), vec!["Fee 2,000.00 due"]);
        // Second run survives with an empty text element.
        assert!(out.contains("<w:i/></w:rPr><w:t></w:t>"));
        assert!(out.contains(r#"<w:t xml:space="preserve">Fee 2,000.00 due</w:t>"#));
    }

    #[test]
    fn unrecognized_tokens_are_left_alone() {
        let xml = doc("<w:p><w:r><w:t>{{UNKNOWN}} and {{CLIENT_NAME}}</w:t></w:r></w:p>");
        let (out, count) = substitute_part(&xml, &values()).unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            paragraph_texts(&out).unwrap(),
            vec!["{{UNKNOWN}} and Acme & Co"]
        );
    }

    #[test]
    fn untouched_paragraphs_are_byte_identical() {
        let body = r#"<w:p w:rsidR="00A1"><w:r><w:t xml:space="preserve"> plain </w:t></w:r></w:p>"#;
        let xml = doc(body);
        let (out, count) = substitute_part(&xml, &values()).unwrap();
        assert_eq!(count, 0);
        assert_eq!(out, xml);
    }

    #[test]
    fn newlines_become_breaks() {
        let xml = doc("<w:p><w:r><w:t>{{SERVICES_BLOCK}}</w:t></w:r></w:p>");
        let (out, _) = substitute_part(&xml, &values()).unwrap();
        assert_eq!(out.matches("<w:br/>").count(), 2);
        assert_eq!(
            paragraph_texts(&out).unwrap(),
            vec!["IT / SOFTWARE\n\nSupport."]
        );
    }

    #[test]
    fn table_cell_paragraphs_are_substituted() {
        let xml = doc(
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc>\
             <w:tc><w:p><w:r><w:t>{{CLIENT_NAME}}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        );
        let (out, count) = substitute_part(&xml, &values()).unwrap();
        assert_eq!(count, 1);
        assert_eq!(paragraph_texts(&out).unwrap(), vec!["Name", "Acme & Co"]);
    }

    #[test]
    fn multiple_occurrences_all_replaced() {
        let xml = doc("<w:p><w:r><w:t>{{CLIENT_NAME}}/{{CLIENT_NAME}}</w:t></w:r></w:p>");
        let (out, count) = substitute_part(&xml, &values()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(paragraph_texts(&out).unwrap(), vec!["Acme & Co/Acme & Co"]);
    }

    #[test]
    fn unbalanced_paragraph_is_an_error() {
        let xml = doc("<w:p><w:r><w:t>x</w:t></w:r>");
        assert!(substitute_part(&xml, &values()).is_err());
    }
}
