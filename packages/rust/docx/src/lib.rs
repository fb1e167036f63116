//! DOCX placeholder rendering.
//!
//! A DOCX file is a zip package; the visible text lives in WordprocessingML
//! parts (`word/document.xml`, headers, footers). Rendering copies the
//! template package entry by entry and rewrites those parts, replacing
//! literal `{{TOKEN}}` markers with values. Tokens without a value are left
//! in place.

mod paragraph;
pub mod template;

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, info, instrument, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use contractgen_shared::{ContractGenError, Result};

/// Main document part inside the package.
const DOCUMENT_PART: &str = "word/document.xml";

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Z0-9_]+)\}\}").expect("valid regex"));

/// Outcome of rendering one document.
#[derive(Debug, Clone)]
pub struct RenderedDocx {
    /// The new package bytes.
    pub bytes: Vec<u8>,
    /// Number of token occurrences replaced.
    pub replacements: usize,
    /// Token names still present after rendering (no value supplied).
    pub unresolved: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Read a template package from disk.
///
/// Fails with `TemplateLoadFailure` when the file is unreadable or is not a
/// DOCX package.
pub fn load_template(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| ContractGenError::template(path, e.to_string()))?;
    let archive = ZipArchive::new(Cursor::new(bytes.as_slice()))
        .map_err(|e| ContractGenError::template(path, format!("not a DOCX package: {e}")))?;
    if !archive.file_names().any(|name| name == DOCUMENT_PART) {
        return Err(ContractGenError::template(
            path,
            format!("package has no {DOCUMENT_PART}"),
        ));
    }
    debug!(path = %path.display(), bytes = bytes.len(), "loaded DOCX template");
    Ok(bytes)
}

/// Render `template` with `values` (token name → replacement text).
#[instrument(skip_all, fields(template_bytes = template.len(), tokens = values.len()))]
pub fn render(template: &[u8], values: &BTreeMap<String, String>) -> Result<RenderedDocx> {
    let mut archive = ZipArchive::new(Cursor::new(template))
        .map_err(|e| ContractGenError::Render(format!("invalid DOCX package: {e}")))?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(template.len())));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut replacements = 0;
    let mut unresolved = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_error)?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            writer
                .add_directory(name.clone(), options)
                .map_err(zip_error)?;
            continue;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut data)
            .map_err(|e| ContractGenError::Render(format!("reading {name}: {e}")))?;

        if is_text_part(&name) {
            let xml = String::from_utf8(data)
                .map_err(|e| ContractGenError::Render(format!("{name} is not UTF-8: {e}")))?;
            let (rewritten, count) = paragraph::substitute_part(&xml, values)?;
            debug!(part = %name, count, "substituted placeholders");
            replacements += count;
            unresolved.extend(tokens_in_part(&rewritten)?);
            data = rewritten.into_bytes();
        }

        writer.start_file(name.clone(), options).map_err(zip_error)?;
        writer
            .write_all(&data)
            .map_err(|e| ContractGenError::Render(format!("writing {name}: {e}")))?;
    }

    let bytes = writer.finish().map_err(zip_error)?.into_inner();

    unresolved.sort();
    unresolved.dedup();
    if !unresolved.is_empty() {
        warn!(tokens = ?unresolved, "template tokens left without a value");
    }
    info!(replacements, size = bytes.len(), "DOCX rendered");

    Ok(RenderedDocx {
        bytes,
        replacements,
        unresolved,
    })
}

/// Extract the paragraph texts of the main document part, in order.
///
/// Paragraphs inside table cells are included in reading order.
pub fn extract_text(docx: &[u8]) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(docx))
        .map_err(|e| ContractGenError::Render(format!("invalid DOCX package: {e}")))?;
    let mut part = archive.by_name(DOCUMENT_PART).map_err(zip_error)?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ContractGenError::Render(format!("reading {DOCUMENT_PART}: {e}")))?;
    paragraph::paragraph_texts(&xml)
}

/// Token names (without braces) occurring in `text`, in order of appearance.
pub fn find_tokens(text: &str) -> Vec<String> {
    TOKEN_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Render a token name as its template marker, e.g. `{{CLIENT_NAME}}`.
pub fn marker(token: &str) -> String {
    format!("{{{{{token}}}}}")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Replace every recognized token in one pass. Values are not rescanned.
pub(crate) fn substitute_tokens(text: &str, values: &BTreeMap<String, String>) -> (String, usize) {
    let mut count = 0;
    let out = TOKEN_RE.replace_all(text, |caps: &Captures<'_>| match values.get(&caps[1]) {
        Some(value) => {
            count += 1;
            value.clone()
        }
        None => caps[0].to_string(),
    });
    (out.into_owned(), count)
}

fn is_text_part(name: &str) -> bool {
    name == DOCUMENT_PART
        || (name.starts_with("word/header") && name.ends_with(".xml"))
        || (name.starts_with("word/footer") && name.ends_with(".xml"))
}

fn tokens_in_part(xml: &str) -> Result<Vec<String>> {
    Ok(paragraph::paragraph_texts(xml)?
        .iter()
        .flat_map(|p| find_tokens(p))
        .collect())
}

fn zip_error(e: zip::result::ZipError) -> ContractGenError {
    ContractGenError::Render(format!("zip error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values() -> BTreeMap<String, String> {
        template::TOKENS
            .iter()
            .map(|t| (t.to_string(), format!("value-of-{}", t.to_lowercase())))
            .collect()
    }

    #[test]
    fn substitute_tokens_counts_and_keeps_unknown() {
        let values = BTreeMap::from([("A".to_string(), "{{B}}".to_string())]);
        let (out, count) = substitute_tokens("{{A}} {{B}} {{A}}", &values);
        assert_eq!(out, "{{B}} {{B}} {{B}}");
        assert_eq!(count, 2);
    }

    #[test]
    fn find_tokens_ignores_lowercase_and_single_braces() {
        assert_eq!(
            find_tokens("{{CLIENT_NAME}} {client} {{lower}} {{FEES_AMOUNT}}"),
            vec!["CLIENT_NAME", "FEES_AMOUNT"]
        );
    }

    #[test]
    fn marker_wraps_in_double_braces() {
        assert_eq!(marker("COUNTRY"), "{{COUNTRY}}");
    }

    #[test]
    fn rendered_default_template_has_no_recognized_tokens() {
        let template = template::default_template().unwrap();
        let rendered = render(&template, &values()).unwrap();
        assert!(rendered.replacements >= template::TOKENS.len());
        assert!(rendered.unresolved.is_empty());

        let text = extract_text(&rendered.bytes).unwrap();
        let leftover: Vec<String> = text.iter().flat_map(|p| find_tokens(p)).collect();
        assert!(leftover.is_empty(), "leftover tokens: {leftover:?}");
        assert!(text.iter().any(|p| p.contains("value-of-client_name")));
    }

    #[test]
    fn missing_values_are_reported() {
        let template = template::default_template().unwrap();
        let mut values = values();
        values.remove("BANK_DETAILS");
        let rendered = render(&template, &values).unwrap();
        assert_eq!(rendered.unresolved, vec!["BANK_DETAILS"]);
    }

    #[test]
    fn non_text_entries_are_copied() {
        let template = template::default_template().unwrap();
        let rendered = render(&template, &values()).unwrap();

        let mut before = ZipArchive::new(Cursor::new(template.as_slice())).unwrap();
        let mut after = ZipArchive::new(Cursor::new(rendered.bytes.as_slice())).unwrap();
        assert_eq!(before.len(), after.len());

        let mut a = String::new();
        before
            .by_name("[Content_Types].xml")
            .unwrap()
            .read_to_string(&mut a)
            .unwrap();
        let mut b = String::new();
        after
            .by_name("[Content_Types].xml")
            .unwrap()
            .read_to_string(&mut b)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn load_template_rejects_non_docx() {
        let path = std::env::temp_dir().join(format!("cg-not-docx-{}.docx", uuid::Uuid::now_v7()));
        std::fs::write(&path, b"plain text").unwrap();
        let err = load_template(&path).unwrap_err();
        assert!(matches!(err, ContractGenError::TemplateLoadFailure { .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_template_missing_file() {
        let err = load_template(Path::new("/definitely/not/here.docx")).unwrap_err();
        assert!(matches!(err, ContractGenError::TemplateLoadFailure { .. }));
    }
}
