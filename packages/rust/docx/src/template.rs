//! The stock master template.
//!
//! `contractgen init` writes this package to `templates/master_contract.docx`.
//! It mirrors the section layout of the PDF renderer and uses every token in
//! [`TOKENS`] at least once.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use contractgen_shared::{ContractGenError, Result};

use crate::marker;

/// Every token the generator supplies a value for.
pub const TOKENS: &[&str] = &[
    "CLIENT_NAME",
    "CLIENT_ADDRESS",
    "CLIENT_EMAIL",
    "CLIENT_PHONE",
    "COUNTRY",
    "EFFECTIVE_DATE",
    "CONTRACT_DURATION",
    "FEES_AMOUNT",
    "FEES_IN_WORDS",
    "CURRENCY_CODE",
    "CURRENCY_SYMBOL",
    "CURRENCY_NAME",
    "USD_EQUIVALENT",
    "SERVICES_BLOCK",
    "LEGAL_FRAMEWORK",
    "SERVICE_PROVIDER",
    "BANK_DETAILS",
];

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Build the stock master template package.
pub fn default_template() -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("word/document.xml", document_xml()),
    ] {
        writer
            .start_file(name, options)
            .map_err(|e| ContractGenError::Render(format!("zip error: {e}")))?;
        writer
            .write_all(content.as_bytes())
            .map_err(|e| ContractGenError::Render(format!("writing {name}: {e}")))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| ContractGenError::Render(format!("zip error: {e}")))?;
    Ok(cursor.into_inner())
}

fn document_xml() -> String {
    let t = marker;
    let mut body = String::new();

    body.push_str(&title("PROFESSIONAL SERVICE AGREEMENT"));
    body.push_str(&table(&[
        ("Client Name:", t("CLIENT_NAME")),
        ("Client Address:", t("CLIENT_ADDRESS")),
        ("Email:", t("CLIENT_EMAIL")),
        ("Phone:", t("CLIENT_PHONE")),
        ("Country:", t("COUNTRY")),
        ("Effective Date:", t("EFFECTIVE_DATE")),
        ("Contract Duration:", t("CONTRACT_DURATION")),
        (
            "Total Fees:",
            format!(
                "{}{} ({})",
                t("CURRENCY_SYMBOL"),
                t("FEES_AMOUNT"),
                t("FEES_IN_WORDS")
            ),
        ),
        ("USD Equivalent:", format!("${} USD", t("USD_EQUIVALENT"))),
    ]));

    let sections: [(&str, Vec<String>); 10] = [
        (
            "1. PARTIES TO THE AGREEMENT",
            vec![
                format!(
                    "This Service Agreement (\"Agreement\") is entered into as of {}, between \
                     the Service Provider and {} (\"Client\"), a company operating in {}.",
                    t("EFFECTIVE_DATE"),
                    t("CLIENT_NAME"),
                    t("COUNTRY")
                ),
                t("SERVICE_PROVIDER"),
            ],
        ),
        (
            "2. SCOPE OF SERVICES",
            vec![
                "The Service Provider agrees to provide the following professional services \
                 to the Client:"
                    .to_string(),
                t("SERVICES_BLOCK"),
            ],
        ),
        (
            "3. FEES AND PAYMENT TERMS",
            vec![
                format!(
                    "The Client agrees to pay the Service Provider a total fee of {}{} {} ({}) \
                     for the services rendered under this Agreement, equivalent to ${} USD.",
                    t("CURRENCY_SYMBOL"),
                    t("FEES_AMOUNT"),
                    t("CURRENCY_NAME"),
                    t("FEES_IN_WORDS"),
                    t("USD_EQUIVALENT")
                ),
                format!("Invoices are issued in {}.", t("CURRENCY_CODE")),
                t("BANK_DETAILS"),
            ],
        ),
        (
            "4. TERM AND TERMINATION",
            vec![format!(
                "This Agreement shall commence on {} and shall continue for a period of {}, \
                 unless terminated earlier in accordance with the provisions herein. Either \
                 party may terminate this Agreement with 30 days written notice.",
                t("EFFECTIVE_DATE"),
                t("CONTRACT_DURATION")
            )],
        ),
        ("5. CONFIDENTIALITY", vec![CONFIDENTIALITY.to_string()]),
        ("6. INTELLECTUAL PROPERTY", vec![INTELLECTUAL_PROPERTY.to_string()]),
        ("7. LIMITATION OF LIABILITY", vec![LIABILITY.to_string()]),
        ("8. GOVERNING LAW", vec![t("LEGAL_FRAMEWORK")]),
        ("9. GENERAL PROVISIONS", vec![GENERAL_PROVISIONS.to_string()]),
        (
            "10. SIGNATURES",
            vec![
                "Service Provider: ______________________________   Date: ____________"
                    .to_string(),
                format!(
                    "Client ({}): ______________________________   Date: ____________",
                    t("CLIENT_NAME")
                ),
            ],
        ),
    ];

    for (heading_text, paragraphs) in &sections {
        body.push_str(&heading(heading_text));
        for text in paragraphs {
            body.push_str(&paragraph(text));
        }
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr></w:body></w:document>"#
    )
}

const CONFIDENTIALITY: &str = "Both parties agree to maintain the confidentiality of all \
     proprietary and confidential information disclosed during the term of this Agreement. \
     This obligation shall survive the termination of this Agreement.";

const INTELLECTUAL_PROPERTY: &str = "All intellectual property rights in any work product \
     created by the Service Provider shall be transferred to the Client upon full payment of \
     fees, unless otherwise agreed in writing.";

const LIABILITY: &str = "The Service Provider's liability under this Agreement shall be \
     limited to the total fees paid by the Client. Neither party shall be liable for any \
     indirect, incidental, or consequential damages.";

const GENERAL_PROVISIONS: &str = "This Agreement constitutes the entire agreement between \
     the parties and supersedes all prior understandings. Any amendment must be in writing \
     and signed by both parties. If any provision is held invalid, the remaining provisions \
     remain in full force.";

fn run(text: &str, bold: bool, size_half_points: u32) -> String {
    let props = if bold {
        format!("<w:rPr><w:b/><w:sz w:val=\"{size_half_points}\"/></w:rPr>")
    } else {
        format!("<w:rPr><w:sz w:val=\"{size_half_points}\"/></w:rPr>")
    };
    format!(
        r#"<w:r>{props}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(text)
    )
}

fn title(text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:jc w:val="center"/><w:spacing w:after="400"/></w:pPr>{}</w:p>"#,
        run(text, true, 40)
    )
}

fn heading(text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:spacing w:before="200" w:after="160"/></w:pPr>{}</w:p>"#,
        run(text, true, 24)
    )
}

fn paragraph(text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:jc w:val="both"/><w:spacing w:after="160"/></w:pPr>{}</w:p>"#,
        run(text, false, 20)
    )
}

fn table(rows: &[(&str, String)]) -> String {
    let cell = |text: &str, bold: bool| {
        format!(
            r#"<w:tc><w:tcPr><w:tcW w:w="4320" w:type="dxa"/></w:tcPr><w:p>{}</w:p></w:tc>"#,
            run(text, bold, 18)
        )
    };
    let rows: String = rows
        .iter()
        .map(|(label, value)| format!("<w:tr>{}{}</w:tr>", cell(label, true), cell(value, false)))
        .collect();
    format!(
        r#"<w:tbl><w:tblPr><w:tblW w:w="8640" w:type="dxa"/><w:tblBorders><w:top w:val="single" w:sz="4"/><w:left w:val="single" w:sz="4"/><w:bottom w:val="single" w:sz="4"/><w:right w:val="single" w:sz="4"/><w:insideH w:val="single" w:sz="4"/><w:insideV w:val="single" w:sz="4"/></w:tblBorders></w:tblPr>{rows}</w:tbl>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{extract_text, find_tokens};

    #[test]
    fn default_template_uses_every_token() {
        let bytes = default_template().unwrap();
        let text = extract_text(&bytes).unwrap();
        let found: Vec<String> = text.iter().flat_map(|p| find_tokens(p)).collect();
        for token in TOKENS {
            assert!(found.iter().any(|f| f == token), "template lacks {token}");
        }
    }

    #[test]
    fn default_template_has_ten_sections() {
        let bytes = default_template().unwrap();
        let text = extract_text(&bytes).unwrap();
        assert!(text[0].contains("PROFESSIONAL SERVICE AGREEMENT"));
        assert!(text.iter().any(|p| p == "10. SIGNATURES"));
        assert!(text.iter().any(|p| p == "9. GENERAL PROVISIONS"));
    }
}
