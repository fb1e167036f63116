//! Page layout for the contract PDF.
//!
//! [`lay_out`] turns a [`PdfContract`] into pages of positioned drawing
//! operations without touching any PDF machinery, so pagination and wrapping
//! are testable on their own. Coordinates are PDF points with the origin at
//! the bottom-left corner of a US Letter page.

use crate::metrics::{fold, text_width, wrap};
use crate::{GENERATOR_NAME, PdfContract};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
/// Bounding box the logo is scaled into.
pub const LOGO_BOX: (f32, f32) = (144.0, 72.0);

const FOOTER_BASELINE: f32 = 36.0;
const TABLE_WIDTH: f32 = 432.0;
const LABEL_WIDTH: f32 = 144.0;
const CELL_PADDING: f32 = 8.0;
const CELL_INSET: f32 = 6.0;
const TABLE_SIZE: f32 = 9.0;
const TABLE_LEADING: f32 = 11.0;
const BULLET_INDENT: f32 = 20.0;

pub type Rgb8 = (u8, u8, u8);

pub const BLACK: Rgb8 = (0, 0, 0);
pub const ACCENT: Rgb8 = (30, 64, 175);
pub const GREY: Rgb8 = (128, 128, 128);
pub const LABEL_FILL: Rgb8 = (243, 244, 246);
pub const GRID: Rgb8 = (229, 231, 235);

pub const TITLE: &str = "PROFESSIONAL SERVICE AGREEMENT";

/// Font used by a text operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
    /// The configured Unicode font for right-to-left text.
    Rtl,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        face: Face,
        color: Rgb8,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgb8,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb8,
    },
    Logo {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text of every text operation, in emission order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Optional decorations resolved before layout.
#[derive(Debug, Clone, Default)]
pub struct Decorations {
    /// Logo size in points, already fitted to [`LOGO_BOX`].
    pub logo: Option<(f32, f32)>,
    /// Right-to-left title in visual order, ready to draw.
    pub rtl_title: Option<String>,
}

/// Classification of one line of the service block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceLine<'a> {
    Category(&'a str),
    SubHeader(&'a str),
    Bullet(&'a str),
    Body(&'a str),
}

/// Classify a trimmed, non-empty service block line.
pub fn classify_line<'a>(line: &'a str, category_headers: &[String]) -> ServiceLine<'a> {
    if category_headers.iter().any(|h| h == line) {
        return ServiceLine::Category(line);
    }
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("• ")) {
        return ServiceLine::Bullet(rest.trim_start());
    }
    let upper = line.chars().any(char::is_alphabetic)
        && !line.chars().any(char::is_lowercase)
        && line.chars().count() < 80;
    if line.ends_with(':') || upper {
        return ServiceLine::SubHeader(line);
    }
    ServiceLine::Body(line)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Justify,
}

#[derive(Debug, Clone, Copy)]
struct Style {
    size: f32,
    leading: f32,
    face: Face,
    color: Rgb8,
    align: Align,
    before: f32,
    after: f32,
}

const TITLE_STYLE: Style = Style {
    size: 20.0,
    leading: 24.0,
    face: Face::Bold,
    color: ACCENT,
    align: Align::Center,
    before: 10.0,
    after: 20.0,
};

const HEADING: Style = Style {
    size: 12.0,
    leading: 15.0,
    face: Face::Bold,
    color: ACCENT,
    align: Align::Left,
    before: 10.0,
    after: 8.0,
};

const BODY: Style = Style {
    size: 10.0,
    leading: 14.0,
    face: Face::Regular,
    color: BLACK,
    align: Align::Justify,
    before: 0.0,
    after: 8.0,
};

const CATEGORY: Style = Style {
    size: 11.0,
    leading: 14.0,
    face: Face::Bold,
    color: ACCENT,
    align: Align::Left,
    before: 8.0,
    after: 4.0,
};

const SUB_HEADER: Style = Style {
    size: 10.0,
    leading: 14.0,
    face: Face::Bold,
    color: BLACK,
    align: Align::Left,
    before: 4.0,
    after: 2.0,
};

const BULLET: Style = Style {
    after: 2.0,
    ..BODY
};

const GENERATION_FOOTER: Style = Style {
    size: 7.0,
    leading: 9.0,
    face: Face::Regular,
    color: GREY,
    align: Align::Center,
    before: 0.0,
    after: 0.0,
};

/// Lay out the whole contract.
pub fn lay_out(contract: &PdfContract, decorations: &Decorations) -> Vec<Page> {
    let mut flow = Flow::new();

    if let Some((width, height)) = decorations.logo {
        flow.logo(width, height);
    }

    flow.paragraph(TITLE, TITLE_STYLE, 0.0);

    if let Some(title) = &decorations.rtl_title {
        flow.rtl_line(title, 16.0);
    }
    flow.space(14.4);

    flow.details_table(&details_rows(contract));
    flow.space(18.0);

    for (heading, blocks) in sections(contract) {
        flow.keep_with_next(HEADING.before + HEADING.leading + BODY.leading * 2.0);
        flow.paragraph(heading, HEADING, 0.0);
        for block in blocks {
            match block {
                Block::Body(text) => flow.paragraph(&text, BODY, 0.0),
                Block::Services => flow.services(contract),
                Block::Signatures => flow.signatures(),
            }
        }
        flow.space(10.8);
    }

    flow.space(21.6);
    let generated = format!(
        "Generated by {GENERATOR_NAME} on {} | Version {}",
        contract.generated_at.format("%B %d, %Y at %H:%M"),
        env!("CARGO_PKG_VERSION"),
    );
    flow.paragraph(&generated, GENERATION_FOOTER, 0.0);

    flow.finish()
}

fn or_na(value: &str) -> String {
    if value.trim().is_empty() {
        "N/A".to_string()
    } else {
        value.to_string()
    }
}

fn details_rows(c: &PdfContract) -> Vec<(&'static str, String)> {
    vec![
        ("Client Name:", c.client_name.clone()),
        ("Client Address:", or_na(&c.client_address)),
        ("Email:", or_na(&c.client_email)),
        ("Phone:", or_na(&c.client_phone)),
        ("Country:", c.country.clone()),
        ("Effective Date:", c.effective_date.clone()),
        ("Contract Duration:", c.contract_duration.clone()),
        (
            "Total Fees:",
            format!("{}{} ({})", c.currency_symbol, c.fees, c.fees_in_words),
        ),
        ("USD Equivalent:", format!("${} USD", c.usd_equivalent)),
    ]
}

enum Block {
    Body(String),
    Services,
    Signatures,
}

fn sections(c: &PdfContract) -> Vec<(&'static str, Vec<Block>)> {
    let mut parties = vec![Block::Body(format!(
        "This Service Agreement (\"Agreement\") is entered into as of {}, between the \
         Service Provider and {} (\"Client\"), a company operating in {}.",
        c.effective_date, c.client_name, c.country
    ))];
    if !c.service_provider.trim().is_empty() {
        parties.push(Block::Body(c.service_provider.clone()));
    }

    let mut fees = vec![Block::Body(format!(
        "The Client agrees to pay the Service Provider a total fee of {}{} {} ({}) for the \
         services rendered under this Agreement. Payment terms shall be as mutually agreed \
         upon by both parties.",
        c.currency_symbol, c.fees, c.currency_name, c.fees_in_words
    ))];
    if !c.currency_code.eq_ignore_ascii_case("USD") {
        fees.push(Block::Body(format!(
            "For reference, this amount is equivalent to ${} USD.",
            c.usd_equivalent
        )));
    }
    if !c.bank_details.trim().is_empty() {
        fees.push(Block::Body(c.bank_details.clone()));
    }

    let governing_law = if c.legal_framework.trim().is_empty() {
        format!(
            "This Agreement shall be governed by and construed in accordance with the laws \
             of {}, without regard to its conflict of law provisions.",
            c.country
        )
    } else {
        c.legal_framework.clone()
    };

    vec![
        ("1. PARTIES TO THE AGREEMENT", parties),
        (
            "2. SCOPE OF SERVICES",
            vec![
                Block::Body(
                    "The Service Provider agrees to provide the following professional \
                     services to the Client:"
                        .to_string(),
                ),
                Block::Services,
            ],
        ),
        ("3. FEES AND PAYMENT TERMS", fees),
        (
            "4. TERM AND TERMINATION",
            vec![Block::Body(format!(
                "This Agreement shall commence on {} and shall continue for a period of {}, \
                 unless terminated earlier in accordance with the provisions herein. Either \
                 party may terminate this Agreement with 30 days written notice.",
                c.effective_date, c.contract_duration
            ))],
        ),
        (
            "5. CONFIDENTIALITY",
            vec![Block::Body(
                "Both parties agree to maintain the confidentiality of all proprietary and \
                 confidential information disclosed during the term of this Agreement. This \
                 obligation shall survive the termination of this Agreement."
                    .to_string(),
            )],
        ),
        (
            "6. INTELLECTUAL PROPERTY",
            vec![Block::Body(
                "All intellectual property rights in any work product created by the Service \
                 Provider shall be transferred to the Client upon full payment of fees, unless \
                 otherwise agreed in writing."
                    .to_string(),
            )],
        ),
        (
            "7. LIMITATION OF LIABILITY",
            vec![Block::Body(
                "The Service Provider's liability under this Agreement shall be limited to the \
                 total fees paid by the Client. Neither party shall be liable for any indirect, \
                 incidental, or consequential damages."
                    .to_string(),
            )],
        ),
        ("8. GOVERNING LAW", vec![Block::Body(governing_law)]),
        (
            "9. GENERAL PROVISIONS",
            vec![Block::Body(
                "This Agreement constitutes the entire agreement between the parties and \
                 supersedes all prior understandings. Any amendment must be in writing and \
                 signed by both parties. If any provision is held invalid, the remaining \
                 provisions remain in full force."
                    .to_string(),
            )],
        ),
        ("10. SIGNATURES", vec![Block::Signatures]),
    ]
}

const SIGNATURE_ROWS: [(&str, &str); 9] = [
    ("Service Provider", "Client"),
    ("", ""),
    (
        "______________________________",
        "______________________________",
    ),
    ("Signature", "Signature"),
    ("", ""),
    ("Date: _______________", "Date: _______________"),
    ("", ""),
    (
        "______________________________",
        "______________________________",
    ),
    ("Company Stamp (if applicable)", "Company Stamp (if applicable)"),
];

/// Top-down writer that breaks pages at the bottom margin.
struct Flow {
    done: Vec<Page>,
    current: Page,
    /// Top of the remaining space on the current page.
    y: f32,
}

impl Flow {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: Page::default(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn at_top(&self) -> bool {
        self.y >= PAGE_HEIGHT - MARGIN
    }

    fn new_page(&mut self) {
        self.done.push(std::mem::take(&mut self.current));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Start a new page unless `height` still fits on this one.
    fn ensure(&mut self, height: f32) {
        if self.y - height < MARGIN && !self.at_top() {
            self.new_page();
        }
    }

    fn keep_with_next(&mut self, height: f32) {
        self.ensure(height);
    }

    fn space(&mut self, height: f32) {
        if !self.at_top() {
            self.y = (self.y - height).max(MARGIN);
        }
    }

    fn push(&mut self, op: DrawOp) {
        self.current.ops.push(op);
    }

    fn text(&mut self, x: f32, baseline: f32, style: Style, text: String) {
        self.push(DrawOp::Text {
            x,
            y: baseline,
            size: style.size,
            face: style.face,
            color: style.color,
            text,
        });
    }

    fn logo(&mut self, width: f32, height: f32) {
        self.push(DrawOp::Logo {
            x: (PAGE_WIDTH - width) / 2.0,
            y: self.y - height,
            width,
            height,
        });
        self.y -= height + 12.0;
    }

    fn rtl_line(&mut self, text: &str, size: f32) {
        // No metrics for the external font; assume half an em per glyph.
        let width = text.chars().count() as f32 * size * 0.5;
        let style = Style {
            size,
            leading: size * 1.4,
            face: Face::Rtl,
            color: ACCENT,
            align: Align::Center,
            before: 0.0,
            after: 6.0,
        };
        self.ensure(style.leading);
        let baseline = self.y - size;
        self.text((PAGE_WIDTH - width) / 2.0, baseline, style, text.to_string());
        self.y -= style.leading + style.after;
    }

    /// Lay out `text` (which may contain newlines) at `indent` from the left
    /// margin.
    fn paragraph(&mut self, text: &str, style: Style, indent: f32) {
        self.paragraph_with_marker(text, style, indent, None);
    }

    fn paragraph_with_marker(&mut self, text: &str, style: Style, indent: f32, marker: Option<&str>) {
        let bold = style.face == Face::Bold;
        let left = MARGIN + indent;
        let width = CONTENT_WIDTH - indent;
        let text = fold(text);

        self.space(style.before);

        let mut first = true;
        for source_line in text.lines() {
            let lines = wrap(source_line, style.size, bold, width);
            let count = lines.len();
            for (i, line) in lines.into_iter().enumerate() {
                self.ensure(style.leading);
                let baseline = self.y - style.size;
                if first {
                    if let Some(marker) = marker {
                        self.text(MARGIN + indent / 2.5, baseline, style, marker.to_string());
                    }
                    first = false;
                }
                let last = i + 1 == count;
                self.line(&line, left, width, baseline, style, last);
                self.y -= style.leading;
            }
        }

        self.space(style.after);
    }

    fn line(&mut self, line: &str, left: f32, width: f32, baseline: f32, style: Style, last: bool) {
        let bold = style.face == Face::Bold;
        match style.align {
            Align::Left => self.text(left, baseline, style, line.to_string()),
            Align::Center => {
                let x = left + (width - text_width(line, style.size, bold)) / 2.0;
                self.text(x.max(left), baseline, style, line.to_string());
            }
            Align::Justify => {
                let words: Vec<&str> = line.split(' ').filter(|w| !w.is_empty()).collect();
                if last || words.len() < 2 {
                    self.text(left, baseline, style, line.to_string());
                    return;
                }
                let used: f32 = words.iter().map(|w| text_width(w, style.size, bold)).sum();
                let gap = (width - used) / (words.len() - 1) as f32;
                let mut x = left;
                for word in words {
                    self.text(x, baseline, style, word.to_string());
                    x += text_width(word, style.size, bold) + gap;
                }
            }
        }
    }

    fn details_table(&mut self, rows: &[(&str, String)]) {
        let x0 = MARGIN + (CONTENT_WIDTH - TABLE_WIDTH) / 2.0;
        let value_width = TABLE_WIDTH - LABEL_WIDTH;
        let label_style = Style {
            size: TABLE_SIZE,
            leading: TABLE_LEADING,
            face: Face::Bold,
            color: BLACK,
            align: Align::Left,
            before: 0.0,
            after: 0.0,
        };
        let value_style = Style {
            face: Face::Regular,
            ..label_style
        };

        for (label, value) in rows {
            let labels = wrap(&fold(label), TABLE_SIZE, true, LABEL_WIDTH - 2.0 * CELL_INSET);
            let values = wrap(&fold(value), TABLE_SIZE, false, value_width - 2.0 * CELL_INSET);
            let lines = labels.len().max(values.len()).max(1);
            let height = lines as f32 * TABLE_LEADING + 2.0 * CELL_PADDING;

            self.ensure(height);
            let top = self.y;
            let bottom = top - height;

            self.push(DrawOp::Rect {
                x: x0,
                y: bottom,
                width: LABEL_WIDTH,
                height,
                fill: LABEL_FILL,
            });
            self.grid_row(x0, top, bottom, &[LABEL_WIDTH, value_width]);

            let first_baseline = top - CELL_PADDING - TABLE_SIZE;
            for (i, text) in labels.into_iter().enumerate() {
                let y = first_baseline - i as f32 * TABLE_LEADING;
                self.text(x0 + CELL_INSET, y, label_style, text);
            }
            for (i, text) in values.into_iter().enumerate() {
                let y = first_baseline - i as f32 * TABLE_LEADING;
                self.text(x0 + LABEL_WIDTH + CELL_INSET, y, value_style, text);
            }

            self.y = bottom;
        }
    }

    fn grid_row(&mut self, x0: f32, top: f32, bottom: f32, widths: &[f32]) {
        let x1 = x0 + widths.iter().sum::<f32>();
        self.push(DrawOp::Line {
            from: (x0, top),
            to: (x1, top),
            color: GRID,
        });
        self.push(DrawOp::Line {
            from: (x0, bottom),
            to: (x1, bottom),
            color: GRID,
        });
        let mut x = x0;
        self.push(DrawOp::Line {
            from: (x, top),
            to: (x, bottom),
            color: GRID,
        });
        for w in widths {
            x += w;
            self.push(DrawOp::Line {
                from: (x, top),
                to: (x, bottom),
                color: GRID,
            });
        }
    }

    fn services(&mut self, contract: &PdfContract) {
        for raw in contract.services_block.lines() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            match classify_line(line, &contract.category_headers) {
                ServiceLine::Category(text) => self.paragraph(text, CATEGORY, 0.0),
                ServiceLine::SubHeader(text) => self.paragraph(text, SUB_HEADER, 0.0),
                ServiceLine::Bullet(text) => {
                    self.paragraph_with_marker(text, BULLET, BULLET_INDENT, Some("-"))
                }
                ServiceLine::Body(text) => self.paragraph(text, BODY, 0.0),
            }
        }
    }

    fn signatures(&mut self) {
        let column = TABLE_WIDTH / 2.0;
        let x0 = MARGIN + (CONTENT_WIDTH - TABLE_WIDTH) / 2.0;
        let row_height = TABLE_SIZE + 2.0 * CELL_PADDING;
        let style = Style {
            size: TABLE_SIZE,
            leading: TABLE_LEADING,
            face: Face::Regular,
            color: BLACK,
            align: Align::Center,
            before: 0.0,
            after: 0.0,
        };

        self.space(14.4);
        self.ensure(row_height * SIGNATURE_ROWS.len() as f32);

        for (left, right) in SIGNATURE_ROWS {
            let baseline = self.y - CELL_PADDING - TABLE_SIZE;
            for (i, cell) in [left, right].into_iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                let x = x0 + i as f32 * column + (column - text_width(cell, TABLE_SIZE, false)) / 2.0;
                self.text(x, baseline, style, cell.to_string());
            }
            self.y -= row_height;
        }
    }

    /// Close the last page and stamp "Page N of M" on every page.
    fn finish(mut self) -> Vec<Page> {
        self.done.push(self.current);
        let total = self.done.len();
        let style = Style {
            size: 8.0,
            ..GENERATION_FOOTER
        };
        for (i, page) in self.done.iter_mut().enumerate() {
            let label = format!("Page {} of {}", i + 1, total);
            let x = (PAGE_WIDTH - text_width(&label, style.size, false)) / 2.0;
            page.ops.push(DrawOp::Text {
                x,
                y: FOOTER_BASELINE,
                size: style.size,
                face: style.face,
                color: style.color,
                text: label,
            });
        }
        self.done
    }
}
