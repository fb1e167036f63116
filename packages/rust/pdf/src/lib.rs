//! PDF rendering of service agreements.
//!
//! [`render`] lays the contract out with [`layout::lay_out`] and emits the
//! pages with `printpdf`: builtin Helvetica for Latin text, an optional
//! embedded Unicode font for the right-to-left title, and an optional logo.

pub mod layout;
pub mod logo;
pub mod metrics;
pub mod rtl;

use std::io::Cursor;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use image::DynamicImage;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Polygon, Pt, Rgb,
};
use tracing::{debug, info, instrument, warn};

use contractgen_shared::{ContractGenError, Result};

use layout::{Decorations, DrawOp, Face, LOGO_BOX, PAGE_HEIGHT, PAGE_WIDTH, Rgb8};

/// Product name stamped in the generation footer.
pub const GENERATOR_NAME: &str = "ContractGen";

/// Arabic rendering of the document title for bilingual output.
pub const RTL_TITLE: &str = "اتفاقية خدمات مهنية";

const LOGO_DPI: f32 = 300.0;

/// Everything the PDF shows, already formatted for display.
#[derive(Debug, Clone)]
pub struct PdfContract {
    pub client_name: String,
    pub client_address: String,
    pub client_email: String,
    pub client_phone: String,
    pub country: String,
    pub effective_date: String,
    pub contract_duration: String,
    pub fees: String,
    pub fees_in_words: String,
    pub currency_code: String,
    pub currency_symbol: String,
    pub currency_name: String,
    pub usd_equivalent: String,
    /// Assembled service block text.
    pub services_block: String,
    /// Upper-cased category headers occurring in `services_block`.
    pub category_headers: Vec<String>,
    pub legal_framework: String,
    pub service_provider: String,
    pub bank_details: String,
    pub generated_at: DateTime<Utc>,
}

/// Rendering switches.
#[derive(Debug, Clone, Default)]
pub struct PdfOptions {
    /// Add the Arabic title line.
    pub bilingual: bool,
    pub logo_path: Option<PathBuf>,
    /// TrueType/OpenType font with Arabic coverage.
    pub rtl_font_path: Option<PathBuf>,
}

/// Rendered document plus the optional assets that were left out.
#[derive(Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    /// `AssetLoadFailure`/`Config` errors for a logo or font that could not
    /// be used. The document was rendered without them.
    pub skipped_assets: Vec<ContractGenError>,
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    rtl: Option<IndirectFontRef>,
}

impl Fonts {
    fn get(&self, face: Face) -> Option<&IndirectFontRef> {
        match face {
            Face::Regular => Some(&self.regular),
            Face::Bold => Some(&self.bold),
            Face::Rtl => self.rtl.as_ref(),
        }
    }
}

/// Render the contract to PDF bytes.
#[instrument(skip_all, fields(client = %contract.client_name, bilingual = options.bilingual))]
pub fn render(contract: &PdfContract, options: &PdfOptions) -> Result<RenderedPdf> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        "Service Agreement",
        Mm::from(Pt(PAGE_WIDTH)),
        Mm::from(Pt(PAGE_HEIGHT)),
        "Layer 1",
    );

    let mut fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?,
        rtl: None,
    };
    let mut skipped_assets = Vec::new();

    if options.bilingual {
        match embed_rtl_font(&doc, options.rtl_font_path.as_deref()) {
            Ok(font) => fonts.rtl = Some(font),
            Err(e) => {
                warn!(error = %e, "skipping Arabic title");
                skipped_assets.push(e);
            }
        }
    }

    let logo = match options.logo_path.as_deref().map(logo::decode) {
        Some(Ok(img)) => Some(img),
        Some(Err(e)) => {
            warn!(error = %e, "skipping logo");
            skipped_assets.push(e);
            None
        }
        None => None,
    };
    let decorations = Decorations {
        logo: logo
            .as_ref()
            .and_then(|img| logo::fit_within(img.width(), img.height(), LOGO_BOX.0, LOGO_BOX.1)),
        rtl_title: fonts.rtl.as_ref().map(|_| rtl::prepare(RTL_TITLE)),
    };

    let pages = layout::lay_out(contract, &decorations);
    debug!(pages = pages.len(), "layout complete");

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(
                Mm::from(Pt(PAGE_WIDTH)),
                Mm::from(Pt(PAGE_HEIGHT)),
                "Layer 1",
            );
            doc.get_page(page_index).get_layer(layer_index)
        };

        for op in &page.ops {
            draw(&layer, op, &fonts, logo.as_ref());
        }
    }

    let bytes = doc.save_to_bytes().map_err(render_error)?;
    info!(
        pages = pages.len(),
        size = bytes.len(),
        skipped = skipped_assets.len(),
        "PDF rendered"
    );
    Ok(RenderedPdf {
        bytes,
        skipped_assets,
    })
}

fn embed_rtl_font(
    doc: &printpdf::PdfDocumentReference,
    path: Option<&std::path::Path>,
) -> Result<IndirectFontRef> {
    let path = path.ok_or_else(|| {
        ContractGenError::config("bilingual output needs [pdf] rtl_font_path to be set")
    })?;
    let bytes = std::fs::read(path).map_err(|e| ContractGenError::asset(path, e.to_string()))?;
    doc.add_external_font(Cursor::new(bytes))
        .map_err(|e| ContractGenError::asset(path, e.to_string()))
}

fn draw(layer: &PdfLayerReference, op: &DrawOp, fonts: &Fonts, logo: Option<&DynamicImage>) {
    match op {
        DrawOp::Text {
            x,
            y,
            size,
            face,
            color,
            text,
        } => {
            let Some(font) = fonts.get(*face) else {
                return;
            };
            layer.set_fill_color(rgb(*color));
            layer.use_text(text.as_str(), *size, Mm::from(Pt(*x)), Mm::from(Pt(*y)), font);
        }
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
        } => {
            layer.set_fill_color(rgb(*fill));
            let corners = [(*x, *y), (x + width, *y), (x + width, y + height), (*x, y + height)];
            layer.add_polygon(Polygon {
                rings: vec![corners.iter().map(|&(px, py)| (point(px, py), false)).collect()],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            });
        }
        DrawOp::Line { from, to, color } => {
            layer.set_outline_color(rgb(*color));
            layer.set_outline_thickness(1.0);
            layer.add_line(Line {
                points: vec![(point(from.0, from.1), false), (point(to.0, to.1), false)],
                is_closed: false,
            });
        }
        DrawOp::Logo {
            x,
            y,
            width,
            height,
        } => {
            let Some(img) = logo else {
                return;
            };
            // Natural size at LOGO_DPI, in points.
            let natural_width = img.width() as f32 * 72.0 / LOGO_DPI;
            let natural_height = img.height() as f32 * 72.0 / LOGO_DPI;
            let flattened = DynamicImage::ImageRgb8(img.to_rgb8());
            Image::from_dynamic_image(&flattened).add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm::from(Pt(*x))),
                    translate_y: Some(Mm::from(Pt(*y))),
                    scale_x: Some(width / natural_width),
                    scale_y: Some(height / natural_height),
                    dpi: Some(LOGO_DPI),
                    ..Default::default()
                },
            );
        }
    }
}

fn rgb((r, g, b): Rgb8) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn point(x: f32, y: f32) -> Point {
    Point::new(Mm::from(Pt(x)), Mm::from(Pt(y)))
}

fn render_error(e: impl std::fmt::Display) -> ContractGenError {
    ContractGenError::Render(format!("PDF: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn contract() -> PdfContract {
        PdfContract {
            client_name: "Acme".into(),
            client_address: String::new(),
            client_email: "a@acme.example".into(),
            client_phone: String::new(),
            country: "UK".into(),
            effective_date: "01 March 2025".into(),
            contract_duration: "6 Months".into(),
            fees: "1,500.00".into(),
            fees_in_words: "One Thousand, Five Hundred Pounds".into(),
            currency_code: "GBP".into(),
            currency_symbol: "£".into(),
            currency_name: "British Pound".into(),
            usd_equivalent: "1,905.00".into(),
            services_block: "HR & PAYROLL\n\nPayroll Processing:\n- Monthly payroll.".into(),
            category_headers: vec!["HR & PAYROLL".into()],
            legal_framework: "Laws of England and Wales.".into(),
            service_provider: String::new(),
            bank_details: String::new(),
            generated_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn renders_a_pdf() {
        let rendered = render(&contract(), &PdfOptions::default()).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert!(rendered.skipped_assets.is_empty());
    }

    #[test]
    fn missing_assets_are_skipped() {
        let options = PdfOptions {
            bilingual: true,
            logo_path: Some(PathBuf::from("/no/such/logo.png")),
            rtl_font_path: Some(PathBuf::from("/no/such/font.ttf")),
        };
        let rendered = render(&contract(), &options).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert_eq!(rendered.skipped_assets.len(), 2);
        assert!(
            rendered
                .skipped_assets
                .iter()
                .all(|e| matches!(e, ContractGenError::AssetLoadFailure { .. }))
        );
    }

    #[test]
    fn bilingual_without_font_reports_it() {
        let options = PdfOptions {
            bilingual: true,
            ..PdfOptions::default()
        };
        let rendered = render(&contract(), &options).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert_eq!(rendered.skipped_assets.len(), 1);
        assert!(rendered.skipped_assets[0].to_string().contains("rtl_font_path"));
    }

    #[test]
    fn logo_is_embedded() {
        let path = std::env::temp_dir().join(format!("cg-logo-{}.png", uuid::Uuid::now_v7()));
        let img = image::RgbImage::from_pixel(40, 20, image::Rgb([30, 64, 175]));
        img.save(&path).unwrap();

        let with_logo = render(
            &contract(),
            &PdfOptions {
                logo_path: Some(path.clone()),
                ..PdfOptions::default()
            },
        )
        .unwrap();
        let without = render(&contract(), &PdfOptions::default()).unwrap();
        assert!(with_logo.skipped_assets.is_empty());
        assert!(with_logo.bytes.len() > without.bytes.len());

        let _ = std::fs::remove_file(&path);
    }
}
