//! Cover letter PDF rendering with lopdf and the standard Helvetica fonts.
//!
//! A4, margins 2.54 cm left/right and 1.27 cm top/bottom. Recipient, date and signature
//! are indented 10 cm. Body paragraphs are justified; content flowing past the bottom
//! margin continues on a new page so callers can check the page count.

use super::metrics::{Face, encode_win_ansi, text_width, wrap};
use crate::domain::{DomainError, LetterLayout};
use crate::ports::{PdfRenderer, RenderedPdf};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::debug;

const PT_PER_CM: f32 = 28.3465;
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN_X: f32 = 2.54 * PT_PER_CM;
const MARGIN_Y: f32 = 1.27 * PT_PER_CM;
const INDENT: f32 = 10.0 * PT_PER_CM;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

#[derive(Debug, Default)]
pub struct LopdfRenderer;

impl LopdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// One positioned line. `word_spacing` stretches spaces for justification.
#[derive(Debug, Clone)]
struct Line {
    x: f32,
    y: f32,
    face: Face,
    text: String,
    word_spacing: f32,
}

/// Flows blocks top to bottom, breaking pages at the bottom margin.
struct Flow {
    size: f32,
    leading: f32,
    y: f32,
    pages: Vec<Vec<Line>>,
}

impl Flow {
    fn new(size: f32) -> Self {
        Self {
            size,
            leading: size + 2.0,
            y: PAGE_HEIGHT - MARGIN_Y,
            pages: vec![Vec::new()],
        }
    }

    fn space(&mut self, cm: f32) {
        self.y -= cm * PT_PER_CM;
    }

    fn next_baseline(&mut self) -> f32 {
        if self.y - self.leading < MARGIN_Y {
            self.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN_Y;
        }
        self.y -= self.leading;
        self.y
    }

    fn push(&mut self, line: Line) {
        if let Some(page) = self.pages.last_mut() {
            page.push(line);
        }
    }

    /// Paragraph starting `indent` points right of the left margin.
    fn paragraph(&mut self, text: &str, face: Face, indent: f32, justify: bool) {
        let width = PAGE_WIDTH - 2.0 * MARGIN_X - indent;
        let wrapped = wrap(face, text, self.size, width);
        let count = wrapped.len();
        for (i, text) in wrapped.into_iter().enumerate() {
            let spaces = text.matches(' ').count();
            let word_spacing = if justify && i + 1 < count && spaces > 0 {
                (width - text_width(face, &text, self.size)) / spaces as f32
            } else {
                0.0
            };
            let y = self.next_baseline();
            self.push(Line {
                x: MARGIN_X + indent,
                y,
                face,
                text,
                word_spacing,
            });
        }
    }

    /// Every line its own paragraph; empty lines keep their height.
    fn block(&mut self, text: &str, indent: f32) {
        for line in text.lines() {
            if line.trim().is_empty() {
                self.next_baseline();
            } else {
                self.paragraph(line.trim(), Face::Regular, indent, false);
            }
        }
    }
}

fn layout_lines(layout: &LetterLayout, size: f32) -> Vec<Vec<Line>> {
    let mut flow = Flow::new(size);
    flow.block(&layout.sender, 0.0);
    flow.block(&layout.recipient, INDENT);
    flow.space(0.8);
    flow.paragraph(&layout.date_line, Face::Regular, INDENT, false);
    flow.space(2.0);
    flow.paragraph(&layout.subject, Face::Bold, 0.0, true);
    flow.space(0.4);

    let paragraphs: Vec<&str> = layout
        .body
        .lines()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    for (i, paragraph) in paragraphs.iter().enumerate() {
        flow.paragraph(paragraph, Face::Regular, 0.0, true);
        if i + 1 < paragraphs.len() {
            flow.space(0.2);
        }
    }

    flow.space(0.8);
    flow.paragraph(&layout.signature, Face::Regular, INDENT, false);
    flow.pages
}

fn to_pdf_err(e: lopdf::Error) -> DomainError {
    DomainError::Document(format!("PDF build failed: {}", e))
}

fn page_content(lines: &[Line], size: f32) -> Content {
    let mut operations = Vec::with_capacity(lines.len() * 6);
    for line in lines {
        let font = match line.face {
            Face::Regular => REGULAR,
            Face::Bold => BOLD,
        };
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec![font.into(), Object::Real(size)]));
        operations.push(Operation::new("Tw", vec![Object::Real(line.word_spacing)]));
        operations.push(Operation::new(
            "Td",
            vec![Object::Real(line.x), Object::Real(line.y)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(
                encode_win_ansi(&line.text),
                StringFormat::Literal,
            )],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

fn font(doc: &mut Document, base: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    })
}

impl PdfRenderer for LopdfRenderer {
    fn render(&self, layout: &LetterLayout, font_size: f32) -> Result<RenderedPdf, DomainError> {
        let pages = layout_lines(layout, font_size);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular = font(&mut doc, "Helvetica");
        let bold = font(&mut doc, "Helvetica-Bold");
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                REGULAR => regular,
                BOLD => bold,
            },
        });

        let mut kids = Vec::with_capacity(pages.len());
        for lines in &pages {
            let content = page_content(lines, font_size).encode().map_err(to_pdf_err)?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(PAGE_WIDTH),
                    Object::Real(PAGE_HEIGHT),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(layout.title.as_str()),
            "Producer" => Object::string_literal("jobfinder"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| DomainError::Document(format!("PDF write failed: {}", e)))?;
        debug!(pages = pages.len(), font_size, bytes = bytes.len(), "rendered letter");
        Ok(RenderedPdf {
            bytes,
            pages: pages.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_count(pdf: &[u8]) -> usize {
        Document::load_mem(pdf).unwrap().get_pages().len()
    }

    fn layout(body: String) -> LetterLayout {
        LetterLayout {
            title: "Cover_Letter_Lovelace_Acme_SA".into(),
            sender: "Ada Lovelace\nRue du Lac 4\n1009 Pully\nada@example.com".into(),
            recipient: "Acme SA\nMadame Müller\nRue de l'Industrie 31\n1000 Lausanne".into(),
            date_line: "À Pully, le 14 octobre 2026".into(),
            subject: "Candidature: Ingénieure logiciel Rust".into(),
            body,
            signature: "Ada Lovelace".into(),
        }
    }

    #[test]
    fn short_letter_fits_one_page() {
        let body = "Madame,\n\nJe vous écris pour le poste annoncé.\n\nMeilleures salutations".to_string();
        let pdf = LopdfRenderer::new().render(&layout(body), 12.0).unwrap();
        assert_eq!(pdf.pages, 1);
        assert!(pdf.bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(page_count(&pdf.bytes), 1);
    }

    #[test]
    fn long_letter_overflows_and_smaller_font_uses_fewer_lines() {
        let paragraph = "Expérience solide en systèmes distribués et en développement Rust. ".repeat(8);
        let body = vec![paragraph; 6].join("\n\n");
        let renderer = LopdfRenderer::new();
        let large = renderer.render(&layout(body.clone()), 12.0).unwrap();
        assert!(large.pages > 1);
        assert_eq!(page_count(&large.bytes), large.pages);

        let lines_12: usize = layout_lines(&layout(body.clone()), 12.0).iter().map(Vec::len).sum();
        let lines_10: usize = layout_lines(&layout(body), 10.0).iter().map(Vec::len).sum();
        assert!(lines_10 < lines_12);
    }

    #[test]
    fn indented_blocks_and_justified_body() {
        let body = format!("{}\n\nShort closing line", "word ".repeat(120));
        let pages = layout_lines(&layout(body), 11.0);
        let lines = &pages[0];

        let recipient = lines.iter().find(|l| l.text == "Madame Müller").unwrap();
        assert!((recipient.x - (MARGIN_X + INDENT)).abs() < 0.01);
        let sender = lines.iter().find(|l| l.text == "Ada Lovelace").unwrap();
        assert!((sender.x - MARGIN_X).abs() < 0.01);

        let body_lines: Vec<_> = lines.iter().filter(|l| l.text.starts_with("word")).collect();
        assert!(body_lines.len() > 1);
        assert!(body_lines[0].word_spacing > 0.0);
        assert_eq!(body_lines.last().unwrap().word_spacing, 0.0);

        let closing = lines.iter().find(|l| l.text == "Short closing line").unwrap();
        assert_eq!(closing.word_spacing, 0.0);
        assert_eq!(lines.last().unwrap().text, "Ada Lovelace");
    }
}
