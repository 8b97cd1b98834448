//! Minimal single-page PDF writer: one JPEG background and text in the
//! built-in Helvetica faces, which PDF viewers supply without embedding.

use std::fmt::Write as _;

pub const POINTS_PER_MM: f32 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfFont {
    Helvetica,
    HelveticaBold,
}

impl PdfFont {
    fn resource_name(self) -> &'static str {
        match self {
            PdfFont::Helvetica => "F1",
            PdfFont::HelveticaBold => "F2",
        }
    }
}

/// JPEG bytes drawn over the whole page
pub struct PdfImage<'a> {
    pub jpeg: &'a [u8],
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct PdfText {
    pub text: String,
    /// Left edge in points
    pub x: f32,
    /// Baseline in points, measured from the bottom edge
    pub y: f32,
    pub size: f32,
    pub font: PdfFont,
    pub color: (f32, f32, f32),
    pub opacity: f32,
}

pub struct SinglePageDocument<'a> {
    width: f32,
    height: f32,
    title: Option<String>,
    background: Option<PdfImage<'a>>,
    texts: Vec<PdfText>,
}

// Fixed object numbers; the optional image always comes last
const CATALOG: usize = 1;
const PAGES: usize = 2;
const PAGE: usize = 3;
const FONT_REGULAR: usize = 4;
const FONT_BOLD: usize = 5;
const CONTENTS: usize = 6;
const INFO: usize = 7;
const IMAGE: usize = 8;

impl<'a> SinglePageDocument<'a> {
    /// Page size in points
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            title: None,
            background: None,
            texts: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_background(mut self, image: PdfImage<'a>) -> Self {
        self.background = Some(image);
        self
    }

    pub fn push_text(&mut self, text: PdfText) {
        self.texts.push(text);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ObjectWriter::new();
        let opacities = self.opacities();

        writer.object(CATALOG, format!("<< /Type /Catalog /Pages {PAGES} 0 R >>").as_bytes());
        writer.object(
            PAGES,
            format!("<< /Type /Pages /Kids [{PAGE} 0 R] /Count 1 >>").as_bytes(),
        );

        let mut resources = format!(
            "/Font << /F1 {FONT_REGULAR} 0 R /F2 {FONT_BOLD} 0 R >>"
        );
        if self.background.is_some() {
            let _ = write!(resources, " /XObject << /Im1 {IMAGE} 0 R >>");
        }
        if !opacities.is_empty() {
            resources.push_str(" /ExtGState <<");
            for (i, opacity) in opacities.iter().enumerate() {
                let _ = write!(resources, " /GS{i} << /Type /ExtGState /ca {} >>", number(*opacity));
            }
            resources.push_str(" >>");
        }
        writer.object(
            PAGE,
            format!(
                "<< /Type /Page /Parent {PAGES} 0 R /MediaBox [0 0 {} {}] /Resources << {resources} >> /Contents {CONTENTS} 0 R >>",
                number(self.width),
                number(self.height),
            )
            .as_bytes(),
        );

        writer.object(FONT_REGULAR, standard_font("Helvetica").as_bytes());
        writer.object(FONT_BOLD, standard_font("Helvetica-Bold").as_bytes());

        writer.stream(CONTENTS, "", &self.content_stream(&opacities));

        let mut info = b"<< /Producer (cardcraft)".to_vec();
        if let Some(title) = &self.title {
            info.extend_from_slice(b" /Title ");
            info.extend_from_slice(&literal_string(title));
        }
        info.extend_from_slice(b" >>");
        writer.object(INFO, &info);

        if let Some(image) = &self.background {
            writer.stream(
                IMAGE,
                &format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode",
                    image.width, image.height
                ),
                image.jpeg,
            );
        }

        writer.finish(CATALOG, INFO)
    }

    // Distinct opacities below 1.0, each backed by one graphics state
    fn opacities(&self) -> Vec<f32> {
        let mut opacities: Vec<f32> = Vec::new();
        for text in &self.texts {
            let opacity = text.opacity.clamp(0.0, 1.0);
            if opacity < 1.0 && !opacities.iter().any(|o| (o - opacity).abs() < 0.001) {
                opacities.push(opacity);
            }
        }
        opacities
    }

    fn content_stream(&self, opacities: &[f32]) -> Vec<u8> {
        let mut content = Vec::new();

        if self.background.is_some() {
            content.extend_from_slice(
                format!(
                    "q\n{} 0 0 {} 0 0 cm\n/Im1 Do\nQ\n",
                    number(self.width),
                    number(self.height)
                )
                .as_bytes(),
            );
        }

        for text in &self.texts {
            content.extend_from_slice(b"q\n");
            if let Some(gs) = opacities
                .iter()
                .position(|o| (o - text.opacity.clamp(0.0, 1.0)).abs() < 0.001)
            {
                content.extend_from_slice(format!("/GS{gs} gs\n").as_bytes());
            }
            let (r, g, b) = text.color;
            content.extend_from_slice(
                format!(
                    "BT\n/{} {} Tf\n{} {} {} rg\n{} {} Td\n",
                    text.font.resource_name(),
                    number(text.size),
                    number(r),
                    number(g),
                    number(b),
                    number(text.x),
                    number(text.y),
                )
                .as_bytes(),
            );
            content.extend_from_slice(&literal_string(&text.text));
            content.extend_from_slice(b" Tj\nET\nQ\n");
        }

        content
    }
}

/// Appends numbered objects while recording their byte offsets for the xref table
struct ObjectWriter {
    buf: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl ObjectWriter {
    fn new() -> Self {
        let mut buf = b"%PDF-1.4\n".to_vec();
        // Binary marker so transfer tools treat the file as binary
        buf.extend_from_slice(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n']);
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.offsets.push((id, self.buf.len()));
        self.buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, dict_entries: &str, data: &[u8]) {
        let mut body = format!("<< {dict_entries} /Length {} >>\nstream\n", data.len())
            .replace("<<  /", "<< /")
            .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.object(id, &body);
    }

    fn finish(mut self, root: usize, info: usize) -> Vec<u8> {
        self.offsets.sort_by_key(|(id, _)| *id);
        let size = self.offsets.len() + 1;
        let xref_offset = self.buf.len();

        let mut xref = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for (_, offset) in &self.offsets {
            let _ = write!(xref, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {size} /Root {root} 0 R /Info {info} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        );
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

fn standard_font(base: &str) -> String {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>")
}

/// Compact decimal form: at most three decimals, no trailing zeros
fn number(value: f32) -> String {
    let formatted = format!("{value:.3}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Encodes text as a PDF literal string in WinAnsiEncoding.
/// Characters outside the encoding become `?`.
fn literal_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for c in text.chars() {
        match win_ansi_byte(c) {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(win_ansi_byte(c));
            }
            b'\n' | b'\r' => out.push(b' '),
            byte => out.push(byte),
        }
    }
    out.push(b')');
    out
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\u{20}'..='\u{7e}' | '\n' | '\r' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str, opacity: f32) -> PdfText {
        PdfText {
            text: value.to_string(),
            x: 15.77,
            y: 100.0,
            size: 12.9,
            font: PdfFont::HelveticaBold,
            color: (1.0, 1.0, 1.0),
            opacity,
        }
    }

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_document_structure() {
        let jpeg = [0xFFu8, 0xD8, 0xFF, 0xD9];
        let mut doc = SinglePageDocument::new(252.283, 144.567)
            .with_title("Acme")
            .with_background(PdfImage {
                jpeg: &jpeg,
                width: 1051,
                height: 602,
            });
        doc.push_text(text("Acme (Holdings)", 1.0));
        doc.push_text(text("CEO", 0.9));

        let bytes = doc.to_bytes();
        let pdf = as_text(&bytes);

        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with("%%EOF\n"));
        assert!(pdf.contains("/MediaBox [0 0 252.283 144.567]"));
        assert!(pdf.contains("/Width 1051 /Height 602"));
        assert!(pdf.contains("/Filter /DCTDecode /Length 4 >>"));
        assert!(pdf.contains("/BaseFont /Helvetica-Bold"));
        assert!(pdf.contains("(Acme \\(Holdings\\)) Tj"));
        assert!(pdf.contains("/GS0 << /Type /ExtGState /ca 0.9 >>"));
        assert!(pdf.contains("/GS0 gs"));
        assert!(pdf.contains("/Title (Acme)"));
        assert!(pdf.contains("/Size 9 /Root 1 0 R"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut doc = SinglePageDocument::new(100.0, 50.0);
        doc.push_text(text("Hello", 1.0));
        let bytes = doc.to_bytes();

        // The trailer and xref table are plain ASCII
        let marker = b"startxref\n";
        let at = bytes
            .windows(marker.len())
            .rposition(|w| w == marker)
            .unwrap();
        let tail = std::str::from_utf8(&bytes[at + marker.len()..]).unwrap();
        let startxref: usize = tail.lines().next().unwrap().parse().unwrap();

        let xref = std::str::from_utf8(&bytes[startxref..]).unwrap();
        assert!(xref.starts_with("xref\n0 8\n"));

        let entries: Vec<usize> = xref
            .lines()
            .skip(3)
            .take(7)
            .map(|line| line[..10].parse().unwrap())
            .collect();
        for (i, offset) in entries.iter().enumerate() {
            let expected = format!("{} 0 obj", i + 1);
            assert!(bytes[*offset..].starts_with(expected.as_bytes()), "object {}", i + 1);
        }

        // No image object and no graphics states without a background or opacity
        let pdf = as_text(&bytes);
        assert!(!pdf.contains("/XObject"));
        assert!(!pdf.contains("/ExtGState"));
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(literal_string("Café – 5€"), b"(Caf\xe9 \x96 5\x80)".to_vec());
        assert_eq!(literal_string("a\\b"), b"(a\\\\b)".to_vec());
        assert_eq!(literal_string("日本"), b"(??)".to_vec());
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(number(252.2834), "252.283");
        assert_eq!(number(1.0), "1");
        assert_eq!(number(0.5), "0.5");
        assert_eq!(number(-0.0001), "0");
    }
}
