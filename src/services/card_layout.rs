//! Text placement shared by the SVG preview and the PDF export.
//!
//! Coordinates are CSS pixels on a 384 x 224 card with 24 px padding: the
//! business name and title sit at the top, the contact block is pinned to the
//! bottom edge.

use crate::services::card_design::CardDesign;

pub const CARD_WIDTH_PX: f32 = 384.0;
pub const CARD_HEIGHT_PX: f32 = 224.0;
pub const CARD_PADDING_PX: f32 = 24.0;

// Baseline offset within a line box, as a fraction of the font size
const ASCENT: f32 = 0.8;
// Average Helvetica glyph width, as a fraction of the font size
const AVERAGE_GLYPH_WIDTH: f32 = 0.55;

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    /// Baseline, measured from the top edge
    pub baseline: f32,
    pub font_size: f32,
    pub bold: bool,
    pub opacity: f32,
}

struct LineSlot<'a> {
    value: &'a str,
    placeholder: &'static str,
    font_size: f32,
    line_height: f32,
    bold: bool,
    opacity: f32,
}

impl<'a> LineSlot<'a> {
    fn new(value: &'a str, placeholder: &'static str, font_size: f32, line_height: f32) -> Self {
        Self {
            value,
            placeholder,
            font_size,
            line_height,
            bold: false,
            opacity: 1.0,
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    fn place(self, top: f32) -> TextLine {
        let value = self.value.trim();
        let text = if value.is_empty() { self.placeholder } else { value };
        let half_leading = (self.line_height - self.font_size) / 2.0;

        TextLine {
            text: fit_to_width(text, self.font_size, CARD_WIDTH_PX - 2.0 * CARD_PADDING_PX),
            x: CARD_PADDING_PX,
            baseline: top + half_leading + self.font_size * ASCENT,
            font_size: self.font_size,
            bold: self.bold,
            opacity: self.opacity,
        }
    }
}

/// Lays out every text line of the card, substituting placeholders for empty fields
pub fn layout(design: &CardDesign) -> Vec<TextLine> {
    const HEADING_GAP: f32 = 4.0;
    const CONTACT_GAP: f32 = 4.0;

    let mut lines = Vec::with_capacity(7);

    let heading = [
        LineSlot::new(&design.business_name, "Your Business Name", 20.0, 28.0).bold(),
        LineSlot::new(&design.title, "Your Title", 14.0, 20.0).opacity(0.9),
    ];
    let mut top = CARD_PADDING_PX;
    for slot in heading {
        let height = slot.line_height;
        lines.push(slot.place(top));
        top += height + HEADING_GAP;
    }

    let contact = [
        LineSlot::new(&design.user_name, "Your Name", 14.0, 20.0),
        LineSlot::new(&design.email, "your.email@example.com", 14.0, 20.0),
        LineSlot::new(&design.phone, "+1 (555) 123-4567", 14.0, 20.0),
        LineSlot::new(&design.website, "www.yourwebsite.com", 14.0, 20.0),
        LineSlot::new(&design.address, "Your Business Address", 12.0, 16.0),
    ];
    let block_height: f32 = contact.iter().map(|s| s.line_height).sum::<f32>()
        + CONTACT_GAP * (contact.len() - 1) as f32;
    let mut top = CARD_HEIGHT_PX - CARD_PADDING_PX - block_height;
    for slot in contact {
        let height = slot.line_height;
        lines.push(slot.place(top));
        top += height + CONTACT_GAP;
    }

    lines
}

/// Truncates with "..." so the estimated width stays inside the card
fn fit_to_width(text: &str, font_size: f32, max_width: f32) -> String {
    let max_chars = (max_width / (font_size * AVERAGE_GLYPH_WIDTH)).floor() as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_for_empty_design() {
        let lines = layout(&CardDesign::default());
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();

        assert_eq!(
            texts,
            vec![
                "Your Business Name",
                "Your Title",
                "Your Name",
                "your.email@example.com",
                "+1 (555) 123-4567",
                "www.yourwebsite.com",
                "Your Business Address",
            ]
        );
    }

    #[test]
    fn test_heading_and_contact_positions() {
        let lines = layout(&CardDesign {
            business_name: "Acme".to_string(),
            ..Default::default()
        });

        let name = &lines[0];
        assert_eq!(name.text, "Acme");
        assert!(name.bold);
        assert!((name.baseline - 44.0).abs() < 0.01);

        assert!((lines[1].opacity - 0.9).abs() < f32::EPSILON);

        // Contact block ends at the bottom padding
        let address = lines.last().unwrap();
        assert!((address.baseline - 195.6).abs() < 0.01);
        assert!(address.baseline < CARD_HEIGHT_PX - CARD_PADDING_PX);
        assert!(lines.iter().all(|l| l.x == CARD_PADDING_PX));
    }

    #[test]
    fn test_long_text_is_truncated() {
        let lines = layout(&CardDesign {
            address: "1234 Extremely Long Boulevard Name, Suite 5678, Some Very Long City Name, Region"
                .to_string(),
            ..Default::default()
        });

        let address = &lines.last().unwrap().text;
        assert!(address.ends_with("..."));
        assert!(address.chars().count() <= 50);
    }
}
