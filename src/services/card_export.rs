use image::DynamicImage;

use crate::services::background::{BackgroundError, BackgroundLoader};
use crate::services::card_design::{CardColors, CardDesign, DesignError};
use crate::services::card_layout::{layout, TextLine, CARD_HEIGHT_PX, CARD_WIDTH_PX};
use crate::services::card_renderer::{
    encode_jpeg, render_background, RenderError, CARD_HEIGHT_MM, CARD_WIDTH_MM,
};
use crate::services::pdf::{PdfFont, PdfImage, PdfText, SinglePageDocument, POINTS_PER_MM};

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Design(#[from] DesignError),

    #[error(transparent)]
    Background(#[from] BackgroundError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A rendered card ready for download
#[derive(Debug)]
pub struct CardExport {
    pub filename: String,
    pub pdf: Vec<u8>,
}

/// Validates the design, resolves its background and renders the PDF.
/// Image work runs on the blocking pool.
#[tracing::instrument(skip_all, fields(business_name = %design.business_name))]
pub async fn export_card(
    loader: &BackgroundLoader,
    design: &CardDesign,
) -> Result<CardExport, ExportError> {
    let colors = design.validate()?;

    let background = match design.background_image() {
        Some(value) => Some(loader.load(value).await?),
        None => None,
    };

    let lines = layout(design);
    let title = lines
        .first()
        .map(|line| line.text.clone())
        .unwrap_or_default();

    let pdf = tokio::task::spawn_blocking(move || {
        render_pdf(colors, background.as_ref(), &lines, &title)
    })
    .await??;

    tracing::info!(bytes = pdf.len(), "Card exported");

    Ok(CardExport {
        filename: design.export_filename(),
        pdf,
    })
}

/// Draws the raster background full-page and the text lines on top.
/// Layout pixels are scaled independently on each axis to the page size.
pub fn render_pdf(
    colors: CardColors,
    background: Option<&DynamicImage>,
    lines: &[TextLine],
    title: &str,
) -> Result<Vec<u8>, RenderError> {
    let canvas = render_background(colors.background, background);
    let jpeg = encode_jpeg(&canvas)?;

    let page_width = CARD_WIDTH_MM * POINTS_PER_MM;
    let page_height = CARD_HEIGHT_MM * POINTS_PER_MM;
    let scale_x = page_width / CARD_WIDTH_PX;
    let scale_y = page_height / CARD_HEIGHT_PX;

    let mut doc = SinglePageDocument::new(page_width, page_height)
        .with_title(title)
        .with_background(PdfImage {
            jpeg: &jpeg,
            width: canvas.width(),
            height: canvas.height(),
        });

    for line in lines {
        doc.push_text(PdfText {
            text: line.text.clone(),
            x: line.x * scale_x,
            y: page_height - line.baseline * scale_y,
            size: line.font_size * scale_y,
            font: if line.bold {
                PdfFont::HelveticaBold
            } else {
                PdfFont::Helvetica
            },
            color: colors.text.unit(),
            opacity: line.opacity,
        });
    }

    Ok(doc.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> BackgroundLoader {
        BackgroundLoader::new(reqwest::Client::new(), "unused", 5 * 1024 * 1024)
    }

    #[tokio::test]
    async fn test_export_default_design() {
        let export = export_card(&loader(), &CardDesign::default()).await.unwrap();

        assert_eq!(export.filename, "business-card.pdf");
        assert!(export.pdf.starts_with(b"%PDF-1.4"));

        let text = String::from_utf8_lossy(&export.pdf);
        assert!(text.contains("/MediaBox [0 0 252.283 144.567]"));
        assert!(text.contains("/Width 1051 /Height 602"));
        assert!(text.contains("(Your Business Name) Tj"));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
        // White text
        assert!(text.contains("1 1 1 rg"));
    }

    #[tokio::test]
    async fn test_export_uses_business_name() {
        let design = CardDesign {
            business_name: "Acme Co".to_string(),
            text_color: "#000000".to_string(),
            ..Default::default()
        };
        let export = export_card(&loader(), &design).await.unwrap();

        assert_eq!(export.filename, "Acme Co.pdf");
        let text = String::from_utf8_lossy(&export.pdf);
        assert!(text.contains("/Title (Acme Co)"));
        assert!(text.contains("0 0 0 rg"));
    }

    #[tokio::test]
    async fn test_invalid_design_is_rejected_before_rendering() {
        let design = CardDesign {
            background_color: "blue".to_string(),
            ..Default::default()
        };

        let result = export_card(&loader(), &design).await;
        assert!(matches!(result, Err(ExportError::Design(_))));
    }

    #[tokio::test]
    async fn test_missing_background_asset() {
        let design = CardDesign {
            background_image: Some("templates/missing.png".to_string()),
            ..Default::default()
        };

        let result = export_card(&loader(), &design).await;
        assert!(matches!(
            result,
            Err(ExportError::Background(BackgroundError::NotFound))
        ));
    }

    #[test]
    fn test_text_positions_are_flipped_to_pdf_space() {
        let lines = layout(&CardDesign::default());
        let pdf = render_pdf(
            CardDesign::default().validate().unwrap(),
            None,
            &lines,
            "Preview",
        )
        .unwrap();
        let text = String::from_utf8_lossy(&pdf);

        // Business name: x 24 px and baseline 44 px from the top of 384 x 224
        assert!(text.contains("15.768 116.17 Td"));
        assert!(text.contains("/F2 "));
        assert!(text.contains("/F1 "));
    }
}
