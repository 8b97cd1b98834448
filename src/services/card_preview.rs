use std::fmt::Write as _;

use crate::services::background::BackgroundSource;
use crate::services::card_design::{CardColors, CardDesign};
use crate::services::card_layout::{layout, CARD_HEIGHT_PX, CARD_WIDTH_PX};

const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";
const CORNER_RADIUS: f32 = 8.0;
const OVERLAY_OPACITY: f32 = 0.2;

/// Renders the card as a standalone SVG document
pub fn render_svg(design: &CardDesign, colors: CardColors) -> String {
    let (w, h) = (CARD_WIDTH_PX, CARD_HEIGHT_PX);
    let mut svg = String::with_capacity(2048);

    let _ = write!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##
    );
    let _ = write!(
        svg,
        r##"<defs><clipPath id="card"><rect width="{w}" height="{h}" rx="{CORNER_RADIUS}"/></clipPath></defs>"##
    );
    svg.push_str(r##"<g clip-path="url(#card)">"##);
    let _ = write!(
        svg,
        r##"<rect width="{w}" height="{h}" fill="{}"/>"##,
        colors.background.to_hex()
    );

    if let Some(href) = design.background_image().and_then(image_href) {
        let _ = write!(
            svg,
            r##"<image href="{}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="xMidYMid slice"/>"##,
            html_escape::encode_double_quoted_attribute(&href)
        );
        let _ = write!(
            svg,
            r##"<rect width="{w}" height="{h}" fill="#000000" fill-opacity="{OVERLAY_OPACITY}"/>"##
        );
    }

    let fill = colors.text.to_hex();
    for line in layout(design) {
        let _ = write!(
            svg,
            r##"<text x="{}" y="{}" font-family="{FONT_FAMILY}" font-size="{}" fill="{fill}""##,
            line.x, line.baseline, line.font_size
        );
        if line.bold {
            svg.push_str(r#" font-weight="bold""#);
        }
        if line.opacity < 1.0 {
            let _ = write!(svg, r#" fill-opacity="{}""#, line.opacity);
        }
        let _ = write!(svg, ">{}</text>", html_escape::encode_text(&line.text));
    }

    svg.push_str("</g></svg>");
    svg
}

/// Browser-loadable reference for a background; unusable values are skipped
fn image_href(value: &str) -> Option<String> {
    match BackgroundSource::classify(value).ok()? {
        BackgroundSource::Inline { .. } | BackgroundSource::Remote(_) => Some(value.trim().to_string()),
        BackgroundSource::Asset(path) => {
            let path = path.to_str()?.replace('\\', "/");
            Some(format!("/static/{path}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(design: &CardDesign) -> String {
        let colors = design.validate().unwrap();
        render_svg(design, colors)
    }

    #[test]
    fn test_default_preview() {
        let svg = render(&CardDesign::default());

        assert!(svg.starts_with("<svg "));
        assert!(svg.ends_with("</g></svg>"));
        assert!(svg.contains(r#"viewBox="0 0 384 224""#));
        assert!(svg.contains(r##"fill="#2563eb""##));
        assert!(svg.contains(">Your Business Name</text>"));
        assert!(svg.contains(">Your Business Address</text>"));
        assert_eq!(svg.matches("<text ").count(), 7);
        assert!(!svg.contains("<image"));
        assert!(!svg.contains("fill-opacity=\"0.2\""));
    }

    #[test]
    fn test_text_is_escaped() {
        let svg = render(&CardDesign {
            business_name: "Smith & <Sons>".to_string(),
            ..Default::default()
        });

        assert!(svg.contains(">Smith &amp; &lt;Sons&gt;</text>"));
        assert!(!svg.contains("<Sons>"));
    }

    #[test]
    fn test_template_asset_background_with_overlay() {
        let svg = render(&CardDesign {
            background_image: Some("templates/gold.jpg".to_string()),
            text_color: "#1f2937".to_string(),
            ..Default::default()
        });

        assert!(svg.contains(r#"<image href="/static/templates/gold.jpg""#));
        assert!(svg.contains(r#"preserveAspectRatio="xMidYMid slice""#));
        assert!(svg.contains(r#"fill-opacity="0.2""#));
        assert!(svg.contains(r##"fill="#1f2937""##));
    }

    #[test]
    fn test_unsafe_background_is_skipped() {
        let svg = render(&CardDesign {
            background_image: Some("../../etc/passwd".to_string()),
            ..Default::default()
        });

        assert!(!svg.contains("<image"));
    }

    #[test]
    fn test_bold_and_dimmed_lines() {
        let svg = render(&CardDesign::default());

        assert!(svg.contains(
            r##"font-size="20" fill="#ffffff" font-weight="bold">Your Business Name"##
        ));
        assert!(svg.contains(r#"fill-opacity="0.9">Your Title"#));
    }
}
