//! Free vs. premium feature gating for card designs.
//!
//! Anyone may preview any design. Exporting a design that uses premium
//! features requires a premium account.

use serde::Serialize;

use crate::models::CardTemplate;
use crate::services::card_design::{
    template_colors, CardDesign, CardStyle, DEFAULT_BACKGROUND_COLOR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumFeature {
    LuxuryStyle,
    CustomStyle,
    PremiumTemplate,
    CustomBackgroundColor,
    BackgroundImage,
}

impl PremiumFeature {
    pub fn as_str(self) -> &'static str {
        match self {
            PremiumFeature::LuxuryStyle => "luxury_style",
            PremiumFeature::CustomStyle => "custom_style",
            PremiumFeature::PremiumTemplate => "premium_template",
            PremiumFeature::CustomBackgroundColor => "custom_background_color",
            PremiumFeature::BackgroundImage => "background_image",
        }
    }
}

/// Lists the premium features a design relies on, in a stable order.
///
/// The baseline background is the template's color when one is applied,
/// otherwise the default. Text color never counts.
pub fn premium_features(
    style: CardStyle,
    template: Option<&CardTemplate>,
    design: &CardDesign,
) -> Vec<PremiumFeature> {
    let mut features = Vec::new();

    match style {
        CardStyle::Basic => {}
        CardStyle::Luxury => features.push(PremiumFeature::LuxuryStyle),
        CardStyle::Custom => features.push(PremiumFeature::CustomStyle),
    }

    if template.is_some_and(|t| t.is_premium) {
        features.push(PremiumFeature::PremiumTemplate);
    }

    let baseline = template
        .map(|t| template_colors(t).0)
        .unwrap_or(DEFAULT_BACKGROUND_COLOR);
    if !same_color(&design.background_color, baseline) {
        features.push(PremiumFeature::CustomBackgroundColor);
    }

    if let Some(image) = design.background_image() {
        let from_template = template.is_some_and(|t| t.file_path.trim() == image);
        if !from_template {
            features.push(PremiumFeature::BackgroundImage);
        }
    }

    features
}

/// Features the user is not entitled to; empty means export is allowed
pub fn denied_features(is_premium: bool, features: &[PremiumFeature]) -> Vec<PremiumFeature> {
    if is_premium {
        Vec::new()
    } else {
        features.to_vec()
    }
}

// Compares parsed colors so `#FFF` and `#ffffff` match
fn same_color(a: &str, b: &str) -> bool {
    use crate::services::card_design::Rgb;

    match (Rgb::parse(a), Rgb::parse(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn template(is_premium: bool) -> CardTemplate {
        CardTemplate {
            template_id: 7,
            category_id: 2,
            title: "Gold".to_string(),
            card_template_description: None,
            file_path: "templates/gold.jpg".to_string(),
            is_premium,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            category: None,
        }
    }

    #[test]
    fn test_default_basic_design_is_free() {
        let features = premium_features(CardStyle::Basic, None, &CardDesign::default());
        assert!(features.is_empty());
    }

    #[test]
    fn test_text_color_is_always_free() {
        let design = CardDesign {
            text_color: "#ff0000".to_string(),
            ..Default::default()
        };
        assert!(premium_features(CardStyle::Basic, None, &design).is_empty());
    }

    #[test]
    fn test_free_template_keeps_design_free() {
        let template = template(false);
        let mut design = CardDesign::default();
        design.apply_template(&template);

        assert!(premium_features(CardStyle::Basic, Some(&template), &design).is_empty());
    }

    #[test]
    fn test_premium_template_and_luxury_style() {
        let template = template(true);
        let mut design = CardDesign::default();
        design.apply_template(&template);

        let features = premium_features(CardStyle::Luxury, Some(&template), &design);
        assert_eq!(
            features,
            vec![PremiumFeature::LuxuryStyle, PremiumFeature::PremiumTemplate]
        );
    }

    #[test]
    fn test_custom_background_and_uploaded_image() {
        let design = CardDesign {
            background_color: "#059669".to_string(),
            background_image: Some("data:image/png;base64,AAAA".to_string()),
            ..Default::default()
        };

        let features = premium_features(CardStyle::Custom, None, &design);
        assert_eq!(
            features,
            vec![
                PremiumFeature::CustomStyle,
                PremiumFeature::CustomBackgroundColor,
                PremiumFeature::BackgroundImage,
            ]
        );
    }

    #[test]
    fn test_color_comparison_ignores_notation() {
        let template = template(false);
        let mut design = CardDesign::default();
        design.apply_template(&template);
        design.background_color = "#FFF".to_string();

        assert!(premium_features(CardStyle::Basic, Some(&template), &design).is_empty());
    }

    #[test]
    fn test_premium_users_are_never_denied() {
        let features = vec![PremiumFeature::LuxuryStyle, PremiumFeature::BackgroundImage];

        assert!(denied_features(true, &features).is_empty());
        assert_eq!(denied_features(false, &features), features);
    }

    #[test]
    fn test_feature_names() {
        assert_eq!(PremiumFeature::CustomBackgroundColor.as_str(), "custom_background_color");
        assert_eq!(
            serde_json::to_string(&PremiumFeature::PremiumTemplate).unwrap(),
            "\"premium_template\""
        );
    }
}
