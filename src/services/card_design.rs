use serde::{Deserialize, Serialize};

use crate::models::CardTemplate;

pub const DEFAULT_BACKGROUND_COLOR: &str = "#2563eb";
pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";

const PREMIUM_TEMPLATE_BACKGROUND: &str = "#2563eb";
const PREMIUM_TEMPLATE_TEXT: &str = "#ffffff";
const FREE_TEMPLATE_BACKGROUND: &str = "#ffffff";
const FREE_TEMPLATE_TEXT: &str = "#1f2937";

const MAX_BUSINESS_NAME_LEN: usize = 60;
const MAX_FIELD_LEN: usize = 100;
const MAX_ADDRESS_LEN: usize = 200;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DesignError {
    #[error("{field} must be a hex color like #1f2937")]
    InvalidColor { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Website is not a valid URL")]
    InvalidWebsite,

    #[error("Email is not a valid address")]
    InvalidEmail,
}

/// Which family of designs the card belongs to. Luxury and custom designs are
/// premium-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStyle {
    #[default]
    Basic,
    Luxury,
    Custom,
}

/// Everything the customer can edit on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardDesign {
    pub business_name: String,
    pub user_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub address: String,
    pub background_color: String,
    pub text_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

impl Default for CardDesign {
    fn default() -> Self {
        Self {
            business_name: String::new(),
            user_name: String::new(),
            title: String::new(),
            email: String::new(),
            phone: String::new(),
            website: String::new(),
            address: String::new(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            background_image: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rgb` or `#rrggbb`
    pub fn parse(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        match hex.len() {
            3 => {
                let mut digits = hex.chars().map(|c| {
                    let d = c.to_digit(16).unwrap_or(0) as u8;
                    d * 16 + d
                });
                Some(Rgb(digits.next()?, digits.next()?, digits.next()?))
            }
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Channels scaled to 0.0..=1.0
    pub fn unit(self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

/// Colors resolved from a design that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardColors {
    pub background: Rgb,
    pub text: Rgb,
}

/// Background and text colors a template starts a design with
pub fn template_colors(template: &CardTemplate) -> (&'static str, &'static str) {
    if template.is_premium {
        (PREMIUM_TEMPLATE_BACKGROUND, PREMIUM_TEMPLATE_TEXT)
    } else {
        (FREE_TEMPLATE_BACKGROUND, FREE_TEMPLATE_TEXT)
    }
}

impl CardDesign {
    /// Applies a template's colors and background image, keeping the text fields
    pub fn apply_template(&mut self, template: &CardTemplate) {
        let (background, text) = template_colors(template);
        self.background_color = background.to_string();
        self.text_color = text.to_string();

        let file_path = template.file_path.trim();
        self.background_image = (!file_path.is_empty()).then(|| file_path.to_string());
    }

    /// Background image reference, ignoring blank values
    pub fn background_image(&self) -> Option<&str> {
        self.background_image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<CardColors, DesignError> {
        let checks: [(&'static str, &str, usize); 7] = [
            ("Business name", &self.business_name, MAX_BUSINESS_NAME_LEN),
            ("Name", &self.user_name, MAX_FIELD_LEN),
            ("Title", &self.title, MAX_FIELD_LEN),
            ("Email", &self.email, MAX_FIELD_LEN),
            ("Phone", &self.phone, MAX_FIELD_LEN),
            ("Website", &self.website, MAX_FIELD_LEN),
            ("Address", &self.address, MAX_ADDRESS_LEN),
        ];
        for (field, value, max) in checks {
            if value.chars().count() > max {
                return Err(DesignError::TooLong { field, max });
            }
        }

        let email = self.email.trim();
        if !email.is_empty() && !is_plausible_email(email) {
            return Err(DesignError::InvalidEmail);
        }

        let website = self.website.trim();
        if !website.is_empty() && parse_website(website).is_none() {
            return Err(DesignError::InvalidWebsite);
        }

        let background = Rgb::parse(&self.background_color).ok_or(DesignError::InvalidColor {
            field: "Background color",
        })?;
        let text = Rgb::parse(&self.text_color).ok_or(DesignError::InvalidColor {
            field: "Text color",
        })?;

        Ok(CardColors { background, text })
    }

    /// Download name: the business name, or `business-card` when blank.
    /// Characters that are unsafe in file names or headers are replaced.
    pub fn export_filename(&self) -> String {
        let base: String = self
            .business_name
            .trim()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
                c if c.is_control() || !c.is_ascii() => '_',
                c => c,
            })
            .collect();
        let base = base.trim_matches(|c: char| c == '.' || c.is_whitespace());

        if base.is_empty() {
            "business-card.pdf".to_string()
        } else {
            format!("{base}.pdf")
        }
    }
}

pub(crate) fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !email.contains(' ')
        }
        None => false,
    }
}

/// Websites are often typed without a scheme; assume https in that case
fn parse_website(website: &str) -> Option<url::Url> {
    let candidate = if website.contains("://") {
        website.to_string()
    } else {
        format!("https://{website}")
    };

    url::Url::parse(&candidate)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn template(is_premium: bool, file_path: &str) -> CardTemplate {
        CardTemplate {
            template_id: 1,
            category_id: 1,
            title: "Corporate".to_string(),
            card_template_description: None,
            file_path: file_path.to_string(),
            is_premium,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            category: None,
        }
    }

    #[test]
    fn test_parse_colors() {
        assert_eq!(Rgb::parse("#2563eb"), Some(Rgb(0x25, 0x63, 0xeb)));
        assert_eq!(Rgb::parse("#FFF"), Some(Rgb(255, 255, 255)));
        assert_eq!(Rgb::parse("2563eb"), None);
        assert_eq!(Rgb::parse("#25g3eb"), None);
        assert_eq!(Rgb::parse("#2563e"), None);
        assert_eq!(Rgb(31, 41, 55).to_hex(), "#1f2937");
    }

    #[test]
    fn test_default_design_is_valid() {
        let colors = CardDesign::default().validate().unwrap();
        assert_eq!(colors.background, Rgb(0x25, 0x63, 0xeb));
        assert_eq!(colors.text, Rgb(255, 255, 255));
    }

    #[test]
    fn test_free_template_styling() {
        let mut design = CardDesign {
            business_name: "Acme".to_string(),
            ..Default::default()
        };
        design.apply_template(&template(false, "templates/plain.png"));

        assert_eq!(design.background_color, "#ffffff");
        assert_eq!(design.text_color, "#1f2937");
        assert_eq!(design.background_image(), Some("templates/plain.png"));
        assert_eq!(design.business_name, "Acme");
    }

    #[test]
    fn test_premium_template_styling_without_image() {
        let mut design = CardDesign {
            background_image: Some("data:image/png;base64,AAAA".to_string()),
            ..Default::default()
        };
        design.apply_template(&template(true, "  "));

        assert_eq!(design.background_color, "#2563eb");
        assert_eq!(design.text_color, "#ffffff");
        assert_eq!(design.background_image(), None);
    }

    #[test]
    fn test_validation_errors() {
        let design = CardDesign {
            text_color: "white".to_string(),
            ..Default::default()
        };
        assert_eq!(
            design.validate(),
            Err(DesignError::InvalidColor { field: "Text color" })
        );

        let design = CardDesign {
            business_name: "x".repeat(61),
            ..Default::default()
        };
        assert!(matches!(
            design.validate(),
            Err(DesignError::TooLong { max: 60, .. })
        ));

        let design = CardDesign {
            email: "not-an-email".to_string(),
            ..Default::default()
        };
        assert_eq!(design.validate(), Err(DesignError::InvalidEmail));
    }

    #[test]
    fn test_website_without_scheme_is_accepted() {
        let design = CardDesign {
            website: "www.example.com".to_string(),
            ..Default::default()
        };
        assert!(design.validate().is_ok());

        let design = CardDesign {
            website: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(design.validate(), Err(DesignError::InvalidWebsite));
    }

    #[test]
    fn test_export_filename() {
        let mut design = CardDesign::default();
        assert_eq!(design.export_filename(), "business-card.pdf");

        design.business_name = "Acme Co".to_string();
        assert_eq!(design.export_filename(), "Acme Co.pdf");

        design.business_name = "A/B \"Studio\"".to_string();
        assert_eq!(design.export_filename(), "A-B -Studio-.pdf");

        design.business_name = "   ".to_string();
        assert_eq!(design.export_filename(), "business-card.pdf");
    }

    #[test]
    fn test_style_deserializes_lowercase() {
        let style: CardStyle = serde_json::from_str("\"luxury\"").unwrap();
        assert_eq!(style, CardStyle::Luxury);
        assert_eq!(CardStyle::default(), CardStyle::Basic);
    }
}
