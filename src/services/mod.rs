// Services module - Business logic

pub mod accounts;
pub mod background;
pub mod card_design;
pub mod card_export;
pub mod card_layout;
pub mod card_preview;
pub mod card_renderer;
pub mod dashboard;
pub mod encryption;
pub mod entitlement;
pub mod password;
pub mod pdf;
pub mod upgrade;
