// Models module - Database entity representations

pub mod category;
pub mod contact;
pub mod payment;
pub mod review;
pub mod template;
pub mod user;

pub use category::TemplateCategory;
pub use contact::ContactMessage;
pub use payment::Payment;
pub use review::Review;
pub use template::CardTemplate;
pub use user::UserDetail;
