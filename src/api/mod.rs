// API module - HTTP endpoints

pub mod auth;
pub mod cards;
pub mod categories;
pub mod contacts;
pub mod dashboard;
pub mod health;
pub mod middleware;
pub mod payments;
pub mod reviews;
pub mod templates;
pub mod users;

use axum::Router;

use crate::config::Config;
use middleware::session::AppState;

/// All JSON and health routes
pub fn router(config: &Config) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(users::router())
        .merge(categories::router())
        .merge(templates::router())
        .merge(payments::router())
        .merge(contacts::router())
        .merge(reviews::router())
        .merge(dashboard::router())
        .merge(cards::router(config.max_background_bytes))
}
