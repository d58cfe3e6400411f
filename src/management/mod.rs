mod auth;

pub use auth::REFRESH_MARGIN_SECS;
pub use auth::TokenManager;
