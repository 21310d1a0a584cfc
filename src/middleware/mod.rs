pub mod auth;
pub mod cookie;

pub use auth::{CurrentUser, raw_cookie_header};
pub use cookie::extract_cookie;
