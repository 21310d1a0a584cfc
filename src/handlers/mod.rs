pub mod auth;
pub mod health;
pub mod short_link;
