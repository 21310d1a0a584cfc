pub mod short_link;
pub mod user;

pub use short_link::{CreateShortLinkRequest, CreateShortLinkResponse};
pub use user::{PublicUser, VerifyEmailRequest};
