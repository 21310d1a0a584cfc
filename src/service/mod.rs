pub mod clock;
pub mod session;
pub mod short_link;
pub mod verification;

pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{AuthenticatedSession, SessionManager};
pub use short_link::ShortLinkResolver;
pub use verification::VerificationService;
