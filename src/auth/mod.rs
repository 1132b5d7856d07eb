//! Passwordless email-link authentication
//!
//! Users request a magic link, follow it, and receive an HMAC-signed
//! session cookie. No server-side session storage is needed.

mod login;
mod middleware;
pub mod session;

pub use login::auth_router;
pub use middleware::CurrentUser;
pub use session::Session;
