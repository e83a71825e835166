pub mod errors;
pub mod session;

pub use errors::SessionError;
pub use session::SessionCookies;
