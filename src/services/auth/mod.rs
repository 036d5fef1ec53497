pub mod authenticator;
pub mod headers;

pub use authenticator::{AuthError, UserId, authenticate, extract_bearer_token};
pub use headers::RequestHeaders;
