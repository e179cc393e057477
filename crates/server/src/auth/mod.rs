pub mod extractors;
pub mod jwt;
pub mod lockout;
pub mod middleware;
pub mod password;

pub use extractors::{AuthRejection, AuthRequired, CurrentUser, MaybeAuth};
