pub mod error;
pub mod feature_flags;

pub mod analytics;
pub mod case;
pub mod common;
pub mod court;
pub mod document;
pub mod judgment;
pub mod search;
pub mod user;

pub use error::*;
pub use feature_flags::*;

pub use analytics::*;
pub use case::*;
pub use common::*;
pub use court::*;
pub use document::*;
pub use judgment::*;
pub use search::*;
pub use user::*;
