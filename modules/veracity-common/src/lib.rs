pub mod config;
pub mod error;
mod from_row;
pub mod influence;
pub mod normalize;
pub mod redact;
pub mod types;

pub use config::Config;
pub use error::VeracityError;
pub use influence::influence_score;
pub use normalize::{normalize_content, NormalizedContent};
pub use redact::redact_pii;
pub use types::*;
