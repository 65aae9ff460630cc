pub mod config;
pub mod error;
pub mod text;
pub mod types;

pub use config::HarvestConfig;
pub use error::HarvestError;
pub use text::word_count;
pub use types::*;
