pub mod calendar;
pub mod config;
pub mod humanize;
pub mod types;

pub use config::TvlConfig;
pub use humanize::humanize_number;
pub use types::*;
