pub mod auth;
pub mod browse;
pub mod download;
pub mod entries;
pub mod health;
pub mod types;

pub use types::*;
