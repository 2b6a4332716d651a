//! Application configuration
//!
//! Where the game lives, which account is selected, and how many manifest
//! backups to keep. Stored as JSON under the user config directory.

pub mod app;

pub use app::AppConfig;
