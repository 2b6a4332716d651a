#![forbid(unsafe_code)]

//! Account and character addon profiles for World of Warcraft installations.
//!
//! Reads the profile database the in-game addon writes to SavedVariables and
//! rewrites an account's `AddOns.txt` to match a chosen profile.

pub mod config;
pub mod constants;
pub mod error;
pub mod lua;
pub mod store;
pub mod types;

pub use error::{ProfileError, Result};
