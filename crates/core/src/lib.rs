//! Translate the dialogue text of `.ass` subtitle files while keeping timing,
//! styling and every non-dialogue line untouched.

pub mod ass;
pub mod error;
pub mod files;
pub mod translate;

pub use error::{Error, Result};
