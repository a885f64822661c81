//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: writes the final record stream as a JSON dataset

pub mod json;
