//! Text normalization for titles and descriptions.
//!
//! All functions here are pure and total over `&str`: empty input yields an
//! empty string and nothing panics or returns an error. Each cleaner is
//! idempotent, `f(f(x)) == f(x)`.
//!
//! # Submodules
//!
//! - [`rules`]: ordered rewrite tables and the fixpoint driver
//! - [`title`]: [`clean_title`]
//! - [`body`]: [`clean_body`], the anchor/junk-line/rewrite grammar
//! - [`tokenize`]: [`tokenize_for_vector`] and the segmenter seam

pub mod body;
pub mod rules;
pub mod title;
pub mod tokenize;

pub use body::clean_body;
pub use title::clean_title;
pub use tokenize::{
    HeuristicSegmenter, PosSegmenter, PosTag, SegmentOptions, SegmenterFactory,
    default_segmenter_factory, tokenize_for_vector,
};

/// Outlet names recognized in suffixes, sign-offs and notices.
pub const OUTLETS: &str = "KBS|SBS|YTN|MBC|JTBC|MBN";
