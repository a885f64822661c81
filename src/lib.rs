//! # News Shorts Harvester
//!
//! Harvests short-form news videos from a broadcaster's channel page,
//! restricts them to a recent time window and a duration band, enriches each
//! one with authoritative metadata, strips broadcaster boilerplate from its
//! text, and emits a ranked, de-duplicated dataset.
//!
//! ## Architecture
//!
//! 1. **Discovery** ([`discovery`]): walk the channel's video list through
//!    successive reveal steps, applying cheap filters and an early-stop rule
//! 2. **Enrichment** ([`enrichment`]): fetch watch-page metadata per
//!    candidate with bounded concurrency, re-check age precisely, filter by
//!    language and clean the text ([`text`])
//! 3. **Aggregation** ([`aggregate`]): sort by upload instant and assign ids
//!
//! [`pipeline::Pipeline`] sequences the stages; the page and metadata
//! sources behind it are traits ([`sources`]) so they can be replaced.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod enrichment;
pub mod error;
pub mod lang;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod sources;
pub mod text;
pub mod timing;
pub mod utils;
