//! Core library for doclayout
//!
//! This crate implements the **Functional Core** of the doclayout application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`doclayout_core`** (this crate): pure layout analysis, heading detection,
//!   section extraction, ranking math and report aggregation
//! - **`pdf`**: turns PDF bytes into positioned [`TextFragment`]s
//! - **`doclayout`**: file system, HTTP, concurrency and the CLI (the Imperative Shell)
//!
//! Nothing in this crate touches the file system or the network apart from
//! [`config::RunConfig::load`], which reads a single configuration file.
//!
//! # Pipeline
//!
//! 1. [`layout::reconstruct`] merges fragments into [`Line`]s
//! 2. [`baseline::compute_baseline`] derives the document's typical font size
//!    and line width
//! 3. [`heading::detect_candidates`] flags lines that look like headings
//! 4. [`ranking::rank_candidates`] scores candidates against a query through a
//!    pluggable [`ranking::Ranker`]
//! 5. [`sections::extract_sections`] carves the text between ranked headings
//! 6. [`report::Report`] merges sections across documents into the final output
//!
//! Steps 1 to 3 are bundled by [`analysis::analyze_pages`].
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use doclayout_core::{analyze_pages, extract_sections, rank_candidates};
//! use doclayout_core::{HeuristicConfig, LexicalRanker};
//!
//! let config = HeuristicConfig::default();
//! let analysis = analyze_pages(&pages, &config);
//! let ranked = rank_candidates(&LexicalRanker, &analysis.candidates, "budget travel", 10)?;
//! let sections = extract_sections(&ranked, &pages, &config);
//! ```

pub mod analysis;
pub mod baseline;
pub mod config;
pub mod heading;
pub mod layout;
pub mod ranking;
pub mod report;
pub mod sections;
pub mod text;
pub mod types;

pub use analysis::{analyze_pages, DocumentAnalysis};
pub use config::{ConfigError, HeuristicConfig, RunConfig};
pub use ranking::{
    rank_candidates, LexicalRanker, PrecomputedEmbeddings, Ranker, RankingError,
};
pub use report::{AnalysisOutput, Report};
pub use sections::extract_sections;
pub use types::*;
