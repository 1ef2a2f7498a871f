//! PDF access and content-stream interpretation.

pub mod backend;
pub mod content;
