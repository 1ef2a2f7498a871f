//! Per-document pipeline: lines, baseline and heading candidates.

use serde::Serialize;

use crate::baseline::compute_baseline;
use crate::config::HeuristicConfig;
use crate::heading::detect_candidates;
use crate::layout::reconstruct;
use crate::types::{DocumentBaseline, HeadingCandidate, Line, TextFragment};

/// Everything derived from one document's fragments before ranking.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentAnalysis {
    pub lines: Vec<Line>,
    pub baseline: DocumentBaseline,
    pub candidates: Vec<HeadingCandidate>,
}

/// Reconstruct lines, baseline the document and classify every line.
///
/// A document without lines is not an error: it gets the default baseline
/// and no candidates.
pub fn analyze_pages(pages: &[Vec<TextFragment>], config: &HeuristicConfig) -> DocumentAnalysis {
    let lines = reconstruct(pages, config);
    let baseline = compute_baseline(&lines, config);

    if lines.is_empty() {
        log::debug!("document has no extractable lines");
        return DocumentAnalysis {
            lines,
            baseline,
            candidates: Vec::new(),
        };
    }

    let candidates = detect_candidates(&lines, &baseline, config);
    log::debug!(
        "{} lines, median font size {:.2}, width threshold {:.1}, {} candidates",
        lines.len(),
        baseline.median_font_size,
        baseline.width_threshold,
        candidates.len()
    );

    DocumentAnalysis {
        lines,
        baseline,
        candidates,
    }
}
