//! Section boundaries between consecutive ranked headings.
//!
//! A heading owns everything from its own vertical position up to the next
//! heading's position, possibly spanning several pages. The last heading
//! owns the rest of the document.

use std::cmp::Ordering;

use crate::config::HeuristicConfig;
use crate::layout::sort_fragments;
use crate::text::{is_binary, normalize};
use crate::types::{ScoredCandidate, Section, TextFragment};

/// Where a section's content stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionEnd {
    pub page: usize,
    /// `None` extends to the end of the page.
    pub y: Option<f32>,
}

/// Page/position range owned by one heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionRange {
    pub start_page: usize,
    pub start_y: f32,
    pub end: SectionEnd,
}

/// Order candidates geometrically; the ranking order is not kept.
fn sort_by_position(candidates: &[ScoredCandidate]) -> Vec<&ScoredCandidate> {
    let mut sorted: Vec<&ScoredCandidate> = candidates.iter().collect();
    sorted.sort_by(|a, b| {
        a.candidate
            .page_index()
            .cmp(&b.candidate.page_index())
            .then(
                a.candidate
                    .y()
                    .partial_cmp(&b.candidate.y())
                    .unwrap_or(Ordering::Equal),
            )
    });
    sorted
}

/// Ranges owned by each candidate, in geometric order.
pub fn section_ranges(candidates: &[ScoredCandidate], page_count: usize) -> Vec<SectionRange> {
    let sorted = sort_by_position(candidates);
    let last_page = page_count.saturating_sub(1);

    sorted
        .iter()
        .enumerate()
        .map(|(i, current)| {
            let end = match sorted.get(i + 1) {
                Some(next) => SectionEnd {
                    page: next.candidate.page_index(),
                    y: Some(next.candidate.y()),
                },
                None => SectionEnd {
                    page: last_page,
                    y: None,
                },
            };
            SectionRange {
                start_page: current.candidate.page_index(),
                start_y: current.candidate.y(),
                end,
            }
        })
        .collect()
}

/// Raw text inside `range`: fragments joined with spaces, one newline per
/// page walked.
pub fn text_in_range(
    pages: &[Vec<TextFragment>],
    range: &SectionRange,
    config: &HeuristicConfig,
) -> String {
    let mut text = String::new();

    for page in range.start_page..=range.end.page {
        let Some(fragments) = pages.get(page) else {
            break;
        };
        let mut ordered = fragments.clone();
        sort_fragments(&mut ordered, config);

        for fragment in &ordered {
            let y = fragment.origin_y();
            if page == range.start_page && y < range.start_y {
                continue;
            }
            if page == range.end.page && range.end.y.is_some_and(|end_y| y >= end_y) {
                continue;
            }
            if is_binary(&fragment.text) {
                continue;
            }
            text.push_str(&fragment.text);
            text.push(' ');
        }
        text.push('\n');
    }

    text
}

/// Carve the document into one section per ranked candidate.
///
/// Sections come back in (page, y) order, each keeping its candidate's
/// score. Content is normalized; page numbers are 1-based.
pub fn extract_sections(
    candidates: &[ScoredCandidate],
    pages: &[Vec<TextFragment>],
    config: &HeuristicConfig,
) -> Vec<Section> {
    let sorted = sort_by_position(candidates);
    let ranges = section_ranges(candidates, pages.len());

    sorted
        .into_iter()
        .zip(ranges)
        .map(|(scored, range)| {
            let raw = text_in_range(pages, &range, config);
            Section {
                heading: scored.candidate.text().to_string(),
                score: scored.score,
                content: normalize(&raw, None),
                page_number: range.start_page + 1,
            }
        })
        .collect()
}
