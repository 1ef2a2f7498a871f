//! Fragment-to-line reconstruction.
//!
//! PDF text arrives as independent positioned runs with no line or paragraph
//! markers, so logical lines are inferred from geometry alone:
//!
//! ```text
//! TextFragment[] (per page)  ->  sort by (rounded y, x)  ->  sweep  ->  Line[]
//! ```
//!
//! The sweep keeps appending fragments to a buffer until the buffer closes a
//! sentence or the next fragment jumps down by more than
//! [`HeuristicConfig::paragraph_gap_ratio`] times the previous font size.

use std::cmp::Ordering;

use crate::config::HeuristicConfig;
use crate::text::{ends_sentence, is_binary, normalize};
use crate::types::{Line, TextFragment};

/// Sort fragments top-to-bottom, then left-to-right.
pub fn sort_fragments(fragments: &mut [TextFragment], config: &HeuristicConfig) {
    fragments.sort_by(|a, b| {
        config
            .round_y(a.origin_y())
            .partial_cmp(&config.round_y(b.origin_y()))
            .unwrap_or(Ordering::Equal)
            .then(a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal))
    });
}

/// Reconstruct the lines of every page, in page order.
pub fn reconstruct(pages: &[Vec<TextFragment>], config: &HeuristicConfig) -> Vec<Line> {
    pages
        .iter()
        .flat_map(|fragments| reconstruct_page(fragments, config))
        .collect()
}

/// Position and size of the last fragment appended to a [`LineBuffer`].
struct LastSeen {
    y: f32,
    font_size: f32,
    fragment: TextFragment,
}

/// Accumulates fragment text until a line boundary is found.
struct LineBuffer {
    text: String,
    last: Option<LastSeen>,
}

impl LineBuffer {
    fn new() -> Self {
        Self {
            text: String::new(),
            last: None,
        }
    }

    fn take_line(&mut self) -> Option<Line> {
        let text = std::mem::take(&mut self.text);
        let last = self.last.as_ref()?;
        if text.is_empty() {
            return None;
        }
        Some(Line {
            text,
            font_size: last.font_size,
            page_index: last.fragment.page_index,
            y: last.fragment.origin_y(),
            fragment: last.fragment.clone(),
        })
    }
}

/// Merge one page's fragments into lines.
pub fn reconstruct_page(fragments: &[TextFragment], config: &HeuristicConfig) -> Vec<Line> {
    let mut sorted = fragments.to_vec();
    sort_fragments(&mut sorted, config);

    let mut lines = Vec::new();
    let mut buffer = LineBuffer::new();

    for fragment in sorted {
        if is_binary(&fragment.text) {
            continue;
        }
        let text = normalize(&fragment.text, None);
        if text.is_empty() {
            continue;
        }

        let y = config.round_y(fragment.origin_y());

        let starts_block = buffer
            .last
            .as_ref()
            .is_some_and(|last| (y - last.y).abs() > last.font_size * config.paragraph_gap_ratio);

        if !buffer.text.is_empty() && (ends_sentence(&buffer.text) || starts_block) {
            lines.extend(buffer.take_line());
            buffer.text = text;
        } else if buffer.text.is_empty() {
            buffer.text = text;
        } else {
            buffer.text.push(' ');
            buffer.text.push_str(&text);
        }

        buffer.last = Some(LastSeen {
            y,
            font_size: fragment.font_size,
            fragment,
        });
    }

    lines.extend(buffer.take_line());

    log::debug!(
        "reconstructed {} lines from {} fragments",
        lines.len(),
        fragments.len()
    );

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BBox, StyleFlags};

    // -- Helpers for building test data -----------------------------------

    fn make_fragment(text: &str, x: f32, y: f32, font_size: f32) -> TextFragment {
        TextFragment {
            text: text.to_string(),
            font_name: "TestFont".to_string(),
            font_size,
            flags: StyleFlags::empty(),
            bbox: BBox::new(x, y, x + text.len() as f32 * font_size * 0.5, y + font_size),
            baseline: None,
            page_index: 0,
            page_width: 600.0,
        }
    }

    fn on_page(mut fragment: TextFragment, page: usize) -> TextFragment {
        fragment.page_index = page;
        fragment
    }

    fn texts(lines: &[Line]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        let config = HeuristicConfig::default();
        assert!(reconstruct(&[], &config).is_empty());
        assert!(reconstruct(&[vec![], vec![]], &config).is_empty());
    }

    #[test]
    fn test_same_row_fragments_merge() {
        let config = HeuristicConfig::default();
        let page = vec![
            make_fragment("World", 100.0, 72.0, 12.0),
            make_fragment("Hello", 50.0, 72.0, 12.0),
        ];
        let lines = reconstruct(&[page], &config);
        assert_eq!(texts(&lines), vec!["Hello World"]);
        // The last merged fragment supplies the geometry.
        assert_eq!(lines[0].fragment.text, "World");
    }

    #[test]
    fn test_one_fragment_per_line_is_preserved() {
        let config = HeuristicConfig::default();
        let page = vec![
            make_fragment("Third", 50.0, 300.0, 12.0),
            make_fragment("First", 50.0, 100.0, 12.0),
            make_fragment("Second", 50.0, 200.0, 12.0),
        ];
        let lines = reconstruct(&[page], &config);
        assert_eq!(texts(&lines), vec!["First", "Second", "Third"]);
        assert!(lines.windows(2).all(|w| w[0].y < w[1].y));
    }

    #[test]
    fn test_paragraph_gap_splits_lines() {
        let config = HeuristicConfig::default();
        // Gap of 30 > 1.2 * 12, first text has no terminal punctuation.
        let page = vec![
            make_fragment("Introduction", 50.0, 100.0, 12.0),
            make_fragment("Body starts here", 50.0, 130.0, 12.0),
        ];
        let lines = reconstruct(&[page], &config);
        assert_eq!(texts(&lines), vec!["Introduction", "Body starts here"]);
    }

    #[test]
    fn test_wrapped_lines_merge_into_paragraph() {
        let config = HeuristicConfig::default();
        // Gap of 14 <= 1.2 * 12: a wrapped line of the same paragraph.
        let page = vec![
            make_fragment("The quick brown fox", 50.0, 100.0, 12.0),
            make_fragment("jumps over the dog", 50.0, 114.0, 12.0),
        ];
        let lines = reconstruct(&[page], &config);
        assert_eq!(texts(&lines), vec!["The quick brown fox jumps over the dog"]);
        assert_eq!(lines[0].y, 114.0);
    }

    #[test]
    fn test_sentence_end_flushes_buffer() {
        let config = HeuristicConfig::default();
        let page = vec![
            make_fragment("First sentence.", 50.0, 100.0, 12.0),
            make_fragment("Second one", 50.0, 114.0, 12.0),
        ];
        let lines = reconstruct(&[page], &config);
        assert_eq!(texts(&lines), vec!["First sentence.", "Second one"]);
    }

    #[test]
    fn test_gap_uses_previous_font_size() {
        let config = HeuristicConfig::default();
        // 20pt title followed by 10pt body 22 units below: 22 <= 1.2 * 20.
        let page = vec![
            make_fragment("Big Title", 50.0, 100.0, 20.0),
            make_fragment("small text", 50.0, 122.0, 10.0),
        ];
        assert_eq!(reconstruct(&[page], &config).len(), 1);

        // 10pt body followed by 20pt text 22 units below: 22 > 1.2 * 10.
        let page = vec![
            make_fragment("small text", 50.0, 100.0, 10.0),
            make_fragment("Big Title", 50.0, 122.0, 20.0),
        ];
        assert_eq!(reconstruct(&[page], &config).len(), 2);
    }

    #[test]
    fn test_binary_and_blank_fragments_are_dropped() {
        let config = HeuristicConfig::default();
        let page = vec![
            make_fragment("Heading", 50.0, 100.0, 12.0),
            make_fragment("\u{0}\u{1}\u{2}", 120.0, 100.0, 12.0),
            make_fragment("   ", 150.0, 100.0, 12.0),
        ];
        let lines = reconstruct(&[page], &config);
        assert_eq!(texts(&lines), vec!["Heading"]);
        assert_eq!(lines[0].fragment.text, "Heading");
    }

    #[test]
    fn test_fragment_text_is_normalized() {
        let config = HeuristicConfig::default();
        let page = vec![make_fragment("  spaced\t\tout  ", 50.0, 100.0, 12.0)];
        let lines = reconstruct(&[page], &config);
        assert_eq!(texts(&lines), vec!["spaced out"]);
    }

    #[test]
    fn test_pages_do_not_merge() {
        let config = HeuristicConfig::default();
        let pages = vec![
            vec![make_fragment("end of page one", 50.0, 700.0, 12.0)],
            vec![on_page(make_fragment("start of page two", 50.0, 700.0, 12.0), 1)],
        ];
        let lines = reconstruct(&pages, &config);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].page_index, 0);
        assert_eq!(lines[1].page_index, 1);
    }

    #[test]
    fn test_rounding_groups_near_rows() {
        let config = HeuristicConfig::default();
        // 100.02 and 100.04 both round to 100.0, so x decides the order.
        let page = vec![
            make_fragment("right", 200.0, 100.02, 12.0),
            make_fragment("left", 50.0, 100.04, 12.0),
        ];
        let lines = reconstruct(&[page], &config);
        assert_eq!(texts(&lines), vec!["left right"]);
    }
}
