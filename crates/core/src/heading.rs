//! Heading detection from typography and geometry.
//!
//! Each heuristic is an independent predicate over a line and its document
//! baseline. All predicates run for every line; any line that triggers at
//! least one becomes a [`HeadingCandidate`] carrying the triggered reasons.

use crate::config::HeuristicConfig;
use crate::text::{is_all_upper, is_title_case};
use crate::types::{DocumentBaseline, HeadingCandidate, HeadingReason, Line};

/// Everything a predicate may look at.
struct LineContext<'a> {
    line: &'a Line,
    baseline: &'a DocumentBaseline,
    config: &'a HeuristicConfig,
    word_count: usize,
}

impl LineContext<'_> {
    fn is_short(&self) -> bool {
        self.word_count < self.config.short_line_words
    }
}

type Predicate = fn(&LineContext<'_>) -> bool;

/// Heuristics in reporting order.
const RULES: [(HeadingReason, Predicate); 6] = [
    (HeadingReason::LargerFont, larger_font),
    (HeadingReason::Bold, bold),
    (HeadingReason::Centered, centered),
    (HeadingReason::Uppercase, uppercase),
    (HeadingReason::TitleCase, title_case),
    (HeadingReason::ShortProminent, short_and_prominent),
];

fn larger_font(ctx: &LineContext<'_>) -> bool {
    ctx.line.font_size > ctx.baseline.median_font_size * ctx.config.larger_font_ratio
}

fn bold(ctx: &LineContext<'_>) -> bool {
    ctx.line.fragment.is_bold()
}

/// Margins balance out, and the line is compact: centered body paragraphs
/// do not count.
fn centered(ctx: &LineContext<'_>) -> bool {
    let bbox = &ctx.line.fragment.bbox;
    let left = bbox.x0;
    let right = ctx.line.fragment.page_width - bbox.x1;
    let balanced = (left - right).abs() < ctx.config.center_tolerance;
    balanced && (ctx.line.width() < ctx.baseline.width_threshold || ctx.is_short())
}

fn uppercase(ctx: &LineContext<'_>) -> bool {
    is_all_upper(&ctx.line.text)
}

fn title_case(ctx: &LineContext<'_>) -> bool {
    is_title_case(&ctx.line.text)
}

fn short_and_prominent(ctx: &LineContext<'_>) -> bool {
    ctx.is_short() && ctx.line.font_size > ctx.baseline.median_font_size
}

/// Evaluate every heuristic against `line`. An empty result means the line
/// is not a heading candidate.
pub fn classify(
    line: &Line,
    baseline: &DocumentBaseline,
    config: &HeuristicConfig,
) -> Vec<HeadingReason> {
    let ctx = LineContext {
        line,
        baseline,
        config,
        word_count: line.word_count(),
    };

    RULES
        .iter()
        .filter(|(_, predicate)| predicate(&ctx))
        .map(|(reason, _)| *reason)
        .collect()
}

/// Keep the lines that trigger at least one heuristic, in document order.
pub fn detect_candidates(
    lines: &[Line],
    baseline: &DocumentBaseline,
    config: &HeuristicConfig,
) -> Vec<HeadingCandidate> {
    lines
        .iter()
        .filter_map(|line| {
            let reasons = classify(line, baseline, config);
            if reasons.is_empty() {
                return None;
            }
            log::trace!("heading candidate {:?}: {:?}", line.text, reasons);
            Some(HeadingCandidate {
                line: line.clone(),
                reasons,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BBox, StyleFlags, TextFragment};

    // -- Helpers for building test data -----------------------------------

    fn make_line(text: &str, font_size: f32, x0: f32, x1: f32) -> Line {
        let fragment = TextFragment {
            text: text.to_string(),
            font_name: "Arial".to_string(),
            font_size,
            flags: StyleFlags::empty(),
            bbox: BBox::new(x0, 100.0, x1, 100.0 + font_size),
            baseline: None,
            page_index: 0,
            page_width: 600.0,
        };
        Line {
            text: text.to_string(),
            font_size,
            page_index: 0,
            y: 100.0,
            fragment,
        }
    }

    fn with_font(mut line: Line, font_name: &str, flags: StyleFlags) -> Line {
        line.fragment.font_name = font_name.to_string();
        line.fragment.flags = flags;
        line
    }

    fn baseline(median: f32, width_threshold: f32) -> DocumentBaseline {
        DocumentBaseline {
            median_font_size: median,
            width_threshold,
        }
    }

    fn reasons_for(line: &Line, base: &DocumentBaseline) -> Vec<HeadingReason> {
        classify(line, base, &HeuristicConfig::default())
    }

    #[test]
    fn test_bold_by_font_name() {
        let line = with_font(
            make_line("Chapter One", 12.0, 50.0, 150.0),
            "Arial-Bold",
            StyleFlags::empty(),
        );
        let reasons = reasons_for(&line, &baseline(10.0, 400.0));
        assert!(reasons.contains(&HeadingReason::Bold));
    }

    #[test]
    fn test_larger_font() {
        let line = make_line("Introduction", 15.0, 50.0, 150.0);
        let reasons = reasons_for(&line, &baseline(10.0, 400.0));
        assert!(reasons.contains(&HeadingReason::LargerFont));
        assert!(reasons.contains(&HeadingReason::ShortProminent));
    }

    #[test]
    fn test_normal_text_is_rejected() {
        // Left aligned: left margin 50, right margin 300.
        let line = make_line("Just some normal sentence text.", 10.0, 50.0, 300.0);
        assert!(reasons_for(&line, &baseline(10.0, 400.0)).is_empty());
    }

    #[test]
    fn test_larger_font_requires_multiplier() {
        // 11 > 10 but not > 11.5: only the weaker signal fires.
        let line = make_line("slightly larger words", 11.0, 50.0, 300.0);
        let reasons = reasons_for(&line, &baseline(10.0, 400.0));
        assert_eq!(reasons, vec![HeadingReason::ShortProminent]);
    }

    #[test]
    fn test_centered_short_line() {
        // Margins 200 and 200.
        let line = make_line("a centered caption", 10.0, 200.0, 400.0);
        let reasons = reasons_for(&line, &baseline(10.0, 100.0));
        assert_eq!(reasons, vec![HeadingReason::Centered]);
    }

    #[test]
    fn test_centered_long_wide_paragraph_is_not_flagged() {
        let text = "this is a long centered paragraph with many more than ten words in it";
        let line = make_line(text, 10.0, 50.0, 550.0);
        // Width 500 is not under the 400 threshold and the line is long.
        assert!(reasons_for(&line, &baseline(10.0, 400.0)).is_empty());
    }

    #[test]
    fn test_centered_long_but_narrow_line() {
        let text = "this is a long centered paragraph with many more than ten words in it";
        let line = make_line(text, 10.0, 200.0, 400.0);
        let reasons = reasons_for(&line, &baseline(10.0, 400.0));
        assert_eq!(reasons, vec![HeadingReason::Centered]);
    }

    #[test]
    fn test_uppercase_and_title_case() {
        let line = make_line("EXECUTIVE SUMMARY", 10.0, 50.0, 200.0);
        let reasons = reasons_for(&line, &baseline(10.0, 400.0));
        assert_eq!(reasons, vec![HeadingReason::Uppercase]);

        let line = make_line("Executive Summary", 10.0, 50.0, 200.0);
        let reasons = reasons_for(&line, &baseline(10.0, 400.0));
        assert_eq!(reasons, vec![HeadingReason::TitleCase]);
    }

    #[test]
    fn test_all_signals_fire_together() {
        let line = with_font(
            make_line("OVERVIEW", 20.0, 250.0, 350.0),
            "Helvetica",
            StyleFlags::BOLD,
        );
        let reasons = reasons_for(&line, &baseline(10.0, 400.0));
        assert_eq!(
            reasons,
            vec![
                HeadingReason::LargerFont,
                HeadingReason::Bold,
                HeadingReason::Centered,
                HeadingReason::Uppercase,
                HeadingReason::ShortProminent,
            ]
        );
    }

    #[test]
    fn test_bold_flag_toggles_only_bold() {
        let plain = make_line("Results and Discussion", 14.0, 240.0, 360.0);
        let bolded = with_font(plain.clone(), "Arial", StyleFlags::BOLD);
        let base = baseline(12.0, 300.0);

        let mut without = reasons_for(&plain, &base);
        let with = reasons_for(&bolded, &base);

        assert!(!without.contains(&HeadingReason::Bold));
        assert!(with.contains(&HeadingReason::Bold));
        without.push(HeadingReason::Bold);
        without.sort();
        let mut with_sorted = with.clone();
        with_sorted.sort();
        assert_eq!(without, with_sorted);
    }

    #[test]
    fn test_configurable_center_tolerance() {
        // Margins 180 and 220 differ by 40.
        let line = make_line("off center", 10.0, 180.0, 380.0);
        let base = baseline(10.0, 400.0);
        assert!(!reasons_for(&line, &base).contains(&HeadingReason::Centered));

        let config = HeuristicConfig {
            center_tolerance: 50.0,
            ..HeuristicConfig::default()
        };
        assert!(classify(&line, &base, &config).contains(&HeadingReason::Centered));
    }

    #[test]
    fn test_detect_candidates_keeps_document_order() {
        let lines = vec![
            make_line("Introduction", 16.0, 50.0, 150.0),
            make_line("plain body text that goes on.", 10.0, 50.0, 500.0),
            make_line("Methods", 16.0, 50.0, 120.0),
        ];
        let candidates =
            detect_candidates(&lines, &baseline(10.0, 375.0), &HeuristicConfig::default());
        let texts: Vec<&str> = candidates.iter().map(|c| c.text()).collect();
        assert_eq!(texts, vec!["Introduction", "Methods"]);
        assert!(candidates.iter().all(|c| !c.reasons.is_empty()));
    }

    #[test]
    fn test_detect_candidates_empty() {
        let candidates = detect_candidates(&[], &baseline(12.0, 0.0), &HeuristicConfig::default());
        assert!(candidates.is_empty());
    }
}
