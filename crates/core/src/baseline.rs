//! Document-wide statistics that normalize the heading heuristics across
//! documents with different styling.

use std::cmp::Ordering;

use crate::config::HeuristicConfig;
use crate::types::{DocumentBaseline, Line};

/// Compute the median font size and the compact-width threshold.
///
/// The width threshold is `width_threshold_ratio` times the most frequent
/// line width after bucketing (ties go to the bucket seen first). The median
/// is the lower median of all line font sizes. Without lines the threshold
/// is 0 and the median falls back to `default_font_size`.
pub fn compute_baseline(lines: &[Line], config: &HeuristicConfig) -> DocumentBaseline {
    DocumentBaseline {
        median_font_size: median_font_size(lines, config.default_font_size),
        width_threshold: dominant_width(lines, config.width_bucket)
            .map(|w| w * config.width_threshold_ratio)
            .unwrap_or(0.0),
    }
}

fn bucket(width: f32, size: f32) -> f32 {
    (width / size).round() * size
}

/// Most common bucketed line width.
fn dominant_width(lines: &[Line], bucket_size: f32) -> Option<f32> {
    // (bucket, count) in first-seen order so ties resolve deterministically.
    let mut counts: Vec<(f32, usize)> = Vec::new();
    for line in lines {
        let b = bucket(line.width(), bucket_size);
        match counts.iter_mut().find(|(w, _)| *w == b) {
            Some((_, count)) => *count += 1,
            None => counts.push((b, 1)),
        }
    }

    let max = counts.iter().map(|(_, c)| *c).max()?;
    counts.into_iter().find(|(_, c)| *c == max).map(|(w, _)| w)
}

fn median_font_size(lines: &[Line], default: f32) -> f32 {
    let mut sizes: Vec<f32> = lines.iter().map(|l| l.font_size).collect();
    if sizes.is_empty() {
        return default;
    }
    sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sizes[(sizes.len() - 1) / 2]
}
