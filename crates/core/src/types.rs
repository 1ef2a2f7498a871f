use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Style bits reported by the rendering backend for a fragment.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct StyleFlags: u32 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const MONOSPACE = 1 << 2;
        const SERIF = 1 << 3;
        const SUPERSCRIPT = 1 << 4;
    }
}

/// Axis-aligned box in layout units. `y` grows downward, so `y0` is the top
/// edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        BBox { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// A single positioned run of text as emitted by the rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub font_name: String,
    pub font_size: f32,
    #[serde(default)]
    pub flags: StyleFlags,
    pub bbox: BBox,
    /// Top-down baseline of the text row, without text rise. Runs of
    /// different sizes on one row share it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<f32>,
    pub page_index: usize,
    pub page_width: f32,
}

impl TextFragment {
    /// Vertical origin used for ordering and section boundaries: the row
    /// baseline when the backend knows it, the top edge otherwise.
    pub fn origin_y(&self) -> f32 {
        self.baseline.unwrap_or(self.bbox.y0)
    }

    /// Bold either by style flag or by a `bold` marker in the font name.
    pub fn is_bold(&self) -> bool {
        self.flags.contains(StyleFlags::BOLD) || self.font_name.to_lowercase().contains("bold")
    }
}

/// A reconstructed logical row or paragraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub text: String,
    /// Font size of the last fragment merged into the line.
    pub font_size: f32,
    /// Last fragment merged into the line; supplies the line geometry.
    pub fragment: TextFragment,
    pub page_index: usize,
    pub y: f32,
}

impl Line {
    pub fn width(&self) -> f32 {
        self.fragment.bbox.width()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Per-document reference values for the heading heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DocumentBaseline {
    pub median_font_size: f32,
    pub width_threshold: f32,
}

/// Why a line was flagged as a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadingReason {
    #[serde(rename = "Larger font")]
    LargerFont,
    Bold,
    Centered,
    Uppercase,
    #[serde(rename = "Title Case")]
    TitleCase,
    #[serde(rename = "Short & Prominent")]
    ShortProminent,
}

impl fmt::Display for HeadingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadingReason::LargerFont => write!(f, "Larger font"),
            HeadingReason::Bold => write!(f, "Bold"),
            HeadingReason::Centered => write!(f, "Centered"),
            HeadingReason::Uppercase => write!(f, "Uppercase"),
            HeadingReason::TitleCase => write!(f, "Title Case"),
            HeadingReason::ShortProminent => write!(f, "Short & Prominent"),
        }
    }
}

/// A line that triggered at least one heading heuristic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadingCandidate {
    pub line: Line,
    pub reasons: Vec<HeadingReason>,
}

impl HeadingCandidate {
    pub fn text(&self) -> &str {
        &self.line.text
    }

    pub fn page_index(&self) -> usize {
        self.line.page_index
    }

    /// Vertical position of the candidate: the row origin of its
    /// representative fragment.
    pub fn y(&self) -> f32 {
        self.line.fragment.origin_y()
    }
}

/// A heading candidate after ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: HeadingCandidate,
    pub score: f32,
}

/// Content range owned by a ranked heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub score: f32,
    pub content: String,
    /// 1-based page the heading sits on.
    pub page_number: usize,
}
