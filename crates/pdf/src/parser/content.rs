//! Content-stream walking: PDF text operators to positioned fragments.
//!
//! A simplified text-rendering state machine tracks the text matrix, font
//! and spacing parameters while walking a page's operations, and emits one
//! [`TextFragment`] per shown string. Glyph widths are approximated from the
//! font size. Coordinates are flipped to a top-down system whose origin is
//! the top-left corner of the page's MediaBox.

use doclayout_core::{BBox, StyleFlags, TextFragment};

use super::backend::{
    get_number_from_value, BackendFontInfo, PageBox, PageId, PdfBackend, PdfValue,
};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Approximate character width as a fraction of font size when no better
/// metric is available.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Fraction of a character width a `TJ` kerning gap must exceed to count
/// as a word break.
const WORD_GAP_RATIO: f32 = 0.3;

/// The identity 2x3 text matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Font naming
// ---------------------------------------------------------------------------

/// Drop the six-letter subset tag (`ABCDEF+Helvetica` -> `Helvetica`).
pub fn strip_subset_prefix(base_font: &str) -> &str {
    match base_font.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => base_font,
    }
}

/// Style flags implied by a base-font name.
pub fn font_flags(base_font: &str) -> StyleFlags {
    let lower = base_font.to_lowercase();
    let mut flags = StyleFlags::empty();

    if ["bold", "black", "heavy", "semibold", "demi"]
        .iter()
        .any(|w| lower.contains(w))
    {
        flags |= StyleFlags::BOLD;
    }
    if lower.contains("italic") || lower.contains("oblique") {
        flags |= StyleFlags::ITALIC;
    }
    if lower.contains("courier") || lower.contains("mono") {
        flags |= StyleFlags::MONOSPACE;
    }
    if (lower.contains("times") || lower.contains("serif") || lower.contains("georgia"))
        && !lower.contains("sans")
    {
        flags |= StyleFlags::SERIF;
    }

    flags
}

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

/// Mutable state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
struct TextState {
    /// Current font resource key (`/F1`), not the base-font name.
    font_key: Vec<u8>,
    font_name: String,
    font_flags: StyleFlags,
    font_size: f32,
    text_matrix: [f32; 6],
    /// Set by BT and updated by Td/TD/T*/Tm.
    line_matrix: [f32; 6],
    /// Horizontal scaling (percent / 100).
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font_flags: StyleFlags::empty(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    /// Baseline Y of the text row in user space, ignoring rise.
    fn row_baseline(&self) -> f32 {
        self.text_matrix[5]
    }

    /// Rendered size: `font_size * sqrt(b^2 + d^2)` of the text matrix.
    fn effective_font_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    fn char_width(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    fn estimate_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.char_width() * self.text_matrix[0].abs()
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Advance past `text` as if it had been painted.
    fn advance_after_show(&mut self, text: &str) {
        let dx: f32 = text
            .chars()
            .map(|ch| {
                let spacing = if ch == ' ' { self.word_spacing } else { 0.0 };
                self.char_width() + self.char_spacing + spacing
            })
            .sum();
        self.advance_x(dx);
    }

    /// Multiply the line matrix by a translation (Td / TD / T*).
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    fn set_font(&mut self, key: Vec<u8>, base_font: &str, size: f32) {
        let name = strip_subset_prefix(base_font);
        self.font_key = key;
        self.font_size = size;
        self.font_flags = font_flags(name);
        self.font_name = name.to_string();
    }
}

/// Everything needed to turn a shown string into a fragment.
struct PageContext<'a> {
    backend: &'a dyn PdfBackend,
    page_id: PageId,
    page_index: usize,
    page_box: PageBox,
}

impl PageContext<'_> {
    fn decode(&self, val: &PdfValue, font_key: &[u8]) -> String {
        match val {
            PdfValue::Str(bytes) => self.backend.decode_text(self.page_id, font_key, bytes),
            _ => String::new(),
        }
    }

    /// Build a fragment in top-down page coordinates. `row` is the user-space
    /// row baseline; the glyph box also moves with text rise.
    fn fragment(&self, text: String, x: f32, row: f32, state: &TextState) -> TextFragment {
        let size = state.effective_font_size();
        let x0 = x - self.page_box.x0;
        let baseline = self.page_box.top() - row;
        let bottom = baseline - state.text_rise;
        let mut flags = state.font_flags;
        if state.text_rise > 0.0 {
            flags |= StyleFlags::SUPERSCRIPT;
        }

        TextFragment {
            bbox: BBox::new(x0, bottom - size, x0 + state.estimate_width(&text), bottom),
            baseline: Some(baseline),
            text,
            font_name: state.font_name.clone(),
            font_size: size,
            flags,
            page_index: self.page_index,
            page_width: self.page_box.width,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Walk a single page's content stream and produce its fragments in stream
/// order.
///
/// Handled operators:
///
/// | Operator | Action |
/// |----------|--------|
/// | `BT`     | Begin text object, reset matrices |
/// | `Tf`     | Set font and size |
/// | `Tm`     | Set text matrix directly |
/// | `Td`     | Translate text position |
/// | `TD`     | Translate and set leading |
/// | `T*`     | Move to start of next line |
/// | `TL` `Tc` `Tw` `Tz` `Ts` | Leading, spacing, scaling, rise |
/// | `Tj`     | Show a string |
/// | `TJ`     | Show strings with kerning adjustments |
/// | `'`      | Move to next line and show string |
/// | `"`      | Set spacing, move to next line and show string |
pub fn extract_page_fragments(
    backend: &dyn PdfBackend,
    page_id: PageId,
    page_index: usize,
) -> Result<Vec<TextFragment>, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_default();
    let ctx = PageContext {
        backend,
        page_id,
        page_index,
        page_box: backend.page_box(page_id)?,
    };

    let mut state = TextState::default();
    let mut fragments: Vec<TextFragment> = Vec::new();

    for op in &ops {
        let number = |i: usize| op.operands.get(i).and_then(get_number_from_value);

        match op.operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => handle_tf(&op.operands, &fonts, &mut state),
            "Tm" => handle_tm(&op.operands, &mut state),
            "Td" => {
                if let (Some(tx), Some(ty)) = (number(0), number(1)) {
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (number(0), number(1)) {
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.translate_line(0.0, -state.leading),
            "TL" => state.leading = number(0).unwrap_or(state.leading),
            "Tc" => state.char_spacing = number(0).unwrap_or(state.char_spacing),
            "Tw" => state.word_spacing = number(0).unwrap_or(state.word_spacing),
            "Tz" => {
                if let Some(v) = number(0) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => state.text_rise = number(0).unwrap_or(state.text_rise),
            "Tj" => {
                if let Some(first) = op.operands.first() {
                    show_string(first, &ctx, &mut state, &mut fragments);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = op.operands.first() {
                    show_tj_array(arr, &ctx, &mut state, &mut fragments);
                }
            }
            "'" => {
                state.translate_line(0.0, -state.leading);
                if let Some(first) = op.operands.first() {
                    show_string(first, &ctx, &mut state, &mut fragments);
                }
            }
            "\"" => {
                if op.operands.len() >= 3 {
                    state.word_spacing = number(0).unwrap_or(state.word_spacing);
                    state.char_spacing = number(1).unwrap_or(state.char_spacing);
                    state.translate_line(0.0, -state.leading);
                    show_string(&op.operands[2], &ctx, &mut state, &mut fragments);
                }
            }
            // ET keeps the font: some producers rely on it across text objects.
            _ => {}
        }
    }

    log::trace!(
        "page {}: {} operations, {} fragments",
        page_index,
        ops.len(),
        fragments.len()
    );
    Ok(fragments)
}

fn handle_tf(operands: &[PdfValue], fonts: &[BackendFontInfo], state: &mut TextState) {
    let (Some(key), Some(size)) = (operands.first(), operands.get(1)) else {
        return;
    };
    let key = match key {
        PdfValue::Name(n) | PdfValue::Str(n) => n.clone(),
        _ => return,
    };
    let size = get_number_from_value(size).unwrap_or(0.0);

    let base = fonts
        .iter()
        .find(|info| info.name == key)
        .and_then(|info| info.base_font.clone())
        .unwrap_or_else(|| String::from_utf8_lossy(&key).into_owned());
    state.set_font(key, &base, size);
}

fn handle_tm(operands: &[PdfValue], state: &mut TextState) {
    let vals: Vec<f32> = operands
        .iter()
        .take(6)
        .filter_map(get_number_from_value)
        .collect();
    if let &[a, b, c, d, e, f] = vals.as_slice() {
        state.text_matrix = [a, b, c, d, e, f];
        state.line_matrix = state.text_matrix;
    }
}

/// Shared by `Tj`, `'` and `"`.
fn show_string(
    operand: &PdfValue,
    ctx: &PageContext<'_>,
    state: &mut TextState,
    fragments: &mut Vec<TextFragment>,
) {
    let text = ctx.decode(operand, &state.font_key);
    if text.is_empty() {
        return;
    }
    let fragment = ctx.fragment(text.clone(), state.x(), state.row_baseline(), state);
    fragments.push(fragment);
    state.advance_after_show(&text);
}

/// A `TJ` array mixes strings with kerning adjustments in thousandths of a
/// text-space unit. The whole array becomes one fragment; large negative
/// adjustments read as spaces.
fn show_tj_array(
    arr: &[PdfValue],
    ctx: &PageContext<'_>,
    state: &mut TextState,
    fragments: &mut Vec<TextFragment>,
) {
    let mut buf = String::new();
    let mut start_x = state.x();
    let row = state.row_baseline();

    for elem in arr {
        if let PdfValue::Str(_) = elem {
            let piece = ctx.decode(elem, &state.font_key);
            if buf.is_empty() {
                start_x = state.x();
            }
            buf.push_str(&piece);
            state.advance_after_show(&piece);
        } else if let Some(adj) = get_number_from_value(elem) {
            let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
            if dx > state.char_width() * WORD_GAP_RATIO && !buf.is_empty() && !buf.ends_with(' ')
            {
                buf.push(' ');
            }
            state.advance_x(dx);
        }
    }

    let text = buf.trim_end();
    if !text.is_empty() {
        fragments.push(ctx.fragment(text.to_string(), start_x, row, state));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
