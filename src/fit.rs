//! Dynamic font fitting: wrap text into a rectangle and pick the largest size
//! that fits both dimensions.
//!
//! Wrapping is computed once at [`BASELINE_FONT_SIZE`] and the chosen size is
//! applied to those lines as-is. A size that would allow a different, tighter
//! wrap is not explored, so extreme aspect ratios can come out slightly
//! under- or over-sized.

use serde::Serialize;

use crate::fonts::{FontFamily, FontSpec, TextMetrics};

pub const BASELINE_FONT_SIZE: f64 = 12.0;
/// Line pitch as a multiple of the font size.
pub const LINE_HEIGHT_RATIO: f64 = 1.18;
pub const MIN_FONT_SIZE: f64 = 1.0;
pub const MAX_FONT_SIZE: f64 = 256.0;
const SINGLE_LINE_HEIGHT_CAP: f64 = 0.92;
const MULTI_LINE_HEIGHT_CAP: f64 = 0.88;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
}

/// Semantic class of a text element, derived from its label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRole {
    Title,
    SectionHeader,
    Caption,
    Body,
}

impl TextRole {
    pub fn from_label(label: Option<&str>) -> TextRole {
        let Some(label) = label else {
            return TextRole::Body;
        };
        let key: String = label
            .trim()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c.to_ascii_lowercase() })
            .collect();
        match key.as_str() {
            "title" | "document_title" => TextRole::Title,
            "section_header" | "heading" => TextRole::SectionHeader,
            "footnote" | "caption" => TextRole::Caption,
            _ => TextRole::Body,
        }
    }

    pub fn style(self) -> TextStyle {
        let (family, bold, italic, alignment, semantic_scale) = match self {
            TextRole::Title => (FontFamily::Sans, true, false, Alignment::Center, 1.0),
            TextRole::SectionHeader => (FontFamily::Sans, true, false, Alignment::Left, 0.95),
            TextRole::Caption => (FontFamily::Sans, false, true, Alignment::Left, 0.85),
            TextRole::Body => (FontFamily::Serif, false, false, Alignment::Left, 0.92),
        };
        TextStyle {
            font: FontSpec {
                family,
                bold,
                italic,
                size: BASELINE_FONT_SIZE,
            },
            alignment,
            semantic_scale,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TextStyle {
    /// Font at the baseline size.
    pub font: FontSpec,
    pub alignment: Alignment,
    /// Multiplier applied to the height-bound size.
    pub semantic_scale: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FittedText {
    pub lines: Vec<String>,
    pub font: FontSpec,
    pub line_height: f64,
    pub alignment: Alignment,
    pub role: TextRole,
}

impl FittedText {
    pub fn font_size(&self) -> f64 {
        self.font.size
    }
}

/// Split a word wider than `max_width` into chunks that fit, at least one
/// character each.
fn split_word(metrics: &dyn TextMetrics, word: &str, font: &FontSpec, max_width: f64) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if current.chars().count() > 1 && metrics.measure(&current, font) > max_width {
            current.pop();
            chunks.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Greedy word wrap at `max_width`. Explicit newlines start a new line.
pub fn wrap_text(metrics: &dyn TextMetrics, text: &str, font: &FontSpec, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if metrics.measure(&candidate, font) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if metrics.measure(word, font) <= max_width {
                current = word.to_string();
            } else {
                let mut chunks = split_word(metrics, word, font, max_width);
                current = chunks.pop().unwrap_or_default();
                lines.extend(chunks);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Wrap `text` into a `width` x `height` box and choose its font size.
///
/// Degenerate boxes and blank text get [`MIN_FONT_SIZE`] and the text
/// unwrapped on a single line.
pub fn fit_text(
    metrics: &dyn TextMetrics,
    width: f64,
    height: f64,
    text: &str,
    label: Option<&str>,
) -> FittedText {
    let role = TextRole::from_label(label);
    let style = role.style();

    let degenerate = !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0;
    let lines = if degenerate {
        Vec::new()
    } else {
        wrap_text(metrics, text, &style.font, width)
    };
    if lines.is_empty() {
        let font = style.font.with_size(MIN_FONT_SIZE);
        return FittedText {
            lines: vec![text.to_string()],
            font,
            line_height: MIN_FONT_SIZE * LINE_HEIGHT_RATIO,
            alignment: style.alignment,
            role,
        };
    }

    let widest = lines
        .iter()
        .map(|l| metrics.measure(l, &style.font))
        .fold(0.0f64, f64::max);
    let line_count = lines.len() as f64;

    let max_by_height = height / (line_count * LINE_HEIGHT_RATIO) * style.semantic_scale;
    let max_by_width = if widest > 0.0 {
        width * BASELINE_FONT_SIZE / widest
    } else {
        MAX_FONT_SIZE
    };
    let cap_ratio = if lines.len() == 1 {
        SINGLE_LINE_HEIGHT_CAP
    } else {
        MULTI_LINE_HEIGHT_CAP
    };
    let cap = cap_ratio * height;

    let size = max_by_height
        .min(max_by_width)
        .min(cap)
        .clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);

    FittedText {
        lines,
        font: style.font.with_size(size),
        line_height: size * LINE_HEIGHT_RATIO,
        alignment: style.alignment,
        role,
    }
}
