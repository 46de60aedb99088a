//! Word cloud rendering.
//!
//! Words are weighted by frequency (stopwords removed), sized linearly between
//! `MIN_FONT_PX` and `MAX_FONT_PX`, and placed heaviest-first along an
//! Archimedean spiral from the canvas centre. A word that cannot be placed is
//! shrunk, then dropped. Layout is deterministic for a given text.
//!
//! Output is an SVG with an explicit 400x400 canvas and a white background.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use crate::analysis::keywords::word_frequencies;

pub const CANVAS_PX: f32 = 400.0;
const MAX_WORDS: usize = 200;
const MAX_FONT_PX: f32 = 64.0;
const MIN_FONT_PX: f32 = 10.0;
const SHRINK: f32 = 0.8;
/// Average glyph advance as a fraction of font size.
const GLYPH_ASPECT: f32 = 0.6;
const PADDING_PX: f32 = 2.0;
const SPIRAL_STEP: f32 = 0.1;
const SPIRAL_GROWTH: f32 = 2.0;

// viridis
const PALETTE: &[&str] = &[
    "#440154", "#482878", "#3e4989", "#31688e", "#26828e", "#1f9e89", "#35b779", "#6ece58",
    "#b5de2b", "#fde725",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedWord {
    pub text: String,
    pub font_px: f32,
    /// Centre of the word's bounding box.
    pub x: f32,
    pub y: f32,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl Rect {
    fn centered(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            left: x - width / 2.0,
            top: y - height / 2.0,
            right: x + width / 2.0,
            bottom: y + height / 2.0,
        }
    }

    fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    fn inside(&self, width: f32, height: f32) -> bool {
        self.left >= 0.0 && self.top >= 0.0 && self.right <= width && self.bottom <= height
    }
}

fn word_box(text: &str, font_px: f32, x: f32, y: f32) -> Rect {
    let width = text.chars().count() as f32 * font_px * GLYPH_ASPECT + PADDING_PX;
    let height = font_px + PADDING_PX;
    Rect::centered(x, y, width, height)
}

/// Places up to `MAX_WORDS` words on a `width` x `height` canvas.
pub fn layout(frequencies: &[(String, usize)], width: f32, height: f32) -> Vec<PlacedWord> {
    let Some(max_count) = frequencies.iter().map(|(_, c)| *c).max() else {
        return Vec::new();
    };

    let mut placed: Vec<PlacedWord> = Vec::new();
    let mut boxes: Vec<Rect> = Vec::new();

    for (rank, (text, count)) in frequencies.iter().take(MAX_WORDS).enumerate() {
        let relative = *count as f32 / max_count as f32;
        let mut font_px = MIN_FONT_PX + (MAX_FONT_PX - MIN_FONT_PX) * relative;

        // Never wider than the canvas.
        let max_fit = (width - PADDING_PX) / (text.chars().count() as f32 * GLYPH_ASPECT);
        font_px = font_px.min(max_fit);
        if font_px < MIN_FONT_PX {
            continue;
        }

        loop {
            if let Some((x, y)) = find_spot(text, font_px, &boxes, width, height) {
                boxes.push(word_box(text, font_px, x, y));
                placed.push(PlacedWord {
                    text: text.clone(),
                    font_px,
                    x,
                    y,
                    color: PALETTE[rank % PALETTE.len()],
                });
                break;
            }
            font_px *= SHRINK;
            if font_px < MIN_FONT_PX {
                break;
            }
        }
    }

    placed
}

fn find_spot(
    text: &str,
    font_px: f32,
    taken: &[Rect],
    width: f32,
    height: f32,
) -> Option<(f32, f32)> {
    let (cx, cy) = (width / 2.0, height / 2.0);
    let max_radius = (width * width + height * height).sqrt() / 2.0;
    let mut theta = 0.0_f32;

    loop {
        let radius = SPIRAL_GROWTH * theta;
        if radius > max_radius {
            return None;
        }
        let x = cx + radius * theta.cos();
        let y = cy + radius * theta.sin();
        let candidate = word_box(text, font_px, x, y);
        if candidate.inside(width, height) && !taken.iter().any(|r| r.intersects(&candidate)) {
            return Some((x, y));
        }
        theta += SPIRAL_STEP;
    }
}

/// Renders a word cloud for `text`, or `None` if it has no countable words.
pub fn render_svg(text: &str) -> Option<String> {
    let frequencies = word_frequencies(text);
    let words = layout(&frequencies, CANVAS_PX, CANVAS_PX);
    if words.is_empty() {
        return None;
    }

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="white"/>"#,
        w = CANVAS_PX,
        h = CANVAS_PX
    );
    for word in &words {
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="{:.1}" fill="{}" font-family="sans-serif" text-anchor="middle" dominant-baseline="central">{}</text>"#,
            word.x,
            word.y,
            word.font_px,
            word.color,
            escape_xml(&word.text)
        ));
    }
    svg.push_str("</svg>");
    Some(svg)
}

/// Embeds an SVG document as an `<img src>`-ready data URI.
pub fn svg_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
