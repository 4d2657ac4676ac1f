//! Bitmap text: measurement, greedy word wrap and drawing.
//!
//! Glyphs come from the 8x8 `font8x8` tables and are scaled by nearest-neighbour sampling to a
//! square cell of `size` pixels. Bold text is drawn twice, one pixel apart. Measuring and
//! drawing share [`TextStyle::measure`], so wrapped lines never exceed the width they were
//! wrapped to.

use font8x8::UnicodeFonts;
use image::RgbaImage;

use crate::foundation::core::Rgba8;
use crate::foundation::math::over_straight;

/// Font parameters for one text field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextStyle {
    /// Glyph cell size in pixels (height and advance).
    pub size: u32,
    /// Draw with a one-pixel horizontal double strike.
    pub bold: bool,
    /// Straight-alpha fill colour.
    pub color: Rgba8,
    /// Vertical advance between wrapped lines.
    pub line_height: u32,
}

impl TextStyle {
    /// Width of `text` in pixels when drawn in this style.
    pub fn measure(&self, text: &str) -> u32 {
        let n = text.chars().count() as u32;
        if n == 0 {
            return 0;
        }
        n * self.size + u32::from(self.bold)
    }
}

/// Split `text` into lines no wider than `max_width` according to `measure`.
///
/// Words are separated by any whitespace and are never split: a word wider than `max_width`
/// occupies a line of its own.
pub fn wrap_words(text: &str, max_width: u32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_owned()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn glyph(c: char) -> [u8; 8] {
    font8x8::BASIC_FONTS
        .get(c)
        .or_else(|| font8x8::LATIN_FONTS.get(c))
        .or_else(|| font8x8::BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Draw one line of text with its top-left corner at `(x, y)`. Pixels outside `img` are clipped.
pub fn draw_line(img: &mut RgbaImage, x: i64, y: i64, text: &str, style: &TextStyle) {
    let size = i64::from(style.size.max(1));
    let strikes: &[i64] = if style.bold { &[0, 1] } else { &[0] };
    for (i, c) in text.chars().enumerate() {
        let rows = glyph(c);
        let cell_x = x + i as i64 * size;
        for dy in 0..size {
            let bits = rows[(dy * 8 / size) as usize];
            if bits == 0 {
                continue;
            }
            for dx in 0..size {
                if bits & (1 << (dx * 8 / size)) == 0 {
                    continue;
                }
                for &s in strikes {
                    blend_at(img, cell_x + dx + s, y + dy, style.color);
                }
            }
        }
    }
}

fn blend_at(img: &mut RgbaImage, x: i64, y: i64, color: Rgba8) {
    let (w, h) = img.dimensions();
    if x < 0 || y < 0 || x >= i64::from(w) || y >= i64::from(h) {
        return;
    }
    let px = img.get_pixel_mut(x as u32, y as u32);
    px.0 = over_straight(px.0, color);
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/text.rs"]
mod tests;
