//! Median-cut colour quantization for RGBA rasters.
//!
//! Opaque colours are histogrammed (every `quality`-th pixel), then the colour box with the
//! widest channel range is split at its population median until the colour budget is spent.
//! Each box contributes its population-weighted mean. Pixels below the alpha threshold map to
//! a reserved transparent entry placed after the colour entries.

use std::collections::HashMap;

use image::RgbaImage;

use crate::foundation::core::Rgb8;
use crate::foundation::error::{StampError, StampResult};
use crate::foundation::math::dist_sq;

/// Hard cap on colour table entries, transparent slot included.
pub const MAX_PALETTE: usize = 256;

/// Quantizer knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantizeOpts {
    /// Palette budget including the transparent slot, `2..=256`.
    pub max_colors: usize,
    /// Histogram sampling stride, `1..=30`. 1 samples every pixel; larger is faster and coarser.
    pub quality: u8,
    /// Pixels with alpha below this are transparent.
    pub alpha_threshold: u8,
}

impl Default for QuantizeOpts {
    fn default() -> Self {
        Self {
            max_colors: MAX_PALETTE,
            quality: 1,
            alpha_threshold: 128,
        }
    }
}

impl QuantizeOpts {
    /// Check option ranges.
    pub fn validate(&self) -> StampResult<()> {
        if !(2..=MAX_PALETTE).contains(&self.max_colors) {
            return Err(StampError::validation("max_colors must be within 2..=256"));
        }
        if !(1..=30).contains(&self.quality) {
            return Err(StampError::validation("quality must be within 1..=30"));
        }
        Ok(())
    }
}

/// Indexed raster plus the colour table it refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantizedFrame {
    /// Row-major palette indices.
    pub indices: Vec<u8>,
    /// Colour table (at most 256 entries, transparent slot included).
    pub palette: Vec<Rgb8>,
    /// Index reserved for transparent pixels, if any.
    pub transparent_index: Option<u8>,
}

/// A colour table that can map rasters onto itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb8>,
    transparent_index: Option<u8>,
    alpha_threshold: u8,
}

impl Palette {
    /// Build a palette for `image`. With `reserve_transparent` a transparent slot is kept even
    /// when `image` itself is fully opaque, so later frames can be mapped onto the same table.
    pub fn build(image: &RgbaImage, opts: &QuantizeOpts, reserve_transparent: bool) -> Self {
        let threshold = opts.alpha_threshold;
        let has_transparent = image.pixels().any(|p| p.0[3] < threshold);
        let reserve = reserve_transparent || has_transparent;
        let budget = opts.max_colors.clamp(2, MAX_PALETTE) - usize::from(reserve);

        let mut hist = histogram(image, threshold, usize::from(opts.quality.max(1)));
        if hist.is_empty() {
            hist = histogram(image, threshold, 1);
        }

        let mut colors = if hist.len() <= budget {
            hist.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            hist.into_iter().map(|(c, _)| c).collect()
        } else {
            median_cut(hist, budget)
        };
        if colors.is_empty() {
            colors.push([0, 0, 0]);
        }

        let transparent_index = reserve.then(|| {
            let idx = colors.len() as u8;
            colors.push([0, 0, 0]);
            idx
        });

        Self {
            colors,
            transparent_index,
            alpha_threshold: threshold,
        }
    }

    /// Colour table entries, transparent slot included.
    pub fn colors(&self) -> &[Rgb8] {
        &self.colors
    }

    /// Index reserved for transparent pixels.
    pub fn transparent_index(&self) -> Option<u8> {
        self.transparent_index
    }

    /// Map every pixel to its nearest palette entry.
    ///
    /// Transparent pixels map to the transparent slot; without one they fall back to the
    /// nearest colour.
    pub fn map(&self, image: &RgbaImage) -> Vec<u8> {
        let opaque_len = self.colors.len() - usize::from(self.transparent_index.is_some());
        let opaque = &self.colors[..opaque_len];
        let mut cache: HashMap<Rgb8, u8> = HashMap::new();

        image
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                if a < self.alpha_threshold
                    && let Some(t) = self.transparent_index
                {
                    return t;
                }
                let c = [r, g, b];
                *cache.entry(c).or_insert_with(|| nearest(opaque, c))
            })
            .collect()
    }

    /// Package the palette and a mapped raster as a frame.
    pub fn quantized(&self, image: &RgbaImage) -> QuantizedFrame {
        QuantizedFrame {
            indices: self.map(image),
            palette: self.colors.clone(),
            transparent_index: self.transparent_index,
        }
    }
}

/// Build a per-frame palette for `image` and map it.
pub fn quantize(image: &RgbaImage, opts: &QuantizeOpts) -> QuantizedFrame {
    Palette::build(image, opts, false).quantized(image)
}

fn histogram(image: &RgbaImage, threshold: u8, stride: usize) -> Vec<(Rgb8, u32)> {
    let mut counts: HashMap<Rgb8, u32> = HashMap::new();
    for p in image.pixels().step_by(stride) {
        let [r, g, b, a] = p.0;
        if a >= threshold {
            *counts.entry([r, g, b]).or_insert(0) += 1;
        }
    }
    let mut out: Vec<_> = counts.into_iter().collect();
    out.sort_unstable_by_key(|&(c, _)| c);
    out
}

fn nearest(colors: &[Rgb8], c: Rgb8) -> u8 {
    let mut best = 0usize;
    let mut best_d = u32::MAX;
    for (i, &p) in colors.iter().enumerate() {
        let d = dist_sq(p, c);
        if d < best_d {
            best = i;
            best_d = d;
            if d == 0 {
                break;
            }
        }
    }
    best as u8
}

struct ColorBox {
    entries: Vec<(Rgb8, u32)>,
}

impl ColorBox {
    fn widest_channel(&self) -> (usize, u8) {
        let mut lo = [u8::MAX; 3];
        let mut hi = [0u8; 3];
        for (c, _) in &self.entries {
            for ch in 0..3 {
                lo[ch] = lo[ch].min(c[ch]);
                hi[ch] = hi[ch].max(c[ch]);
            }
        }
        (0..3)
            .map(|ch| (ch, hi[ch] - lo[ch]))
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .unwrap_or((0, 0))
    }

    fn population(&self) -> u64 {
        self.entries.iter().map(|&(_, n)| u64::from(n)).sum()
    }

    fn split(mut self) -> (ColorBox, ColorBox) {
        let (ch, _) = self.widest_channel();
        self.entries.sort_unstable_by_key(|&(c, _)| (c[ch], c));
        let half = self.population().div_ceil(2);
        let mut acc = 0u64;
        let mut cut = 1;
        for (i, &(_, n)) in self.entries.iter().enumerate() {
            acc += u64::from(n);
            if acc >= half {
                cut = i + 1;
                break;
            }
        }
        let cut = cut.clamp(1, self.entries.len() - 1);
        let upper = self.entries.split_off(cut);
        (self, ColorBox { entries: upper })
    }

    fn mean(&self) -> Rgb8 {
        let total = self.population().max(1);
        let mut sum = [0u64; 3];
        for &(c, n) in &self.entries {
            for ch in 0..3 {
                sum[ch] += u64::from(c[ch]) * u64::from(n);
            }
        }
        sum.map(|s| ((s + total / 2) / total) as u8)
    }
}

fn median_cut(hist: Vec<(Rgb8, u32)>, budget: usize) -> Vec<Rgb8> {
    let mut boxes = vec![ColorBox { entries: hist }];
    while boxes.len() < budget {
        let pick = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.entries.len() > 1)
            .max_by(|(ia, a), (ib, b)| {
                let (ra, rb) = (a.widest_channel().1, b.widest_channel().1);
                ra.cmp(&rb)
                    .then(a.population().cmp(&b.population()))
                    .then(ib.cmp(ia))
            })
            .map(|(i, _)| i);
        let Some(i) = pick else {
            break;
        };
        let (lo, hi) = boxes.swap_remove(i).split();
        boxes.push(lo);
        boxes.push(hi);
    }
    boxes.iter().map(ColorBox::mean).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/quantize/median_cut.rs"]
mod tests;
