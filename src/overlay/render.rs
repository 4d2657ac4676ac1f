use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::composite::canvas::CompositedFrame;
use crate::foundation::core::{Rect, Rgba8};
use crate::overlay::layout::{BACKGROUND, DIVIDER_COLOR, Geometry, PlacedLine, place_text};
use crate::overlay::payload::{OverlayPayload, SignatureVariant};
use crate::overlay::text::draw_line;

/// Paints the signature around each composited source frame.
///
/// Layout, wrapped text and the scaled QR raster are computed once in [`OverlayRenderer::new`];
/// [`OverlayRenderer::render`] is then a pure function of the frame.
#[derive(Clone, Debug)]
pub struct OverlayRenderer {
    geometry: Geometry,
    lines: Vec<PlacedLine>,
    qr: Option<(Rect, RgbaImage)>,
}

impl OverlayRenderer {
    /// Prepare the overlay for `payload`.
    pub fn new(payload: &OverlayPayload, variant: SignatureVariant) -> Self {
        let geometry = Geometry::new(payload.output, payload.qr.is_some());
        let lines = place_text(&geometry, payload, variant);
        let qr = geometry.qr.zip(payload.qr.as_ref()).map(|(rect, src)| {
            let scaled = imageops::resize(src, rect.width, rect.height, FilterType::Nearest);
            (rect, scaled)
        });
        Self {
            geometry,
            lines,
            qr,
        }
    }

    /// Box geometry in use.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Wrapped text lines in drawing order.
    pub fn lines(&self) -> &[PlacedLine] {
        &self.lines
    }

    /// Render one output raster: background, logo, divider, QR, text.
    pub fn render(&self, frame: &CompositedFrame) -> RgbaImage {
        let size = self.geometry.output;
        let mut out = RgbaImage::from_pixel(size.width, size.height, image::Rgba(BACKGROUND));

        if let Some((rect, logo)) = fit_logo(&frame.image, self.geometry.logo_box) {
            imageops::overlay(&mut out, &logo, i64::from(rect.left), i64::from(rect.top));
        }

        fill_rect(&mut out, self.geometry.divider, DIVIDER_COLOR);

        if let Some((rect, qr)) = &self.qr {
            if let Some(backing) = self.geometry.qr_backing() {
                fill_rect(&mut out, backing, BACKGROUND);
            }
            imageops::overlay(&mut out, qr, i64::from(rect.left), i64::from(rect.top));
        }

        for line in &self.lines {
            draw_line(
                &mut out,
                i64::from(line.x),
                i64::from(line.y),
                &line.text,
                &line.style,
            );
        }
        out
    }
}

/// Scale `src` to fit `bounds` preserving aspect ratio, never enlarging, centred.
///
/// Returns `None` when nothing would be visible.
pub fn fit_logo(src: &RgbaImage, bounds: Rect) -> Option<(Rect, RgbaImage)> {
    let rect = fit_rect(src.width(), src.height(), bounds)?;
    let scaled = if (rect.width, rect.height) == src.dimensions() {
        src.clone()
    } else {
        imageops::resize(src, rect.width, rect.height, FilterType::Nearest)
    };
    Some((rect, scaled))
}

/// Destination rectangle for a `w`x`h` image contained in `bounds` with scale `min(1, fit)`.
pub fn fit_rect(w: u32, h: u32, bounds: Rect) -> Option<Rect> {
    if w == 0 || h == 0 || bounds.is_empty() {
        return None;
    }
    let (bw, bh) = (f64::from(bounds.width), f64::from(bounds.height));
    let scale = (bw / f64::from(w)).min(bh / f64::from(h)).min(1.0);
    let dw = (f64::from(w) * scale).round() as u32;
    let dh = (f64::from(h) * scale).round() as u32;
    if dw == 0 || dh == 0 {
        return None;
    }
    let dx = (f64::from(bounds.left) + (bw - f64::from(dw)) / 2.0).round() as u32;
    let dy = (f64::from(bounds.top) + (bh - f64::from(dh)) / 2.0).round() as u32;
    Some(Rect::new(dx, dy, dw, dh))
}

fn fill_rect(img: &mut RgbaImage, rect: Rect, color: Rgba8) {
    let right = rect.right().min(img.width());
    let bottom = rect.bottom().min(img.height());
    for y in rect.top..bottom {
        for x in rect.left..right {
            img.put_pixel(x, y, image::Rgba(color));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/render.rs"]
mod tests;
