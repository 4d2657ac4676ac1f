use image::RgbaImage;

use crate::decode::decoder::{GifHeader, SourceFrame};
use crate::foundation::core::{DisposalMethod, Rect, Rgb8, Rgba8, Size, TRANSPARENT};
use crate::foundation::error::{FormatError, StampResult};

/// Colour painted for an index past the end of the colour table.
const OUT_OF_TABLE: Rgba8 = [0, 0, 0, 255];

/// Snapshot of the canvas after one source frame has been painted.
///
/// Owned by whoever receives it; mutating it never touches the compositor's canvas.
#[derive(Clone, Debug)]
pub struct CompositedFrame {
    /// 0-based source frame index.
    pub index: usize,
    /// Full logical-screen raster, straight-alpha RGBA8.
    pub image: RgbaImage,
    /// Display time carried over from the source frame.
    pub delay_cs: u16,
}

#[derive(Debug)]
struct PendingDisposal {
    rect: Rect,
    method: DisposalMethod,
    saved: Option<Vec<u8>>,
}

/// Persistent logical-screen canvas driven by per-frame disposal codes.
///
/// The only transition is [`Compositor::apply`]: it first settles the disposal declared by the
/// previous frame, then paints the new frame and returns a copy of the result. History for
/// `RestorePrevious` is a single saved rectangle.
#[derive(Debug)]
pub struct Compositor {
    canvas: RgbaImage,
    background: Rgba8,
    global_palette: Option<Vec<Rgb8>>,
    pending: Option<PendingDisposal>,
}

impl Compositor {
    /// Create a compositor whose canvas starts filled with `background`.
    pub fn new(screen: Size, global_palette: Option<Vec<Rgb8>>, background: Rgba8) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(screen.width, screen.height, image::Rgba(background)),
            background,
            global_palette,
            pending: None,
        }
    }

    /// Compositor for a decoded stream. The background is fully transparent, which is how
    /// browsers treat GIF "restore to background".
    pub fn for_stream(header: &GifHeader) -> Self {
        Self::new(header.screen, header.global_palette.clone(), TRANSPARENT)
    }

    /// Current canvas contents.
    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Settle the previous frame's disposal, paint `frame`, and snapshot the canvas.
    pub fn apply(&mut self, frame: &SourceFrame) -> StampResult<CompositedFrame> {
        let rect = frame.info.rect;
        let screen = Size {
            width: self.canvas.width(),
            height: self.canvas.height(),
        };
        if !rect.fits_within(screen) {
            return Err(FormatError::FrameOutOfBounds {
                frame: frame.info.index,
                left: rect.left as u16,
                top: rect.top as u16,
                width: rect.width as u16,
                height: rect.height as u16,
                screen_width: screen.width as u16,
                screen_height: screen.height as u16,
            }
            .into());
        }

        let indices = frame.decode_indices()?;
        self.dispose_previous();

        let palette = frame.palette(self.global_palette.as_deref())?;
        let saved = (frame.info.disposal == DisposalMethod::RestorePrevious)
            .then(|| copy_rect(&self.canvas, rect));
        paint_indices(
            &mut self.canvas,
            rect,
            &indices,
            palette,
            frame.info.transparent_index,
        );
        self.pending = Some(PendingDisposal {
            rect,
            method: frame.info.disposal,
            saved,
        });

        Ok(CompositedFrame {
            index: frame.info.index,
            image: self.canvas.clone(),
            delay_cs: frame.info.delay_cs,
        })
    }

    fn dispose_previous(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        match pending.method {
            DisposalMethod::None | DisposalMethod::DoNotDispose => {}
            DisposalMethod::RestoreBackground => {
                fill_rect(&mut self.canvas, pending.rect, self.background);
            }
            DisposalMethod::RestorePrevious => {
                if let Some(saved) = pending.saved {
                    paste_rect(&mut self.canvas, pending.rect, &saved);
                }
            }
        }
    }
}

fn row_range(stride: usize, rect: Rect, y: u32) -> std::ops::Range<usize> {
    let start = ((y as usize) * stride + rect.left as usize) * 4;
    start..start + rect.width as usize * 4
}

fn copy_rect(canvas: &RgbaImage, rect: Rect) -> Vec<u8> {
    let stride = canvas.width() as usize;
    let buf = canvas.as_raw();
    let mut out = Vec::with_capacity(rect.area() as usize * 4);
    for y in rect.top..rect.bottom() {
        out.extend_from_slice(&buf[row_range(stride, rect, y)]);
    }
    out
}

fn paste_rect(canvas: &mut RgbaImage, rect: Rect, saved: &[u8]) {
    let stride = canvas.width() as usize;
    let row_len = rect.width as usize * 4;
    let buf: &mut [u8] = &mut *canvas;
    for (row, y) in (rect.top..rect.bottom()).enumerate() {
        buf[row_range(stride, rect, y)].copy_from_slice(&saved[row * row_len..(row + 1) * row_len]);
    }
}

fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba8) {
    let stride = canvas.width() as usize;
    let buf: &mut [u8] = &mut *canvas;
    for y in rect.top..rect.bottom() {
        for px in buf[row_range(stride, rect, y)].chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }
}

fn paint_indices(
    canvas: &mut RgbaImage,
    rect: Rect,
    indices: &[u8],
    palette: &[Rgb8],
    transparent: Option<u8>,
) {
    let stride = canvas.width() as usize;
    let width = rect.width as usize;
    let buf: &mut [u8] = &mut *canvas;
    for (row, y) in (rect.top..rect.bottom()).enumerate() {
        let src = &indices[row * width..(row + 1) * width];
        for (px, &idx) in buf[row_range(stride, rect, y)].chunks_exact_mut(4).zip(src) {
            if Some(idx) == transparent {
                continue;
            }
            let color = palette
                .get(idx as usize)
                .map(|c| [c[0], c[1], c[2], 255])
                .unwrap_or(OUT_OF_TABLE);
            px.copy_from_slice(&color);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/canvas.rs"]
mod tests;
