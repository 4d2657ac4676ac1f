//! Fixed two-column signature geometry.
//!
//! Left: the logo box and a vertical divider. Right: the text column, optionally narrowed by a
//! QR square anchored to the right edge. Everything is a pure function of the output size,
//! the variant and the payload.

use crate::foundation::core::{Rect, Rgba8, Size};
use crate::overlay::payload::{OverlayPayload, SignatureVariant};
use crate::overlay::text::{TextStyle, wrap_words};

/// Outer padding on every side.
pub const PADDING: u32 = 16;
/// Width of the left (logo) column; the divider sits on its right edge.
pub const LEFT_COLUMN: u32 = 220;
/// Divider stroke width.
pub const DIVIDER_WIDTH: u32 = 2;
/// Gap between divider and text.
pub const TEXT_GAP: u32 = 12;
/// Narrowest text column, regardless of output size.
pub const MIN_TEXT_WIDTH: u32 = 40;
/// Largest QR side.
pub const MAX_QR_SIDE: u32 = 110;
/// White margin around the QR square.
pub const QR_MARGIN: u32 = 6;
/// Gap between text column and QR square.
pub const QR_GAP: u32 = 12;

/// Canvas fill behind everything.
pub const BACKGROUND: Rgba8 = [0xFF, 0xFF, 0xFF, 0xFF];
/// Divider colour.
pub const DIVIDER_COLOR: Rgba8 = [0x00, 0x5A, 0x9C, 0xFF];
const ADDRESS_COLOR: Rgba8 = [0x77, 0x77, 0x77, 0xFF];

/// Name and body colours for a variant.
pub fn text_colors(variant: SignatureVariant) -> (Rgba8, Rgba8) {
    match variant {
        SignatureVariant::Standard => ([0x00, 0x33, 0x66, 0xFF], [0x55, 0x55, 0x55, 0xFF]),
        SignatureVariant::WithQr => ([0x0E, 0x29, 0x23, 0xFF], [0x0E, 0x29, 0x23, 0xFF]),
    }
}

/// Box geometry for one output size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Output raster size.
    pub output: Size,
    /// Box the logo is fitted into.
    pub logo_box: Rect,
    /// Divider stroke.
    pub divider: Rect,
    /// QR square (without its margin), when a QR is drawn.
    pub qr: Option<Rect>,
    /// Left edge of the text column.
    pub text_left: u32,
    /// Text column width used for wrapping.
    pub text_width: u32,
}

impl Geometry {
    /// Compute the boxes for `output`, reserving a QR square when `with_qr`.
    pub fn new(output: Size, with_qr: bool) -> Self {
        let Size { width, height } = output;
        let inner_h = height.saturating_sub(2 * PADDING);

        let logo_box = Rect::new(PADDING, PADDING, LEFT_COLUMN - 2 * PADDING, inner_h);
        let divider = Rect::new(LEFT_COLUMN, PADDING, DIVIDER_WIDTH, inner_h);
        let text_left = LEFT_COLUMN + TEXT_GAP;
        let mut text_right = width.saturating_sub(PADDING);

        let qr = with_qr.then(|| {
            let side = MAX_QR_SIDE.min(inner_h);
            let left = width.saturating_sub(PADDING + side);
            let top = (height - side).div_ceil(2);
            text_right = left.saturating_sub(QR_GAP);
            Rect::new(left, top, side, side)
        });

        Self {
            output,
            logo_box,
            divider,
            qr,
            text_left,
            text_width: text_right.saturating_sub(text_left).max(MIN_TEXT_WIDTH),
        }
    }

    /// The QR square grown by its white margin.
    pub fn qr_backing(&self) -> Option<Rect> {
        self.qr.map(|r| {
            Rect::new(
                r.left.saturating_sub(QR_MARGIN),
                r.top.saturating_sub(QR_MARGIN),
                r.width + 2 * QR_MARGIN,
                r.height + 2 * QR_MARGIN,
            )
        })
    }
}

/// One wrapped text line at its final position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedLine {
    /// Line content.
    pub text: String,
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Font parameters.
    pub style: TextStyle,
}

/// Lay out every text field top to bottom: name, department, title, phone, email, address.
pub fn place_text(
    geometry: &Geometry,
    payload: &OverlayPayload,
    variant: SignatureVariant,
) -> Vec<PlacedLine> {
    let (name_color, body_color) = text_colors(variant);
    let name = TextStyle {
        size: 16,
        bold: true,
        color: name_color,
        line_height: 19,
    };
    let body = TextStyle {
        size: 13,
        bold: false,
        color: body_color,
        line_height: 19,
    };
    let phone = TextStyle { bold: true, ..body };
    let small = TextStyle {
        size: 11,
        bold: false,
        color: ADDRESS_COLOR,
        line_height: 15,
    };

    let fields: [(Option<&str>, TextStyle, u32, u32); 6] = [
        (Some(payload.display_name.as_str()), name, 0, 6),
        (payload.department.as_deref(), body, 0, 0),
        (Some(payload.title.as_str()), body, 0, 0),
        (Some(payload.phone.as_str()), phone, 2, 0),
        (payload.email.as_deref(), body, 2, 0),
        (payload.address.as_deref(), small, 6, 0),
    ];

    let mut out = Vec::new();
    let mut y = PADDING;
    for (text, style, before, after) in fields {
        let Some(text) = text else {
            continue;
        };
        y += before;
        for line in wrap_words(text, geometry.text_width, |s| style.measure(s)) {
            out.push(PlacedLine {
                text: line,
                x: geometry.text_left,
                y,
                style,
            });
            y += style.line_height;
        }
        y += after;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/layout.rs"]
mod tests;
