use super::*;
use crate::foundation::core::Size;

const WHITE: Rgba8 = [255, 255, 255, 255];

fn payload(qr: Option<RgbaImage>) -> OverlayPayload {
    OverlayPayload {
        display_name: "Jane Doe".into(),
        title: "Engineer".into(),
        phone: "555-0100".into(),
        department: None,
        email: None,
        address: None,
        qr,
        output: Size::new(635, 215).unwrap(),
    }
}

fn solid(w: u32, h: u32, c: Rgba8) -> CompositedFrame {
    CompositedFrame {
        index: 0,
        image: RgbaImage::from_pixel(w, h, image::Rgba(c)),
        delay_cs: 10,
    }
}

#[test]
fn small_logo_is_centred_without_upscaling() {
    assert_eq!(
        fit_rect(100, 100, Rect::new(16, 16, 188, 183)),
        Some(Rect::new(60, 58, 100, 100))
    );
}

#[test]
fn large_logo_is_shrunk_preserving_aspect() {
    assert_eq!(
        fit_rect(400, 200, Rect::new(16, 16, 188, 183)),
        Some(Rect::new(16, 61, 188, 94))
    );
    assert_eq!(fit_rect(0, 10, Rect::new(0, 0, 5, 5)), None);
    assert_eq!(fit_rect(10, 10, Rect::new(0, 0, 0, 5)), None);
}

#[test]
fn render_places_logo_divider_and_background() {
    let r = OverlayRenderer::new(&payload(None), SignatureVariant::Standard);
    let out = r.render(&solid(100, 100, [255, 0, 0, 255]));
    assert_eq!(out.dimensions(), (635, 215));
    assert_eq!(out.get_pixel(60, 58).0, [255, 0, 0, 255]);
    assert_eq!(out.get_pixel(159, 157).0, [255, 0, 0, 255]);
    assert_eq!(out.get_pixel(59, 58).0, WHITE);
    assert_eq!(out.get_pixel(220, 16).0, DIVIDER_COLOR);
    assert_eq!(out.get_pixel(221, 198).0, DIVIDER_COLOR);
    assert_eq!(out.get_pixel(220, 15).0, WHITE);
    assert_eq!(out.get_pixel(0, 0).0, WHITE);
    assert_eq!(out.get_pixel(634, 214).0, WHITE);
}

#[test]
fn transparent_logo_pixels_show_white() {
    let r = OverlayRenderer::new(&payload(None), SignatureVariant::Standard);
    let out = r.render(&solid(100, 100, [0, 0, 0, 0]));
    assert_eq!(out.get_pixel(100, 100).0, WHITE);
}

#[test]
fn text_is_painted_in_the_text_column() {
    let r = OverlayRenderer::new(&payload(None), SignatureVariant::Standard);
    let out = r.render(&solid(10, 10, [0, 0, 0, 0]));
    let inked = (232..600)
        .flat_map(|x| (16..35).map(move |y| (x, y)))
        .filter(|&(x, y)| out.get_pixel(x, y).0 != WHITE)
        .count();
    assert!(inked > 0);
    assert_eq!(r.lines().len(), 3);
}

#[test]
fn qr_is_drawn_on_a_white_margin() {
    let qr = RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255]));
    let r = OverlayRenderer::new(&payload(Some(qr)), SignatureVariant::WithQr);
    let out = r.render(&solid(10, 10, [0, 0, 0, 0]));
    assert_eq!(r.geometry().qr, Some(Rect::new(509, 53, 110, 110)));
    assert_eq!(out.get_pixel(509, 53).0, [0, 0, 0, 255]);
    assert_eq!(out.get_pixel(618, 162).0, [0, 0, 0, 255]);
    assert_eq!(out.get_pixel(504, 48).0, WHITE);
    assert_eq!(out.get_pixel(619, 163).0, WHITE);
}

#[test]
fn rendering_is_pure() {
    let r = OverlayRenderer::new(&payload(None), SignatureVariant::Standard);
    let frame = solid(50, 30, [10, 200, 30, 255]);
    assert_eq!(r.render(&frame), r.render(&frame));
}
