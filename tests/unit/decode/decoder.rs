use super::*;

// Classic 10x10 four-colour sample GIF (GIF89a, one frame, empty graphic control).
const SAMPLE_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x0A, 0x00, 0x0A, 0x00, 0x91, 0x00, 0x00, 0xFF, 0xFF,
    0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x21, 0xF9, 0x04, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x0A, 0x00, 0x00, 0x02, 0x16,
    0x8C, 0x2D, 0x99, 0x87, 0x2A, 0x1C, 0xDC, 0x33, 0xA0, 0x02, 0x75, 0xEC, 0x95, 0xFA, 0xA8,
    0xDE, 0x60, 0x8C, 0x04, 0x91, 0x4C, 0x01, 0x00, 0x3B,
];

/// Minimal hand assembler for test streams.
struct Builder {
    out: Vec<u8>,
}

impl Builder {
    fn new(w: u16, h: u16, palette: &[Rgb8]) -> Self {
        let mut out = b"GIF89a".to_vec();
        out.extend_from_slice(&w.to_le_bytes());
        out.extend_from_slice(&h.to_le_bytes());
        // 4-entry global table.
        out.extend_from_slice(&[0x81, 0, 0]);
        for i in 0..4 {
            out.extend_from_slice(&palette.get(i).copied().unwrap_or([0, 0, 0]));
        }
        Self { out }
    }

    fn looping(mut self, n: u16) -> Self {
        self.out.extend_from_slice(&[0x21, 0xFF, 0x0B]);
        self.out.extend_from_slice(b"NETSCAPE2.0");
        self.out.extend_from_slice(&[0x03, 0x01]);
        self.out.extend_from_slice(&n.to_le_bytes());
        self.out.push(0);
        self
    }

    fn comment(mut self, text: &[u8]) -> Self {
        self.out.extend_from_slice(&[0x21, 0xFE]);
        crate::codec::blocks::write_sub_blocks(&mut self.out, text).unwrap();
        self
    }

    fn control(mut self, disposal: u8, delay: u16, transparent: Option<u8>) -> Self {
        let packed = (disposal << 2) | u8::from(transparent.is_some());
        self.out.extend_from_slice(&[0x21, 0xF9, 0x04, packed]);
        self.out.extend_from_slice(&delay.to_le_bytes());
        self.out.extend_from_slice(&[transparent.unwrap_or(0), 0]);
        self
    }

    fn image(mut self, rect: (u16, u16, u16, u16), interlaced: bool, indices: &[u8]) -> Self {
        self.out.push(0x2C);
        for v in [rect.0, rect.1, rect.2, rect.3] {
            self.out.extend_from_slice(&v.to_le_bytes());
        }
        self.out.push(if interlaced { 0x40 } else { 0 });
        self.out.push(2);
        let packed = crate::codec::lzw::compress(indices, 2);
        crate::codec::blocks::write_sub_blocks(&mut self.out, &packed).unwrap();
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.out.push(0x3B);
        self.out
    }
}

fn decode_all(bytes: Vec<u8>) -> StampResult<(GifHeader, Vec<SourceFrame>)> {
    let dec = GifDecoder::new(bytes, &DecodeLimits::default())?;
    let header = dec.header().clone();
    let frames = dec.collect::<StampResult<Vec<_>>>()?;
    Ok((header, frames))
}

fn format_err(res: StampResult<impl std::fmt::Debug>) -> FormatError {
    match res {
        Err(StampError::Format(f)) => f,
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn sample_gif_header_and_frame() {
    let (header, frames) = decode_all(SAMPLE_GIF.to_vec()).unwrap();
    assert_eq!(header.screen, Size::new(10, 10).unwrap());
    assert_eq!(header.frame_count, 1);
    assert_eq!(header.loop_count, None);
    let palette = header.global_palette.as_ref().unwrap();
    assert_eq!(palette.len(), 4);
    assert_eq!(palette[1], [0xFF, 0x00, 0x00]);

    let f = &frames[0];
    assert_eq!(f.info.rect, Rect::new(0, 0, 10, 10));
    assert_eq!(f.info.disposal, DisposalMethod::None);
    assert_eq!(f.info.delay_cs, 0);
    assert_eq!(f.info.transparent_index, None);
    let indices = f.decode_indices().unwrap();
    assert_eq!(&indices[..10], &[1, 1, 1, 1, 1, 2, 2, 2, 2, 2]);
    assert_eq!(&indices[90..], &[2, 2, 2, 2, 2, 1, 1, 1, 1, 1]);
}

#[test]
fn graphic_control_and_loop_are_parsed() {
    let bytes = Builder::new(4, 4, &[[0, 0, 0], [255, 255, 255]])
        .looping(0)
        .comment(b"made by hand")
        .control(2, 7, Some(3))
        .image((0, 0, 4, 4), false, &[1; 16])
        .image((1, 1, 2, 2), false, &[0; 4])
        .finish();
    let (header, frames) = decode_all(bytes).unwrap();
    assert_eq!(header.loop_count, Some(LoopCount::Infinite));
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].info.disposal, DisposalMethod::RestoreBackground);
    assert_eq!(frames[0].info.delay_cs, 7);
    assert_eq!(frames[0].info.transparent_index, Some(3));
    // No control block: defaults.
    assert_eq!(frames[1].info.disposal, DisposalMethod::None);
    assert_eq!(frames[1].info.delay_cs, 0);
    assert_eq!(frames[1].info.transparent_index, None);
    assert_eq!(frames[1].info.rect, Rect::new(1, 1, 2, 2));
}

#[test]
fn interlaced_rows_are_reordered() {
    // 1x8 column: row y holds index y % 4, stored in pass order 0,4 | 2,6 | 1,3,5,7.
    let stored = [0u8, 0, 2, 2, 1, 3, 1, 3];
    let bytes = Builder::new(1, 8, &[])
        .image((0, 0, 1, 8), true, &stored)
        .finish();
    let (_, frames) = decode_all(bytes).unwrap();
    assert!(frames[0].info.interlaced);
    assert_eq!(
        frames[0].decode_indices().unwrap(),
        vec![0, 1, 2, 3, 0, 1, 2, 3]
    );
}

#[test]
fn bad_signature_is_rejected() {
    assert_eq!(
        format_err(decode_all(b"PNG89a\0\0".to_vec())),
        FormatError::BadSignature
    );
    assert_eq!(format_err(decode_all(vec![])), FormatError::BadSignature);
}

#[test]
fn truncated_final_block_fails_before_any_frame() {
    let mut bytes = Builder::new(4, 4, &[])
        .image((0, 0, 4, 4), false, &[1; 16])
        .image((0, 0, 4, 4), false, &[2; 16])
        .finish();
    bytes.truncate(bytes.len() - 3);
    assert_eq!(
        format_err(GifDecoder::new(bytes, &DecodeLimits::default())),
        FormatError::Truncated("sub-block")
    );
}

#[test]
fn missing_trailer_is_rejected() {
    let mut bytes = Builder::new(4, 4, &[])
        .image((0, 0, 4, 4), false, &[1; 16])
        .finish();
    bytes.pop();
    assert_eq!(format_err(decode_all(bytes)), FormatError::MissingTrailer);
}

#[test]
fn frame_outside_screen_is_rejected() {
    let bytes = Builder::new(4, 4, &[])
        .image((2, 2, 4, 4), false, &[1; 16])
        .finish();
    assert!(matches!(
        format_err(decode_all(bytes)),
        FormatError::FrameOutOfBounds { frame: 0, .. }
    ));
}

#[test]
fn stream_without_images_has_no_frames() {
    let bytes = Builder::new(4, 4, &[]).finish();
    assert_eq!(format_err(decode_all(bytes)), FormatError::NoFrames);
}

#[test]
fn limits_cap_frames_and_dimensions() {
    let bytes = Builder::new(4, 4, &[])
        .image((0, 0, 4, 4), false, &[1; 16])
        .image((0, 0, 4, 4), false, &[1; 16])
        .finish();
    let limits = DecodeLimits {
        max_frames: 1,
        ..DecodeLimits::default()
    };
    assert!(matches!(
        GifDecoder::new(bytes.clone(), &limits),
        Err(StampError::ResourceLimitExceeded(_))
    ));

    let limits = DecodeLimits {
        max_dimension: 3,
        ..DecodeLimits::default()
    };
    assert!(matches!(
        GifDecoder::new(bytes.clone(), &limits),
        Err(StampError::ResourceLimitExceeded(_))
    ));

    let limits = DecodeLimits {
        max_pixels: 20,
        ..DecodeLimits::default()
    };
    assert!(matches!(
        GifDecoder::new(bytes, &limits),
        Err(StampError::ResourceLimitExceeded(_))
    ));
}

#[test]
fn short_lzw_payload_is_truncated_image_data() {
    let bytes = Builder::new(4, 4, &[])
        .image((0, 0, 4, 4), false, &[1; 4])
        .finish();
    let (_, frames) = decode_all(bytes).unwrap();
    assert_eq!(
        frames[0].decode_indices().unwrap_err(),
        FormatError::Truncated("image data")
    );
}

#[test]
fn missing_palette_is_reported() {
    let mut bytes = Builder::new(2, 2, &[])
        .image((0, 0, 2, 2), false, &[0; 4])
        .finish();
    // Clear the global table flag; the table bytes then parse as unknown blocks, so rebuild.
    bytes[10] = 0;
    bytes.drain(13..25);
    let (header, frames) = decode_all(bytes).unwrap();
    assert!(header.global_palette.is_none());
    assert_eq!(
        frames[0].palette(None).unwrap_err(),
        FormatError::MissingPalette { frame: 0 }
    );
}

#[test]
fn frame_infos_match_yielded_frames() {
    let bytes = Builder::new(4, 4, &[])
        .control(1, 10, None)
        .image((0, 0, 4, 4), false, &[1; 16])
        .control(3, 20, Some(0))
        .image((0, 0, 2, 2), false, &[1; 4])
        .finish();
    let dec = GifDecoder::new(bytes, &DecodeLimits::default()).unwrap();
    let infos = dec.frame_infos();
    let frames: Vec<_> = dec.map(|f| f.unwrap().info).collect();
    assert_eq!(infos, frames);
    assert_eq!(infos[1].disposal, DisposalMethod::RestorePrevious);
}
