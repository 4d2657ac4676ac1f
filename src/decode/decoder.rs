use crate::codec::{blocks, lzw};
use crate::foundation::core::{DisposalMethod, LoopCount, Rect, Rgb8, Size};
use crate::foundation::error::{FormatError, StampError, StampResult};

const TRAILER: u8 = 0x3B;
const EXTENSION: u8 = 0x21;
const IMAGE: u8 = 0x2C;
const GRAPHIC_CONTROL: u8 = 0xF9;
const APPLICATION: u8 = 0xFF;

/// Caps applied while scanning a source, before any pixel is decompressed.
#[derive(Clone, Copy, Debug)]
pub struct DecodeLimits {
    /// Maximum number of frames.
    pub max_frames: usize,
    /// Maximum logical screen width or height.
    pub max_dimension: u32,
    /// Maximum pixel volume: the logical screen area and the sum of all frame areas.
    pub max_pixels: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_frames: 1000,
            max_dimension: 4096,
            max_pixels: 64 * 1024 * 1024,
        }
    }
}

/// Stream-level metadata read from the header and collected during the prescan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GifHeader {
    /// Logical screen dimensions.
    pub screen: Size,
    /// Global colour table, if present.
    pub global_palette: Option<Vec<Rgb8>>,
    /// Background colour index into the global table.
    pub background_index: u8,
    /// Repeat behaviour from the NETSCAPE2.0 / ANIMEXTS1.0 extension.
    pub loop_count: Option<LoopCount>,
    /// Number of image blocks in the stream.
    pub frame_count: usize,
}

/// Per-frame metadata from the image descriptor and its graphic control extension.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FrameInfo {
    /// 0-based frame index.
    pub index: usize,
    /// Frame rectangle within the logical screen.
    pub rect: Rect,
    /// Disposal applied after this frame is shown.
    pub disposal: DisposalMethod,
    /// Display time in hundredths of a second.
    pub delay_cs: u16,
    /// Palette index treated as "do not paint".
    pub transparent_index: Option<u8>,
    /// Rows are stored in 4-pass interlaced order.
    pub interlaced: bool,
    /// Frame carries its own colour table.
    pub has_local_palette: bool,
}

/// One decoded-but-not-decompressed frame.
#[derive(Clone, Debug)]
pub struct SourceFrame {
    /// Descriptor and control metadata.
    pub info: FrameInfo,
    /// Local colour table, if present.
    pub local_palette: Option<Vec<Rgb8>>,
    /// LZW minimum code size from the image data block.
    pub min_code_size: u8,
    /// Reassembled LZW payload.
    pub compressed: Vec<u8>,
}

impl SourceFrame {
    /// Decompress the frame into row-major indices (`width * height`), de-interlacing if needed.
    pub fn decode_indices(&self) -> Result<Vec<u8>, FormatError> {
        let rect = self.info.rect;
        let expected = rect.area() as usize;
        let indices = lzw::decompress(&self.compressed, self.min_code_size, expected)?;
        if indices.len() < expected {
            return Err(FormatError::Truncated("image data"));
        }
        if self.info.interlaced {
            Ok(deinterlace(&indices, rect.width as usize, rect.height as usize))
        } else {
            Ok(indices)
        }
    }

    /// Colour table in effect for this frame: the local table, else the global one.
    pub fn palette<'a>(&'a self, global: Option<&'a [Rgb8]>) -> Result<&'a [Rgb8], FormatError> {
        self.local_palette
            .as_deref()
            .or(global)
            .ok_or(FormatError::MissingPalette {
                frame: self.info.index,
            })
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct GraphicControl {
    disposal: DisposalMethod,
    delay_cs: u16,
    transparent_index: Option<u8>,
}

#[derive(Clone, Debug)]
struct FrameEntry {
    info: FrameInfo,
    local_palette: Option<(usize, usize)>,
    min_code_size: u8,
    data_pos: usize,
}

/// Lazy frame decoder over one source GIF.
///
/// Construction walks the entire block structure once without decompressing anything, so a bad
/// signature, truncated block, out-of-bounds frame, missing trailer, or exceeded limit is
/// reported before the first frame is handed out. Frames are then produced in order, each one
/// reassembled on demand. The decoder owns its bytes and cannot be rewound.
#[derive(Debug)]
pub struct GifDecoder {
    bytes: Vec<u8>,
    header: GifHeader,
    entries: Vec<FrameEntry>,
    next: usize,
    failed: bool,
}

impl GifDecoder {
    /// Scan `bytes` and prepare to yield its frames.
    pub fn new(bytes: Vec<u8>, limits: &DecodeLimits) -> StampResult<Self> {
        let scan = Scanner {
            bytes: &bytes,
            limits,
        };
        let (header, entries) = scan.run()?;
        Ok(Self {
            bytes,
            header,
            entries,
            next: 0,
            failed: false,
        })
    }

    /// Stream-level metadata.
    pub fn header(&self) -> &GifHeader {
        &self.header
    }

    /// Metadata of every frame, available without decompression.
    pub fn frame_infos(&self) -> Vec<FrameInfo> {
        self.entries.iter().map(|e| e.info.clone()).collect()
    }

    fn materialize(&self, entry: &FrameEntry) -> Result<SourceFrame, FormatError> {
        let local_palette = entry
            .local_palette
            .map(|(start, len)| read_palette(&self.bytes, start, len))
            .transpose()?;
        let (compressed, _) = blocks::read_sub_blocks(&self.bytes, entry.data_pos)?;
        Ok(SourceFrame {
            info: entry.info.clone(),
            local_palette,
            min_code_size: entry.min_code_size,
            compressed,
        })
    }
}

impl Iterator for GifDecoder {
    type Item = StampResult<SourceFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let entry = self.entries.get(self.next)?;
        let res = self.materialize(entry).map_err(StampError::from);
        self.next += 1;
        if res.is_err() {
            self.failed = true;
        }
        Some(res)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.failed {
            0
        } else {
            self.entries.len() - self.next
        };
        (0, Some(left))
    }
}

struct Scanner<'a> {
    bytes: &'a [u8],
    limits: &'a DecodeLimits,
}

impl Scanner<'_> {
    fn u16_at(&self, pos: usize, what: &'static str) -> Result<u16, FormatError> {
        self.bytes
            .get(pos..pos + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .ok_or(FormatError::Truncated(what))
    }

    fn byte_at(&self, pos: usize, what: &'static str) -> Result<u8, FormatError> {
        self.bytes
            .get(pos)
            .copied()
            .ok_or(FormatError::Truncated(what))
    }

    fn run(&self) -> StampResult<(GifHeader, Vec<FrameEntry>)> {
        let sig = self.bytes.get(..6).ok_or(FormatError::BadSignature)?;
        if sig != b"GIF89a" && sig != b"GIF87a" {
            return Err(FormatError::BadSignature.into());
        }

        let width = self.u16_at(6, "logical screen descriptor")?;
        let height = self.u16_at(8, "logical screen descriptor")?;
        let packed = self.byte_at(10, "logical screen descriptor")?;
        let background_index = self.byte_at(11, "logical screen descriptor")?;
        self.byte_at(12, "logical screen descriptor")?;
        if width == 0 || height == 0 {
            return Err(FormatError::EmptyScreen.into());
        }
        let screen = Size {
            width: u32::from(width),
            height: u32::from(height),
        };
        self.check_screen(screen)?;

        let mut pos = 13;
        let global_palette = if packed & 0x80 != 0 {
            let len = 2usize << (packed & 0x07);
            let palette = read_palette(self.bytes, pos, len)
                .map_err(|_| FormatError::Truncated("global colour table"))?;
            pos += len * 3;
            Some(palette)
        } else {
            None
        };

        let mut entries = Vec::new();
        let mut loop_count = None;
        let mut pending: Option<GraphicControl> = None;
        let mut total_pixels = 0u64;

        loop {
            let Some(&introducer) = self.bytes.get(pos) else {
                return Err(FormatError::MissingTrailer.into());
            };
            match introducer {
                TRAILER => break,
                EXTENSION => {
                    let label = self.byte_at(pos + 1, "extension")?;
                    let body_pos = pos + 2;
                    match label {
                        GRAPHIC_CONTROL => {
                            let (body, end) = blocks::read_sub_blocks(self.bytes, body_pos)?;
                            if body.len() < 4 {
                                return Err(FormatError::Truncated("graphic control").into());
                            }
                            pending = Some(parse_graphic_control(&body));
                            pos = end;
                        }
                        APPLICATION => {
                            let (body, end) = blocks::read_sub_blocks(self.bytes, body_pos)?;
                            if let Some(count) = parse_loop_extension(&body) {
                                loop_count = Some(count);
                            }
                            pos = end;
                        }
                        _ => pos = blocks::skip_sub_blocks(self.bytes, body_pos)?,
                    }
                }
                IMAGE => {
                    let index = entries.len();
                    if index >= self.limits.max_frames {
                        return Err(StampError::limit(format!(
                            "source has more than {} frames",
                            self.limits.max_frames
                        )));
                    }
                    let (entry, end) = self.scan_image(pos, index, screen, pending.take())?;
                    total_pixels += entry.info.rect.area();
                    if total_pixels > self.limits.max_pixels {
                        return Err(StampError::limit(format!(
                            "decoded pixel volume exceeds {}",
                            self.limits.max_pixels
                        )));
                    }
                    entries.push(entry);
                    pos = end;
                }
                other => return Err(FormatError::UnknownBlock(other).into()),
            }
        }

        if entries.is_empty() {
            return Err(FormatError::NoFrames.into());
        }

        let header = GifHeader {
            screen,
            global_palette,
            background_index,
            loop_count,
            frame_count: entries.len(),
        };
        Ok((header, entries))
    }

    fn check_screen(&self, screen: Size) -> StampResult<()> {
        let max = self.limits.max_dimension;
        if screen.width > max || screen.height > max {
            return Err(StampError::limit(format!(
                "logical screen {}x{} exceeds {max} px per side",
                screen.width, screen.height
            )));
        }
        if screen.area() > self.limits.max_pixels {
            return Err(StampError::limit(format!(
                "logical screen area exceeds {}",
                self.limits.max_pixels
            )));
        }
        Ok(())
    }

    fn scan_image(
        &self,
        pos: usize,
        index: usize,
        screen: Size,
        gce: Option<GraphicControl>,
    ) -> Result<(FrameEntry, usize), FormatError> {
        let left = self.u16_at(pos + 1, "image descriptor")?;
        let top = self.u16_at(pos + 3, "image descriptor")?;
        let width = self.u16_at(pos + 5, "image descriptor")?;
        let height = self.u16_at(pos + 7, "image descriptor")?;
        let packed = self.byte_at(pos + 9, "image descriptor")?;

        let rect = Rect::new(
            u32::from(left),
            u32::from(top),
            u32::from(width),
            u32::from(height),
        );
        if !rect.fits_within(screen) {
            return Err(FormatError::FrameOutOfBounds {
                frame: index,
                left,
                top,
                width,
                height,
                screen_width: screen.width as u16,
                screen_height: screen.height as u16,
            });
        }

        let mut cursor = pos + 10;
        let local_palette = if packed & 0x80 != 0 {
            let len = 2usize << (packed & 0x07);
            if cursor + len * 3 > self.bytes.len() {
                return Err(FormatError::Truncated("local colour table"));
            }
            let range = (cursor, len);
            cursor += len * 3;
            Some(range)
        } else {
            None
        };

        let min_code_size = self.byte_at(cursor, "image data")?;
        lzw::check_min_code_size(min_code_size)?;
        let data_pos = cursor + 1;
        let end = blocks::skip_sub_blocks(self.bytes, data_pos)?;

        let gce = gce.unwrap_or_default();
        let info = FrameInfo {
            index,
            rect,
            disposal: gce.disposal,
            delay_cs: gce.delay_cs,
            transparent_index: gce.transparent_index,
            interlaced: packed & 0x40 != 0,
            has_local_palette: local_palette.is_some(),
        };
        Ok((
            FrameEntry {
                info,
                local_palette,
                min_code_size,
                data_pos,
            },
            end,
        ))
    }
}

fn read_palette(bytes: &[u8], start: usize, len: usize) -> Result<Vec<Rgb8>, FormatError> {
    let raw = bytes
        .get(start..start + len * 3)
        .ok_or(FormatError::Truncated("colour table"))?;
    Ok(raw.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

fn parse_graphic_control(body: &[u8]) -> GraphicControl {
    let packed = body[0];
    GraphicControl {
        disposal: DisposalMethod::from_gif_code(packed >> 2),
        delay_cs: u16::from_le_bytes([body[1], body[2]]),
        transparent_index: (packed & 0x01 != 0).then_some(body[3]),
    }
}

fn parse_loop_extension(body: &[u8]) -> Option<LoopCount> {
    let id = body.get(..11)?;
    if id != b"NETSCAPE2.0" && id != b"ANIMEXTS1.0" {
        return None;
    }
    if body.get(11) != Some(&1) {
        return None;
    }
    let lo = *body.get(12)?;
    let hi = *body.get(13)?;
    Some(LoopCount::from_stored(u16::from_le_bytes([lo, hi])))
}

fn deinterlace(rows_in_pass_order: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; width * height];
    let mut src_row = 0;
    for (start, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
        let mut y = start;
        while y < height {
            let src = &rows_in_pass_order[src_row * width..(src_row + 1) * width];
            out[y * width..(y + 1) * width].copy_from_slice(src);
            src_row += 1;
            y += step;
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/decode/decoder.rs"]
mod tests;
