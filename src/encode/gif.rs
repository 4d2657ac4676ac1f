use std::io::Write;

use crate::codec::{blocks, lzw};
use crate::foundation::core::{DisposalMethod, LoopCount, Rgb8, Size};
use crate::foundation::error::{StampError, StampResult};
use crate::quantize::median_cut::MAX_PALETTE;

/// Colour table used by an output frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FramePalette {
    /// The table written in the stream header.
    Global,
    /// A table written right before this frame's pixels.
    Local(Vec<Rgb8>),
}

/// One fully composed, indexed output frame covering the whole output screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFrame {
    /// Row-major palette indices, `width * height` long.
    pub indices: Vec<u8>,
    /// Colour table the indices refer to.
    pub palette: FramePalette,
    /// Requested display time in hundredths of a second (clamped on write).
    pub delay_cs: u16,
    /// Disposal written into the graphic control extension.
    pub disposal: DisposalMethod,
    /// Index flagged as transparent.
    pub transparent_index: Option<u8>,
}

/// Encoder knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderOpts {
    /// Delays below this are raised to it. Many viewers play 0 or 1 centisecond delays at an
    /// arbitrary slower speed.
    pub min_delay_cs: u16,
}

impl Default for EncoderOpts {
    fn default() -> Self {
        Self { min_delay_cs: 2 }
    }
}

/// Delay actually written for a requested delay.
pub fn clamp_delay(delay_cs: u16, min_delay_cs: u16) -> u16 {
    delay_cs.max(min_delay_cs)
}

struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Fresh,
    Frames,
    Finished,
}

/// Incremental GIF89a writer.
///
/// Call [`write_header`](Self::write_header) once, [`write_frame`](Self::write_frame) per frame
/// and [`write_trailer`](Self::write_trailer) once. Each call writes straight to the underlying
/// writer; only the current frame's compressed data is buffered. A failed write poisons
/// nothing retroactively: bytes already written stay written.
pub struct GifEncoder<W: Write> {
    out: CountingWriter<W>,
    opts: EncoderOpts,
    screen: Size,
    global_len: Option<usize>,
    state: State,
    frames: u64,
}

impl<W: Write> GifEncoder<W> {
    /// Wrap `writer`.
    pub fn new(writer: W, opts: EncoderOpts) -> Self {
        Self {
            out: CountingWriter {
                inner: writer,
                written: 0,
            },
            opts,
            screen: Size {
                width: 0,
                height: 0,
            },
            global_len: None,
            state: State::Fresh,
            frames: 0,
        }
    }

    /// Bytes handed to the underlying writer so far.
    pub fn bytes_written(&self) -> u64 {
        self.out.written
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.inner
    }

    /// Write signature, logical screen descriptor, optional global table and loop extension.
    pub fn write_header(
        &mut self,
        screen: Size,
        global_palette: Option<&[Rgb8]>,
        loop_count: Option<LoopCount>,
    ) -> StampResult<()> {
        if self.state != State::Fresh {
            return Err(StampError::validation("gif header already written"));
        }
        if screen.width == 0
            || screen.height == 0
            || screen.width > u32::from(u16::MAX)
            || screen.height > u32::from(u16::MAX)
        {
            return Err(StampError::validation(format!(
                "output size {}x{} is not encodable",
                screen.width, screen.height
            )));
        }
        if let Some(p) = global_palette {
            check_palette(p)?;
        }

        let mut head = Vec::with_capacity(13 + 768 + 19);
        head.extend_from_slice(b"GIF89a");
        head.extend_from_slice(&(screen.width as u16).to_le_bytes());
        head.extend_from_slice(&(screen.height as u16).to_le_bytes());
        match global_palette {
            Some(p) => {
                let bits = table_size_bits(p.len());
                head.push(0x80 | 0x70 | bits);
                head.extend_from_slice(&[0, 0]);
                push_table(&mut head, p, bits);
            }
            None => head.extend_from_slice(&[0x70, 0, 0]),
        }
        if let Some(count) = loop_count {
            head.extend_from_slice(&[0x21, 0xFF, 0x0B]);
            head.extend_from_slice(b"NETSCAPE2.0");
            head.extend_from_slice(&[0x03, 0x01]);
            head.extend_from_slice(&count.stored().to_le_bytes());
            head.push(0);
        }
        self.out.write_all(&head).map_err(StampError::sink)?;

        self.screen = screen;
        self.global_len = global_palette.map(|p| padded_len(p.len()));
        self.state = State::Frames;
        Ok(())
    }

    /// Write graphic control, image descriptor, optional local table and LZW data for a frame.
    pub fn write_frame(&mut self, frame: &OutputFrame) -> StampResult<()> {
        if self.state != State::Frames {
            return Err(StampError::validation(
                "gif frames must follow the header and precede the trailer",
            ));
        }
        let expected = self.screen.area() as usize;
        if frame.indices.len() != expected {
            return Err(StampError::validation(format!(
                "frame has {} indices, expected {expected}",
                frame.indices.len()
            )));
        }
        let table_len = match &frame.palette {
            FramePalette::Global => self.global_len.ok_or_else(|| {
                StampError::validation("frame uses the global palette but none was written")
            })?,
            FramePalette::Local(p) => {
                check_palette(p)?;
                padded_len(p.len())
            }
        };
        if let Some(&max) = frame.indices.iter().max()
            && usize::from(max) >= table_len
        {
            return Err(StampError::validation(format!(
                "index {max} outside a {table_len}-entry colour table"
            )));
        }
        if let Some(t) = frame.transparent_index
            && usize::from(t) >= table_len
        {
            return Err(StampError::validation(format!(
                "transparent index {t} outside a {table_len}-entry colour table"
            )));
        }

        let delay = clamp_delay(frame.delay_cs, self.opts.min_delay_cs);
        let mut head = Vec::with_capacity(8 + 10 + 768 + 1);
        let flags = (frame.disposal.gif_code() << 2) | u8::from(frame.transparent_index.is_some());
        head.extend_from_slice(&[0x21, 0xF9, 0x04, flags]);
        head.extend_from_slice(&delay.to_le_bytes());
        head.extend_from_slice(&[frame.transparent_index.unwrap_or(0), 0]);

        head.push(0x2C);
        head.extend_from_slice(&[0, 0, 0, 0]);
        head.extend_from_slice(&(self.screen.width as u16).to_le_bytes());
        head.extend_from_slice(&(self.screen.height as u16).to_le_bytes());
        match &frame.palette {
            FramePalette::Global => head.push(0),
            FramePalette::Local(p) => {
                let bits = table_size_bits(p.len());
                head.push(0x80 | bits);
                push_table(&mut head, p, bits);
            }
        }
        let min_code_size = lzw::min_code_size_for(table_len);
        head.push(min_code_size);

        let data = lzw::compress(&frame.indices, min_code_size);
        self.out.write_all(&head).map_err(StampError::sink)?;
        blocks::write_sub_blocks(&mut self.out, &data).map_err(StampError::sink)?;
        self.out.flush().map_err(StampError::sink)?;

        self.frames += 1;
        Ok(())
    }

    /// Write the trailer byte and flush.
    pub fn write_trailer(&mut self) -> StampResult<()> {
        if self.state != State::Frames {
            return Err(StampError::validation(
                "gif trailer requires a header and may be written once",
            ));
        }
        self.out.write_all(&[0x3B]).map_err(StampError::sink)?;
        self.out.flush().map_err(StampError::sink)?;
        self.state = State::Finished;
        Ok(())
    }
}

fn check_palette(p: &[Rgb8]) -> StampResult<()> {
    if p.is_empty() || p.len() > MAX_PALETTE {
        return Err(StampError::validation(format!(
            "colour table must hold 1..=256 entries, got {}",
            p.len()
        )));
    }
    Ok(())
}

/// Packed size field `n` such that the table holds `2 << n` entries.
fn table_size_bits(len: usize) -> u8 {
    let mut bits = 0u8;
    while (2usize << bits) < len && bits < 7 {
        bits += 1;
    }
    bits
}

fn padded_len(len: usize) -> usize {
    2usize << table_size_bits(len)
}

fn push_table(out: &mut Vec<u8>, palette: &[Rgb8], bits: u8) {
    let len = 2usize << bits;
    for i in 0..len {
        out.extend_from_slice(&palette.get(i).copied().unwrap_or([0, 0, 0]));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
