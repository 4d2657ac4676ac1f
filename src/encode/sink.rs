use std::io::Write;

use crate::encode::gif::{EncoderOpts, GifEncoder, OutputFrame};
use crate::foundation::core::{FrameIndex, LoopCount, Rgb8, Size};
use crate::foundation::error::{StampError, StampResult};

/// Configuration provided to a [`FrameSink`] right before the first frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output screen size; every frame covers all of it.
    pub screen: Size,
    /// Shared colour table when palettes are reused across frames.
    pub global_palette: Option<Vec<Rgb8>>,
    /// Repeat behaviour to declare, `None` to play once.
    pub loop_count: Option<LoopCount>,
}

/// Sink contract for consuming output frames in source order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order, between
/// one `begin` and one `end`.
pub trait FrameSink {
    /// Called once before any frame is pushed.
    fn begin(&mut self, cfg: SinkConfig) -> StampResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &OutputFrame) -> StampResult<()>;
    /// Called once after the last frame.
    fn end(&mut self) -> StampResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, OutputFrame)>,
    ended: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(FrameIndex, OutputFrame)] {
        &self.frames
    }

    /// `true` once `end` has been called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> StampResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &OutputFrame) -> StampResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> StampResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Sink that encodes frames as a GIF straight into any writer (file, stdout, socket).
///
/// Backpressure comes from the writer: a slow consumer blocks `push_frame`.
pub struct GifStreamSink<W: Write> {
    encoder: GifEncoder<W>,
    last_idx: Option<FrameIndex>,
}

impl<W: Write> GifStreamSink<W> {
    /// Create a sink writing to `writer`.
    pub fn new(writer: W, opts: EncoderOpts) -> Self {
        Self {
            encoder: GifEncoder::new(writer, opts),
            last_idx: None,
        }
    }

    /// Bytes written to the writer so far.
    pub fn bytes_written(&self) -> u64 {
        self.encoder.bytes_written()
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.encoder.into_inner()
    }
}

impl<W: Write> FrameSink for GifStreamSink<W> {
    fn begin(&mut self, cfg: SinkConfig) -> StampResult<()> {
        self.last_idx = None;
        self.encoder
            .write_header(cfg.screen, cfg.global_palette.as_deref(), cfg.loop_count)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &OutputFrame) -> StampResult<()> {
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(StampError::validation(format!(
                "frames must be pushed in increasing order (got {} after {})",
                idx.0, last.0
            )));
        }
        self.encoder.write_frame(frame)?;
        self.last_idx = Some(idx);
        Ok(())
    }

    fn end(&mut self) -> StampResult<()> {
        self.encoder.write_trailer()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
