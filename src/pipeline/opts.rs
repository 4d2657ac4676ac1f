use crate::decode::decoder::DecodeLimits;
use crate::encode::gif::EncoderOpts;
use crate::foundation::core::LoopCount;
use crate::foundation::error::{StampError, StampResult};
use crate::quantize::median_cut::{MAX_PALETTE, QuantizeOpts};

/// Per-request pipeline knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineOpts {
    /// Quantizer sampling stride, `1..=30`: 1 is slowest and most faithful.
    pub quality: u8,
    /// Delays below this many centiseconds are raised to it on output.
    pub min_delay_cs: u16,
    /// Compute one palette from the first output frame and map every frame onto it (global
    /// colour table), instead of a palette per frame (local colour tables).
    pub palette_reuse: bool,
    /// Maximum source frame count.
    pub max_frames: usize,
    /// Maximum decoded pixel volume of the source (screen area and summed frame areas), and the
    /// largest pixel area of the output and of the QR raster.
    pub max_pixels: u64,
    /// Maximum width or height of the source screen, the output and the QR raster.
    pub max_dimension: u32,
    /// Loop behaviour to write; `None` keeps the source's.
    pub loop_override: Option<LoopCount>,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        let limits = DecodeLimits::default();
        Self {
            quality: 1,
            min_delay_cs: 2,
            palette_reuse: false,
            max_frames: limits.max_frames,
            max_pixels: limits.max_pixels,
            max_dimension: limits.max_dimension,
            loop_override: None,
        }
    }
}

impl PipelineOpts {
    /// Check option ranges.
    pub fn validate(&self) -> StampResult<()> {
        if !(1..=30).contains(&self.quality) {
            return Err(StampError::validation("quality must be within 1..=30"));
        }
        if self.max_frames == 0 {
            return Err(StampError::validation("max_frames must be > 0"));
        }
        if self.max_pixels == 0 {
            return Err(StampError::validation("max_pixels must be > 0"));
        }
        if self.max_dimension == 0 || self.max_dimension > u32::from(u16::MAX) {
            return Err(StampError::validation(
                "max_dimension must be within 1..=65535",
            ));
        }
        Ok(())
    }

    /// Limits for the source decoder.
    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_frames: self.max_frames,
            max_dimension: self.max_dimension,
            max_pixels: self.max_pixels,
        }
    }

    /// Quantizer options.
    pub fn quantize_opts(&self) -> QuantizeOpts {
        QuantizeOpts {
            max_colors: MAX_PALETTE,
            quality: self.quality,
            ..QuantizeOpts::default()
        }
    }

    /// Encoder options.
    pub fn encoder_opts(&self) -> EncoderOpts {
        EncoderOpts {
            min_delay_cs: self.min_delay_cs,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/opts.rs"]
mod tests;
