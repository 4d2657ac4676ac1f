//! gifstamp turns an animated GIF into a personalized animated e-mail signature.
//!
//! Every source frame is decoded, composited onto a persistent canvas, framed by the signature
//! layout (logo, divider, text, optional QR), quantized back to at most 256 colours and
//! re-encoded, one frame at a time, straight into an output stream.
//!
//! # Pipeline overview
//!
//! 1. **Decode**: `bytes -> GifDecoder` (structural prescan, then lazy [`SourceFrame`]s)
//! 2. **Composite**: `SourceFrame -> CompositedFrame` ([`Compositor`] applies disposal rules)
//! 3. **Overlay**: `CompositedFrame -> RgbaImage` ([`OverlayRenderer`])
//! 4. **Quantize**: `RgbaImage -> indices + palette` (median cut, [`quantize`])
//! 5. **Encode**: `OutputFrame -> bytes` ([`GifEncoder`] behind a [`FrameSink`])
//!
//! [`render_signature`] drives all five for one [`SignatureRequest`].
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Fail before output**: payload, QR, fetch, structure and resource limits are all checked
//!   before the first byte reaches the sink.
//! - **Bounded memory**: one canvas and one frame in flight per request, independent of frame
//!   count.
//! - **Self-contained codecs**: LZW and quantization are implemented here, not delegated.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod codec {
    pub mod blocks;
    pub mod lzw;
}
mod composite {
    pub mod canvas;
}
mod decode {
    pub mod decoder;
}
mod encode {
    pub mod gif;
    pub mod sink;
}
mod foundation {
    pub mod core;
    pub mod error;
    pub mod math;
}
mod overlay {
    pub mod layout;
    pub mod payload;
    pub mod render;
    pub mod text;
}
mod pipeline {
    pub mod opts;
    pub mod session;
    pub mod source;
}
mod quantize {
    pub mod median_cut;
}

pub use codec::blocks::{MAX_SUB_BLOCK, read_sub_blocks, skip_sub_blocks, write_sub_blocks};
pub use codec::lzw::{check_min_code_size, compress, decompress, min_code_size_for};
pub use composite::canvas::{CompositedFrame, Compositor};
pub use decode::decoder::{DecodeLimits, FrameInfo, GifDecoder, GifHeader, SourceFrame};
pub use encode::gif::{EncoderOpts, FramePalette, GifEncoder, OutputFrame, clamp_delay};
pub use encode::sink::{FrameSink, GifStreamSink, InMemorySink, SinkConfig};
pub use foundation::core::{
    DisposalMethod, FrameIndex, LoopCount, Rect, Rgb8, Rgba8, Size, TRANSPARENT,
};
pub use foundation::error::{FormatError, StampError, StampResult};
pub use overlay::layout::{Geometry, PlacedLine, place_text, text_colors};
pub use overlay::payload::{
    DEFAULT_OUT_HEIGHT, DEFAULT_OUT_WIDTH, OverlayPayload, PayloadFields, SignatureVariant,
    decode_qr,
};
pub use overlay::render::{OverlayRenderer, fit_logo, fit_rect};
pub use overlay::text::{TextStyle, draw_line, wrap_words};
pub use pipeline::opts::PipelineOpts;
pub use pipeline::session::{
    CancelFlag, RenderStats, SignatureRequest, SourceSummary, inspect_source, render_signature,
    render_signature_to_writer,
};
pub use pipeline::source::{FileFetcher, SourceFetcher, StaticFetcher};
pub use quantize::median_cut::{MAX_PALETTE, Palette, QuantizeOpts, QuantizedFrame, quantize};
