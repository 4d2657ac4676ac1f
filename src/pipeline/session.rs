use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::composite::canvas::Compositor;
use crate::decode::decoder::{DecodeLimits, FrameInfo, GifDecoder};
use crate::encode::gif::{FramePalette, OutputFrame};
use crate::encode::sink::{FrameSink, GifStreamSink, SinkConfig};
use crate::foundation::core::{DisposalMethod, FrameIndex, LoopCount, Rgb8, Size};
use crate::foundation::error::{StampError, StampResult};
use crate::overlay::payload::{OverlayPayload, PayloadFields, SignatureVariant};
use crate::overlay::render::OverlayRenderer;
use crate::pipeline::opts::PipelineOpts;
use crate::pipeline::source::SourceFetcher;
use crate::quantize::median_cut::{Palette, QuantizedFrame, quantize};

const LOG_PREVIEW_CHARS: usize = 80;

/// Cooperative cancellation shared between a request and whoever serves its output.
///
/// The pipeline checks it at every frame boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A flag that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// `true` once [`CancelFlag::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One signature request: where the source lives, the overlay fields, and the layout variant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureRequest {
    /// Source location handed to the [`SourceFetcher`].
    pub source: String,
    /// Overlay fields as submitted.
    pub payload: PayloadFields,
    /// Layout variant.
    pub variant: SignatureVariant,
}

/// Counters for a finished request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames handed to the sink.
    pub frames_written: u64,
    /// Encoded bytes written, when the sink is a byte stream.
    pub bytes_written: u64,
}

/// Stream-level facts about a source, as reported by `inspect`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SourceSummary {
    /// Logical screen size.
    pub screen: Size,
    /// Repeat behaviour, if declared.
    pub loop_count: Option<LoopCount>,
    /// Per-frame metadata.
    pub frames: Vec<FrameInfo>,
}

/// Scan a source without decompressing any frame.
pub fn inspect_source(bytes: Vec<u8>, limits: &DecodeLimits) -> StampResult<SourceSummary> {
    let decoder = GifDecoder::new(bytes, limits)?;
    Ok(SourceSummary {
        screen: decoder.header().screen,
        loop_count: decoder.header().loop_count,
        frames: decoder.frame_infos(),
    })
}

/// Render a signature into `sink`.
///
/// Everything that can be rejected up front is checked before the sink sees anything, in this
/// order: options, payload fields, QR raster, output size, source fetch, source structure.
/// Only then is `begin` called, right before the first frame is pushed. Frames are decoded,
/// composited, decorated, quantized and pushed one at a time.
#[tracing::instrument(skip_all, fields(variant = ?request.variant, source = %preview(&request.source)))]
pub fn render_signature(
    request: &SignatureRequest,
    fetcher: &dyn SourceFetcher,
    opts: &PipelineOpts,
    sink: &mut dyn FrameSink,
    cancel: &CancelFlag,
) -> StampResult<RenderStats> {
    opts.validate()?;
    let payload = request.payload.clone().into_payload(request.variant, &opts.decode_limits())?;
    check_output_size(payload.output, opts)?;
    log_request(request, &payload);

    let bytes = fetcher.fetch(&request.source)?;
    let decoder = GifDecoder::new(bytes, &opts.decode_limits())?;

    let mut stream = FrameStream::new(&payload, request.variant, opts, &decoder);
    match stream.run(decoder, sink, cancel) {
        Ok(()) => {
            tracing::info!(frames = stream.frames_written, "signature rendered");
            Ok(RenderStats {
                frames_written: stream.frames_written,
                bytes_written: 0,
            })
        }
        Err(err) => {
            if stream.started {
                tracing::warn!(
                    error = %err,
                    frames_written = stream.frames_written,
                    "signature stream aborted after output started; output is incomplete"
                );
            }
            Err(err)
        }
    }
}

/// Render a signature as GIF bytes into `writer`.
///
/// On error, bytes already written stay written; the caller must treat them as partial output
/// unless [`StampError::is_retryable_before_output`] holds and nothing was written.
pub fn render_signature_to_writer<W: Write>(
    request: &SignatureRequest,
    fetcher: &dyn SourceFetcher,
    opts: &PipelineOpts,
    writer: W,
    cancel: &CancelFlag,
) -> StampResult<RenderStats> {
    let mut sink = GifStreamSink::new(writer, opts.encoder_opts());
    let stats = render_signature(request, fetcher, opts, &mut sink, cancel)?;
    Ok(RenderStats {
        bytes_written: sink.bytes_written(),
        ..stats
    })
}

fn check_output_size(output: Size, opts: &PipelineOpts) -> StampResult<()> {
    if output.width > opts.max_dimension || output.height > opts.max_dimension {
        return Err(StampError::limit(format!(
            "output {}x{} exceeds {} px per side",
            output.width, output.height, opts.max_dimension
        )));
    }
    let area = u64::from(output.width) * u64::from(output.height);
    if area > opts.max_pixels {
        return Err(StampError::limit(format!(
            "output {}x{} exceeds {} pixels",
            output.width, output.height, opts.max_pixels
        )));
    }
    Ok(())
}

struct FrameStream {
    compositor: Compositor,
    renderer: OverlayRenderer,
    output: Size,
    loop_count: Option<LoopCount>,
    opts: PipelineOpts,
    shared_palette: Option<Palette>,
    started: bool,
    frames_written: u64,
}

impl FrameStream {
    fn new(
        payload: &OverlayPayload,
        variant: SignatureVariant,
        opts: &PipelineOpts,
        decoder: &GifDecoder,
    ) -> Self {
        let header = decoder.header();
        Self {
            compositor: Compositor::for_stream(header),
            renderer: OverlayRenderer::new(payload, variant),
            output: payload.output,
            loop_count: opts.loop_override.or(header.loop_count),
            opts: *opts,
            shared_palette: None,
            started: false,
            frames_written: 0,
        }
    }

    fn run(
        &mut self,
        decoder: GifDecoder,
        sink: &mut dyn FrameSink,
        cancel: &CancelFlag,
    ) -> StampResult<()> {
        for (i, frame) in decoder.enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(frame = i, "request cancelled");
                return Err(StampError::Cancelled);
            }
            let frame = frame?;
            let composited = self.compositor.apply(&frame)?;
            let raster = self.renderer.render(&composited);
            let (mut out, global) = self.quantize(&raster);
            out.delay_cs = composited.delay_cs;

            if !self.started {
                sink.begin(SinkConfig {
                    screen: self.output,
                    global_palette: global,
                    loop_count: self.loop_count,
                })?;
                self.started = true;
            }
            tracing::debug!(
                frame = i,
                delay_cs = out.delay_cs,
                disposal = ?out.disposal,
                palette = palette_len(&out, self.shared_palette.as_ref()),
                "frame ready"
            );
            sink.push_frame(FrameIndex(i as u64), &out)?;
            self.frames_written += 1;
        }
        sink.end()
    }

    /// Map `raster` to an output frame. The second value is the shared colour table, returned
    /// only when it is built (first frame with palette reuse).
    fn quantize(&mut self, raster: &image::RgbaImage) -> (OutputFrame, Option<Vec<Rgb8>>) {
        let qopts = self.opts.quantize_opts();
        if !self.opts.palette_reuse {
            let q = quantize(raster, &qopts);
            let frame = output_frame(q.indices, FramePalette::Local(q.palette), q.transparent_index);
            return (frame, None);
        }

        let mut built = None;
        let palette = self.shared_palette.get_or_insert_with(|| {
            let p = Palette::build(raster, &qopts, true);
            built = Some(p.colors().to_vec());
            p
        });
        let QuantizedFrame {
            indices,
            transparent_index,
            ..
        } = palette.quantized(raster);
        (output_frame(indices, FramePalette::Global, transparent_index), built)
    }
}

fn output_frame(indices: Vec<u8>, palette: FramePalette, reserved: Option<u8>) -> OutputFrame {
    let transparent_index = reserved.filter(|t| indices.contains(t));
    let disposal = if transparent_index.is_some() {
        DisposalMethod::RestoreBackground
    } else {
        DisposalMethod::DoNotDispose
    };
    OutputFrame {
        indices,
        palette,
        delay_cs: 0,
        disposal,
        transparent_index,
    }
}

fn palette_len(frame: &OutputFrame, shared: Option<&Palette>) -> usize {
    match &frame.palette {
        FramePalette::Local(p) => p.len(),
        FramePalette::Global => shared.map_or(0, |p| p.colors().len()),
    }
}

fn preview(s: &str) -> &str {
    s.char_indices()
        .nth(LOG_PREVIEW_CHARS)
        .map_or(s, |(i, _)| &s[..i])
}

fn log_request(request: &SignatureRequest, payload: &OverlayPayload) {
    let opt = |v: &Option<String>| v.as_deref().map(preview).unwrap_or_default().to_owned();
    tracing::info!(
        variant = ?request.variant,
        out = %format!("{}x{}", payload.output.width, payload.output.height),
        name = preview(&payload.display_name),
        title = preview(&payload.title),
        phone = preview(&payload.phone),
        department = %opt(&payload.department),
        email = %opt(&payload.email),
        address = %opt(&payload.address),
        source = preview(&request.source),
        "signature request"
    );
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/session.rs"]
mod tests;
