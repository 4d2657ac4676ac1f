use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use base64::Engine as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gifstamp", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stamp a signature onto every frame of an animated GIF.
    Render(RenderArgs),
    /// Print the structure of a GIF as JSON.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Overlay payload JSON (name, title, phone, ...).
    #[arg(long)]
    payload: PathBuf,

    /// Source GIF path. Defaults to the payload's `gifUrl`, relative to the payload file.
    #[arg(long)]
    source: Option<PathBuf>,

    /// QR image file; replaces the payload's `qrCodeData`.
    #[arg(long)]
    qr: Option<PathBuf>,

    /// Output GIF path, or `-` for stdout.
    #[arg(long)]
    out: PathBuf,

    /// Signature layout.
    #[arg(long, value_enum, default_value_t = VariantChoice::Standard)]
    variant: VariantChoice,

    /// Quantizer sampling stride (1 = best, 30 = fastest).
    #[arg(long, default_value_t = 1)]
    quality: u8,

    /// Minimum frame delay in centiseconds.
    #[arg(long, default_value_t = 2)]
    min_delay: u16,

    /// Compute one palette from the first frame and reuse it for every frame.
    #[arg(long)]
    palette_reuse: bool,

    /// Repeat count to write (0 = forever). Defaults to the source's.
    #[arg(long)]
    loop_count: Option<u16>,

    /// Maximum number of source frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Maximum decoded source pixel volume.
    #[arg(long)]
    max_pixels: Option<u64>,

    /// Maximum width or height, source and output.
    #[arg(long)]
    max_dimension: Option<u32>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// GIF to inspect.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantChoice {
    Standard,
    WithQr,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn read_payload(path: &Path) -> anyhow::Result<gifstamp::PayloadFields> {
    let f = File::open(path).with_context(|| format!("open payload '{}'", path.display()))?;
    let fields = serde_json::from_reader(BufReader::new(f)).context("parse payload JSON")?;
    Ok(fields)
}

fn qr_data_url(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("read qr '{}'", path.display()))?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:application/octet-stream;base64,{b64}"))
}

fn pipeline_opts(args: &RenderArgs) -> gifstamp::PipelineOpts {
    let defaults = gifstamp::PipelineOpts::default();
    gifstamp::PipelineOpts {
        quality: args.quality,
        min_delay_cs: args.min_delay,
        palette_reuse: args.palette_reuse,
        max_frames: args.max_frames.unwrap_or(defaults.max_frames),
        max_pixels: args.max_pixels.unwrap_or(defaults.max_pixels),
        max_dimension: args.max_dimension.unwrap_or(defaults.max_dimension),
        loop_override: args.loop_count.map(gifstamp::LoopCount::from_stored),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let opts = pipeline_opts(&args);
    let mut fields = read_payload(&args.payload)?;
    if let Some(qr) = &args.qr {
        fields.qr_code_data = Some(qr_data_url(qr)?);
    }

    let payload_dir = args.payload.parent().unwrap_or_else(|| Path::new("."));
    let (fetcher, source) = match (&args.source, &fields.source) {
        (Some(path), _) => (gifstamp::FileFetcher::new(), path.display().to_string()),
        (None, Some(loc)) => (gifstamp::FileFetcher::with_root(payload_dir), loc.clone()),
        (None, None) => anyhow::bail!("no source: pass --source or set gifUrl in the payload"),
    };

    let request = gifstamp::SignatureRequest {
        source,
        payload: fields,
        variant: match args.variant {
            VariantChoice::Standard => gifstamp::SignatureVariant::Standard,
            VariantChoice::WithQr => gifstamp::SignatureVariant::WithQr,
        },
    };
    let cancel = gifstamp::CancelFlag::new();

    let stats = if args.out == Path::new("-") {
        let stdout = std::io::stdout();
        let mut w = BufWriter::new(stdout.lock());
        let stats = gifstamp::render_signature_to_writer(&request, &fetcher, &opts, &mut w, &cancel)?;
        w.flush().context("flush stdout")?;
        stats
    } else {
        if let Some(parent) = args.out.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        let f = File::create(&args.out)
            .with_context(|| format!("create output '{}'", args.out.display()))?;
        let mut w = BufWriter::new(f);
        let stats = gifstamp::render_signature_to_writer(&request, &fetcher, &opts, &mut w, &cancel)
            .with_context(|| format!("render '{}'", args.out.display()))?;
        w.flush()
            .with_context(|| format!("flush '{}'", args.out.display()))?;
        eprintln!(
            "wrote {} ({} frames, {} bytes)",
            args.out.display(),
            stats.frames_written,
            stats.bytes_written
        );
        stats
    };
    tracing::debug!(?stats, "done");
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read '{}'", args.in_path.display()))?;
    let summary = gifstamp::inspect_source(bytes, &gifstamp::DecodeLimits::default())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("serialize summary")?
    );
    Ok(())
}
