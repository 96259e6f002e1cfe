use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "wishtree", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a numbered PNG sequence.
    Frames(FramesArgs),
    /// Print the compiled choreography (or one evaluated frame) as JSON.
    Timeline(TimelineArgs),
    /// Print a parsed lyric sheet, or the line active at a song position.
    Lyrics(LyricsArgs),
}

#[derive(Args, Debug)]
struct CardArgs {
    /// Input card JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory card asset paths resolve against. Defaults to the card's directory.
    #[arg(long)]
    assets: Option<PathBuf>,
}

impl CardArgs {
    fn load(&self) -> anyhow::Result<wishtree::Card> {
        Ok(wishtree::Card::from_path(&self.in_path)?)
    }

    fn assets_root(&self) -> &Path {
        self.assets.as_deref().unwrap_or_else(|| {
            self.in_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
        })
    }
}

#[derive(Args, Debug)]
struct RangeArgs {
    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Render chunk size.
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    /// First frame to render (inclusive).
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Frame to stop at (exclusive). Defaults to the card duration.
    #[arg(long)]
    end: Option<u64>,
}

impl RangeArgs {
    fn opts(&self, enable_audio: bool) -> wishtree::RenderSessionOpts {
        wishtree::RenderSessionOpts {
            parallel: self.parallel,
            chunk_size: self.chunk_size,
            threads: self.threads,
            enable_audio,
            ..Default::default()
        }
    }

    fn range(&self, card: &wishtree::Card) -> anyhow::Result<wishtree::FrameRange> {
        Ok(wishtree::FrameRange::new(
            wishtree::FrameIndex(self.start),
            wishtree::FrameIndex(self.end.unwrap_or(card.duration)),
        )?)
    }
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    card: CardArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    card: CardArgs,

    #[command(flatten)]
    range: RangeArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Fail instead of replacing an existing output file.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    /// Disable audio mixing for this render.
    #[arg(long, default_value_t = false)]
    no_audio: bool,
}

#[derive(Args, Debug)]
struct FramesArgs {
    #[command(flatten)]
    card: CardArgs,

    #[command(flatten)]
    range: RangeArgs,

    /// Output directory for the PNG files.
    #[arg(long)]
    out_dir: PathBuf,

    /// File name prefix; files are named `<prefix><frame:05>.png`.
    #[arg(long, default_value = "frame_")]
    prefix: String,
}

#[derive(Args, Debug)]
struct TimelineArgs {
    #[command(flatten)]
    card: CardArgs,

    /// Print the evaluated frame state at this card time (seconds) instead.
    #[arg(long)]
    at: Option<f64>,
}

#[derive(Args, Debug)]
struct LyricsArgs {
    /// Lyric file (`MM:SS` line then text line). Uses the built-in sheet when omitted.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Print only the line active at this song position (seconds).
    #[arg(long)]
    at: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    initialise_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Timeline(args) => cmd_timeline(args),
        Command::Lyrics(args) => cmd_lyrics(args),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let card = args.card.load()?;
    let sess = wishtree::RenderSession::new(
        &card,
        args.card.assets_root(),
        wishtree::RenderSessionOpts::default(),
    )?;
    let frame = sess.render_frame(wishtree::FrameIndex(args.frame))?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    wishtree::write_png(&args.out, &frame)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let card = args.card.load()?;
    let sess = wishtree::RenderSession::new(
        &card,
        args.card.assets_root(),
        args.range.opts(!args.no_audio),
    )?;

    let mut sink_opts = wishtree::FfmpegSinkOpts::new(&args.out);
    sink_opts.overwrite = !args.no_overwrite;
    let mut sink = wishtree::FfmpegSink::new(sink_opts);

    let stats = sess.render_range(args.range.range(&card)?, &mut sink)?;
    tracing::info!(
        frames = stats.frames_total,
        video_frames = stats.video_frames,
        audio_segments = stats.audio_segments,
        "render finished"
    );

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let card = args.card.load()?;
    let sess = wishtree::RenderSession::new(
        &card,
        args.card.assets_root(),
        args.range.opts(false),
    )?;

    let mut sink = wishtree::PngSequenceSink::new(&args.out_dir, args.prefix.clone());
    let stats = sess.render_range(args.range.range(&card)?, &mut sink)?;

    eprintln!(
        "wrote {} frames to {}",
        stats.frames_total,
        args.out_dir.display()
    );
    Ok(())
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<()> {
    let card = args.card.load()?;
    let opts = wishtree::RenderSessionOpts {
        enable_audio: false,
        ..Default::default()
    };
    let sess = wishtree::RenderSession::new(&card, args.card.assets_root(), opts)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.at {
        Some(t) => serde_json::to_writer_pretty(&mut out, &sess.evaluator().eval_time(t))?,
        None => serde_json::to_writer_pretty(&mut out, sess.choreography())?,
    }
    writeln!(out)?;
    Ok(())
}

fn cmd_lyrics(args: LyricsArgs) -> anyhow::Result<()> {
    let sheet = match &args.file {
        Some(path) => wishtree::LyricSheet::from_path(path)?,
        None => wishtree::LyricSheet::builtin(),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.at {
        Some(t) => match sheet.line_at(t) {
            Some(line) => writeln!(out, "{}", line.text)?,
            None => tracing::info!(at = t, "no lyric line yet"),
        },
        None => {
            for line in sheet.lines() {
                let secs = line.time.max(0.0) as u64;
                writeln!(out, "{:02}:{:02}  {}", secs / 60, secs % 60, line.text)?;
            }
        }
    }
    Ok(())
}
