use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, mpsc};

use rayon::prelude::*;

use crate::audio::manifest::build_audio_manifest;
use crate::audio::mix::{mix_manifest, write_mix_to_f32le_file};
use crate::card::model::Card;
use crate::choreo::choreography::Choreography;
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::eval::evaluator::{Evaluator, FrameState};
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::error::{CardError, CardResult};
use crate::lyrics::sheet::LyricSheet;
use crate::media::prepared::{PreparedMedia, resolve_asset};
use crate::particles::fields::Fields;
use crate::render::cpu::{CpuRenderer, RenderSettings};
use crate::render::frame::FrameRGBA;
use crate::render::overlay::{Overlay, UiLayout, build_fontdb};

const MAX_REORDER_BUFFER_BYTES: u64 = 128 * 1024 * 1024;
const SINK_CLOSED: &str = "encoder thread is not accepting frames";

/// Options controlling `RenderSession` range rendering behavior.
#[derive(Clone, Debug)]
pub struct RenderSessionOpts {
    /// Enable frame-level parallelism (rayon), using a dedicated thread pool.
    pub parallel: bool,
    /// Chunk size used by the render->encode streaming pipeline.
    pub chunk_size: usize,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Bounded channel capacity between render workers and the encoder thread.
    pub channel_capacity: usize,
    /// Mix the song and video soundtrack for `render_range`.
    pub enable_audio: bool,
    /// Camera rig and post-processing.
    pub render: RenderSettings,
}

impl Default for RenderSessionOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
            channel_capacity: 4,
            enable_audio: true,
            render: RenderSettings::default(),
        }
    }
}

/// Range render statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Total frames pushed to the sink.
    pub frames_total: u64,
    /// Frames that composited a decoded video picture.
    pub video_frames: u64,
    /// Audio segments mixed into the soundtrack.
    pub audio_segments: u64,
}

/// Session-oriented renderer for one card.
///
/// A session front-loads media probing, choreography compilation and particle generation, then
/// renders single frames or streams ranges. Every frame is a pure function of the card, the
/// probed media and the frame index.
pub struct RenderSession {
    card: Card,
    assets_root: PathBuf,
    media: PreparedMedia,
    eval: Evaluator,
    renderer: CpuRenderer,
    opts: RenderSessionOpts,
}

impl RenderSession {
    /// Validate `card` and prepare everything needed to render it.
    ///
    /// Asset paths in the card resolve against `assets_root`. Missing media is not an error; the
    /// card plays its error states instead.
    #[tracing::instrument(skip_all, fields(root = %assets_root.as_ref().display()))]
    pub fn new(
        card: &Card,
        assets_root: impl AsRef<Path>,
        opts: RenderSessionOpts,
    ) -> CardResult<Self> {
        card.validate()?;
        let assets_root = assets_root.as_ref().to_path_buf();

        let media = PreparedMedia::prepare(card, &assets_root);
        let choreo = Choreography::compile(card, &media.info())?;
        let lyrics = match &card.song.lyrics {
            Some(rel) => LyricSheet::from_path(&resolve_asset(&assets_root, rel))?,
            None => LyricSheet::builtin(),
        };
        let eval = Evaluator::new(
            choreo,
            lyrics,
            card.fps,
            card.duration,
            card.scene.auto_rotate,
        );

        let fields = Arc::new(Fields::generate(card.seed, &card.scene));
        let overlay = Overlay::new(
            UiLayout {
                canvas: card.canvas,
                pixel_ratio: card.scene.pixel_ratio,
            },
            card.title.clone(),
            build_fontdb(&assets_root),
        );
        let renderer = CpuRenderer::new(card.canvas, fields, overlay, opts.render);

        tracing::info!(
            frames = card.duration,
            points = renderer.fields().point_count(),
            song = media.song.is_some(),
            video = media.video.is_some(),
            "render session ready"
        );
        Ok(Self {
            card: card.clone(),
            assets_root,
            media,
            eval,
            renderer,
            opts,
        })
    }

    pub fn card(&self) -> &Card {
        &self.card
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    pub fn media(&self) -> &PreparedMedia {
        &self.media
    }

    pub fn choreography(&self) -> &Choreography {
        self.eval.choreography()
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.eval
    }

    /// Full card length as a frame range.
    pub fn full_range(&self) -> FrameRange {
        FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(self.card.duration),
        }
    }

    /// Evaluate a frame without rasterizing it.
    pub fn eval_frame(&self, frame: FrameIndex) -> CardResult<FrameState> {
        self.eval.eval_frame(frame)
    }

    /// Render a single frame.
    pub fn render_frame(&self, frame: FrameIndex) -> CardResult<FrameRGBA> {
        if frame.0 >= self.card.duration {
            return Err(CardError::validation(
                "render_frame frame must be within card duration",
            ));
        }
        Ok(render_one(&self.eval, &self.renderer, &self.media, frame)?.0)
    }

    /// Render a frame range and stream frames into a sink.
    ///
    /// The sink receives frames in strictly increasing frame index order. When `parallel` is
    /// enabled, out-of-order worker completion is deterministically reordered at the sink boundary
    /// (bounded channel backpressure).
    pub fn render_range(
        &self,
        range: FrameRange,
        sink: &mut dyn FrameSink,
    ) -> CardResult<RenderStats> {
        if range.is_empty() {
            return Err(CardError::validation(
                "render_range range must be non-empty",
            ));
        }
        if range.end.0 > self.card.duration {
            return Err(CardError::validation(
                "render_range range must be within card duration",
            ));
        }

        let mut stats = RenderStats::default();
        let mut audio_tmp = TempFileGuard(None);
        let audio_cfg = if self.opts.enable_audio {
            match build_audio_manifest(
                self.eval.choreography(),
                &self.media,
                self.card.fps,
                range,
            )? {
                None => None,
                Some(manifest) => {
                    let mixed = mix_manifest(&manifest);
                    let path = std::env::temp_dir().join(format!(
                        "wishtree_audio_mix_{}_{}.f32le",
                        std::process::id(),
                        std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .map(|d| d.as_nanos())
                            .unwrap_or(0)
                    ));
                    write_mix_to_f32le_file(&mixed, &path)?;
                    audio_tmp.0 = Some(path.clone());
                    stats.audio_segments = manifest.segments.len() as u64;
                    Some(AudioInputConfig {
                        path,
                        sample_rate: manifest.sample_rate,
                        channels: manifest.channels,
                    })
                }
            }
        } else {
            None
        };

        let cfg = SinkConfig {
            width: self.card.canvas.width,
            height: self.card.canvas.height,
            fps: self.card.fps,
            audio: audio_cfg,
        };

        let cap = self.opts.channel_capacity.max(1);
        let bytes_per_frame = u64::from(cfg.width)
            .saturating_mul(u64::from(cfg.height))
            .saturating_mul(4)
            .max(1);
        let max_chunk_by_mem = (MAX_REORDER_BUFFER_BYTES / bytes_per_frame).max(1);

        let mut chunk_size = normalized_chunk_size(self.opts.chunk_size).min(max_chunk_by_mem);
        chunk_size = chunk_size.min(range.len_frames());

        let pool = if self.opts.parallel {
            Some(build_thread_pool(self.opts.threads)?)
        } else {
            None
        };

        let video_frames = AtomicU64::new(0);
        let ctx = ChunkCtx {
            eval: &self.eval,
            renderer: &self.renderer,
            media: &self.media,
            video_frames: &video_frames,
        };

        tracing::info!(
            start = range.start.0,
            end = range.end.0,
            parallel = self.opts.parallel,
            chunk_size,
            audio = cfg.audio.is_some(),
            "render range"
        );

        // Encoder thread: enforce in-order delivery to the sink regardless of render completion
        // order.
        std::thread::scope(|scope| -> CardResult<RenderStats> {
            let (tx, rx) = mpsc::sync_channel::<FrameMsg>(cap);
            let range_start = range.start.0;
            let range_end = range.end.0;
            let sink_ref: &mut dyn FrameSink = sink;

            let enc = scope.spawn(move || -> CardResult<()> {
                sink_ref.begin(cfg)?;

                let mut next = range_start;
                let mut pending = HashMap::<u64, FrameRGBA>::new();
                while next < range_end {
                    if let Some(frame) = pending.remove(&next) {
                        sink_ref.push_frame(FrameIndex(next), &frame)?;
                        next += 1;
                        continue;
                    }

                    let msg = rx.recv().map_err(|_| {
                        CardError::evaluation("encoder channel disconnected unexpectedly")
                    })?;
                    pending.insert(msg.idx.0, msg.frame);

                    while let Some(frame) = pending.remove(&next) {
                        sink_ref.push_frame(FrameIndex(next), &frame)?;
                        next += 1;
                        if next >= range_end {
                            break;
                        }
                    }
                }

                sink_ref.end()?;
                Ok(())
            });

            let produce_res = (|| -> CardResult<()> {
                let mut chunk_start = range_start;
                while chunk_start < range_end {
                    let chunk_end = (chunk_start + chunk_size).min(range_end);
                    match pool.as_ref() {
                        Some(pool) => {
                            render_chunk_parallel(&ctx, pool, &tx, chunk_start, chunk_end)?
                        }
                        None => {
                            for f in chunk_start..chunk_end {
                                send_frame(&ctx, &tx, f)?;
                            }
                        }
                    }
                    chunk_start = chunk_end;
                }
                Ok(())
            })();

            drop(tx);
            let enc_res = enc
                .join()
                .map_err(|_| CardError::evaluation("encoder thread panicked"))?;

            match (produce_res, enc_res) {
                (Err(CardError::Evaluation(msg)), Err(e)) if msg == SINK_CLOSED => return Err(e),
                (Err(e), _) | (Ok(()), Err(e)) => return Err(e),
                (Ok(()), Ok(())) => {}
            }

            stats.frames_total = range.len_frames();
            stats.video_frames = video_frames.load(Ordering::Relaxed);
            tracing::info!(
                frames = stats.frames_total,
                video_frames = stats.video_frames,
                "render range done"
            );
            Ok(stats)
        })
    }
}

#[derive(Debug)]
struct FrameMsg {
    idx: FrameIndex,
    frame: FrameRGBA,
}

#[derive(Clone, Copy)]
struct ChunkCtx<'a> {
    eval: &'a Evaluator,
    renderer: &'a CpuRenderer,
    media: &'a PreparedMedia,
    video_frames: &'a AtomicU64,
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

fn build_thread_pool(threads: Option<usize>) -> CardResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(CardError::validation(
            "render_range 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| CardError::evaluation(format!("failed to build rayon thread pool: {e}")))
}

/// Evaluate and draw one frame. The flag reports whether a video picture was composited.
fn render_one(
    eval: &Evaluator,
    renderer: &CpuRenderer,
    media: &PreparedMedia,
    frame: FrameIndex,
) -> CardResult<(FrameRGBA, bool)> {
    let state = eval.eval_frame(frame)?;
    let video = state.video.and_then(|v| {
        match media.video_frame(v.local_time) {
            Ok(pic) => pic,
            Err(e) => {
                tracing::warn!(frame = frame.0, error = %e, "video frame unavailable");
                None
            }
        }
    });
    let out = renderer.render(&state, video.as_ref())?;
    Ok((out, video.is_some()))
}

fn send_frame(ctx: &ChunkCtx<'_>, tx: &mpsc::SyncSender<FrameMsg>, f: u64) -> CardResult<()> {
    let idx = FrameIndex(f);
    let (frame, had_video) = render_one(ctx.eval, ctx.renderer, ctx.media, idx)?;
    if had_video {
        ctx.video_frames.fetch_add(1, Ordering::Relaxed);
    }
    tx.send(FrameMsg { idx, frame })
        .map_err(|_| CardError::evaluation(SINK_CLOSED))
}

fn render_chunk_parallel(
    ctx: &ChunkCtx<'_>,
    pool: &rayon::ThreadPool,
    tx: &mpsc::SyncSender<FrameMsg>,
    start: u64,
    end: u64,
) -> CardResult<()> {
    pool.install(|| {
        (start..end).into_par_iter().try_for_each_init(
            || tx.clone(),
            |tx, f| send_frame(ctx, tx, f),
        )
    })
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_session.rs"]
mod tests;
