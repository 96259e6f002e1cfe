use std::sync::Arc;

use crate::choreo::choreography::Choreography;
use crate::foundation::core::{Fps, FrameRange};
use crate::foundation::error::{CardError, CardResult};
use crate::media::ffmpeg::{AudioPcm, MIX_SAMPLE_RATE, decode_audio_f32_stereo};
use crate::media::prepared::PreparedMedia;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    Song,
    Video,
}

/// A stretch of card time that plays one source from a given position.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct PlannedSegment {
    pub source: AudioSource,
    pub start_sec: f64,
    pub end_sec: f64,
    pub source_start_sec: f64,
}

/// One scheduled audio contribution in output sample space.
#[derive(Clone, Debug)]
pub struct AudioSegment {
    pub timeline_start_sample: u64,
    pub timeline_end_sample: u64,
    pub source_start_sec: f64,
    pub volume: f32,
    pub pcm: Arc<AudioPcm>,
}

/// Audio mixing plan for a frame range.
#[derive(Clone, Debug)]
pub struct AudioManifest {
    pub sample_rate: u32,
    pub channels: u16,
    pub total_samples: u64,
    pub segments: Vec<AudioSegment>,
}

/// Every audible stretch in `[from, to)` card seconds.
///
/// Song play intervals are split where the song loops back to its start.
pub fn plan_audio(choreo: &Choreography, from: f64, to: f64) -> Vec<PlannedSegment> {
    let mut out = Vec::new();

    if let Some(dur) = choreo.music.song_duration.filter(|d| *d > 0.0) {
        for iv in &choreo.music.intervals {
            let mut at = iv.start;
            let mut pos = iv.offset.rem_euclid(dur);
            while at < iv.end {
                let end = if iv.end - at <= dur - pos {
                    iv.end
                } else {
                    at + (dur - pos)
                };
                out.push(PlannedSegment {
                    source: AudioSource::Song,
                    start_sec: at,
                    end_sec: end,
                    source_start_sec: pos,
                });
                at = end;
                pos = 0.0;
            }
        }
    }

    for ep in choreo.videos.iter().filter(|v| v.playable && v.end > v.start) {
        out.push(PlannedSegment {
            source: AudioSource::Video,
            start_sec: ep.start,
            end_sec: ep.end,
            source_start_sec: 0.0,
        });
    }

    out.into_iter()
        .filter_map(|seg| {
            let start = seg.start_sec.max(from);
            let end = seg.end_sec.min(to);
            (end > start).then(|| PlannedSegment {
                start_sec: start,
                end_sec: end,
                source_start_sec: seg.source_start_sec + (start - seg.start_sec),
                ..seg
            })
        })
        .collect()
}

/// Convert a frame delta to the nearest sample index at `sample_rate`.
pub fn frame_to_sample(frame_delta: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frame_delta) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

fn sec_to_sample(secs: f64, sample_rate: u32) -> u64 {
    (secs * f64::from(sample_rate)).round().max(0.0) as u64
}

/// Build the mix plan for `range`, decoding the sources that are actually heard.
///
/// Returns `None` when nothing is audible in the range.
#[tracing::instrument(skip_all, fields(start = range.start.0, end = range.end.0))]
pub fn build_audio_manifest(
    choreo: &Choreography,
    media: &PreparedMedia,
    fps: Fps,
    range: FrameRange,
) -> CardResult<Option<AudioManifest>> {
    if range.is_empty() {
        return Err(CardError::validation(
            "audio manifest range must be non-empty",
        ));
    }
    let from = fps.frames_to_secs(range.start.0);
    let to = fps.frames_to_secs(range.end.0);
    let planned = plan_audio(choreo, from, to);
    if planned.is_empty() {
        return Ok(None);
    }

    let mut song_pcm: Option<Arc<AudioPcm>> = None;
    let mut video_pcm: Option<Arc<AudioPcm>> = None;
    let mut segments = Vec::with_capacity(planned.len());

    for seg in planned {
        let (probe, volume, cache) = match seg.source {
            AudioSource::Song => (&media.song, media.song_volume, &mut song_pcm),
            AudioSource::Video => (&media.video, media.video_volume, &mut video_pcm),
        };
        let Some(probe) = probe else {
            continue;
        };
        if !probe.has_audio {
            continue;
        }
        let pcm = match cache {
            Some(pcm) => Arc::clone(pcm),
            None => {
                let pcm = Arc::new(decode_audio_f32_stereo(&probe.source_path, MIX_SAMPLE_RATE)?);
                *cache = Some(Arc::clone(&pcm));
                pcm
            }
        };
        segments.push(AudioSegment {
            timeline_start_sample: sec_to_sample(seg.start_sec - from, MIX_SAMPLE_RATE),
            timeline_end_sample: sec_to_sample(seg.end_sec - from, MIX_SAMPLE_RATE),
            source_start_sec: seg.source_start_sec,
            volume,
            pcm,
        });
    }

    if segments.is_empty() {
        return Ok(None);
    }
    tracing::debug!(segments = segments.len(), "audio manifest built");
    Ok(Some(AudioManifest {
        sample_rate: MIX_SAMPLE_RATE,
        channels: 2,
        total_samples: frame_to_sample(range.len_frames(), fps, MIX_SAMPLE_RATE),
        segments,
    }))
}

#[cfg(test)]
#[path = "../../tests/unit/audio/manifest.rs"]
mod tests;
