use std::path::{Path, PathBuf};

use crate::card::model::Card;
use crate::choreo::choreography::MediaInfo;
use crate::foundation::error::{CardError, CardResult};
use crate::media::ffmpeg::{MediaProbe, decode_video_frames_rgba8, probe_media};
use crate::render::frame::FrameRGBA;

/// Resolve a card asset path against the assets root.
pub fn resolve_asset(assets_root: &Path, rel: &Path) -> PathBuf {
    if rel.is_absolute() {
        rel.to_path_buf()
    } else {
        assets_root.join(rel)
    }
}

/// Song and video as probed before rendering.
///
/// A missing or unreadable file is not a render error: the card shows its error states instead
/// (music button in error, video overlay closing at once).
#[derive(Clone, Debug, Default)]
pub struct PreparedMedia {
    pub song: Option<MediaProbe>,
    pub song_volume: f32,
    pub video: Option<MediaProbe>,
    pub video_volume: f32,
}

impl PreparedMedia {
    #[tracing::instrument(skip_all, fields(root = %assets_root.display()))]
    pub fn prepare(card: &Card, assets_root: &Path) -> Self {
        let probe = |what: &str, rel: Option<&PathBuf>| -> Option<MediaProbe> {
            let rel = rel?;
            let path = resolve_asset(assets_root, rel);
            match probe_media(&path) {
                Ok(p) => {
                    tracing::debug!(
                        what,
                        path = %path.display(),
                        duration = p.duration_secs,
                        "media probed"
                    );
                    Some(p)
                }
                Err(e) => {
                    tracing::warn!(what, path = %path.display(), error = %e, "media unavailable");
                    None
                }
            }
        };

        let song = probe("song", card.song.path.as_ref()).filter(|p| p.has_audio);
        let video = probe("video", card.video.path.as_ref()).filter(|p| {
            let ok = p.video_size.is_some();
            if !ok {
                tracing::warn!(path = %p.source_path.display(), "video file has no video stream");
            }
            ok
        });

        Self {
            song,
            song_volume: card.song.volume as f32,
            video,
            video_volume: card.video.volume as f32,
        }
    }

    pub fn info(&self) -> MediaInfo {
        MediaInfo {
            song_duration: self.song.as_ref().map(|p| p.duration_secs),
            video_duration: self.video.as_ref().map(|p| p.duration_secs),
        }
    }

    /// Video picture `local_time` seconds into playback, held on its last frame.
    pub fn video_frame(&self, local_time: f64) -> CardResult<Option<FrameRGBA>> {
        let Some(video) = &self.video else {
            return Ok(None);
        };
        let Some((width, height)) = video.video_size else {
            return Ok(None);
        };
        let t = local_time.clamp(0.0, (video.duration_secs - 0.05).max(0.0));
        let mut frames = decode_video_frames_rgba8(video, t, 1)?;
        let data = frames.pop().ok_or_else(|| {
            CardError::media(format!(
                "ffmpeg returned no video frames for '{}' at {t:.3}s",
                video.source_path.display()
            ))
        })?;
        Ok(Some(FrameRGBA {
            width,
            height,
            data,
            premultiplied: true,
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/prepared.rs"]
mod tests;
