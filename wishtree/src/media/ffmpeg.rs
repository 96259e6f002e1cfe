use std::path::{Path, PathBuf};

use crate::foundation::error::{CardError, CardResult};

/// Sample rate of the audio mix and of every decoded source.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// What `ffprobe` reports about a song or video file.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaProbe {
    pub source_path: PathBuf,
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// Size of the first video stream, if any.
    pub video_size: Option<(u32, u32)>,
    pub has_audio: bool,
}

/// Decoded interleaved floating-point PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.max(1))
    }
}

#[cfg(feature = "media-ffmpeg")]
pub fn probe_media(source_path: &Path) -> CardResult<MediaProbe> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| CardError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(CardError::media(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| CardError::media(format!("ffprobe json parse failed: {e}")))?;

    let secs = |s: &Option<String>| s.as_deref().and_then(|v| v.trim().parse::<f64>().ok());
    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| secs(&f.duration))
        .or_else(|| parsed.streams.iter().find_map(|s| secs(&s.duration)))
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| {
            CardError::media(format!(
                "ffprobe reported no duration for '{}'",
                source_path.display()
            ))
        })?;

    let video_size = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .and_then(|s| Some((s.width?, s.height?)));
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(MediaProbe {
        source_path: source_path.to_path_buf(),
        duration_secs,
        video_size,
        has_audio,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Returns an error when the `media-ffmpeg` feature is disabled.
pub fn probe_media(_source_path: &Path) -> CardResult<MediaProbe> {
    Err(CardError::media(
        "song/video assets require the 'media-ffmpeg' feature",
    ))
}

/// Decode up to `frame_count` sequential RGBA frames starting at `start_time_sec`.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_video_frames_rgba8(
    source: &MediaProbe,
    start_time_sec: f64,
    frame_count: u32,
) -> CardResult<Vec<Vec<u8>>> {
    if frame_count == 0 {
        return Ok(Vec::new());
    }
    let Some((width, height)) = source.video_size else {
        return Err(CardError::media(format!(
            "'{}' has no video stream",
            source.source_path.display()
        )));
    };

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{start_time_sec:.9}")])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            &frame_count.to_string(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| CardError::media(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(CardError::media(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = width as usize * height as usize * 4;
    if expected_len == 0 {
        return Err(CardError::media(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if !out.stdout.len().is_multiple_of(expected_len) {
        return Err(CardError::media(format!(
            "decoded video batch has invalid size: got {} bytes, expected multiples of {expected_len}",
            out.stdout.len()
        )));
    }

    Ok(out
        .stdout
        .chunks_exact(expected_len)
        .take(frame_count as usize)
        .map(<[u8]>::to_vec)
        .collect())
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Returns an error when the `media-ffmpeg` feature is disabled.
pub fn decode_video_frames_rgba8(
    _source: &MediaProbe,
    _start_time_sec: f64,
    _frame_count: u32,
) -> CardResult<Vec<Vec<u8>>> {
    Err(CardError::media(
        "song/video assets require the 'media-ffmpeg' feature",
    ))
}

/// Decode the audio of a song or video to stereo interleaved `f32` PCM.
///
/// A file without an audio stream decodes to empty PCM.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> CardResult<AudioPcm> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| CardError::media(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        if msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
            || msg.contains("does not contain any stream")
        {
            return Ok(AudioPcm {
                sample_rate,
                channels: 2,
                interleaved_f32: Vec::new(),
            });
        }
        return Err(CardError::media(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    pcm_from_f32le(&out.stdout, sample_rate, 2)
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Returns an error when the `media-ffmpeg` feature is disabled.
pub fn decode_audio_f32_stereo(_path: &Path, _sample_rate: u32) -> CardResult<AudioPcm> {
    Err(CardError::media(
        "song/video assets require the 'media-ffmpeg' feature",
    ))
}

/// Parse raw little-endian `f32` samples.
pub fn pcm_from_f32le(bytes: &[u8], sample_rate: u32, channels: u16) -> CardResult<AudioPcm> {
    if !bytes.len().is_multiple_of(4) {
        return Err(CardError::media(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(AudioPcm {
        sample_rate,
        channels,
        interleaved_f32: bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    })
}

/// `true` when an `ffmpeg` binary is runnable from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

#[cfg(test)]
#[path = "../../tests/unit/media/ffmpeg.rs"]
mod tests;
