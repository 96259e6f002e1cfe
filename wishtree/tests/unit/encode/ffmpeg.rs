use super::*;
use crate::encode::sink::AudioInputConfig;

fn cfg(audio: Option<AudioInputConfig>) -> SinkConfig {
    SinkConfig {
        width: 64,
        height: 48,
        fps: Fps { num: 30000, den: 1001 },
        audio,
    }
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn video_only_args_disable_audio() {
    let args = ffmpeg_args(&cfg(None), Path::new("out/card.mp4")).unwrap();
    let joined = args.join(" ");
    assert!(joined.contains("-s 64x48 -r 30000/1001 -i pipe:0"));
    assert!(joined.contains("-an -c:v libx264 -pix_fmt yuv420p"));
    assert_eq!(args.last().map(String::as_str), Some("out/card.mp4"));
}

#[test]
fn audio_args_add_the_pcm_input_and_aac() {
    let audio = AudioInputConfig {
        path: PathBuf::from("/tmp/mix.f32le"),
        sample_rate: 48_000,
        channels: 2,
    };
    let joined = ffmpeg_args(&cfg(Some(audio)), Path::new("card.mp4"))
        .unwrap()
        .join(" ");
    assert!(joined.contains("-f f32le -ar 48000 -ac 2 -i /tmp/mix.f32le"));
    assert!(joined.contains("-c:a aac -shortest"));
    assert!(!joined.contains("-an"));
}

#[test]
fn zero_rate_audio_is_rejected() {
    let audio = AudioInputConfig {
        path: PathBuf::from("mix.f32le"),
        sample_rate: 0,
        channels: 2,
    };
    assert!(ffmpeg_args(&cfg(Some(audio)), Path::new("card.mp4")).is_err());
}

#[test]
fn odd_dimensions_are_rejected_before_spawning() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(std::env::temp_dir().join("odd.mp4")));
    let mut c = cfg(None);
    c.width = 63;
    let err = sink.begin(c).unwrap_err();
    assert!(err.to_string().contains("even"));
}

#[test]
fn pushing_before_begin_fails() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("never.mp4"));
    assert!(sink.push_frame(FrameIndex(0), &FrameRGBA::new(2, 2)).is_err());
    assert!(sink.end().is_err());
}
