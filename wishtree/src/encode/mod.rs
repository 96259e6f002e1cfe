//! Frame sinks.
//!
//! [`sink::FrameSink`] is the contract every output implements. [`ffmpeg::FfmpegSink`] streams
//! into the system `ffmpeg` for MP4, [`png::PngSequenceSink`] writes numbered PNG files.

pub mod ffmpeg;
pub mod png;
pub mod sink;
