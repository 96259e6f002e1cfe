pub mod ffmpeg;
pub mod prepared;
