//! Timestamped lyric sheets and playback-time lookup.

pub mod sheet;
