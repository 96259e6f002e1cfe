//! Easing, keyframe tracks, timeline sequences, and curve helpers.

pub mod bezier;
pub mod ease;
pub mod keyframes;
pub mod sequence;
