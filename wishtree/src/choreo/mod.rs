//! Compiling a card's interaction script into a time-indexed choreography.

pub mod choreography;
pub mod music;
pub(crate) mod queue;
pub mod timelines;
