//! Card documents: canvas, timing, assets, scene knobs, and the interaction script.

pub mod model;
pub mod script;
