//! Session-oriented rendering: compile a card once, then render frames or stream ranges.

pub mod render_session;
