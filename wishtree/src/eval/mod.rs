//! Per-frame evaluation of a compiled card into a [`FrameState`](evaluator::FrameState).

pub mod evaluator;
