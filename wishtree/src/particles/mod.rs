//! Static particle fields and their per-frame displacement functions.

pub mod displace;
pub mod fields;
