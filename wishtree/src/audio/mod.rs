pub mod manifest;
pub mod mix;
