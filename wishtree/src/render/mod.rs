pub mod camera;
pub mod composite;
pub mod cpu;
pub mod frame;
pub mod overlay;
pub mod post;
pub mod splat;
