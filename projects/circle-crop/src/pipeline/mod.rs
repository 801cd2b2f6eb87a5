// Frame pipeline: detection, calibration, transform and playback

pub mod annotate;
pub mod crop;
pub mod detection;
pub mod geometry;
pub mod orchestrator;
pub mod types;
