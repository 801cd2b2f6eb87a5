pub mod calibration;
pub mod opencv_reader;
pub mod opencv_writer;
pub mod processor;

use crate::pipeline::types::StreamMetadata;
use anyhow::Result;
use opencv::core::Mat;

/// Sequential frame source with an absolute seek.
pub trait VideoReader {
    fn frame_count(&self) -> Result<usize>;
    fn source_fps(&self) -> Result<f64>;
    /// Next frame in decode order, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<Mat>>;
    /// Zero-based; affects the following `next_frame`.
    fn seek_to_frame(&mut self, frame_num: usize) -> Result<()>;

    fn metadata(&self) -> Result<StreamMetadata> {
        Ok(StreamMetadata::new(self.frame_count()?, self.source_fps()?))
    }
}

/// Append-only encoder for transformed frames.
pub trait FrameSink {
    fn write(&mut self, frame: &Mat) -> Result<()>;
    /// Finalizes the artifact. Calls after the first are no-ops.
    fn close(&mut self) -> Result<()>;
}
