use super::FrameSink;
use anyhow::{anyhow, Context, Result};
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::VideoWriter,
};

/// `mp4v` encoder at the source's native rate.
pub struct OpencvWriter {
    writer: VideoWriter,
    path: String,
    frame_size: Size,
    frames_written: usize,
    closed: bool,
}

impl OpencvWriter {
    pub fn new(path: &str, fps: f64, frame_size: Size) -> Result<Self> {
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(path, fourcc, fps, frame_size, true)
            .with_context(|| format!("Failed to create video writer at: '{}'", path))?;
        if !writer.is_opened()? {
            return Err(anyhow!("Failed to open video writer: {}", path));
        }

        tracing::info!(
            "OpencvWriter: writing {} at {:.2} fps, {}x{}",
            path,
            fps,
            frame_size.width,
            frame_size.height
        );

        Ok(Self {
            writer,
            path: path.to_string(),
            frame_size,
            frames_written: 0,
            closed: false,
        })
    }
}

impl FrameSink for OpencvWriter {
    fn write(&mut self, frame: &Mat) -> Result<()> {
        if self.closed {
            return Err(anyhow!("Write after close: {}", self.path));
        }
        let size = frame.size()?;
        if size != self.frame_size {
            return Err(anyhow!(
                "Frame size {}x{} does not match writer size {}x{}",
                size.width,
                size.height,
                self.frame_size.width,
                self.frame_size.height
            ));
        }

        self.writer.write(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.writer.release()?;
        tracing::info!(
            "OpencvWriter: finalized {} ({} frames)",
            self.path,
            self.frames_written
        );
        Ok(())
    }
}

impl Drop for OpencvWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("OpencvWriter: finalize on drop failed: {}", e);
        }
    }
}
