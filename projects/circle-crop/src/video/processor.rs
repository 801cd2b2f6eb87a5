use crate::display::DisplaySurface;
use crate::pipeline::crop::FrameTransformer;
use crate::pipeline::detection::CircleDetector;
use crate::pipeline::geometry::{RegionCalibrator, ReferenceSelection, DEFAULT_MASK_SCALE};
use crate::pipeline::orchestrator::{PlaybackController, PlaybackSummary, DEFAULT_INPUT_WAIT};
use crate::pipeline::types::{PlaybackEvent, StreamMetadata};
use crate::video::calibration::{calibrate_from_first_frame, SessionError};
use crate::video::{opencv_reader::OpencvReader, FrameSink, VideoReader};
use anyhow::Result;
use crossbeam::channel::{self, Sender};
use indicatif::{ProgressBar, ProgressStyle};
use opencv::core::Size;
use std::time::{Duration, Instant};

pub struct ProcessingStats {
    pub summary: PlaybackSummary,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub selection: ReferenceSelection,
    pub mask_scale: f64,
    pub input_wait: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            selection: ReferenceSelection::default(),
            mask_scale: DEFAULT_MASK_SCALE,
            input_wait: DEFAULT_INPUT_WAIT,
        }
    }
}

/// One run over one video: calibrate on frame 0, then hand off to playback.
pub struct VideoSession<R> {
    pub reader: R,
    pub path: String,
    pub metadata: StreamMetadata,
    pub pb: ProgressBar,
    pub start_time: Instant,
}

impl VideoSession<OpencvReader> {
    pub fn open(video_path: &str) -> Result<Self, SessionError> {
        let reader = OpencvReader::new(video_path).map_err(|e| SessionError::SourceOpen {
            path: video_path.to_string(),
            source: e,
        })?;
        let mut session =
            Self::from_reader(reader, video_path).map_err(|e| SessionError::SourceOpen {
                path: video_path.to_string(),
                source: e,
            })?;

        let pb = ProgressBar::new(session.metadata.total_frames as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} encoded ({per_sec:.1.yellow})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        session.pb = pb;

        Ok(session)
    }
}

impl<R: VideoReader> VideoSession<R> {
    pub fn from_reader(reader: R, path: &str) -> Result<Self> {
        let metadata = reader.metadata()?;
        Ok(Self {
            reader,
            path: path.to_string(),
            metadata,
            pb: ProgressBar::hidden(),
            start_time: Instant::now(),
        })
    }

    /// Calibrates, then opens the sink and display and plays until dismissed.
    ///
    /// Sink and display are only opened once calibration has succeeded, so
    /// an unreadable or undetectable first frame leaves nothing behind but
    /// the reader, which is released on drop.
    pub fn run<C, S, D>(
        mut self,
        detector: &C,
        options: &SessionOptions,
        open_sink: impl FnOnce(f64, Size) -> Result<S>,
        open_display: impl FnOnce(&StreamMetadata, Sender<PlaybackEvent>) -> Result<D>,
    ) -> Result<ProcessingStats>
    where
        C: CircleDetector + ?Sized,
        S: FrameSink,
        D: DisplaySurface,
    {
        let region = calibrate_from_first_frame(
            &mut self.reader,
            detector,
            |size| {
                RegionCalibrator::new(size)
                    .with_selection(options.selection)
                    .with_mask_scale(options.mask_scale)
            },
            &self.path,
        )?;
        let transformer = FrameTransformer::new(region)?;

        let sink = open_sink(self.metadata.frames_per_second, region.output_size())?;
        let (tx, rx) = channel::unbounded();
        let display = open_display(&self.metadata, tx)?;

        let mut controller =
            PlaybackController::new(self.reader, sink, display, transformer, rx, self.metadata)
                .with_input_wait(options.input_wait)
                .with_progress(self.pb);
        let summary = controller.run()?;

        Ok(ProcessingStats {
            summary,
            duration: self.start_time.elapsed(),
        })
    }
}
