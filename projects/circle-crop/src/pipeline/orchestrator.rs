// Playback orchestrator: owns the read/transform/display/encode loop
//
// One tick = optionally advance the sequential pass, then pump the display
// and drain every queued operator event in arrival order.

use crate::display::DisplaySurface;
use crate::pipeline::annotate::draw_time_overlay;
use crate::pipeline::crop::FrameTransformer;
use crate::pipeline::types::{PlaybackEvent, PlaybackPhase, PlaybackState, StreamMetadata};
use crate::video::{FrameSink, VideoReader};
use anyhow::Result;
use crossbeam::channel::Receiver;
use indicatif::ProgressBar;
use opencv::core::Mat;
use std::time::Duration;

/// Space bar.
pub const PAUSE_KEY: i32 = 32;

pub const DEFAULT_INPUT_WAIT: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub frames_encoded: usize,
    pub previews_shown: usize,
    pub reached_end: bool,
}

pub struct PlaybackController<R, S, D> {
    reader: R,
    sink: S,
    display: D,
    transformer: FrameTransformer,
    events: Receiver<PlaybackEvent>,
    metadata: StreamMetadata,
    state: PlaybackState,
    last_frame: Option<Mat>,
    input_wait: Duration,
    progress: ProgressBar,
    frames_encoded: usize,
    previews_shown: usize,
}

impl<R, S, D> PlaybackController<R, S, D>
where
    R: VideoReader,
    S: FrameSink,
    D: DisplaySurface,
{
    /// `reader` must be positioned at frame 0.
    pub fn new(
        reader: R,
        sink: S,
        display: D,
        transformer: FrameTransformer,
        events: Receiver<PlaybackEvent>,
        metadata: StreamMetadata,
    ) -> Self {
        Self {
            reader,
            sink,
            display,
            transformer,
            events,
            metadata,
            state: PlaybackState::new(),
            last_frame: None,
            input_wait: DEFAULT_INPUT_WAIT,
            progress: ProgressBar::hidden(),
            frames_encoded: 0,
            previews_shown: 0,
        }
    }

    pub fn with_input_wait(mut self, wait: Duration) -> Self {
        self.input_wait = wait;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[cfg(test)]
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Runs until the operator cancels or dismisses the display.
    /// The sink is finalized on every exit path, including errors.
    pub fn run(&mut self) -> Result<PlaybackSummary> {
        tracing::info!(
            "Playback started: {} frames at {:.2} fps",
            self.metadata.total_frames,
            self.metadata.frames_per_second
        );

        let outcome = self.run_loop();
        let closed = self.sink.close();
        self.progress.finish_and_clear();

        outcome?;
        closed?;

        let summary = PlaybackSummary {
            frames_encoded: self.frames_encoded,
            previews_shown: self.previews_shown,
            reached_end: self.state.reached_end(),
        };
        tracing::info!(
            "Playback finished: {} frames encoded, {} previews, reached_end={}",
            summary.frames_encoded,
            summary.previews_shown,
            summary.reached_end
        );
        Ok(summary)
    }

    fn run_loop(&mut self) -> Result<()> {
        while self.tick()? == TickOutcome::Continue {}
        Ok(())
    }

    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.state.phase == PlaybackPhase::Playing {
            self.advance()?;
        }

        self.display.pump(self.input_wait)?;

        while let Ok(event) = self.events.try_recv() {
            if self.handle_event(event)? == TickOutcome::Exit {
                return Ok(TickOutcome::Exit);
            }
        }

        Ok(TickOutcome::Continue)
    }

    /// Sequential pass: read, transform, display, encode.
    fn advance(&mut self) -> Result<()> {
        let Some(frame) = self.reader.next_frame()? else {
            return self.enter_ended();
        };

        let out = self.transformer.apply(&frame)?;
        self.display.show(&out)?;
        self.sink.write(&out)?;

        self.state.current_frame_index += 1;
        self.frames_encoded += 1;
        self.progress.inc(1);
        self.last_frame = Some(out);
        Ok(())
    }

    fn enter_ended(&mut self) -> Result<()> {
        self.state.phase = PlaybackPhase::Ended;
        tracing::info!(
            "Reached the end of the video after {} frames",
            self.state.current_frame_index
        );

        if let Some(last) = &self.last_frame {
            self.display.show(last)?;
            tracing::info!("Paused on the last frame. Press any key to exit.");
        }
        Ok(())
    }

    fn handle_event(&mut self, event: PlaybackEvent) -> Result<TickOutcome> {
        match (self.state.phase, event) {
            (_, PlaybackEvent::Dismissed) => {
                tracing::info!("Display dismissed");
                Ok(TickOutcome::Exit)
            }
            (PlaybackPhase::Ended, PlaybackEvent::Key(_)) => Ok(TickOutcome::Exit),
            (PlaybackPhase::Ended, PlaybackEvent::Seek(index)) => {
                tracing::debug!("Ignoring seek to {} after end of stream", index);
                Ok(TickOutcome::Continue)
            }
            (phase, PlaybackEvent::Key(PAUSE_KEY)) => {
                self.state.phase = if phase == PlaybackPhase::Paused {
                    PlaybackPhase::Playing
                } else {
                    PlaybackPhase::Paused
                };
                tracing::info!(
                    "{} at frame {}",
                    if self.state.is_paused() { "Paused" } else { "Resumed" },
                    self.state.current_frame_index
                );
                Ok(TickOutcome::Continue)
            }
            (_, PlaybackEvent::Key(key)) => {
                tracing::info!("Key {} pressed, stopping playback", key);
                Ok(TickOutcome::Exit)
            }
            (_, PlaybackEvent::Seek(index)) => {
                self.preview(index)?;
                Ok(TickOutcome::Continue)
            }
        }
    }

    /// Shows a single frame without touching the encoded sequence: the source
    /// is put back where the sequential pass left it.
    fn preview(&mut self, index: usize) -> Result<()> {
        let target = index.min(self.metadata.last_index());

        self.reader.seek_to_frame(target)?;
        let read = self.reader.next_frame();
        self.reader.seek_to_frame(self.state.current_frame_index)?;

        let Some(frame) = read? else {
            tracing::warn!("Preview seek to frame {} returned no frame", target);
            return Ok(());
        };

        let mut out = self.transformer.apply(&frame)?;
        let position = if self.metadata.frames_per_second > 0.0 {
            Duration::from_secs_f64(target as f64 / self.metadata.frames_per_second)
        } else {
            Duration::ZERO
        };
        draw_time_overlay(&mut out, position, self.metadata.duration)?;
        self.display.show(&out)?;

        self.previews_shown += 1;
        tracing::debug!(
            "Previewed frame {}, sequential pass stays at {}",
            target,
            self.state.current_frame_index
        );
        Ok(())
    }
}
