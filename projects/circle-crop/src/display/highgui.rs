use super::DisplaySurface;
use crate::pipeline::types::{PlaybackEvent, StreamMetadata};
use anyhow::{Context, Result};
use crossbeam::channel::Sender;
use opencv::core::Mat;
use opencv::highgui;
use std::time::Duration;

pub const POSITION_TRACKBAR: &str = "Position";

/// Resizable OpenCV window with a frame-position trackbar.
pub struct HighguiDisplay {
    title: String,
    events: Sender<PlaybackEvent>,
}

impl HighguiDisplay {
    pub fn open(
        title: &str,
        metadata: &StreamMetadata,
        events: Sender<PlaybackEvent>,
    ) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_NORMAL)
            .with_context(|| format!("Failed to create window '{}'", title))?;

        let scrub_tx = events.clone();
        highgui::create_trackbar(
            POSITION_TRACKBAR,
            title,
            None,
            metadata.last_index().max(1) as i32,
            Some(Box::new(move |pos| {
                // Runs inside wait_key; only enqueue, the controller does the seek.
                forward(&scrub_tx, PlaybackEvent::Seek(pos.max(0) as usize));
            })),
        )
        .context("Failed to create position trackbar")?;

        tracing::info!(
            "Display '{}' ready, scrub range 0..={}",
            title,
            metadata.last_index()
        );

        Ok(Self {
            title: title.to_string(),
            events,
        })
    }

    fn is_visible(&self) -> bool {
        highgui::get_window_property(&self.title, highgui::WND_PROP_VISIBLE)
            .map(|v| v >= 1.0)
            .unwrap_or(false)
    }
}

impl DisplaySurface for HighguiDisplay {
    fn show(&mut self, frame: &Mat) -> Result<()> {
        highgui::imshow(&self.title, frame)?;
        Ok(())
    }

    fn pump(&mut self, wait: Duration) -> Result<()> {
        let key = highgui::wait_key(wait.as_millis().clamp(1, i32::MAX as u128) as i32)?;
        if key != -1 {
            forward(&self.events, PlaybackEvent::Key(key));
        }
        if !self.is_visible() {
            forward(&self.events, PlaybackEvent::Dismissed);
        }
        Ok(())
    }
}

impl Drop for HighguiDisplay {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.title) {
            tracing::warn!("Failed to close window '{}': {}", self.title, e);
        }
    }
}

/// Queues an event for the controller. Returns false once the receiver is gone.
fn forward(events: &Sender<PlaybackEvent>, event: PlaybackEvent) -> bool {
    match events.send(event) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Dropped {:?}, playback no longer listening", e.into_inner());
            false
        }
    }
}
