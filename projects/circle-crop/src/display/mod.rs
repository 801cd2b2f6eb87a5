// Display surface: renders frames and feeds operator input into the playback queue

pub mod highgui;

use anyhow::Result;
use opencv::core::Mat;
use std::time::Duration;

pub trait DisplaySurface {
    fn show(&mut self, frame: &Mat) -> Result<()>;

    /// Waits up to `wait` for input. Scrub moves, key presses and dismissal
    /// are pushed onto the surface's event queue in the order they arrive.
    fn pump(&mut self, wait: Duration) -> Result<()>;
}
