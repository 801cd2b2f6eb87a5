use opencv::core::{Point, Rect, Size};
use std::time::Duration;

/// A circular feature reported by the detector for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircleCandidate {
    pub center: Point,
    pub radius: i32,
}

impl CircleCandidate {
    pub fn new(x: i32, y: i32, radius: i32) -> Self {
        Self {
            center: Point::new(x, y),
            radius,
        }
    }

    /// Whether `p` lies inside (or on) this candidate's disk.
    pub fn contains(&self, p: Point) -> bool {
        squared_distance(self.center, p) <= (self.radius as i64).pow(2)
    }
}

pub fn squared_distance(a: Point, b: Point) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

/// Square crop plus circular mask, derived once from the first frame.
///
/// `mask_center` is in full-frame coordinates. The crop rectangle always lies
/// inside the frame it was calibrated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionDescriptor {
    pub crop_origin: Point,
    pub side_length: i32,
    pub mask_center: Point,
    pub mask_radius: i32,
}

impl RegionDescriptor {
    pub fn crop_rect(&self) -> Rect {
        Rect::new(
            self.crop_origin.x,
            self.crop_origin.y,
            self.side_length,
            self.side_length,
        )
    }

    /// Mask center translated into crop-local coordinates.
    pub fn local_center(&self) -> Point {
        Point::new(
            self.mask_center.x - self.crop_origin.x,
            self.mask_center.y - self.crop_origin.y,
        )
    }

    pub fn output_size(&self) -> Size {
        Size::new(self.side_length, self.side_length)
    }
}

/// Immutable facts about the opened stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamMetadata {
    pub total_frames: usize,
    pub frames_per_second: f64,
    pub duration: Duration,
}

impl StreamMetadata {
    pub fn new(total_frames: usize, frames_per_second: f64) -> Self {
        let duration = if frames_per_second > 0.0 {
            Duration::from_secs_f64(total_frames as f64 / frames_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            total_frames,
            frames_per_second,
            duration,
        }
    }

    /// Highest index a scrub may request.
    pub fn last_index(&self) -> usize {
        self.total_frames.saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Playing,
    Paused,
    /// Source exhausted; last frame is held until the operator dismisses it.
    Ended,
}

/// Mutable playback state, owned by the controller alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    /// Index of the next frame the sequential pass will read.
    pub current_frame_index: usize,
    pub phase: PlaybackPhase,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            current_frame_index: 0,
            phase: PlaybackPhase::Playing,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.phase == PlaybackPhase::Paused
    }

    pub fn reached_end(&self) -> bool {
        self.phase == PlaybackPhase::Ended
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

/// Input funnelled from the display surface into the controller's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Raw key code as reported by the display toolkit.
    Key(i32),
    /// Scrub control moved to this frame index.
    Seek(usize),
    /// Display surface closed or lost visibility.
    Dismissed,
}
