use crate::pipeline::types::CircleCandidate;
use anyhow::{Context, Result};
use opencv::core::{Mat, Vec3f, Vector};
use opencv::imgproc;
use opencv::prelude::*;

/// Anything that can report circular features in a frame, in ranked order.
pub trait CircleDetector {
    fn detect(&self, frame: &Mat) -> Result<Vec<CircleCandidate>>;
}

/// Tuning for the Hough gradient transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughConfig {
    /// Median blur aperture applied before the transform (odd, > 1).
    pub blur_kernel: i32,
    /// Inverse accumulator resolution.
    pub dp: f64,
    pub min_center_distance: f64,
    /// Upper Canny threshold.
    pub canny_threshold: f64,
    pub accumulator_threshold: f64,
    pub min_radius: i32,
    /// 0 means unbounded.
    pub max_radius: i32,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            dp: 1.2,
            min_center_distance: 100.0,
            canny_threshold: 100.0,
            accumulator_threshold: 30.0,
            min_radius: 0,
            max_radius: 0,
        }
    }
}

/// OpenCV `HoughCircles` over a median-blurred grayscale copy of the frame.
pub struct HoughCircleDetector {
    config: HoughConfig,
}

impl HoughCircleDetector {
    pub fn new(config: HoughConfig) -> Self {
        Self { config }
    }

    fn grayscale(&self, frame: &Mat) -> Result<Mat> {
        let mut gray = Mat::default();
        if frame.channels() == 1 {
            frame.copy_to(&mut gray)?;
        } else {
            imgproc::cvt_color_def(frame, &mut gray, imgproc::COLOR_BGR2GRAY)?;
        }

        let mut blurred = Mat::default();
        imgproc::median_blur(&gray, &mut blurred, self.config.blur_kernel)?;
        Ok(blurred)
    }
}

impl Default for HoughCircleDetector {
    fn default() -> Self {
        Self::new(HoughConfig::default())
    }
}

impl CircleDetector for HoughCircleDetector {
    fn detect(&self, frame: &Mat) -> Result<Vec<CircleCandidate>> {
        let gray = self.grayscale(frame)?;

        let mut circles = Vector::<Vec3f>::new();
        imgproc::hough_circles(
            &gray,
            &mut circles,
            imgproc::HOUGH_GRADIENT,
            self.config.dp,
            self.config.min_center_distance,
            self.config.canny_threshold,
            self.config.accumulator_threshold,
            self.config.min_radius,
            self.config.max_radius,
        )
        .context("HoughCircles failed")?;

        // Truncate to whole pixels, keeping the transform's ranking.
        let candidates: Vec<CircleCandidate> = circles
            .iter()
            .map(|c| CircleCandidate::new(c[0] as i32, c[1] as i32, c[2].max(0.0) as i32))
            .collect();

        tracing::debug!("HoughCircles returned {} candidates", candidates.len());
        Ok(candidates)
    }
}
