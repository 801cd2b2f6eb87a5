use crate::pipeline::types::{squared_distance, CircleCandidate, RegionDescriptor};
use opencv::core::{Point, Size};
use thiserror::Error;

/// Fraction of the scale reference radius kept inside the mask.
pub const DEFAULT_MASK_SCALE: f64 = 0.51;

/// Zero-based ordinal of the scale reference in detector output.
pub const DEFAULT_SCALE_INDEX: usize = 40;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("no circular feature detected in the reference frame")]
    NoDetection,
    #[error("scale reference needs {required} candidates, detector returned {found}")]
    InsufficientCandidates { required: usize, found: usize },
    #[error("scale reference radius {radius} yields an empty mask")]
    DegenerateRegion { radius: i32 },
    #[error("crop side {side} does not fit in a {width}x{height} frame")]
    RegionExceedsFrame { side: i32, width: i32, height: i32 },
}

/// How the centering and scale references are picked from detector output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferenceSelection {
    /// Fixed positions in the detector's ranked output.
    Ordinal { centering: usize, scale: usize },
    /// Centering = highest-ranked candidate near the frame center,
    /// scale = largest candidate whose disk contains that center.
    /// `center_tolerance` is a fraction of the frame's shorter side.
    Geometric { center_tolerance: f64 },
}

impl Default for ReferenceSelection {
    fn default() -> Self {
        Self::Ordinal {
            centering: 0,
            scale: DEFAULT_SCALE_INDEX,
        }
    }
}

/// Turns one frame's candidate list into a fixed crop/mask region.
#[derive(Debug, Clone, Copy)]
pub struct RegionCalibrator {
    frame_size: Size,
    selection: ReferenceSelection,
    mask_scale: f64,
}

impl RegionCalibrator {
    pub fn new(frame_size: Size) -> Self {
        Self {
            frame_size,
            selection: ReferenceSelection::default(),
            mask_scale: DEFAULT_MASK_SCALE,
        }
    }

    pub fn with_selection(mut self, selection: ReferenceSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_mask_scale(mut self, mask_scale: f64) -> Self {
        self.mask_scale = mask_scale;
        self
    }

    pub fn calibrate(
        &self,
        candidates: &[CircleCandidate],
    ) -> Result<RegionDescriptor, CalibrationError> {
        if candidates.is_empty() {
            return Err(CalibrationError::NoDetection);
        }

        let (centering, scale) = match self.selection {
            ReferenceSelection::Ordinal { centering, scale } => {
                let required = centering.max(scale) + 1;
                if candidates.len() < required {
                    return Err(CalibrationError::InsufficientCandidates {
                        required,
                        found: candidates.len(),
                    });
                }
                (candidates[centering], candidates[scale])
            }
            ReferenceSelection::Geometric { center_tolerance } => {
                let centering = self.pick_centering(candidates, center_tolerance);
                (centering, pick_scale(candidates, &centering))
            }
        };

        tracing::debug!(
            "Calibration references: centering={:?}, scale={:?}",
            centering,
            scale
        );

        self.build_region(centering.center, scale.radius)
    }

    fn pick_centering(&self, candidates: &[CircleCandidate], tolerance: f64) -> CircleCandidate {
        let frame_center = Point::new(self.frame_size.width / 2, self.frame_size.height / 2);
        let limit =
            tolerance.max(0.0) * self.frame_size.width.min(self.frame_size.height) as f64;
        let limit_sq = (limit * limit) as i64;

        candidates
            .iter()
            .find(|c| squared_distance(c.center, frame_center) <= limit_sq)
            .or_else(|| {
                candidates
                    .iter()
                    .min_by_key(|c| squared_distance(c.center, frame_center))
            })
            .copied()
            .unwrap_or(candidates[0])
    }

    fn build_region(
        &self,
        center: Point,
        scale_radius: i32,
    ) -> Result<RegionDescriptor, CalibrationError> {
        let mask_radius = (self.mask_scale * scale_radius as f64).round() as i32;
        if mask_radius <= 0 {
            return Err(CalibrationError::DegenerateRegion {
                radius: scale_radius,
            });
        }

        let Size { width, height } = self.frame_size;
        let side_length =
            mask_radius
                .checked_mul(2)
                .ok_or(CalibrationError::RegionExceedsFrame {
                    side: i32::MAX,
                    width,
                    height,
                })?;
        if side_length > width || side_length > height {
            return Err(CalibrationError::RegionExceedsFrame {
                side: side_length,
                width,
                height,
            });
        }

        // Shift the crop back inside the frame, never shrink it.
        let origin = Point::new(
            (center.x - mask_radius).clamp(0, width - side_length),
            (center.y - mask_radius).clamp(0, height - side_length),
        );

        Ok(RegionDescriptor {
            crop_origin: origin,
            side_length,
            mask_center: center,
            mask_radius,
        })
    }
}

/// Largest candidate whose disk contains the centering reference's center.
/// The centering reference itself always qualifies, so this never comes up empty.
fn pick_scale(candidates: &[CircleCandidate], centering: &CircleCandidate) -> CircleCandidate {
    candidates
        .iter()
        .filter(|c| c.contains(centering.center))
        .fold(*centering, |best, c| {
            if c.radius > best.radius {
                *c
            } else {
                best
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Size {
        Size::new(400, 400)
    }

    /// 41 candidates: the first centers the crop, the 41st sets the scale.
    fn ordinal_candidates(center: (i32, i32), scale_radius: i32) -> Vec<CircleCandidate> {
        let mut candidates = vec![CircleCandidate::new(center.0, center.1, 50)];
        for i in 1..40 {
            candidates.push(CircleCandidate::new(20 + i, 30, 5));
        }
        candidates.push(CircleCandidate::new(350, 350, scale_radius));
        candidates
    }

    #[test]
    fn test_empty_candidates_is_no_detection() {
        let calibrator = RegionCalibrator::new(frame());
        assert_eq!(calibrator.calibrate(&[]), Err(CalibrationError::NoDetection));

        let geometric = calibrator.with_selection(ReferenceSelection::Geometric {
            center_tolerance: 0.25,
        });
        assert_eq!(geometric.calibrate(&[]), Err(CalibrationError::NoDetection));
    }

    #[test]
    fn test_short_candidate_list_is_insufficient() {
        let calibrator = RegionCalibrator::new(frame());
        let candidates = vec![CircleCandidate::new(200, 200, 50); 40];
        assert_eq!(
            calibrator.calibrate(&candidates),
            Err(CalibrationError::InsufficientCandidates {
                required: 41,
                found: 40
            })
        );
    }

    #[test]
    fn test_ordinal_region_from_reference_scenario() {
        let calibrator = RegionCalibrator::new(frame());
        let region = calibrator
            .calibrate(&ordinal_candidates((200, 200), 80))
            .unwrap();

        assert_eq!(region.mask_radius, 41);
        assert_eq!(region.side_length, 82);
        assert_eq!(region.crop_origin, Point::new(159, 159));
        assert_eq!(region.mask_center, Point::new(200, 200));
    }

    #[test]
    fn test_calibration_is_deterministic() {
        let calibrator = RegionCalibrator::new(frame());
        let candidates = ordinal_candidates((123, 321), 77);
        let first = calibrator.calibrate(&candidates).unwrap();
        for _ in 0..10 {
            assert_eq!(calibrator.calibrate(&candidates).unwrap(), first);
        }
    }

    #[test]
    fn test_crop_is_clamped_inside_frame() {
        let calibrator = RegionCalibrator::new(Size::new(320, 240));
        let centers = [
            (0, 0),
            (-40, 500),
            (319, 239),
            (400, -10),
            (160, 0),
            (10, 120),
        ];

        for (x, y) in centers {
            let region = calibrator.calibrate(&ordinal_candidates((x, y), 100)).unwrap();
            let rect = region.crop_rect();
            assert_eq!(region.side_length, 102);
            assert!(rect.x >= 0 && rect.y >= 0, "origin out of frame for ({x}, {y})");
            assert!(rect.x + rect.width <= 320, "crop past right edge for ({x}, {y})");
            assert!(rect.y + rect.height <= 240, "crop past bottom edge for ({x}, {y})");
            assert_eq!(region.mask_center, Point::new(x, y));
        }
    }

    #[test]
    fn test_oversized_region_fails() {
        let calibrator = RegionCalibrator::new(Size::new(120, 90));
        assert_eq!(
            calibrator.calibrate(&ordinal_candidates((60, 45), 100)),
            Err(CalibrationError::RegionExceedsFrame {
                side: 102,
                width: 120,
                height: 90
            })
        );
    }

    #[test]
    fn test_huge_mask_scale_exceeds_frame() {
        let calibrator = RegionCalibrator::new(Size::new(400, 400)).with_mask_scale(1e12);
        assert_eq!(
            calibrator.calibrate(&ordinal_candidates((200, 200), 80)),
            Err(CalibrationError::RegionExceedsFrame {
                side: i32::MAX,
                width: 400,
                height: 400
            })
        );
    }

    #[test]
    fn test_tiny_scale_reference_is_degenerate() {
        let calibrator = RegionCalibrator::new(frame());
        assert_eq!(
            calibrator.calibrate(&ordinal_candidates((200, 200), 0)),
            Err(CalibrationError::DegenerateRegion { radius: 0 })
        );
    }

    #[test]
    fn test_geometric_selection_prefers_centered_and_enclosing() {
        let calibrator = RegionCalibrator::new(frame()).with_selection(
            ReferenceSelection::Geometric {
                center_tolerance: 0.25,
            },
        );
        let candidates = vec![
            // Off-center, ranked first.
            CircleCandidate::new(30, 30, 20),
            // Near the frame center: centering reference.
            CircleCandidate::new(205, 195, 40),
            // Encloses the centering center: scale reference.
            CircleCandidate::new(210, 200, 100),
            // Bigger but does not contain the center.
            CircleCandidate::new(380, 380, 150),
        ];

        let region = calibrator.calibrate(&candidates).unwrap();
        assert_eq!(region.mask_center, Point::new(205, 195));
        assert_eq!(region.mask_radius, 51);
    }

    #[test]
    fn test_geometric_falls_back_to_nearest_center() {
        let calibrator = RegionCalibrator::new(frame()).with_selection(
            ReferenceSelection::Geometric {
                center_tolerance: 0.01,
            },
        );
        let candidates = vec![
            CircleCandidate::new(30, 30, 20),
            CircleCandidate::new(150, 150, 60),
        ];

        let region = calibrator.calibrate(&candidates).unwrap();
        assert_eq!(region.mask_center, Point::new(150, 150));
        assert_eq!(region.mask_radius, 31);
    }
}
