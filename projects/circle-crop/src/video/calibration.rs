use crate::pipeline::detection::CircleDetector;
use crate::pipeline::geometry::{CalibrationError, RegionCalibrator};
use crate::pipeline::types::RegionDescriptor;
use crate::video::VideoReader;
use opencv::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not open video source '{path}'")]
    SourceOpen {
        path: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("could not read the first frame of '{path}'")]
    FirstFrameRead { path: String },
    #[error("circle detection failed on the first frame")]
    Detection(#[source] anyhow::Error),
    #[error("could not calibrate crop region from the first frame: {0}")]
    Calibration(#[from] CalibrationError),
    #[error("could not rewind '{path}' after calibration")]
    Rewind {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Reads frame 0, derives the crop/mask region from it, and rewinds the
/// reader so the sequential pass starts at frame 0 again.
pub fn calibrate_from_first_frame<R, C>(
    reader: &mut R,
    detector: &C,
    calibrator: impl FnOnce(opencv::core::Size) -> RegionCalibrator,
    path: &str,
) -> Result<RegionDescriptor, SessionError>
where
    R: VideoReader + ?Sized,
    C: CircleDetector + ?Sized,
{
    let first = match reader.next_frame() {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            return Err(SessionError::FirstFrameRead {
                path: path.to_string(),
            })
        }
        Err(e) => {
            tracing::warn!("First frame read failed: {}", e);
            return Err(SessionError::FirstFrameRead {
                path: path.to_string(),
            });
        }
    };

    let frame_size = first
        .size()
        .map_err(|e| SessionError::Detection(e.into()))?;
    let candidates = detector.detect(&first).map_err(SessionError::Detection)?;
    tracing::info!(
        "Detected {} circle candidates in the first frame ({}x{})",
        candidates.len(),
        frame_size.width,
        frame_size.height
    );

    let region = calibrator(frame_size).calibrate(&candidates)?;
    tracing::info!(
        "Crop region: origin=({}, {}), side={}, mask center=({}, {}), mask radius={}",
        region.crop_origin.x,
        region.crop_origin.y,
        region.side_length,
        region.mask_center.x,
        region.mask_center.y,
        region.mask_radius
    );

    reader
        .seek_to_frame(0)
        .map_err(|e| SessionError::Rewind {
            path: path.to_string(),
            source: e,
        })?;

    Ok(region)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pipeline::orchestrator::tests::MemoryReader;
    use crate::pipeline::types::CircleCandidate;
    use anyhow::Result;
    use opencv::core::{Mat, Point};

    pub(crate) struct FixedDetector(pub Vec<CircleCandidate>);

    impl CircleDetector for FixedDetector {
        fn detect(&self, _frame: &Mat) -> Result<Vec<CircleCandidate>> {
            Ok(self.0.clone())
        }
    }

    /// Reference circle of radius 50 at (200, 200); the 41st candidate has radius 80.
    pub(crate) fn reference_candidates() -> Vec<CircleCandidate> {
        let mut candidates = vec![CircleCandidate::new(200, 200, 50)];
        for i in 1..40 {
            candidates.push(CircleCandidate::new(10 + i, 10, 3));
        }
        candidates.push(CircleCandidate::new(320, 80, 80));
        candidates.push(CircleCandidate::new(330, 90, 80));
        candidates
    }

    #[test]
    fn test_calibrates_and_rewinds() {
        let mut reader = MemoryReader::new(5, 10.0);
        let detector = FixedDetector(reference_candidates());

        let region =
            calibrate_from_first_frame(&mut reader, &detector, RegionCalibrator::new, "mem")
                .unwrap();

        assert_eq!(region.mask_radius, 41);
        assert_eq!(region.side_length, 82);
        assert_eq!(region.crop_origin, Point::new(159, 159));
        assert_eq!(reader.pos, 0);
    }

    #[test]
    fn test_empty_source_is_first_frame_error() {
        let mut reader = MemoryReader::new(0, 10.0);
        let detector = FixedDetector(reference_candidates());

        let err = calibrate_from_first_frame(&mut reader, &detector, RegionCalibrator::new, "mem")
            .unwrap_err();
        assert!(matches!(err, SessionError::FirstFrameRead { .. }));
    }

    #[test]
    fn test_no_circles_is_calibration_error() {
        let mut reader = MemoryReader::new(5, 10.0);
        let detector = FixedDetector(Vec::new());

        let err = calibrate_from_first_frame(&mut reader, &detector, RegionCalibrator::new, "mem")
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Calibration(CalibrationError::NoDetection)
        ));
    }
}
