use crate::pipeline::annotate::draw_mask_outline;
use crate::pipeline::types::RegionDescriptor;
use anyhow::{bail, Result};
use opencv::core::{self, Mat, Rect, Scalar};
use opencv::imgproc;
use opencv::prelude::*;

/// Copies a `side x side` square out of `img`, shifting it inside the frame if needed.
pub fn crop_square(img: &Mat, region: &RegionDescriptor) -> Result<Mat> {
    let size = img.size()?;
    let side = region.side_length;

    if side <= 0 || side > size.width || side > size.height {
        bail!(
            "Crop side {} does not fit frame {}x{}",
            side,
            size.width,
            size.height
        );
    }

    let x = region.crop_origin.x.clamp(0, size.width - side);
    let y = region.crop_origin.y.clamp(0, size.height - side);

    let roi = Mat::roi(img, Rect { x, y, ..region.crop_rect() })?;
    let mut out = Mat::default();
    roi.copy_to(&mut out)?;

    Ok(out)
}

/// Applies a fixed region to every frame: crop, outline, then black out
/// everything outside the mask disk.
pub struct FrameTransformer {
    region: RegionDescriptor,
    mask: Mat,
}

impl FrameTransformer {
    pub fn new(region: RegionDescriptor) -> Result<Self> {
        let side = region.side_length;
        let mut mask =
            Mat::new_rows_cols_with_default(side, side, core::CV_8UC1, Scalar::all(0.0))?;
        imgproc::circle(
            &mut mask,
            region.local_center(),
            region.mask_radius,
            Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        Ok(Self { region, mask })
    }

    pub fn apply(&self, frame: &Mat) -> Result<Mat> {
        let mut cropped = crop_square(frame, &self.region)?;
        draw_mask_outline(
            &mut cropped,
            self.region.local_center(),
            self.region.mask_radius,
        )?;

        let mut masked = Mat::new_rows_cols_with_default(
            cropped.rows(),
            cropped.cols(),
            cropped.typ(),
            Scalar::all(0.0),
        )?;
        core::bitwise_and(&cropped, &cropped, &mut masked, &self.mask)?;
        Ok(masked)
    }
}
