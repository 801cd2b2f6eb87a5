use anyhow::Result;
use opencv::core::{Mat, Point, Scalar};
use opencv::imgproc;
use std::time::Duration;

/// Bright red in BGR.
pub const OUTLINE_COLOR: (f64, f64, f64) = (0.0, 0.0, 255.0);
pub const OUTLINE_THICKNESS: i32 = 3;

pub fn outline_color() -> Scalar {
    Scalar::new(OUTLINE_COLOR.0, OUTLINE_COLOR.1, OUTLINE_COLOR.2, 0.0)
}

/// Draws the mask boundary so the whole stroke falls inside the disk.
pub fn draw_mask_outline(img: &mut Mat, center: Point, radius: i32) -> Result<()> {
    let inset = OUTLINE_THICKNESS / 2;
    imgproc::circle(
        img,
        center,
        (radius - inset).max(1),
        outline_color(),
        OUTLINE_THICKNESS,
        imgproc::LINE_8,
        0,
    )?;
    Ok(())
}

/// `MM:SS`
pub fn format_position(position: Duration) -> String {
    let secs = position.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `HH:MM:SS`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

pub fn time_overlay_text(position: Duration, duration: Duration) -> String {
    format!(
        "Time: {} / Duration: {}",
        format_position(position),
        format_duration(duration)
    )
}

/// Stamps the playback clock onto a preview frame.
pub fn draw_time_overlay(img: &mut Mat, position: Duration, duration: Duration) -> Result<()> {
    imgproc::put_text(
        img,
        &time_overlay_text(position, duration),
        Point::new(50, 50),
        imgproc::FONT_HERSHEY_SIMPLEX,
        1.0,
        Scalar::all(255.0),
        2,
        imgproc::LINE_AA,
        false,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(Duration::from_secs(0)), "00:00");
        assert_eq!(format_position(Duration::from_millis(3_900)), "00:03");
        assert_eq!(format_position(Duration::from_secs(754)), "12:34");
    }

    #[test]
    fn test_format_duration_rolls_hours() {
        assert_eq!(format_duration(Duration::from_secs(10)), "00:00:10");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "01:02:05");
    }

    #[test]
    fn test_overlay_text() {
        assert_eq!(
            time_overlay_text(Duration::from_secs(3), Duration::from_secs(10)),
            "Time: 00:03 / Duration: 00:00:10"
        );
    }
}
