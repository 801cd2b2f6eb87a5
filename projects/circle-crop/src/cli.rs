use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Centering = first candidate, scale = candidate at --scale-index
    Ordinal,
    /// Centering = best candidate near the frame center, scale = largest enclosing candidate
    Geometric,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video to crop and mask
    #[arg(env = "CIRCLE_CROP_VIDEO")]
    pub video: PathBuf,

    /// Output video path [default: Crop_<video name> in the current directory]
    #[arg(long, env = "CIRCLE_CROP_OUTPUT")]
    pub output: Option<PathBuf>,

    /// How the centering and scale circles are picked from detector output
    #[arg(long, value_enum, default_value_t = Selection::Ordinal)]
    pub selection: Selection,

    /// Zero-based position of the scale circle (ordinal selection)
    #[arg(long, default_value_t = 40)]
    pub scale_index: usize,

    /// Fraction of the scale circle's radius kept by the mask
    #[arg(long, default_value_t = 0.51, value_parser = parse_fraction)]
    pub mask_scale: f64,

    /// Fraction of the frame's shorter side a centering circle may sit from the middle (geometric selection)
    #[arg(long, default_value_t = 0.25)]
    pub center_tolerance: f64,

    /// Milliseconds to wait for input on each tick
    #[arg(long, default_value_t = 25)]
    pub wait_ms: u64,
}

/// Accepts a float in (0, 1].
fn parse_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not in (0, 1]"))
    }
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["circle-crop", "clip.mp4"]).unwrap();
        assert_eq!(args.video, PathBuf::from("clip.mp4"));
        assert_eq!(args.selection, Selection::Ordinal);
        assert_eq!(args.scale_index, 40);
        assert_eq!(args.mask_scale, 0.51);
        assert_eq!(args.wait_ms, 25);
    }

    #[test]
    fn test_geometric_selection_flag() {
        let args = Args::try_parse_from([
            "circle-crop",
            "clip.mp4",
            "--selection",
            "geometric",
            "--output",
            "out.mp4",
        ])
        .unwrap();
        assert_eq!(args.selection, Selection::Geometric);
        assert_eq!(args.output, Some(PathBuf::from("out.mp4")));
    }

    #[test]
    fn test_mask_scale_outside_unit_range_is_rejected() {
        for bad in ["0", "-0.5", "1.5", "1e12", "NaN", "abc"] {
            let res = Args::try_parse_from(["circle-crop", "clip.mp4", "--mask-scale", bad]);
            assert!(res.is_err(), "accepted --mask-scale {bad}");
        }

        let args =
            Args::try_parse_from(["circle-crop", "clip.mp4", "--mask-scale", "1"]).unwrap();
        assert_eq!(args.mask_scale, 1.0);
    }
}
