use crate::cli::{Args, Selection};
use crate::pipeline::geometry::ReferenceSelection;
use crate::video::processor::SessionOptions;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved inputs and outputs for one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub video_path: PathBuf,
    pub output_path: PathBuf,
    pub window_title: String,
    pub options: SessionOptions,
}

impl RunContext {
    pub fn from_args(args: &Args) -> Result<Self> {
        let video_name = args
            .video
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid video path: {:?}", args.video))?;

        let output_path = match &args.output {
            Some(path) => path.clone(),
            None => default_output_path(Path::new("."), video_name),
        };

        let selection = match args.selection {
            Selection::Ordinal => ReferenceSelection::Ordinal {
                centering: 0,
                scale: args.scale_index,
            },
            Selection::Geometric => ReferenceSelection::Geometric {
                center_tolerance: args.center_tolerance,
            },
        };

        Ok(Self {
            video_path: args.video.clone(),
            output_path,
            window_title: format!("{} ({})", video_name, env!("CARGO_PKG_NAME")),
            options: SessionOptions {
                selection,
                mask_scale: args.mask_scale,
                input_wait: Duration::from_millis(args.wait_ms),
            },
        })
    }

    pub fn video_path_str(&self) -> Result<&str> {
        self.video_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Video path is not valid UTF-8: {:?}", self.video_path))
    }

    pub fn output_path_str(&self) -> Result<&str> {
        self.output_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Output path is not valid UTF-8: {:?}", self.output_path))
    }
}

pub fn default_output_path(dir: &Path, video_name: &str) -> PathBuf {
    dir.join(format!("Crop_{}", video_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_output_and_title() {
        let args = Args::try_parse_from(["circle-crop", "/videos/VTestVid_9.mp4"]).unwrap();
        let ctx = RunContext::from_args(&args).unwrap();

        assert_eq!(ctx.output_path, PathBuf::from("./Crop_VTestVid_9.mp4"));
        assert_eq!(ctx.window_title, "VTestVid_9.mp4 (circle-crop)");
        assert_eq!(
            ctx.options.selection,
            ReferenceSelection::Ordinal {
                centering: 0,
                scale: 40
            }
        );
        assert_eq!(ctx.options.input_wait, Duration::from_millis(25));
    }

    #[test]
    fn test_geometric_options() {
        let args = Args::try_parse_from([
            "circle-crop",
            "clip.mp4",
            "--selection",
            "geometric",
            "--center-tolerance",
            "0.1",
        ])
        .unwrap();
        let ctx = RunContext::from_args(&args).unwrap();
        assert_eq!(
            ctx.options.selection,
            ReferenceSelection::Geometric {
                center_tolerance: 0.1
            }
        );
    }
}
