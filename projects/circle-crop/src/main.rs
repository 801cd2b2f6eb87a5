mod cli;
mod display;
mod pipeline;
mod run_context;
mod video;

use anyhow::Result;
use cli::Args;
use display::highgui::HighguiDisplay;
use pipeline::detection::HoughCircleDetector;
use run_context::RunContext;
use video::opencv_writer::OpencvWriter;
use video::processor::VideoSession;

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();
    let ctx = RunContext::from_args(&args)?;

    let session = VideoSession::open(ctx.video_path_str()?)?;
    let output_path = ctx.output_path_str()?;

    let stats = session.run(
        &HoughCircleDetector::default(),
        &ctx.options,
        |fps, size| OpencvWriter::new(output_path, fps, size),
        |metadata, events| HighguiDisplay::open(&ctx.window_title, metadata, events),
    )?;

    tracing::info!(
        "Wrote {} frames to {} in {:.1}s",
        stats.summary.frames_encoded,
        output_path,
        stats.duration.as_secs_f64()
    );

    Ok(())
}
