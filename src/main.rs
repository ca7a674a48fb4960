use anyhow::{Context, Result};
use clap::Parser;
use squeeze_lab::cli::{Args, Commands};
use squeeze_lab::commands::{self, VideoSettings};
use squeeze_lab::logger;
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.quiet, args.verbose);

    let runtime = Runtime::new().context("failed to start the async runtime")?;
    runtime.block_on(run(args.command))
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::File {
            input,
            method,
            level,
            codec,
            output,
        } => {
            let bench = commands::file_workbench(method, level, codec.as_deref())?;
            commands::run_workbench(&bench, input.as_deref(), output.as_deref(), false)
                .await
                .context("file compression failed")?;
        }
        Commands::Image {
            input,
            max_size_mb,
            max_dimension,
            heif_convert,
            output,
        } => {
            let bench = commands::image_workbench(max_size_mb, max_dimension, heif_convert)?;
            commands::run_workbench(&bench, input.as_deref(), output.as_deref(), false)
                .await
                .context("image compression failed")?;
        }
        Commands::Video {
            input,
            codec,
            crf,
            ffmpeg,
            ffmpeg_args,
            timeout,
            output,
        } => {
            let bench = commands::video_workbench(VideoSettings {
                codec,
                crf,
                ffmpeg,
                ffmpeg_args,
                timeout_secs: timeout,
            })?;
            commands::run_workbench(&bench, input.as_deref(), output.as_deref(), true)
                .await
                .context("video compression failed")?;
        }
        Commands::Compare { input, level } => {
            commands::compare(&input, level)
                .await
                .with_context(|| format!("comparison failed for {:?}", input))?;
        }
        Commands::Info { input } => {
            commands::show_info(&input)
                .await
                .with_context(|| format!("could not inspect {:?}", input))?;
        }
    }
    Ok(())
}
