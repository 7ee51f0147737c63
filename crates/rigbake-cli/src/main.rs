//! rigbake CLI - inspect rigged models, bound their animations and capture sprite frames

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{bounds, capture, inspect};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rigbake")]
#[command(about = "Bake skeletal animations into bounded, camera-fitted sprite frames", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the bone tree, animations, materials, textures and meshes of a model
    Inspect {
        /// Path to a glTF/GLB model
        model: PathBuf,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Compute the bounding volume of an animation and the camera that frames it
    Bounds {
        /// Path to a glTF/GLB model
        model: PathBuf,

        /// Number of evenly spaced poses to sample
        #[arg(long, default_value = "24")]
        samples: usize,

        /// Animation name (defaults to the first one)
        #[arg(long)]
        animation: Option<String>,

        /// Vertical field of view in degrees
        #[arg(long, default_value = "45.0")]
        fov: f32,

        /// Viewport aspect ratio (width / height)
        #[arg(long, default_value = "1.0")]
        aspect: f32,
    },

    /// Render evenly spaced frames of an animation to PNG files
    Capture {
        /// Path to a glTF/GLB model (overrides the config file)
        model: Option<PathBuf>,

        /// TOML capture configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for frame PNGs
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Frame width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Frame height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Number of frames over one loop
        #[arg(long)]
        frames: Option<usize>,

        /// Poses sampled for the bounding volume (defaults to the frame count)
        #[arg(long)]
        samples: Option<usize>,

        /// Also write a sprite sheet with this many columns
        #[arg(long)]
        sheet: Option<u32>,

        /// Draw the bounding volume as a wireframe box
        #[arg(long)]
        wireframe: bool,

        /// Keep the configured camera instead of fitting it to the bounds
        #[arg(long)]
        no_fit: bool,

        /// Animation name (defaults to the first one)
        #[arg(long)]
        animation: Option<String>,

        /// Material view: phong, color, diffuse, normal, specular or emission
        #[arg(long)]
        view: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins when set
    let default_level = match (cli.verbose, cli.quiet) {
        (0, true) => "error",
        (0, false) => "warn",
        (1, _) => "info",
        (2, _) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Inspect { model, format } => inspect::run(&model, &format),
        Commands::Bounds {
            model,
            samples,
            animation,
            fov,
            aspect,
        } => bounds::run(bounds::BoundsArgs {
            model,
            samples,
            animation,
            fov,
            aspect,
        }),
        Commands::Capture {
            model,
            config,
            output,
            width,
            height,
            frames,
            samples,
            sheet,
            wireframe,
            no_fit,
            animation,
            view,
        } => capture::run(capture::CaptureArgs {
            config,
            overrides: config::CaptureOverrides {
                model,
                output,
                width,
                height,
                frames,
                bounds_samples: samples,
                sheet_columns: sheet,
                show_bounds: wireframe,
                no_fit,
                animation,
                material_view: view,
            },
            quiet: cli.quiet,
        }),
    }
}
