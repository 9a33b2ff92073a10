use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facematch_core::{
    detector::largest_face, loader::load_image, FaceDetector, SkinBlobDetector, Verifier,
};

mod config;

#[derive(Parser)]
#[command(name = "facematch", about = "Face comparison and verification CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two images and report whether they show the same face
    Compare {
        /// First image file
        image_a: PathBuf,
        /// Second image file
        image_b: PathBuf,
        /// Emit the result as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Locate faces in a single image
    Detect {
        /// Image file
        image: PathBuf,
        /// Emit the detections as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = config::from_env();

    match cli.command {
        Commands::Compare { image_a, image_b, json } => {
            let verifier = Verifier::with_detector(Arc::new(SkinBlobDetector), config);
            let result = verifier
                .compare_paths(&image_a, &image_b)
                .await
                .context("comparison failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.message);
                println!("confidence: {:.2}%", result.confidence);
            }
            // Script-friendly: success exit only on a positive match
            Ok(if result.is_match { ExitCode::SUCCESS } else { ExitCode::from(1) })
        }
        Commands::Detect { image, json } => {
            let grid = tokio::task::spawn_blocking({
                let image = image.clone();
                let max_dimension = config.max_dimension;
                move || load_image(&image, max_dimension)
            })
            .await?
            .with_context(|| format!("failed to load {}", image.display()))?;

            let detector = SkinBlobDetector;
            let faces = detector
                .detect(&grid, &config.detector_options)
                .context("detection failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&faces)?);
            } else if faces.is_empty() {
                println!("no faces found");
            } else {
                for face in &faces {
                    let dominant = largest_face(&faces) == Some(face);
                    println!(
                        "face at ({}, {}) {}x{}{}",
                        face.left,
                        face.top,
                        face.width,
                        face.height,
                        if dominant { " [dominant]" } else { "" }
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
