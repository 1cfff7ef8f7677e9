use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use plumbline::assessment::{self, SideOutcome};
use plumbline::interpret::Side;
use plumbline::storage::TempDirStore;
use plumbline::{config, PoseDetector};

const SCORE_BAR_CELLS: usize = 20;

#[derive(Parser)]
#[command(name = "plumbline")]
#[command(version, about = "Plumb-line posture analysis from side-view photos")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a left-side and a right-side full-body photo
    Assess {
        /// Left side view (JPEG or PNG)
        #[arg(short, long)]
        left: PathBuf,
        /// Right side view (JPEG or PNG)
        #[arg(short, long)]
        right: PathBuf,
        /// Directory for annotated images
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the default config file if none exists
    InitConfig,
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Assess {
            left,
            right,
            out,
            json,
        } => {
            let cfg = config::load_config(config_path)?;
            assess(&cfg, &left, &right, out.as_deref(), json)
        }
        Commands::InitConfig => init_config(config_path),
        Commands::Config => open_config(config_path),
    }
}

fn assess(
    cfg: &config::Config,
    left: &Path,
    right: &Path,
    out: Option<&Path>,
    json: bool,
) -> Result<()> {
    let left_bytes =
        std::fs::read(left).with_context(|| format!("reading {}", left.display()))?;
    let right_bytes =
        std::fs::read(right).with_context(|| format!("reading {}", right.display()))?;

    info!("Loading pose model: {}", cfg.model_path.display());
    let mut detector = PoseDetector::new(&cfg.model_path)
        .context("Failed to initialize pose landmark model")?
        .with_input_size(cfg.input_size)
        .with_min_confidence(cfg.min_detection_confidence);

    let store = match &cfg.temp_dir {
        Some(dir) => TempDirStore::at(dir)?,
        None => TempDirStore::new()?,
    };

    let outcomes = assessment::assess_pair(&mut detector, &store, &left_bytes, &right_bytes);

    if let Some(dir) = out {
        std::fs::create_dir_all(dir)?;
        for (side, outcome) in &outcomes {
            if let Some(a) = outcome.assessment() {
                let file = dir.join(format!("{}_annotated.png", side.label().to_lowercase()));
                std::fs::write(&file, &a.annotated_png)
                    .with_context(|| format!("writing {}", file.display()))?;
                info!("Saved {} side annotated image to {}", side, file.display());
            }
        }
    }

    if json {
        let doc: Vec<_> = outcomes
            .iter()
            .map(|(side, outcome)| serde_json::json!({ "side": side, "outcome": outcome }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    for (side, outcome) in &outcomes {
        println!();
        println!("{}", render_outcome(*side, outcome));
    }

    println!();
    println!("{}", COMPLETION_MESSAGE);
    Ok(())
}

const COMPLETION_MESSAGE: &str =
    "Posture analysis complete! Review both sides for asymmetry or tilt patterns.";

fn render_outcome(side: Side, outcome: &SideOutcome) -> String {
    match outcome {
        SideOutcome::Analyzed(a) => format!(
            "{} Side View Analysis\n{}\n{} {:.0}%\nPosture Condition: {}",
            side,
            a.report,
            score_bar(a.report.score_fraction()),
            a.report.score,
            a.report.condition
        ),
        SideOutcome::NoLandmarks => format!(
            "No body landmarks detected in {} side image. Please ensure the full body is visible.",
            side
        ),
        SideOutcome::Failed { message } => {
            format!("Error processing {} side image: {}", side, message)
        }
    }
}

fn score_bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * SCORE_BAR_CELLS as f64).round() as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(SCORE_BAR_CELLS - filled)
    )
}

fn init_config(path: Option<&Path>) -> Result<()> {
    let target = path.unwrap_or(config::CONFIG_PATH.as_path());
    if target.exists() {
        info!("Config already exists: {}", target.display());
        return Ok(());
    }
    config::save_config(&config::Config::default(), Some(target))?;
    info!("Wrote default config to {}", target.display());
    Ok(())
}

fn open_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.unwrap_or(config::CONFIG_PATH.as_path());
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
