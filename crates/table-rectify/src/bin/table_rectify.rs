//! table-rectify CLI: rectify snooker/pool table images to a top-down view.

use clap::{ArgAction, Parser};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use table_rectify::detect::{color_view, open_rgb, to_rgb_image};
use table_rectify::{
    FailurePolicy, FailureTracker, RectifyConfig, RectifyError, RectifyReport, TableRectifier,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "table-rectify")]
#[command(about = "Find a table by its felt color and warp it to a top-down view")]
#[command(version)]
struct Cli {
    /// Input images. Several inputs are processed as frames of one sequence.
    inputs: Vec<PathBuf>,

    /// Directory for `<stem>_rectified.png` (and reports).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON config with inputs, output directory, policy and parameters.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Failure policy: skip, abort or abort-after:N.
    #[arg(long)]
    policy: Option<FailurePolicy>,

    /// Write `<stem>_report.json` for every input.
    #[arg(long)]
    report: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = table_rectify::core::level_from_verbosity(verbose);

    // Ignore errors if a logger/subscriber was already installed.
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init_with_filter(level);
        table_rectify::core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = table_rectify::core::init_with_level(level);
    }
}

fn resolve_config(cli: &Cli) -> CliResult<RectifyConfig> {
    let mut cfg = match &cli.config {
        Some(path) => RectifyConfig::load_json(path)?,
        None => RectifyConfig::default(),
    };
    if !cli.inputs.is_empty() {
        cfg.inputs = cli.inputs.iter().map(|p| p.display().to_string()).collect();
    }
    if let Some(dir) = &cli.output_dir {
        cfg.output_dir = Some(dir.display().to_string());
    }
    if let Some(policy) = cli.policy {
        cfg.policy = policy;
    }
    cfg.write_report |= cli.report;
    Ok(cfg)
}

fn run(cli: &Cli) -> CliResult<ExitCode> {
    let cfg = resolve_config(cli)?;
    if cfg.inputs.is_empty() {
        return Err("no input images (pass paths or set \"inputs\" in the config)".into());
    }

    let out_dir = cfg.output_dir();
    fs::create_dir_all(&out_dir)?;

    let rectifier = TableRectifier::new(cfg.params.clone());
    let mut tracker = FailureTracker::new(cfg.policy);

    for (frame, input) in cfg.inputs.iter().enumerate() {
        let input = Path::new(input);
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("frame")
            .to_string();

        let result = open_rgb(input)
            .map_err(|e| RectifyError::InvalidImage {
                reason: format!("{}: {e}", input.display()),
            })
            .and_then(|img| rectifier.rectify(&color_view(&img)));

        let report = match &result {
            Ok(table) => {
                let out_path = out_dir.join(format!("{stem}_rectified.png"));
                to_rgb_image(&table.image)?.save(&out_path)?;
                println!("{} -> {}", input.display(), out_path.display());
                RectifyReport::from_result(Some(input), Some(&out_path), table)
            }
            Err(err) => {
                eprintln!("{}: {err}", input.display());
                RectifyReport::from_error(Some(input), err)
            }
        };

        if cfg.write_report {
            let report_path = out_dir.join(format!("{stem}_report.json"));
            report.write_json(&report_path)?;
            info!("wrote report to {}", report_path.display());
        }

        tracker.record(frame, &result)?;
    }

    if cfg.inputs.len() == 1 && tracker.failed() > 0 {
        return Ok(ExitCode::FAILURE);
    }
    info!(
        "processed {} inputs, {} failed (policy {})",
        cfg.inputs.len(),
        tracker.failed(),
        cfg.policy
    );
    Ok(ExitCode::SUCCESS)
}
