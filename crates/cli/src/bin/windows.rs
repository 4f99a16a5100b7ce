//! Extract visibility windows from a sampled history.
//!
//! Two input layouts are accepted:
//! - `series`: columns `t,v` with an optional `dv` column holding `dv/dt`.
//! - `states`: columns `t,x1,y1,z1,vx1,vy1,vz1,x2,y2,z2,vx2,vy2,vz2`; the visibility history
//!   is sampled against an occluding body from the catalog.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use satvis::access::{body_from_config, compute_access};
use satvis::config::{ExtractionConfig, find_body, load_bodies, load_extraction};
use satvis::export::{self, report};
use satvis::geometry::StateVector;
use satvis::windows::{
    ExtractionMode, WindowExtraction, extract_windows, extract_windows_with_derivatives,
};

#[derive(Parser)]
#[command(author, version, about = "Visibility window extraction")]
struct Cli {
    /// Input CSV file
    #[arg(long)]
    input: PathBuf,

    /// Input layout
    #[arg(long, value_enum, default_value_t = InputFormat::Series)]
    format: InputFormat,

    /// Extraction settings (YAML or TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extraction mode (`der` or `linear`); overrides the settings file
    #[arg(long)]
    mode: Option<String>,

    /// Window label (defaults to the settings file, then the input file stem)
    #[arg(long)]
    label: Option<String>,

    /// Occluding body catalog (YAML list, TOML file or directory of TOML files)
    #[arg(long, default_value = "configs/bodies")]
    bodies: PathBuf,

    /// Occluding body name for `states` input (case-insensitive)
    #[arg(long)]
    body: Option<String>,

    /// Write windows as CSV (`-` for stdout)
    #[arg(long)]
    windows_csv: Option<PathBuf>,

    /// Write crossings as CSV (`-` for stdout)
    #[arg(long)]
    crossings_csv: Option<PathBuf>,

    /// Write a JSON report
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Copy, Clone, ValueEnum, Debug, PartialEq, Eq)]
enum InputFormat {
    Series,
    States,
}

#[derive(Debug, Deserialize)]
struct SeriesRow {
    t: f64,
    v: f64,
    #[serde(default)]
    dv: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StatesRow {
    t: f64,
    x1: f64,
    y1: f64,
    z1: f64,
    vx1: f64,
    vy1: f64,
    vz1: f64,
    x2: f64,
    y2: f64,
    z2: f64,
    vx2: f64,
    vy2: f64,
    vz2: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => load_extraction(path)
            .with_context(|| format!("loading extraction settings from {}", path.display()))?,
        None => ExtractionConfig::default(),
    };

    let mode = ExtractionMode::from_name(cli.mode.as_deref().unwrap_or(&settings.mode));
    let label = cli
        .label
        .clone()
        .or_else(|| settings.label.clone())
        .unwrap_or_else(|| default_label(&cli.input));

    let mut body_name = None;
    let (times, extraction) = match cli.format {
        InputFormat::Series => {
            let rows: Vec<SeriesRow> = read_rows(&cli.input)?;
            let times: Vec<f64> = rows.iter().map(|r| r.t).collect();
            let values: Vec<f64> = rows.iter().map(|r| r.v).collect();
            let derivatives: Option<Vec<f64>> = rows.iter().map(|r| r.dv).collect();
            let extraction = match derivatives {
                Some(derivatives) => {
                    extract_windows_with_derivatives(&values, &derivatives, &times, &label, mode)?
                }
                None => extract_windows(&values, &times, &label, mode)?,
            };
            (times, extraction)
        }
        InputFormat::States => {
            let Some(name) = cli.body.clone().or_else(|| settings.body.clone()) else {
                bail!("`states` input needs an occluding body (--body or `body` in settings)");
            };
            let catalog = load_bodies(&cli.bodies)
                .with_context(|| format!("loading body catalog from {}", cli.bodies.display()))?;
            let body_config = find_body(&catalog, &name)?;
            let body = body_from_config(body_config);
            body_name = Some(body_config.name.clone());

            let rows: Vec<StatesRow> = read_rows(&cli.input)?;
            let times: Vec<f64> = rows.iter().map(|r| r.t).collect();
            let first: Vec<StateVector> = rows
                .iter()
                .map(|r| StateVector::new([r.x1, r.y1, r.z1], [r.vx1, r.vy1, r.vz1]))
                .collect();
            let second: Vec<StateVector> = rows
                .iter()
                .map(|r| StateVector::new([r.x2, r.y2, r.z2], [r.vx2, r.vy2, r.vz2]))
                .collect();
            let extraction = compute_access(&times, &first, &second, &body, &label, mode)?;
            (times, extraction)
        }
    };

    info!(
        label = label.as_str(),
        mode = mode.name(),
        samples = times.len(),
        "extraction finished"
    );
    print_summary(&label, mode, times.len(), &extraction);

    if let Some(path) = &cli.windows_csv {
        let mut writer = export::writer_for_path(path)?;
        export::windows::write_all(&mut writer, &extraction.windows)
            .with_context(|| format!("writing windows to {}", path.display()))?;
    }
    if let Some(path) = &cli.crossings_csv {
        let mut writer = export::writer_for_path(path)?;
        export::crossings::write_all(&mut writer, &extraction.crossings)
            .with_context(|| format!("writing crossings to {}", path.display()))?;
    }
    if let Some(path) = &cli.json {
        let meta = report::Metadata {
            label: &label,
            mode,
            body: body_name.as_deref(),
            samples: times.len(),
            start: times.first().copied().unwrap_or(0.0),
            end: times.last().copied().unwrap_or(0.0),
        };
        report::write_report(path, &meta, &extraction)
            .with_context(|| format!("writing report to {}", path.display()))?;
    }

    Ok(())
}

fn read_rows<T>(path: &Path) -> anyhow::Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for (line, record) in reader.deserialize().enumerate() {
        let row: T = record.with_context(|| format!("{}: bad row {}", path.display(), line + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

fn default_label(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pair")
        .to_string()
}

fn print_summary(label: &str, mode: ExtractionMode, samples: usize, extraction: &WindowExtraction) {
    println!(
        "{label}: {} windows, {} crossings ({} samples, mode {})",
        extraction.windows.len(),
        extraction.crossings.len(),
        samples,
        mode.name()
    );
    for crossing in &extraction.crossings {
        println!("  {:<4} t = {:.6}", crossing.direction.label(), crossing.time);
    }
    for window in &extraction.windows {
        println!(
            "  [{:.6}, {:.6})  duration {:.6}",
            window.start(),
            window.end(),
            window.duration()
        );
    }
    println!(
        "  total visible: {:.6}",
        extraction.windows.total_duration(label)
    );
}
