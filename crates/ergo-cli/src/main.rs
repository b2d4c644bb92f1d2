use anyhow::Result;
use clap::{Parser, Subcommand};
use ergo_lib::{
    analysis::{
        fetch_dataset, first_last_stages, long_table, stage_count, stage_means, stage_rows,
        validate_long_table,
    },
    config::{read_config, StudyConfig},
    plot::{figure_from_dataset, figure_from_stage_comparison, Figure, PlotBackend, Series},
    store::LocalDirStore,
    synth::{generate_study, sync_study},
};
use log::info;
use plotters::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "ergo",
    version,
    about = "Synthetic heart-rate training-study tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the participants x sessions dataset and upload the
    /// per-session files to the store directory
    Generate {
        /// Study config TOML; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        store: PathBuf,
        /// Overrides the seed from the config
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Fetch every session file, reshape to a long table, validate sample
    /// counts, aggregate exercise stages, and print the first/last stage
    /// comparison as JSON
    Analyze {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        store: PathBuf,
        /// Overrides the stage width from the config (seconds)
        #[arg(long)]
        stage_width: Option<u32>,
        /// Render all session traces to this PNG
        #[arg(long)]
        traces_out: Option<PathBuf>,
        /// Render the first/last stage comparison to this PNG
        #[arg(long)]
        stages_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            config,
            store,
            seed,
        } => cmd_generate(config.as_deref(), &store, seed)?,
        Commands::Analyze {
            config,
            store,
            stage_width,
            traces_out,
            stages_out,
        } => cmd_analyze(
            config.as_deref(),
            &store,
            stage_width,
            traces_out.as_deref(),
            stages_out.as_deref(),
        )?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<StudyConfig> {
    match path {
        Some(path) => read_config(path),
        None => Ok(StudyConfig::default()),
    }
}

fn cmd_generate(config: Option<&Path>, store_dir: &Path, seed: Option<u64>) -> Result<()> {
    let mut cfg = load_config(config)?;
    if seed.is_some() {
        cfg.seed = seed;
    }
    let store = LocalDirStore::create(store_dir)?;
    let dataset = generate_study(&cfg)?;
    let uploaded = sync_study(&store, &dataset)?;
    info!("synced {uploaded} files to {}", store_dir.display());
    let summary = json!({
        "study": cfg.name,
        "participants": cfg.participants,
        "sessions": cfg.sessions,
        "duration_s": cfg.durations.total_s(),
        "seed": cfg.seed.unwrap_or(0),
        "files": uploaded,
    });
    println!("{summary}");
    Ok(())
}

fn cmd_analyze(
    config: Option<&Path>,
    store_dir: &Path,
    stage_width: Option<u32>,
    traces_out: Option<&Path>,
    stages_out: Option<&Path>,
) -> Result<()> {
    let cfg = load_config(config)?;
    let stage_width = stage_width.unwrap_or(cfg.stage_width_s);
    let store = LocalDirStore::open(store_dir);
    let dataset = fetch_dataset(&store)?;
    let df = long_table(&dataset)?;
    validate_long_table(&df, cfg.durations.total_s() as usize)?;
    let stages = stage_means(&df, &cfg.durations, stage_width)?;
    let n_stages = stage_count(&cfg.durations, stage_width);
    let comparison = first_last_stages(&stages, n_stages)?;
    let rows = stage_rows(&comparison)?;

    if let Some(path) = traces_out {
        let fig = figure_from_dataset(&dataset, 1024);
        PngBackend::new(path).draw(&fig)?;
        info!("wrote {}", path.display());
    }
    if let Some(path) = stages_out {
        let fig = figure_from_stage_comparison(&rows, n_stages);
        PngBackend::new(path).draw(&fig)?;
        info!("wrote {}", path.display());
    }

    let summary = json!({
        "sessions": dataset.len(),
        "n_stages": n_stages,
        "comparison": rows,
    });
    println!("{summary}");
    Ok(())
}

fn bounds(values: impl Iterator<Item = f64>, fallback: (f64, f64)) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && min < max {
        (min, max)
    } else {
        fallback
    }
}

/// Renders figures to PNG files via plotters.
struct PngBackend {
    path: PathBuf,
}

impl PngBackend {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl PlotBackend for PngBackend {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        draw_plotters_figure(&self.path, fig)
    }
}

fn draw_plotters_figure(path: &Path, fig: &Figure) -> Result<()> {
    let backend = BitMapBackend::new(path, (800, 480));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let points = fig.series.iter().flat_map(|series| match series {
        Series::Line(line) => line.points.iter(),
    });
    let (x_min, x_max) = bounds(points.clone().map(|p| p[0]), (0.0, 1.0));
    let (y_min, y_max) = bounds(points.map(|p| p[1]), (0.0, 1.0));
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    chart.configure_mesh().draw()?;
    for series in &fig.series {
        match series {
            Series::Line(line) => {
                let color = RGBColor(
                    ((line.style.color.0 >> 16) & 0xFF) as u8,
                    ((line.style.color.0 >> 8) & 0xFF) as u8,
                    (line.style.color.0 & 0xFF) as u8,
                );
                chart.draw_series(LineSeries::new(
                    line.points.iter().map(|p| (p[0], p[1])),
                    &color,
                ))?;
            }
        }
    }
    root.present()?;
    Ok(())
}
