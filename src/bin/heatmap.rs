// Usage: target/release/heatmap [--metric distance] [--divider wait|none] [--counts-image] [--cell-table]

use anyhow::{Context, Result};
use clap::Parser;
use hitchmap::{resolve_database, run, Config, Metric, MIN_COUNT, N_BINS};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(about = "Bin hitchhiking spots into a grid and draw it as an interactive heatmap")]
struct Opts {
    /// Averaged per cell: distance or wait
    #[arg(long, default_value = "distance")]
    metric: Metric,

    /// Divides the metric's cell mean, `none` to disable
    // spelled out so clap hands the whole Option to parse_divider
    #[arg(long, default_value = "wait", value_parser = parse_divider)]
    divider: std::option::Option<Metric>,

    /// SQLite database, defaults to db/prod-points.sqlite or db/points.sqlite
    #[arg(long, env = "HEATMAP_DATABASE")]
    database: Option<PathBuf>,

    /// Where the reports go, created if missing
    #[arg(long, env = "HEATMAP_OUT_DIR", default_value = "dist")]
    out_dir: PathBuf,

    /// Bins per axis
    #[arg(long, default_value_t = N_BINS)]
    bins: usize,

    /// Cells with fewer samples are not drawn
    #[arg(long, default_value_t = MIN_COUNT)]
    min_count: usize,

    /// Also save the per-cell sample counts as a png
    #[arg(long)]
    counts_image: bool,

    /// Also save every cell as a csv row
    #[arg(long)]
    cell_table: bool,
}

fn parse_divider(s: &str) -> Result<Option<Metric>, hitchmap::HeatmapError> {
    match s.trim() {
        "" | "none" => Ok(None),
        other => other.parse().map(Some),
    }
}

impl From<Opts> for Config {
    fn from(opts: Opts) -> Self {
        Config {
            metric: opts.metric,
            divider: opts.divider,
            database: opts
                .database
                .unwrap_or_else(|| resolve_database(Path::new("db"))),
            out_dir: opts.out_dir,
            bins: opts.bins,
            min_count: opts.min_count,
            counts_image: opts.counts_image,
            cell_table: opts.cell_table,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logger - defaults to RUST_LOG if set, otherwise INFO
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let config = Config::from(Opts::parse());
    info!(
        "heatmap of {}{} from {}",
        config.metric,
        config
            .divider
            .map(|d| format!(" per {}", d))
            .unwrap_or_default(),
        config.database.display()
    );

    let report = run(&config)
        .with_context(|| format!("failed to build {}", config.html_file_name()))?;

    info!(
        "{} points loaded, {} binned, {} cells occupied, {} drawn",
        report.points, report.binned, report.occupied_cells, report.rendered_cells
    );
    for path in &report.outputs {
        info!("wrote {}", path.display());
    }
    Ok(())
}
