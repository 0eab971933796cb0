use anyhow::{Context, Result};
use clap::Parser;
use ks2dash::{BoundarySet, DashboardConfig, RegionalData};
use std::{fs, path::PathBuf, time::Instant};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Precompute the local-authority choropleth so the front end can load it
/// without parsing the boundary file on every start.
#[derive(Parser, Debug)]
struct Args {
    /// YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JSON path
    #[arg(long, default_value = "assets/regional_map.json")]
    out: PathBuf,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = DashboardConfig::load(args.config.as_deref())?;
    let regional = &config.regional;
    let start = Instant::now();

    let data = RegionalData::load(&regional.table)?;
    let boundaries = BoundarySet::load(&regional.boundaries, &regional.region_key)?;
    let figure = data.choropleth(&boundaries, &regional.metric)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string(&figure).context("serializing choropleth")?;
    fs::write(&args.out, json).with_context(|| format!("writing {}", args.out.display()))?;

    info!(
        out = %args.out.display(),
        frames = figure.frames.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "snapshot written"
    );
    Ok(())
}
