use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ks2dash::{
    BoundarySet, ChartKind, Dashboard, DashboardConfig, Gender, RegionalData, Selection,
    YearChoice,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Explore KS2 attainment tables from the command line.
#[derive(Parser, Debug)]
#[command(name = "ks2dash", version)]
struct Cli {
    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `data_dir` from the config
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List loaded tables
    Tables,
    /// Resolve the dropdowns for a selection
    Controls(SelectionArgs),
    /// Build the figure for a selection
    Figure(SelectionArgs),
    /// Local-authority figures
    Regional {
        #[command(subcommand)]
        view: RegionalView,
        /// Metric column; defaults to `regional.metric`
        #[arg(long, global = true)]
        metric: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum RegionalView {
    /// Animated ranking of authorities
    Ranking,
    /// Animated choropleth
    Map,
}

#[derive(Args, Debug)]
struct SelectionArgs {
    #[arg(long)]
    table: Option<String>,
    /// Period code such as 201718, or `all`
    #[arg(long)]
    year: Option<YearChoice>,
    #[arg(long = "category")]
    categories: Vec<String>,
    #[arg(long = "sub-category")]
    sub_categories: Vec<String>,
    #[arg(long)]
    metric: Option<String>,
    #[arg(long, default_value = "Total")]
    gender: Gender,
    #[arg(long, default_value = "bar")]
    chart: ChartKind,
}

impl SelectionArgs {
    /// Apply flags in dropdown order so each one lands after the fields it
    /// depends on.
    fn to_selection(&self) -> Selection {
        let mut selection = Selection::new();
        selection.set_table(self.table.clone());
        selection.set_year(self.year.clone());
        selection.set_categories(self.categories.clone());
        selection.set_sub_categories(self.sub_categories.clone());
        selection.set_metric(self.metric.clone());
        selection.set_gender(self.gender);
        selection.set_chart_kind(self.chart);
        selection
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Command::Tables => print_json(&Dashboard::load(config)?.tables()),
        Command::Controls(args) => {
            let dashboard = Dashboard::load(config)?;
            print_json(&dashboard.controls(&args.to_selection())?)
        }
        Command::Figure(args) => {
            let dashboard = Dashboard::load(config)?;
            let figure = dashboard.figure(&args.to_selection())?;
            info!(title = %figure.title, points = figure.point_count(), "figure ready");
            print_json(&*figure)
        }
        Command::Regional { view, metric } => {
            let regional = &config.regional;
            let metric = metric.unwrap_or_else(|| regional.metric.clone());
            let data = RegionalData::load(&regional.table)?;
            match view {
                RegionalView::Ranking => print_json(&data.la_ranking(&metric)?),
                RegionalView::Map => {
                    let boundaries = BoundarySet::load(&regional.boundaries, &regional.region_key)?;
                    print_json(&data.choropleth(&boundaries, &metric)?)
                }
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{}", out);
    Ok(())
}
