//! CLI entry point for the COVID-19 data viewer.
//!
//! Loads the ECDC case-distribution feed once, then either runs the
//! interactive menu or answers a single query from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use covid_data_viewer::analyzers::comparable::REFERENCE_CODE;
use covid_data_viewer::analyzers::types::Metric;
use covid_data_viewer::dataset::WorldDataset;
use covid_data_viewer::fetch::{FEED_URL, fetch_feed_text};
use covid_data_viewer::load_dataset;
use covid_data_viewer::menu::Menu;
use covid_data_viewer::output::{print_comparable, print_countries, print_json, print_series};
use covid_data_viewer::render::{
    ChartOptions, ChartRequest, SpawnedRenderer, open_in_viewer, render_chart,
};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DATA_SOURCE_PAGE: &str = "https://www.ecdc.europa.eu/en/publications-data/download-todays-data-geographic-distribution-covid-19-cases-worldwide";

#[derive(Parser)]
#[command(name = "covid_data_viewer")]
#[command(about = "Plot COVID-19 case and death time series per country", long_about = None)]
struct Cli {
    /// Path to a local copy of the feed, or URL to fetch
    #[arg(short, long, global = true, value_name = "FILE_OR_URL", default_value = FEED_URL)]
    source: String,

    /// Country code whose report dates define the comparable countries
    #[arg(short, long, global = true, default_value = REFERENCE_CODE)]
    reference: String,

    /// Directory charts are written to
    #[arg(long, global = true, default_value = "charts")]
    chart_dir: PathBuf,

    /// Open each rendered chart in the system viewer
    #[arg(long, global = true, default_value_t = false)]
    open: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive menu (default)
    Interactive,
    /// List all country names and codes
    List,
    /// List the countries comparable with the reference country
    Comparable,
    /// Print the aggregated rows of one country
    Show {
        code: String,

        /// Print as JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Plot one metric for one country
    Plot {
        code: String,

        /// Graph type: 1 total cases, 2 total deaths, 3 death rate,
        /// 4 infection rate, 5 cases per million, 6 deaths per million
        #[arg(value_parser = parse_graph_type)]
        graph: Metric,
    },
    /// Plot one metric for two comparable countries
    Compare {
        first: String,
        second: String,

        /// Graph type, as for `plot`
        #[arg(value_parser = parse_graph_type)]
        graph: Metric,
    },
}

fn parse_graph_type(selector: &str) -> Result<Metric, String> {
    Metric::from_selector(selector).ok_or_else(|| format!("expected 1-6, got {selector:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _file_guard = init_tracing()?;

    let cli = Cli::parse();
    let options = ChartOptions {
        out_dir: cli.chart_dir.clone(),
        open_viewer: cli.open,
    };

    let text = fetch_feed_text(&cli.source).await?;
    let dataset = load_dataset(&text, &cli.reference.to_uppercase())
        .with_context(|| format!("failed to load feed from {}", cli.source))?;

    let mut stdout = std::io::stdout();
    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => run_interactive(Arc::new(dataset), options).await?,
        Commands::List => print_countries(&dataset, &mut stdout)?,
        Commands::Comparable => print_comparable(&dataset, &mut stdout)?,
        Commands::Show { code, json } => {
            let series = dataset.series(&code.to_uppercase())?;
            if json {
                print_json(series, &mut stdout)?;
            } else {
                print_series(series, &mut stdout)?;
            }
        }
        Commands::Plot { code, graph } => {
            let request = ChartRequest::single(&code.to_uppercase(), graph);
            render_now(dataset, request, options).await?;
        }
        Commands::Compare {
            first,
            second,
            graph,
        } => {
            let (first, second) = (first.to_uppercase(), second.to_uppercase());
            dataset.ensure_comparable(&[first.as_str(), second.as_str()])?;
            let request = ChartRequest::compare(&first, &second, graph);
            render_now(dataset, request, options).await?;
        }
    }

    Ok(())
}

/// Colored stderr output plus a JSON rolling log file. The returned guard
/// must live as long as the program so buffered file logs get flushed.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/covid_data_viewer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("covid_data_viewer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Runs the menu on the blocking pool, with charts spawned as detached
/// blocking tasks on the same runtime.
async fn run_interactive(dataset: Arc<WorldDataset>, options: ChartOptions) -> Result<()> {
    println!("\n    Welcome!\n    All data used is obtained from:\n    {DATA_SOURCE_PAGE}");
    info!(chart_dir = %options.out_dir.display(), "Charts will be written as SVG");

    let renderer = SpawnedRenderer::new(Handle::current(), Arc::clone(&dataset), options);
    tokio::task::spawn_blocking(move || -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let result = Menu::new(&dataset, stdin.lock(), stdout.lock(), renderer).run();
        stdout.flush()?;
        result
    })
    .await?
}

/// Renders one chart and waits for it, for the non-interactive subcommands.
async fn render_now(
    dataset: WorldDataset,
    request: ChartRequest,
    options: ChartOptions,
) -> Result<()> {
    let out_dir = options.out_dir.clone();
    let path =
        tokio::task::spawn_blocking(move || render_chart(&dataset, &request, &out_dir)).await??;
    println!("{}", path.display());
    if options.open_viewer {
        open_in_viewer(&path);
    }
    Ok(())
}
