//! Line charts of country series, rendered to SVG with plotters.
//!
//! Rendering runs on fire-and-forget blocking tasks so that a chart never
//! holds up the menu. Each task owns its [`ChartRequest`] and a shared
//! read-only handle to the dataset.

use crate::analyzers::types::Metric;
use crate::dataset::WorldDataset;
use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, error, info, info_span, warn};

pub const CHART_SIZE: (u32, u32) = (1600, 800);

/// Line colours, in series order: a single chart is red, a comparison is
/// blue then red.
const SINGLE_COLOR: RGBColor = RED;
const COMPARE_COLORS: [RGBColor; 2] = [BLUE, RED];

/// One chart to draw: a metric for one or two countries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub metric: Metric,
    pub codes: Vec<String>,
}

impl ChartRequest {
    pub fn single(code: &str, metric: Metric) -> Self {
        Self {
            metric,
            codes: vec![code.to_string()],
        }
    }

    pub fn compare(first: &str, second: &str, metric: Metric) -> Self {
        Self {
            metric,
            codes: vec![first.to_string(), second.to_string()],
        }
    }

    /// `death_rate_USA_vs_ITA.svg`
    pub fn file_name(&self) -> String {
        format!("{}_{}.svg", self.metric.slug(), self.codes.join("_vs_"))
    }

    /// `Total Cases: UNITED STATES OF AMERICA vs ITALY`
    pub fn title(&self, dataset: &WorldDataset) -> Result<String> {
        let names = self
            .codes
            .iter()
            .map(|code| dataset.name_for_code(code))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("{}: {}", self.metric.label(), names.join(" vs ")))
    }
}

/// Where charts go and what happens after they are written.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub out_dir: PathBuf,
    pub open_viewer: bool,
}

/// Receives chart requests from the menu.
pub trait ChartLauncher {
    /// Starts drawing `request` without waiting for it to finish.
    fn launch(&self, request: ChartRequest);
}

/// Renders each request on the runtime's blocking pool. Tasks are detached:
/// nothing is reported back, failures are logged from inside the task.
pub struct SpawnedRenderer {
    handle: Handle,
    dataset: Arc<WorldDataset>,
    options: ChartOptions,
}

impl SpawnedRenderer {
    pub fn new(handle: Handle, dataset: Arc<WorldDataset>, options: ChartOptions) -> Self {
        Self {
            handle,
            dataset,
            options,
        }
    }
}

impl ChartLauncher for SpawnedRenderer {
    fn launch(&self, request: ChartRequest) {
        let dataset = Arc::clone(&self.dataset);
        let options = self.options.clone();
        let span = info_span!(
            "render_chart",
            metric = request.metric.slug(),
            countries = %request.codes.join(","),
        );

        // The JoinHandle is dropped on purpose; the task runs detached.
        let _ = self.handle.spawn_blocking(move || {
            let _entered = span.enter();
            match render_chart(&dataset, &request, &options.out_dir) {
                Ok(path) => {
                    info!(path = %path.display(), "Chart rendered");
                    if options.open_viewer {
                        open_in_viewer(&path);
                    }
                }
                Err(e) => error!(error = %e, "Chart rendering failed"),
            }
        });
    }
}

/// Draws `request` into `out_dir` and returns the written file's path.
pub fn render_chart(
    dataset: &WorldDataset,
    request: &ChartRequest,
    out_dir: &Path,
) -> Result<PathBuf> {
    if request.codes.is_empty() {
        bail!("chart request names no country");
    }

    let mut lines: Vec<Line<'_>> = Vec::with_capacity(request.codes.len());
    for code in &request.codes {
        let dates = dataset.dates(code)?;
        let values = dataset.column(code, request.metric)?;
        let points = dates.into_iter().map(midnight_utc).zip(values).collect();
        lines.push((code.as_str(), points));
    }

    let Some((xmin, xmax)) = lines
        .iter()
        .flat_map(|(_, points)| points.iter().map(|(x, _)| *x))
        .fold(None, |acc: Option<(DateTime<Utc>, DateTime<Utc>)>, x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
        })
    else {
        bail!("no data to plot for {}", request.codes.join(", "));
    };
    let (xmin, xmax) = if xmin == xmax {
        (xmin - chrono::Duration::days(1), xmax + chrono::Duration::days(1))
    } else {
        (xmin, xmax)
    };

    let ymax = lines
        .iter()
        .flat_map(|(_, points)| points.iter().map(|(_, y)| *y))
        .fold(0.0, f64::max);
    let ymax = if ymax > 0.0 && ymax.is_finite() {
        ymax * 1.05
    } else {
        1.0
    };

    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(request.file_name());
    let title = request.title(dataset)?;
    debug!(path = %path.display(), "Drawing chart");

    draw_lines(&path, &title, request.metric, lines, (xmin..xmax, 0.0..ymax))?;
    Ok(path)
}

type Line<'a> = (&'a str, Vec<(DateTime<Utc>, f64)>);

fn draw_lines(
    path: &Path,
    title: &str,
    metric: Metric,
    lines: Vec<Line<'_>>,
    (x_range, y_range): (Range<DateTime<Utc>>, Range<f64>),
) -> Result<()> {
    let comparison = lines.len() > 1;
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(90)
        .y_label_area_size(120)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
        .label_style(("sans-serif", 18))
        .x_desc("Date")
        .y_desc(metric.label())
        .x_labels(20)
        .x_label_formatter(&|x: &DateTime<Utc>| x.format("%Y-%m-%d").to_string())
        .y_label_formatter(&|y: &f64| format_value(metric, *y))
        .draw()?;

    for (i, (code, points)) in lines.into_iter().enumerate() {
        let color = if comparison {
            COMPARE_COLORS[i % COMPARE_COLORS.len()]
        } else {
            SINGLE_COLOR
        };
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(code)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(2))
            });
    }

    if comparison {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(("sans-serif", 18))
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Axis label for `value`: counts get thousands separators, rates keep a few
/// decimals.
pub fn format_value(metric: Metric, value: f64) -> String {
    match metric {
        Metric::DeathRate | Metric::InfectionRate => format!("{value:.3}"),
        _ => thousands(value),
    }
}

/// `1234567.4` -> `1,234,567`
pub fn thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Hands a rendered chart to the platform's default viewer.
pub fn open_in_viewer(path: &Path) {
    let mut command = viewer_command(path);
    match command.spawn() {
        Ok(mut child) => {
            if let Err(e) = child.wait() {
                warn!(error = %e, "Viewer launcher did not exit cleanly");
            }
        }
        Err(e) => warn!(error = %e, path = %path.display(), "Could not launch chart viewer"),
    }
}

#[cfg(target_os = "macos")]
fn viewer_command(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(path);
    command
}

#[cfg(target_os = "windows")]
fn viewer_command(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(path);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn viewer_command(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}
