use crate::aggregator::LogAggregator;
use crate::config::VisualizationConfig;
use crate::error::VisualizationError;
use crate::events::{Severity, Timestamp};
use crate::reports::timestamp_suffix;
use crate::visualization::svg::{Anchor, SvgDocument};
use chrono::Local;
use log::{error, info};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Window of the response-time rolling mean in the time series chart
const ROLLING_WINDOW: usize = 10;

const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 90.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 80.0;
const AXIS_COLOR: &str = "#333333";
const GRID_COLOR: &str = "#dddddd";
const RESPONSE_TIME_COLOR: &str = "#d62728";

/// Charts produced for every cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChartKind {
    SeverityDistribution,
    TimeSeries,
    HourlyDistribution,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [
        ChartKind::SeverityDistribution,
        ChartKind::TimeSeries,
        ChartKind::HourlyDistribution,
    ];

    /// Prefix of the chart's file name
    pub fn file_stem(&self) -> &'static str {
        match self {
            ChartKind::SeverityDistribution => "severity_distribution",
            ChartKind::TimeSeries => "time_series",
            ChartKind::HourlyDistribution => "hourly_distribution",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "#4c72b0",
        Severity::Warning => "#dd8452",
        Severity::Error => "#c44e52",
    }
}

/// Renders the per-cycle SVG charts into an output directory
///
/// Each chart is rendered independently; a failing chart is reported as
/// `false` by [`Visualizer::generate_all`] and does not affect the others.
#[derive(Debug, Clone)]
pub struct Visualizer {
    output_dir: PathBuf,
    config: VisualizationConfig,
}

impl Visualizer {
    pub fn new(output_dir: impl Into<PathBuf>, config: VisualizationConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            config,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render every chart, stamping file names with the current local time
    pub fn generate_all(&self, aggregator: &LogAggregator) -> BTreeMap<ChartKind, bool> {
        self.generate_all_at(aggregator, Local::now().naive_local())
    }

    /// Render every chart, stamping file names with `generated_at`
    pub fn generate_all_at(
        &self,
        aggregator: &LogAggregator,
        generated_at: Timestamp,
    ) -> BTreeMap<ChartKind, bool> {
        info!("Starting visualization generation...");

        let results: BTreeMap<ChartKind, bool> = ChartKind::ALL
            .iter()
            .map(|&kind| {
                let ok = match self.render(kind, aggregator, generated_at) {
                    Ok(path) => {
                        info!("Successfully saved visualization: {}", path.display());
                        true
                    }
                    Err(e) => {
                        error!("Error creating {} chart: {}", kind, e);
                        false
                    }
                };
                (kind, ok)
            })
            .collect();

        let succeeded = results.values().filter(|ok| **ok).count();
        info!(
            "Visualization generation completed. {}/{} visualizations created successfully.",
            succeeded,
            results.len()
        );
        results
    }

    /// Render one chart and write it to disk
    pub fn render(
        &self,
        kind: ChartKind,
        aggregator: &LogAggregator,
        generated_at: Timestamp,
    ) -> Result<PathBuf, VisualizationError> {
        let svg = match kind {
            ChartKind::SeverityDistribution => self.severity_distribution(aggregator)?,
            ChartKind::TimeSeries => self.time_series(aggregator)?,
            ChartKind::HourlyDistribution => self.hourly_distribution(aggregator)?,
        };

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!(
            "{}_{}.svg",
            kind.file_stem(),
            timestamp_suffix(generated_at)
        ));
        std::fs::write(&path, svg)?;
        Ok(path)
    }

    /// Pie chart of severity shares with percentage labels
    fn severity_distribution(&self, aggregator: &LogAggregator) -> Result<String, VisualizationError> {
        let counts = aggregator.severity_counts();
        let total: usize = counts.values().sum();
        if total == 0 {
            return Err(VisualizationError::NoData("no events".to_string()));
        }

        let mut doc = SvgDocument::new(self.config.width, self.config.height);
        doc.text(
            doc.width() / 2.0,
            40.0,
            "Distribution of Log Severity Levels",
            20,
            Anchor::Middle,
        );

        let center = (doc.width() / 2.0, doc.height() / 2.0 + 15.0);
        let radius = (doc.width().min(doc.height()) / 2.0 - MARGIN_TOP).max(10.0);
        let present: Vec<(Severity, usize)> = counts
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .collect();

        let mut angle = 0.0;
        for (severity, count) in &present {
            let share = *count as f64 / total as f64;
            let sweep = share * std::f64::consts::TAU;
            if present.len() == 1 {
                doc.circle(center, radius, severity_color(*severity));
            } else {
                doc.pie_slice(center, radius, angle, angle + sweep, severity_color(*severity));
            }

            let mid = angle + sweep / 2.0;
            let label_radius = radius * 0.65;
            doc.text(
                center.0 + label_radius * mid.sin(),
                center.1 - label_radius * mid.cos(),
                &format!("{:.1}%", share * 100.0),
                16,
                Anchor::Middle,
            );
            let outer = radius + 24.0;
            doc.text(
                center.0 + outer * mid.sin(),
                center.1 - outer * mid.cos(),
                severity.as_str(),
                14,
                Anchor::Middle,
            );
            angle += sweep;
        }

        Ok(doc.finish())
    }

    /// Hourly event counts per severity, with the rolling mean response time
    /// on a secondary axis
    fn time_series(&self, aggregator: &LogAggregator) -> Result<String, VisualizationError> {
        let timeline = aggregator.hourly_timeline();
        let response_series = aggregator.response_time_rolling_mean(ROLLING_WINDOW);

        // The axis covers hour buckets and exact response-time samples alike
        let instants = timeline
            .keys()
            .copied()
            .chain(response_series.iter().map(|(ts, _)| *ts));
        let (Some(first), Some(last)) = (instants.clone().min(), instants.max()) else {
            return Err(VisualizationError::NoData(
                "no timestamped events".to_string(),
            ));
        };

        let mut doc = SvgDocument::new(self.config.width, self.config.height);
        let plot = PlotArea::new(&doc);
        doc.text(
            doc.width() / 2.0,
            40.0,
            "Log Events and Response Times Over Time",
            20,
            Anchor::Middle,
        );
        plot.draw_axes(&mut doc);

        let span = (last - first).num_seconds().max(0) as f64;
        let x_of = |ts: Timestamp| {
            if span == 0.0 {
                plot.left + plot.width / 2.0
            } else {
                let x = plot.left + (ts - first).num_seconds() as f64 / span * plot.width;
                x.clamp(plot.left, plot.right())
            }
        };

        let max_count = timeline
            .values()
            .flat_map(|counts| counts.iter().copied())
            .max()
            .unwrap_or(0)
            .max(1) as f64;
        plot.y_ticks(&mut doc, max_count, Anchor::End, plot.left - 8.0);
        doc.vertical_text(25.0, plot.top + plot.height / 2.0, "Number of Logs", 14);

        for (idx, severity) in Severity::ALL.iter().enumerate() {
            let points: Vec<(f64, f64)> = timeline
                .iter()
                .map(|(ts, counts)| (x_of(*ts), plot.y_of(counts[idx] as f64, max_count)))
                .collect();
            Self::series(&mut doc, &points, severity_color(*severity), false);
        }

        if !response_series.is_empty() {
            let max_rt = response_series
                .iter()
                .map(|(_, v)| *v)
                .fold(0.0_f64, f64::max)
                .max(1.0);
            let points: Vec<(f64, f64)> = response_series
                .iter()
                .map(|(ts, v)| (x_of(*ts), plot.y_of(*v, max_rt)))
                .collect();
            Self::series(&mut doc, &points, RESPONSE_TIME_COLOR, true);
            plot.y_ticks(&mut doc, max_rt, Anchor::Start, plot.right() + 8.0);
            doc.vertical_text(
                doc.width() - 20.0,
                plot.top + plot.height / 2.0,
                "Response Time (ms)",
                14,
            );
        }

        doc.text(
            plot.left,
            plot.bottom() + 25.0,
            &first.format("%Y-%m-%d %H:%M").to_string(),
            12,
            Anchor::Start,
        );
        doc.text(
            plot.right(),
            plot.bottom() + 25.0,
            &last.format("%Y-%m-%d %H:%M").to_string(),
            12,
            Anchor::End,
        );
        doc.text(
            plot.left + plot.width / 2.0,
            plot.bottom() + 55.0,
            "Time",
            14,
            Anchor::Middle,
        );

        let mut legend_y = plot.top + 10.0;
        for severity in Severity::ALL {
            Self::legend_entry(&mut doc, plot.left + 10.0, legend_y, severity_color(severity), severity.as_str());
            legend_y += 20.0;
        }
        if !response_series.is_empty() {
            Self::legend_entry(&mut doc, plot.left + 10.0, legend_y, RESPONSE_TIME_COLOR, "Avg Response Time");
        }

        Ok(doc.finish())
    }

    /// Hour-of-day by severity heatmap with annotated counts
    fn hourly_distribution(&self, aggregator: &LogAggregator) -> Result<String, VisualizationError> {
        if !aggregator.has_timestamps() {
            return Err(VisualizationError::NoData(
                "no timestamped events".to_string(),
            ));
        }
        let matrix = aggregator.hour_of_day_matrix();
        let max_count = matrix
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
            .max(1) as f64;

        let mut doc = SvgDocument::new(self.config.width, self.config.height);
        let plot = PlotArea::new(&doc);
        doc.text(
            doc.width() / 2.0,
            40.0,
            "Hourly Distribution of Log Events by Severity",
            20,
            Anchor::Middle,
        );

        let cell_w = plot.width / Severity::ALL.len() as f64;
        let cell_h = plot.height / 24.0;
        let font = (cell_h * 0.6).clamp(6.0, 14.0) as u32;

        for (hour, row) in matrix.iter().enumerate() {
            let y = plot.top + hour as f64 * cell_h;
            for (col, count) in row.iter().enumerate() {
                let x = plot.left + col as f64 * cell_w;
                doc.rect(x, y, cell_w, cell_h, &heat_color(*count as f64 / max_count));
                doc.text(
                    x + cell_w / 2.0,
                    y + cell_h * 0.7,
                    &count.to_string(),
                    font,
                    Anchor::Middle,
                );
            }
            doc.text(
                plot.left - 8.0,
                y + cell_h * 0.7,
                &hour.to_string(),
                font,
                Anchor::End,
            );
        }

        for (col, severity) in Severity::ALL.iter().enumerate() {
            doc.text(
                plot.left + (col as f64 + 0.5) * cell_w,
                plot.bottom() + 25.0,
                severity.as_str(),
                14,
                Anchor::Middle,
            );
        }
        doc.text(
            plot.left + plot.width / 2.0,
            plot.bottom() + 55.0,
            "Severity Level",
            14,
            Anchor::Middle,
        );
        doc.vertical_text(25.0, plot.top + plot.height / 2.0, "Hour of Day", 14);

        Ok(doc.finish())
    }

    /// A line through `points`, or a marker when there is only one point
    fn series(doc: &mut SvgDocument, points: &[(f64, f64)], color: &str, dashed: bool) {
        match points {
            [single] => doc.circle(*single, 4.0, color),
            _ => doc.polyline(points, color, dashed),
        }
    }

    fn legend_entry(doc: &mut SvgDocument, x: f64, y: f64, color: &str, label: &str) {
        doc.rect(x, y - 10.0, 14.0, 10.0, color);
        doc.text(x + 20.0, y, label, 12, Anchor::Start);
    }
}

/// Yellow to red ramp for `intensity` in `[0, 1]`
fn heat_color(intensity: f64) -> String {
    let t = intensity.clamp(0.0, 1.0);
    let lerp = |from: f64, to: f64| (from + (to - from) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        lerp(255.0, 189.0),
        lerp(255.0, 0.0),
        lerp(204.0, 38.0)
    )
}

/// Inner plotting rectangle of a chart
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl PlotArea {
    fn new(doc: &SvgDocument) -> Self {
        Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: (doc.width() - MARGIN_LEFT - MARGIN_RIGHT).max(1.0),
            height: (doc.height() - MARGIN_TOP - MARGIN_BOTTOM).max(1.0),
        }
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn y_of(&self, value: f64, max: f64) -> f64 {
        self.bottom() - value / max * self.height
    }

    fn draw_axes(&self, doc: &mut SvgDocument) {
        doc.line((self.left, self.top), (self.left, self.bottom()), AXIS_COLOR);
        doc.line(
            (self.left, self.bottom()),
            (self.right(), self.bottom()),
            AXIS_COLOR,
        );
    }

    /// Five evenly spaced tick labels from zero to `max`, with grid lines
    fn y_ticks(&self, doc: &mut SvgDocument, max: f64, anchor: Anchor, x: f64) {
        for step in 0..=4 {
            let value = max * f64::from(step) / 4.0;
            let y = self.y_of(value, max);
            doc.line((self.left, y), (self.right(), y), GRID_COLOR);
            doc.text(x, y + 4.0, &format!("{:.0}", value), 12, anchor);
        }
    }
}
