use std::error::Error;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::error::{PlotError, Result};
use crate::perf::ThreadTiming;

const FONT: &str = "sans-serif";
const PLOT_WIDTH: u32 = 800;
const PLOT_HEIGHT: u32 = 600;
const CAPTION: &str = "MapReduce Performance";
const MAX_X_LABELS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "svg" => Ok(ImageFormat::Svg),
            other => Err(format!("unsupported image format {:?} (expected png or svg)", other)),
        }
    }
}

/// The image sits next to the input: same base name, image extension.
pub fn output_path(input: &Path, format: ImageFormat) -> PathBuf {
    input.with_extension(format.extension())
}

/// Draws threads against average time and writes the chart to `path`,
/// replacing any file already there.
pub fn write_plot(timings: &[ThreadTiming], path: &Path, format: ImageFormat) -> Result<()> {
    if timings.is_empty() {
        return Err(PlotError::NoData);
    }

    let resolution = (PLOT_WIDTH, PLOT_HEIGHT);
    let drawn = match format {
        ImageFormat::Png => draw_chart(
            BitMapBackend::new(path, resolution).into_drawing_area(),
            timings,
        ),
        ImageFormat::Svg => draw_chart(
            SVGBackend::new(path, resolution).into_drawing_area(),
            timings,
        ),
    };
    drawn.map_err(|e| PlotError::Render(e.to_string()))?;

    info!(path = %path.display(), points = timings.len(), "wrote plot");
    Ok(())
}

fn draw_chart<DB>(
    root: DrawingArea<DB, Shift>,
    timings: &[ThreadTiming],
) -> std::result::Result<(), Box<dyn Error>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let x_range = thread_range(timings);
    let y_min = timings.iter().map(|t| t.average_time_sec).fold(f64::INFINITY, f64::min);
    let y_max = timings.iter().map(|t| t.average_time_sec).fold(f64::NEG_INFINITY, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(CAPTION, (FONT, 24))
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(x_range, axis_range(y_min, y_max))?;

    chart
        .configure_mesh()
        .x_labels(timings.len().clamp(2, MAX_X_LABELS))
        .x_label_formatter(&|v| format!("{}", v))
        .y_label_formatter(&|v| format!("{:.2}", v))
        .x_desc("Number of Threads")
        .y_desc("Average Time (seconds)")
        .draw()?;

    chart.draw_series(LineSeries::new(
        timings.iter().map(|t| (t.threads, t.average_time_sec)),
        BLUE.stroke_width(2),
    ))?;

    chart.draw_series(
        timings
            .iter()
            .map(|t| Circle::new((t.threads, t.average_time_sec), 4, BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}

// A single thread count would give an empty axis, so widen it by one each side.
fn thread_range(timings: &[ThreadTiming]) -> Range<u32> {
    let x_min = timings.iter().map(|t| t.threads).min().unwrap_or(0);
    let x_max = timings.iter().map(|t| t.threads).max().unwrap_or(0);

    if x_min == x_max {
        x_min.saturating_sub(1)..x_max.saturating_add(1)
    } else {
        x_min..x_max
    }
}

/// Pads `min..max` by a tenth of its spread. The lower bound stays at or above
/// zero when the data does.
pub fn axis_range(min: f64, max: f64) -> Range<f64> {
    let spread = max - min;
    let padding = if spread > 0.0 {
        spread / 10.0
    } else if min != 0.0 {
        min.abs() / 10.0
    } else {
        1.0
    };

    let lower = if min >= 0.0 {
        (min - padding).max(0.0)
    } else {
        min - padding
    };
    lower..max + padding
}

/// Hands the written image to the system viewer.
pub fn show(path: &Path) -> Result<()> {
    let path = path.canonicalize()?;
    webbrowser::open(&path.to_string_lossy())?;
    Ok(())
}
