//! Static Chart Renderer
//! Draws report charts as inline SVG with plotters.

use crate::report::profile::HistogramBin;
use crate::report::ReportError;
use plotters::prelude::*;

const CHART_SIZE: (u32, u32) = (520, 260);
const LABEL_FONT: (&str, u32) = ("sans-serif", 11);
const MAX_LABEL_CHARS: usize = 12;

pub const BAR_COLOR: RGBColor = RGBColor(74, 71, 163); // Theme purple
pub const MISSING_COLOR: RGBColor = RGBColor(231, 76, 60); // Red

fn chart_error(err: impl std::fmt::Display) -> ReportError {
    ReportError::Chart(err.to_string())
}

pub struct ChartRenderer;

impl ChartRenderer {
    /// Histogram of a numeric column. Empty string when there are no bins.
    pub fn histogram_svg(bins: &[HistogramBin]) -> Result<String, ReportError> {
        let mut svg = String::new();
        let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
            return Ok(svg);
        };

        let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0);
        let y_max = ((max_count as f64) * 1.1).ceil().max(1.0) as u32;

        {
            let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
            root.fill(&WHITE).map_err(chart_error)?;

            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(45)
                .build_cartesian_2d(first.lower..last.upper, 0u32..y_max)
                .map_err(chart_error)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(6)
                .y_labels(5)
                .x_label_formatter(&|v| format_tick(*v))
                .label_style(LABEL_FONT)
                .draw()
                .map_err(chart_error)?;

            chart
                .draw_series(bins.iter().map(|b| {
                    Rectangle::new(
                        [(b.lower, 0u32), (b.upper, b.count as u32)],
                        BAR_COLOR.mix(0.8).filled(),
                    )
                }))
                .map_err(chart_error)?;

            root.present().map_err(chart_error)?;
        }

        Ok(svg)
    }

    /// Vertical bar chart, one bar per label.
    pub fn bar_chart_svg(
        labels: &[String],
        counts: &[usize],
        color: RGBColor,
    ) -> Result<String, ReportError> {
        let mut svg = String::new();
        if labels.is_empty() {
            return Ok(svg);
        }

        let n = labels.len() as u32;
        let max_count = counts.iter().copied().max().unwrap_or(0);
        let y_max = ((max_count as f64) * 1.1).ceil().max(1.0) as u32;
        let short: Vec<String> = labels.iter().map(|l| short_label(l)).collect();

        {
            let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
            root.fill(&WHITE).map_err(chart_error)?;

            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(45)
                .build_cartesian_2d((0u32..n).into_segmented(), 0u32..y_max)
                .map_err(chart_error)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(labels.len())
                .y_labels(5)
                .x_label_formatter(&|v| match v {
                    SegmentValue::CenterOf(i) => short.get(*i as usize).cloned().unwrap_or_default(),
                    _ => String::new(),
                })
                .label_style(LABEL_FONT)
                .draw()
                .map_err(chart_error)?;

            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(color.mix(0.8).filled())
                        .margin(6)
                        .data(counts.iter().enumerate().map(|(i, c)| (i as u32, *c as u32))),
                )
                .map_err(chart_error)?;

            root.present().map_err(chart_error)?;
        }

        Ok(svg)
    }
}

/// Axis labels drop markup characters and are cut to a fixed width.
fn short_label(label: &str) -> String {
    let clean: String = label
        .chars()
        .map(|c| if "<>&\"'".contains(c) { ' ' } else { c })
        .collect();
    if clean.chars().count() > MAX_LABEL_CHARS {
        let cut: String = clean.chars().take(MAX_LABEL_CHARS - 1).collect();
        format!("{cut}…")
    } else {
        clean
    }
}

fn format_tick(v: f64) -> String {
    let abs = v.abs();
    if abs != 0.0 && !(0.01..10_000.0).contains(&abs) {
        format!("{:.1e}", v)
    } else {
        let s = format!("{:.2}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
