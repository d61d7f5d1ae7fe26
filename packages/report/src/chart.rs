//! Daily-series line chart, rendered as a self-contained SVG document.

use std::fmt::Write as _;

use crime_bot_analytics_models::DailySeries;
use crime_bot_crime_models::ReportingPeriod;
use serde::{Deserialize, Serialize};

use crate::RenderError;

const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 50.0;
const LEGEND_COLUMNS: usize = 3;
const LEGEND_FIRST_BASELINE: f64 = 14.0;
const LEGEND_ROW: f64 = 16.0;
const LEGEND_GAP: f64 = 14.0;

const PALETTE: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
];

/// Dash patterns cycled once the palette runs out, so every line up to
/// `PALETTE.len() * DASHES.len()` series has a distinct style.
const DASHES: [Option<&str>; 4] = [None, Some("6,3"), Some("2,2"), Some("8,3,2,3")];

/// Canvas size for the chart, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    /// Canvas width.
    pub width: u32,
    /// Canvas height, including the legend rows above the plot.
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
        }
    }
}

/// An encoded image held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    /// MIME type of `bytes`.
    pub media_type: &'static str,
    /// Encoded image data.
    pub bytes: Vec<u8>,
}

impl ImageArtifact {
    /// File extension matching the media type, without the dot.
    #[must_use]
    pub fn file_extension(&self) -> &'static str {
        match self.media_type {
            "image/svg+xml" => "svg",
            "image/png" => "png",
            _ => "bin",
        }
    }
}

/// Renders one line per coarse category across the days of the period.
///
/// The x axis is labelled with the neighborhood name and the y axis with
/// the period. The legend sits above the plot area.
///
/// # Errors
///
/// * If the series is empty or covers no days
/// * If a series is not aligned with the day list
/// * If the canvas is too small for the margins
pub fn render_chart(
    daily: &DailySeries,
    neighborhood: &str,
    period: &ReportingPeriod,
    options: &ChartOptions,
) -> Result<ImageArtifact, RenderError> {
    if daily.is_empty() {
        return Err(RenderError::NoSeries);
    }
    if daily.days.is_empty() {
        return Err(RenderError::NoDays);
    }
    if let Some(series) = daily
        .series
        .iter()
        .find(|s| s.counts.len() != daily.days.len())
    {
        return Err(RenderError::MisalignedSeries {
            category: series.category.clone(),
            expected: daily.days.len(),
            actual: series.counts.len(),
        });
    }

    let width = f64::from(options.width);
    let height = f64::from(options.height);
    let top = plot_top(daily.series.len());
    let plot_width = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = height - top - MARGIN_BOTTOM;
    if plot_width < 50.0 || plot_height < 50.0 {
        return Err(RenderError::InvalidDimensions {
            width: options.width,
            height: options.height,
        });
    }

    let svg = draw(daily, neighborhood, period, width, height, top)?;
    log::debug!(
        "Rendered {}x{} chart for '{neighborhood}' ({} series)",
        options.width,
        options.height,
        daily.series.len()
    );

    Ok(ImageArtifact {
        media_type: "image/svg+xml",
        bytes: svg.into_bytes(),
    })
}

#[allow(clippy::cast_precision_loss)]
fn draw(
    daily: &DailySeries,
    neighborhood: &str,
    period: &ReportingPeriod,
    width: f64,
    height: f64,
    top: f64,
) -> Result<String, RenderError> {
    let plot_width = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = height - top - MARGIN_BOTTOM;
    let bottom = top + plot_height;
    let right = MARGIN_LEFT + plot_width;

    let day_count = daily.days.len();
    let y_max = y_axis_max(daily.peak());
    let x_step = if day_count > 1 {
        plot_width / (day_count - 1) as f64
    } else {
        0.0
    };
    let x_at = |i: usize| MARGIN_LEFT + i as f64 * x_step;
    let y_at = |count: u64| bottom - (count as f64 / y_max as f64) * plot_height;

    let mut svg = String::new();
    writeln!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif">"##
    )?;
    writeln!(svg, r##"  <rect width="100%" height="100%" fill="white"/>"##)?;

    // Horizontal grid and integer y ticks.
    let tick_step = tick_step(y_max);
    let mut tick = 0;
    while tick <= y_max {
        let y = y_at(tick);
        writeln!(
            svg,
            r##"  <line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{right}" y2="{y:.1}" stroke="#e5e7eb" stroke-width="1"/>"##
        )?;
        writeln!(
            svg,
            r##"  <text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11" fill="#6b7280">{tick}</text>"##,
            MARGIN_LEFT - 6.0,
            y + 4.0
        )?;
        tick += tick_step;
    }

    // Day-of-month ticks.
    for (i, day) in daily.days.iter().enumerate() {
        if i % 5 != 0 && i + 1 != day_count {
            continue;
        }
        writeln!(
            svg,
            r##"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="11" fill="#6b7280">{}</text>"##,
            x_at(i),
            bottom + 16.0,
            day.format("%d")
        )?;
    }

    // Axes.
    writeln!(
        svg,
        r##"  <line x1="{MARGIN_LEFT}" y1="{bottom}" x2="{right}" y2="{bottom}" stroke="#374151" stroke-width="1.5"/>"##
    )?;
    writeln!(
        svg,
        r##"  <line x1="{MARGIN_LEFT}" y1="{top}" x2="{MARGIN_LEFT}" y2="{bottom}" stroke="#374151" stroke-width="1.5"/>"##
    )?;

    for (i, series) in daily.series.iter().enumerate() {
        let (color, dash) = line_style(i);
        let dash_attr = dash.map_or_else(String::new, |d| format!(r#" stroke-dasharray="{d}""#));
        let mut points = String::new();
        for (day, count) in series.counts.iter().enumerate() {
            if day > 0 {
                points.push(' ');
            }
            write!(points, "{:.1},{:.1}", x_at(day), y_at(*count))?;
        }
        writeln!(
            svg,
            r##"  <polyline points="{points}" fill="none" stroke="{color}" stroke-width="2"{dash_attr}/>"##
        )?;

        let col = (i % LEGEND_COLUMNS) as f64;
        let lx = MARGIN_LEFT + col * (plot_width / LEGEND_COLUMNS as f64);
        let ly = legend_baseline(i / LEGEND_COLUMNS);
        writeln!(
            svg,
            r##"  <line x1="{lx:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{color}" stroke-width="2"{dash_attr}/>"##,
            ly - 4.0,
            lx + 12.0,
            ly - 4.0
        )?;
        writeln!(
            svg,
            r##"  <text x="{:.1}" y="{ly:.1}" font-size="11" fill="#374151">{}</text>"##,
            lx + 16.0,
            escape_xml(&series.category)
        )?;
    }

    writeln!(
        svg,
        r##"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12" fill="#374151">{}</text>"##,
        MARGIN_LEFT + plot_width / 2.0,
        height - 12.0,
        escape_xml(neighborhood)
    )?;
    let label_y = top + plot_height / 2.0;
    writeln!(
        svg,
        r##"  <text x="16" y="{label_y:.1}" text-anchor="middle" font-size="12" fill="#374151" transform="rotate(-90, 16, {label_y:.1})">{}</text>"##,
        escape_xml(&period.label())
    )?;
    svg.push_str("</svg>\n");

    Ok(svg)
}

#[allow(clippy::cast_precision_loss)]
fn legend_baseline(row: usize) -> f64 {
    LEGEND_FIRST_BASELINE + row as f64 * LEGEND_ROW
}

/// Top of the plot area: below the last legend row, never above
/// `MARGIN_TOP`.
fn plot_top(series: usize) -> f64 {
    let rows = series.div_ceil(LEGEND_COLUMNS).max(1);
    (legend_baseline(rows - 1) + LEGEND_GAP).max(MARGIN_TOP)
}

const fn line_style(index: usize) -> (&'static str, Option<&'static str>) {
    let color = PALETTE[index % PALETTE.len()];
    let dash = DASHES[(index / PALETTE.len()) % DASHES.len()];
    (color, dash)
}

/// Top of the y axis: at least 1 so an all-zero series still has a scale.
const fn y_axis_max(peak: u64) -> u64 {
    if peak == 0 { 1 } else { peak }
}

/// Integer tick spacing giving at most ten ticks.
const fn tick_step(y_max: u64) -> u64 {
    let step = y_max.div_ceil(10);
    if step == 0 { 1 } else { step }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crime_bot_analytics_models::CategorySeries;

    fn series(categories: &[(&str, u64)]) -> DailySeries {
        let period = ReportingPeriod::default();
        let days = period.days();
        let series = categories
            .iter()
            .map(|(category, peak)| {
                let mut counts = vec![0; days.len()];
                counts[4] = *peak;
                CategorySeries {
                    category: (*category).to_string(),
                    counts,
                }
            })
            .collect();
        DailySeries { days, series }
    }

    fn render(daily: &DailySeries, name: &str) -> Result<String, RenderError> {
        let artifact = render_chart(
            daily,
            name,
            &ReportingPeriod::default(),
            &ChartOptions::default(),
        )?;
        assert_eq!(artifact.media_type, "image/svg+xml");
        assert_eq!(artifact.file_extension(), "svg");
        Ok(String::from_utf8(artifact.bytes).unwrap())
    }

    #[test]
    fn one_polyline_per_category() {
        let svg = render(&series(&[("ROBO", 3), ("FRAUDE", 2)]), "Roma Norte").unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains(">ROBO</text>"));
        assert!(svg.contains(">FRAUDE</text>"));
        assert!(svg.contains(">Roma Norte</text>"));
        assert!(svg.contains(">diciembre de 2019</text>"));
    }

    #[test]
    fn every_day_is_plotted() {
        let svg = render(&series(&[("ROBO", 3)]), "X").unwrap();
        let points = svg
            .split("points=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        assert_eq!(points.split(' ').count(), 31);
    }

    #[test]
    fn y_ticks_are_integers() {
        let svg = render(&series(&[("ROBO", 3)]), "X").unwrap();
        for tick in ["0", "1", "2", "3"] {
            assert!(svg.contains(&format!("fill=\"#6b7280\">{tick}</text>")));
        }
        assert!(!svg.contains(">0.5<"));
    }

    #[test]
    fn escapes_labels() {
        let svg = render(&series(&[("ROBO <A> & B", 1)]), "SANTA \"FE\"").unwrap();
        assert!(svg.contains("ROBO &lt;A&gt; &amp; B"));
        assert!(svg.contains("SANTA &quot;FE&quot;"));
    }

    #[test]
    fn all_zero_series_still_renders() {
        let svg = render(&series(&[("ROBO", 0)]), "X").unwrap();
        assert_eq!(svg.matches("<polyline").count(), 1);
    }

    #[test]
    fn rejects_empty_series() {
        assert!(matches!(
            render(&DailySeries::default(), "X"),
            Err(RenderError::NoSeries)
        ));

        let no_days = DailySeries {
            days: Vec::new(),
            series: vec![CategorySeries {
                category: "ROBO".to_string(),
                counts: Vec::new(),
            }],
        };
        assert!(matches!(render(&no_days, "X"), Err(RenderError::NoDays)));
    }

    #[test]
    fn rejects_misaligned_series() {
        let mut daily = series(&[("ROBO", 1)]);
        daily.series[0].counts.pop();
        assert!(matches!(
            render(&daily, "X"),
            Err(RenderError::MisalignedSeries {
                expected: 31,
                actual: 30,
                ..
            })
        ));
    }

    #[test]
    fn rejects_tiny_canvas() {
        let result = render_chart(
            &series(&[("ROBO", 1)]),
            "X",
            &ReportingPeriod::default(),
            &ChartOptions {
                width: 40,
                height: 40,
            },
        );
        assert!(matches!(
            result,
            Err(RenderError::InvalidDimensions {
                width: 40,
                height: 40
            })
        ));
    }

    #[test]
    fn legend_stays_above_plot_with_many_series() {
        let names: Vec<String> = (0..16).map(|i| format!("DELITO {i}")).collect();
        let categories: Vec<(&str, u64)> = names.iter().map(|n| (n.as_str(), 5)).collect();
        let svg = render(&series(&categories), "X").unwrap();

        let top = plot_top(16);
        assert!(top > MARGIN_TOP);
        assert!(svg.contains(&format!(
            "<line x1=\"{MARGIN_LEFT}\" y1=\"{top}\" x2=\"{MARGIN_LEFT}\""
        )));

        let legend_ys: Vec<f64> = svg
            .lines()
            .filter(|line| line.contains(r##"font-size="11" fill="#374151""##))
            .map(|line| {
                line.split(" y=\"")
                    .nth(1)
                    .and_then(|rest| rest.split('"').next())
                    .unwrap()
                    .parse()
                    .unwrap()
            })
            .collect();
        assert_eq!(legend_ys.len(), 16);
        assert!(legend_ys.iter().all(|y| *y < top), "{legend_ys:?} vs {top}");

        let styles: std::collections::BTreeSet<&str> = svg
            .lines()
            .filter(|line| line.contains("<polyline"))
            .map(|line| line.rsplit_once("\" fill=").unwrap().1)
            .collect();
        assert_eq!(styles.len(), 16);
    }

    #[test]
    fn first_palette_cycle_is_solid() {
        assert_eq!(line_style(0), (PALETTE[0], None));
        assert_eq!(line_style(PALETTE.len()), (PALETTE[0], DASHES[1]));
        assert!((plot_top(1) - MARGIN_TOP).abs() < f64::EPSILON);
    }
}
