//! Plotters-powered SVG charts.
//!
//! Why SVG and not a bitmap backend?
//! - no native font/raster dependencies (keeps builds lean, see Cargo.toml)
//! - the lab pastes these into reports, so vector output scales cleanly
//!
//! Two chart kinds: a single run's stress-strain curve, and all runs of a
//! probe overlaid with a legend.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::{CHANNEL_ELONGATION, CHANNEL_TENSION, Experiment, ProbeFile};
use crate::error::AppError;

const PLOT_SIZE: (u32, u32) = (900, 600);

/// Render one experiment's stress-strain curve.
pub fn write_experiment_plot(
    path: &Path,
    probe: &str,
    experiment: &Experiment,
) -> Result<(), AppError> {
    let series = curve_points(experiment);
    if series.is_empty() {
        return Err(AppError::no_data(format!(
            "Experiment '{}' has no derived samples to plot.",
            experiment.name
        )));
    }

    let title = format!("Probeta {probe}, ensayo {}", experiment.index);
    render_chart(path, &title, &[(experiment.name.clone(), series)])
}

/// Render all of a probe's experiments overlaid in one chart.
pub fn write_overlay_plot(path: &Path, probe: &ProbeFile) -> Result<(), AppError> {
    let series: Vec<(String, Vec<(f64, f64)>)> = probe
        .experiments
        .iter()
        .map(|e| (e.name.clone(), curve_points(e)))
        .filter(|(_, points)| !points.is_empty())
        .collect();

    if series.is_empty() {
        return Err(AppError::no_data(format!(
            "Probe '{}' has no derived samples to plot.",
            probe.probe
        )));
    }

    let title = format!("Probeta {} (todos los ensayos)", probe.probe);
    render_chart(path, &title, &series)
}

/// Elongation/tension pairs for one run; empty when the export carried no
/// load/extension columns.
fn curve_points(experiment: &Experiment) -> Vec<(f64, f64)> {
    let elongation = experiment.channel(CHANNEL_ELONGATION).unwrap_or(&[]);
    let tension = experiment.channel(CHANNEL_TENSION).unwrap_or(&[]);
    elongation
        .iter()
        .zip(tension)
        .map(|(&x, &y)| (x, y))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect()
}

fn render_chart(
    path: &Path,
    title: &str,
    series: &[(String, Vec<(f64, f64)>)],
) -> Result<(), AppError> {
    draw(path, title, series).map_err(|e| {
        AppError::input(format!("Failed to render plot '{}': {e}", path.display()))
    })
}

fn draw(
    path: &Path,
    title: &str,
    series: &[(String, Vec<(f64, f64)>)],
) -> Result<(), Box<dyn std::error::Error>> {
    let (x_max, y_max) = bounds(series);

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 42)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Elongaci\u{f3}n [-]")
        .y_desc("Tensi\u{f3}n [MPa]")
        .x_labels(8)
        .y_labels(8)
        .label_style(("sans-serif", 12))
        .draw()?;

    for (i, (label, points)) in series.iter().enumerate() {
        let color = Palette99::pick(i);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
            });
    }

    if series.len() > 1 {
        chart
            .configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.85))
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Padded positive axis bounds; degenerate data still gets a drawable box.
fn bounds(series: &[(String, Vec<(f64, f64)>)]) -> (f64, f64) {
    let mut x_max = 0.0f64;
    let mut y_max = 0.0f64;
    for (_, points) in series {
        for &(x, y) in points {
            x_max = x_max.max(x);
            y_max = y_max.max(y);
        }
    }

    let pad = |v: f64| if v > 0.0 { v * 1.05 } else { 1.0 };
    (pad(x_max), pad(y_max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::domain::DerivedMetrics;

    fn experiment_with_curve() -> Experiment {
        let mut channels = BTreeMap::new();
        channels.insert(
            CHANNEL_ELONGATION.to_string(),
            vec![0.0, 0.001, 0.002, 0.003],
        );
        channels.insert(CHANNEL_TENSION.to_string(), vec![0.0, 1.2, 2.4, 3.1]);

        Experiment {
            name: "PA3_1".to_string(),
            source: "PA3_1.txt".to_string(),
            index: 1,
            date: None,
            metadata: BTreeMap::new(),
            channels,
            metrics: DerivedMetrics {
                max_tension_mpa: 3.1,
                max_elongation: 0.003,
                ductility: None,
                modulus: None,
            },
        }
    }

    #[test]
    fn experiment_plot_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PA3_1.svg");
        write_experiment_plot(&path, "PA3", &experiment_with_curve()).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn overlay_plot_includes_all_runs() {
        let mut second = experiment_with_curve();
        second.name = "PA3_2".to_string();
        second.index = 2;

        let probe = ProbeFile {
            tool: "tlab".to_string(),
            probe: "PA3".to_string(),
            experiments: vec![experiment_with_curve(), second],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PA3.svg");
        write_overlay_plot(&path, &probe).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("<svg"));
    }

    #[test]
    fn experiment_without_samples_is_no_data() {
        let mut experiment = experiment_with_curve();
        experiment.channels.clear();

        let dir = tempfile::tempdir().unwrap();
        let err =
            write_experiment_plot(&dir.path().join("x.svg"), "PA3", &experiment).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
