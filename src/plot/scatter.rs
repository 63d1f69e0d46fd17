//! PCA scatter plot of pooled profiles.

use super::{check_labels, label_groups, VisualizationSink};
use crate::data::ProfileTable;
use crate::error::{PurityError, Result};
use crate::project::{pca, Projection};
use plotters::prelude::*;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Default plot title.
pub const PCA_TITLE: &str = "Análise PCA dos Espectros";

/// Renders a 2-component PCA scatter plot, one colour per label, to SVG.
#[derive(Debug, Clone)]
pub struct ScatterPlot {
    /// Output file (must end in `.svg`).
    pub output: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Chart caption.
    pub title: String,
}

impl ScatterPlot {
    /// Create a plot writing to `output` with the default 800x600 size.
    pub fn new<P: AsRef<Path>>(output: P) -> Self {
        Self {
            output: output.as_ref().to_path_buf(),
            width: 800,
            height: 600,
            title: PCA_TITLE.to_string(),
        }
    }

    /// Set the canvas size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the chart caption.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }
}

impl VisualizationSink for ScatterPlot {
    fn render(&self, table: &ProfileTable, labels: &[String]) -> Result<()> {
        check_labels(table, labels)?;

        let ext = self
            .output
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase());
        if ext.as_deref() != Some("svg") {
            return Err(PurityError::Visualization(format!(
                "unsupported plot format for {:?}, use .svg",
                self.output
            )));
        }

        let projection = pca(table, 2)?;
        draw_scatter(self, &projection, labels)
            .map_err(|e| PurityError::Visualization(e.to_string()))?;
        log::info!("wrote PCA scatter plot to {:?}", self.output);
        Ok(())
    }
}

/// Padded axis range covering `values`.
fn axis_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let pad = if span > 0.0 { span * 0.1 } else { 1.0 };
    (min - pad, max + pad)
}

fn draw_scatter(
    plot: &ScatterPlot,
    projection: &Projection,
    labels: &[String],
) -> std::result::Result<(), Box<dyn Error>> {
    let pc1 = projection.component(0);
    let pc2 = projection.component(1);
    let (x_min, x_max) = axis_range(&pc1);
    let (y_min, y_max) = axis_range(&pc2);

    let root = SVGBackend::new(&plot.output, (plot.width, plot.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&plot.title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("PC1")
        .y_desc("PC2")
        .draw()?;

    for (k, group) in label_groups(labels).into_iter().enumerate() {
        let color = Palette99::pick(k).to_rgba();
        let points: Vec<(f64, f64)> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.as_str() == group)
            .map(|(i, _)| (pc1[i], pc2[i]))
            .collect();

        chart
            .draw_series(points.into_iter().map(|p| Circle::new(p, 5, color.filled())))?
            .label(group)
            .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
