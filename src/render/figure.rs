use plotly::common::{ColorScale, ColorScalePalette, Font, HoverInfo, Line, Marker, Mode, Title};
use plotly::layout::{Axis, LayoutScene, Margin};
use plotly::{Layout, Plot, Scatter3D};

use super::{marker_size, PointRecord};
use crate::config::PageTheme;
use crate::overlay::LineSegment;

// ---------------------------------------------------------------------------
// Traces
// ---------------------------------------------------------------------------

const MARKER_OPACITY: f64 = 0.9;
const OVERLAY_WIDTH: f64 = 4.0;
const HOVER: &str = "<b>%{text}</b><br>Instances=%{customdata}<extra></extra>";

/// Scatter of all points, colour and size driven by instance count.
pub fn points_trace(points: &[PointRecord]) -> Box<Scatter3D<f64, f64, f64>> {
    let counts: Vec<u32> = points.iter().map(|p| p.instance_count).collect();

    let marker = Marker::new()
        .size_array(counts.iter().map(|&c| marker_size(c)).collect())
        .color_array(counts.iter().map(|&c| f64::from(c)).collect::<Vec<f64>>())
        .color_scale(ColorScale::Palette(ColorScalePalette::Viridis))
        .opacity(MARKER_OPACITY);

    Scatter3D::new(
        points.iter().map(|p| p.coord[0]).collect(),
        points.iter().map(|p| p.coord[1]).collect(),
        points.iter().map(|p| p.coord[2]).collect(),
    )
    .mode(Mode::Markers)
    .name("Points")
    .marker(marker)
    .text_array(points.iter().map(|p| p.label.clone()).collect::<Vec<String>>())
    .custom_data(counts.iter().map(|&c| u64::from(c)).collect::<Vec<u64>>())
    .hover_template(HOVER)
    .show_legend(false)
}

/// A two-point line for one overlay segment.
pub fn segment_trace(segment: &LineSegment) -> Box<Scatter3D<f64, f64, f64>> {
    let name = format!(
        "group {}: {} – {}",
        segment.group + 1,
        segment.from_label,
        segment.to_label
    );
    Scatter3D::new(
        vec![segment.from[0], segment.to[0]],
        vec![segment.from[1], segment.to[1]],
        vec![segment.from[2], segment.to[2]],
    )
    .mode(Mode::Lines)
    .name(name.as_str())
    .line(Line::new().color(segment.color.clone()).width(OVERLAY_WIDTH))
    .hover_info(HoverInfo::Skip)
    .show_legend(false)
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

fn axis(n: usize) -> Axis {
    Axis::new().title(Title::with_text(format!("t-SNE {n}").as_str()))
}

/// Dark scene titled after the category. The scene itself stays transparent
/// so the paper colour shows through.
pub fn layout(theme: &PageTheme, category: &str) -> Layout {
    Layout::new()
        .title(Title::with_text(theme.figure_title(category).as_str()))
        .scene(LayoutScene::new().x_axis(axis(1)).y_axis(axis(2)).z_axis(axis(3)))
        .paper_background_color(theme.background)
        .plot_background_color(theme.background)
        .font(Font::new().color(theme.font_color))
        .show_legend(false)
        .margin(Margin::new().left(0).right(0).top(60).bottom(0))
}

/// Points first, overlay lines on top.
pub fn build(points: &[PointRecord], segments: &[LineSegment], theme: &PageTheme, category: &str) -> Plot {
    let mut plot = Plot::new();
    plot.add_trace(points_trace(points));
    for segment in segments {
        plot.add_trace(segment_trace(segment));
    }
    plot.set_layout(layout(theme, category));
    plot
}
