//! Rendering: reduced points and overlay lines → standalone HTML page.
//!
//! ```text
//!  PointRecord[] + LineSegment[]
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  figure   │  plotly::Plot: scatter3d markers, line traces, layout
//!   └──────────┘
//!        │ Plot::to_inline_html
//!        ▼
//!   ┌──────────┐
//!   │   page    │  fragment (div + Plotly.newPlot) wrapped in the themed page
//!   └──────────┘
//! ```

pub mod figure;
pub mod page;

use anyhow::Result;

use crate::config::PageTheme;
use crate::overlay::LineSegment;
use crate::reduce::Coord;

/// One reduced record ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub coord: Coord,
    pub label: String,
    pub instance_count: u32,
}

/// Marker size for a record seen `count` times.
pub fn marker_size(count: u32) -> usize {
    2 * count as usize + 6
}

pub trait Renderer {
    /// Produce a complete HTML document for one category.
    fn render(
        &self,
        points: &[PointRecord],
        segments: &[LineSegment],
        theme: &PageTheme,
        category: &str,
    ) -> Result<String>;
}

/// Renders through the Plotly.js runtime loaded from its CDN.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlotlyRenderer;

impl Renderer for PlotlyRenderer {
    fn render(
        &self,
        points: &[PointRecord],
        segments: &[LineSegment],
        theme: &PageTheme,
        category: &str,
    ) -> Result<String> {
        let plot = figure::build(points, segments, theme, category);
        Ok(page::document(&page::fragment(&plot), theme, category))
    }
}
