use anyhow::Result;
use log::{error, info, warn};

use crate::config::{Layout, Profile};
use crate::pipeline::{Outcome, Pipeline, PipelineError};
use crate::reduce::Reducer;
use crate::render::Renderer;

// ---------------------------------------------------------------------------
// Batch driver
// ---------------------------------------------------------------------------

/// Per-profile tally of category outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl std::ops::AddAssign for BatchSummary {
    fn add_assign(&mut self, other: Self) {
        self.written += other.written;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Runs profiles category by category, in table order.
pub struct BatchApp<R, W> {
    pub layout: Layout,
    pub reducer: R,
    pub renderer: W,
}

impl<R: Reducer, W: Renderer> BatchApp<R, W> {
    pub fn new(layout: Layout, reducer: R, renderer: W) -> Self {
        Self {
            layout,
            reducer,
            renderer,
        }
    }

    /// Process every category of `profile`.
    ///
    /// Missing inputs, unreadable inputs and reduction failures are reported
    /// and the batch moves on; only a fatal error (writing, rendering) stops it.
    pub fn run(&self, profile: &Profile) -> Result<BatchSummary> {
        info!("=== Building {} embedding plots ===", profile.name);

        let pipeline = Pipeline {
            layout: &self.layout,
            profile,
            reducer: &self.reducer,
            renderer: &self.renderer,
        };
        let mut summary = BatchSummary::default();

        for category in &profile.categories {
            info!("============================");
            info!("Processing {}", category.name);
            info!("============================");

            match pipeline.process(category) {
                Ok(Outcome::Written { path, points, segments }) => {
                    info!(
                        "✓ Saved HTML plot → {} ({points} points, {segments} connections)",
                        path.display()
                    );
                    summary.written += 1;
                }
                Ok(Outcome::SkippedMissingInput(path)) => {
                    warn!("Missing: {}", path.display());
                    summary.skipped += 1;
                }
                Ok(Outcome::SkippedNoRecords) => summary.skipped += 1,
                Err(err @ (PipelineError::Reduce { .. } | PipelineError::Load { .. })) => {
                    error!("{err}");
                    summary.failed += 1;
                }
                Err(PipelineError::Fatal(err)) => {
                    return Err(err.context(format!("processing {}", category.name)));
                }
            }
        }

        info!(
            "✔ {} profile done: {} written, {} skipped, {} failed",
            profile.name, summary.written, summary.skipped, summary.failed
        );
        Ok(summary)
    }
}
