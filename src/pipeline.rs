use std::path::PathBuf;

use anyhow::Context;
use log::{info, warn};
use thiserror::Error;

use crate::config::{Category, Layout, Profile};
use crate::data::filter::remove_outliers;
use crate::data::loader::load_file;
use crate::overlay::build_segments;
use crate::reduce::{ReduceError, Reducer};
use crate::render::{PointRecord, Renderer};

// ---------------------------------------------------------------------------
// Outcome / errors
// ---------------------------------------------------------------------------

/// What happened to one category.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Written {
        path: PathBuf,
        points: usize,
        segments: usize,
    },
    /// The vectors file does not exist.
    SkippedMissingInput(PathBuf),
    /// Nothing usable survived loading and filtering.
    SkippedNoRecords,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The reducer rejected this category's matrix; other categories may still run.
    #[error("reduction failed for {category}: {source}")]
    Reduce {
        category: String,
        #[source]
        source: ReduceError,
    },
    /// The vectors file exists but could not be read.
    #[error("could not load {category}: {reason:#}")]
    Load { category: String, reason: anyhow::Error },
    /// Output or rendering failure; the batch stops.
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Load → filter → reduce → overlay → render → write, for one category at a time.
pub struct Pipeline<'a, R, W> {
    pub layout: &'a Layout,
    pub profile: &'a Profile,
    pub reducer: &'a R,
    pub renderer: &'a W,
}

impl<R: Reducer, W: Renderer> Pipeline<'_, R, W> {
    pub fn process(&self, category: &Category) -> Result<Outcome, PipelineError> {
        let input = self.layout.input_path(category.name);
        let loaded = load_file(&input).map_err(|reason| PipelineError::Load {
            category: category.name.to_string(),
            reason,
        })?;
        let Some(report) = loaded else {
            return Ok(Outcome::SkippedMissingInput(input));
        };

        info!("→ Loading vectors: {}", input.display());
        for skipped in &report.skipped {
            warn!(
                "Skipping malformed line {} ({}): {}",
                skipped.line_no, skipped.reason, skipped.content
            );
        }
        let mut set = report.set;
        let mean_score = set.scores().iter().sum::<f64>() / set.len().max(1) as f64;
        info!(
            "✓ Loaded {} vectors (dim {}, mean score {mean_score:.3})",
            set.len(),
            set.dim().unwrap_or(0)
        );

        if !category.deny.is_empty() {
            set = remove_outliers(&set, &category.deny);
            info!("✓ Using {} vectors after outlier removal", set.len());
        }
        if set.is_empty() {
            warn!("No usable vectors for {}, skipping", category.name);
            return Ok(Outcome::SkippedNoRecords);
        }

        info!("Running t-SNE ({} profile)…", self.profile.name);
        let coords = self
            .reducer
            .reduce(set.vectors(), &self.profile.tsne)
            .map_err(|source| PipelineError::Reduce {
                category: category.name.to_string(),
                source,
            })?;
        if coords.len() != set.len() {
            return Err(anyhow::anyhow!(
                "reducer returned {} coordinates for {} records",
                coords.len(),
                set.len()
            )
            .into());
        }

        let segments = if category.clusters.is_empty() {
            Vec::new()
        } else {
            let segments = build_segments(
                &coords,
                set.labels(),
                &category.clusters,
                &self.profile.theme.overlay_palette,
            );
            info!("✓ Built {} cluster connections", segments.len());
            segments
        };

        let points: Vec<PointRecord> = set
            .labels()
            .iter()
            .zip(set.instances())
            .zip(&coords)
            .map(|((label, &instance_count), &coord)| PointRecord {
                coord,
                label: label.clone(),
                instance_count,
            })
            .collect();

        let html = self
            .renderer
            .render(&points, &segments, &self.profile.theme, category.name)?;
        let path = self.write(&category.output, &html)?;

        Ok(Outcome::Written {
            path,
            points: points.len(),
            segments: segments.len(),
        })
    }

    fn write(&self, file: &str, html: &str) -> anyhow::Result<PathBuf> {
        let dir = self.layout.output_dir();
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        let path = self.layout.output_path(file);
        std::fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

/// Stand-ins for the t-SNE reducer in tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use crate::config::PageTheme;
    use crate::overlay::LineSegment;
    use crate::reduce::{Coord, ReduceError, Reducer, TsneConfig};
    use crate::render::{PointRecord, Renderer};

    /// Keeps the first three coordinates of every row, zero padded.
    pub struct FirstThree;

    impl Reducer for FirstThree {
        fn reduce(&self, matrix: &[Vec<f64>], _config: &TsneConfig) -> Result<Vec<Coord>, ReduceError> {
            Ok(matrix
                .iter()
                .map(|row| [0, 1, 2].map(|k| row.get(k).copied().unwrap_or(0.0)))
                .collect())
        }
    }

    /// Remembers every call and returns a placeholder page.
    #[derive(Default)]
    pub struct Recorder {
        pub drawn: RefCell<Vec<(Vec<PointRecord>, Vec<LineSegment>)>>,
    }

    impl Renderer for Recorder {
        fn render(
            &self,
            points: &[PointRecord],
            segments: &[LineSegment],
            _theme: &PageTheme,
            category: &str,
        ) -> anyhow::Result<String> {
            self.drawn.borrow_mut().push((points.to_vec(), segments.to_vec()));
            Ok(format!("<!DOCTYPE html><title>{category}</title>"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FirstThree, Recorder};
    use super::*;
    use crate::reduce::Tsne;
    use crate::render::{marker_size, PlotlyRenderer};

    const TWO_RECORDS: &str = "A:0.9:2:[1.0,0.0]\nB:0.8:5:[0.0,1.0]\n";

    fn seed_input(root: &std::path::Path, category: &str, text: &str) {
        let dir = root.join("images").join(category);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("vectors_object_instances.txt"), text).unwrap();
    }

    fn category(deny: &[&str], clusters: &[&[&str]]) -> Category {
        Category {
            name: "FA_classic",
            output: "out.html".into(),
            deny: deny.iter().map(|s| s.to_string()).collect(),
            clusters: clusters
                .iter()
                .map(|g| g.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn run_with<R: Reducer, W: Renderer>(
        root: &std::path::Path,
        reducer: &R,
        renderer: &W,
        cat: &Category,
    ) -> Result<Outcome, PipelineError> {
        let layout = Layout::new(root);
        let profile = Profile::standard();
        let pipeline = Pipeline {
            layout: &layout,
            profile: &profile,
            reducer,
            renderer,
        };
        pipeline.process(cat)
    }

    fn run<R: Reducer>(root: &std::path::Path, reducer: &R, cat: &Category) -> Result<Outcome, PipelineError> {
        run_with(root, reducer, &PlotlyRenderer, cat)
    }

    fn point(x: f64, y: f64, label: &str, instance_count: u32) -> PointRecord {
        PointRecord { coord: [x, y, 0.0], label: label.into(), instance_count }
    }

    #[test]
    fn two_records_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        seed_input(dir.path(), "FA_classic", TWO_RECORDS);

        let outcome = run(dir.path(), &FirstThree, &category(&[], &[])).unwrap();
        let path = dir.path().join("dashboard").join("out.html");
        assert_eq!(outcome, Outcome::Written { path: path.clone(), points: 2, segments: 0 });

        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("scatter3d"));
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains(r#""A""#) && html.contains(r#""B""#));
        assert!(html.contains("text-embedding-005"));
    }

    #[test]
    fn points_keep_label_coordinate_and_count_together() {
        let dir = tempfile::tempdir().unwrap();
        seed_input(dir.path(), "FA_classic", TWO_RECORDS);
        let recorder = Recorder::default();

        run_with(dir.path(), &FirstThree, &recorder, &category(&[], &[])).unwrap();
        let drawn = recorder.drawn.borrow();
        assert_eq!(drawn[0].0, [point(1.0, 0.0, "A", 2), point(0.0, 1.0, "B", 5)]);
        assert_eq!(marker_size(drawn[0].0[1].instance_count), 16);
    }

    #[test]
    fn deny_list_removes_a() {
        let dir = tempfile::tempdir().unwrap();
        seed_input(dir.path(), "FA_classic", TWO_RECORDS);
        let recorder = Recorder::default();

        let outcome = run_with(dir.path(), &FirstThree, &recorder, &category(&["A"], &[])).unwrap();
        assert!(matches!(outcome, Outcome::Written { points: 1, .. }));

        // The surviving point is B with B's own coordinates and size.
        let drawn = recorder.drawn.borrow();
        assert_eq!(drawn[0].0, [point(0.0, 1.0, "B", 5)]);
        assert_eq!(marker_size(drawn[0].0[0].instance_count), 16);
    }

    #[test]
    fn cluster_group_with_absent_label_draws_one_line() {
        let dir = tempfile::tempdir().unwrap();
        seed_input(dir.path(), "FA_classic", TWO_RECORDS);
        let recorder = Recorder::default();

        let outcome = run_with(dir.path(), &FirstThree, &recorder, &category(&[], &[&["A", "B", "C"]])).unwrap();
        assert!(matches!(outcome, Outcome::Written { points: 2, segments: 1, .. }));

        let drawn = recorder.drawn.borrow();
        let segment = &drawn[0].1[0];
        assert_eq!((segment.from_label.as_str(), segment.to_label.as_str()), ("A", "B"));
        assert_eq!((segment.from, segment.to), ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]));
    }

    #[test]
    fn unreadable_input_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images/FA_classic/vectors_object_instances.txt")).unwrap();
        let err = run(dir.path(), &FirstThree, &category(&[], &[])).unwrap_err();
        assert!(matches!(err, PipelineError::Load { .. }));
        assert!(!dir.path().join("dashboard").exists());
    }

    #[test]
    fn missing_input_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run(dir.path(), &FirstThree, &category(&[], &[])).unwrap();
        assert!(matches!(outcome, Outcome::SkippedMissingInput(_)));
        assert!(!dir.path().join("dashboard").exists());
    }

    #[test]
    fn fully_filtered_category_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        seed_input(dir.path(), "FA_classic", TWO_RECORDS);
        let outcome = run(dir.path(), &FirstThree, &category(&["A", "B"], &[])).unwrap();
        assert_eq!(outcome, Outcome::SkippedNoRecords);
    }

    #[test]
    fn too_few_records_for_perplexity_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        seed_input(dir.path(), "FA_classic", TWO_RECORDS);
        let err = run(dir.path(), &Tsne, &category(&[], &[])).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Reduce { source: ReduceError::PerplexityTooLarge { samples: 2, .. }, .. }
        ));
    }

    #[test]
    fn existing_output_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        seed_input(dir.path(), "FA_classic", TWO_RECORDS);
        std::fs::create_dir_all(dir.path().join("dashboard")).unwrap();
        std::fs::write(dir.path().join("dashboard/out.html"), "stale").unwrap();

        run(dir.path(), &FirstThree, &category(&[], &[])).unwrap();
        let html = std::fs::read_to_string(dir.path().join("dashboard/out.html")).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}
