mod app;
mod color;
mod config;
mod data;
mod overlay;
mod pipeline;
mod reduce;
mod render;

use anyhow::{bail, Context, Result};
use log::info;

use app::{BatchApp, BatchSummary};
use config::{Layout, Profile};
use reduce::Tsne;
use render::PlotlyRenderer;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let root = std::env::current_dir().context("resolving project root")?;
    let app = BatchApp::new(Layout::new(root), Tsne, PlotlyRenderer);

    let mut total = BatchSummary::default();
    for profile in Profile::all() {
        total += app.run(&profile)?;
    }

    info!(
        "✔ All t-SNE embedding plots generated: {} written, {} skipped, {} failed",
        total.written, total.skipped, total.failed
    );
    if total.failed > 0 {
        bail!("{} categories failed to reduce", total.failed);
    }
    Ok(())
}
