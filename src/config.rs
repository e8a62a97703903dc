use std::path::{Path, PathBuf};

use crate::color::generate_palette;
use crate::data::filter::DenyList;
use crate::data::loader::VECTORS_FILE;
use crate::reduce::{Init, Solver, TsneConfig};

// ---------------------------------------------------------------------------
// Fixed tables
// ---------------------------------------------------------------------------

/// Aesthetic categories and the stem of their output file, in batch order.
const CATEGORIES: [(&str, &str); 6] = [
    ("FA_DORFic", "D"),
    ("FA_classic", "FA"),
    ("FA_Frutiger_Metro", "FM"),
    ("FA_Frutiger_Eco", "FE"),
    ("FA_Technozen", "T"),
    ("FA_Dark_Aero", "DA"),
];

const OUTLIERS: [(&str, &[&str]); 6] = [
    ("FA_classic", &["Blue", "Ocean"]),
    ("FA_DORFic", &["Graphic_Design", "Plastic", "Interior_Design", "Apples"]),
    ("FA_Frutiger_Eco", &["Floor"]),
    ("FA_Dark_Aero", &["Audio_Equiptment", "Loudspeaker", "Operating_System"]),
    (
        "FA_Frutiger_Metro",
        &[
            "Black",
            "Sticker",
            "Motif",
            "Mobile_Device",
            "Compact_Disk",
            "Silhouette",
            "Wallpaper",
            "Psychadelic_Art",
        ],
    ),
    ("FA_Technozen", &["Shelving", "Corporate Headquarters"]),
];

const CLUSTERS: [(&str, &[&[&str]]); 6] = [
    (
        "FA_DORFic",
        &[
            &["Graphic_Design", "Illustration", "Art", "Pattern", "Visual_Arts"],
            &["Plastic", "Toy", "Interior_Design", "Furniture"],
            &["Apples", "Fruit", "Food", "Natural_Foods"],
        ],
    ),
    (
        "FA_classic",
        &[
            &["Blue", "Ocean", "Water", "Sky", "Azure", "Cloud"],
            &["Plant", "Leaf", "Grass", "Tree", "Flower"],
            &["Computer", "Display_Device", "Technology", "Electronic_Device"],
        ],
    ),
    (
        "FA_Frutiger_Metro",
        &[
            &["Mobile_Device", "Compact_Disk", "Gadget", "Electronic_Device"],
            &["Sticker", "Motif", "Silhouette", "Graphics", "Logo"],
            &["Black", "Wallpaper", "Psychadelic_Art", "Pattern"],
        ],
    ),
    (
        "FA_Frutiger_Eco",
        &[
            &["Plant", "Tree", "Leaf", "Grass", "Vegetation"],
            &["Building", "Architecture", "Urban_Design", "Floor"],
            &["Water", "Sky", "Cloud", "Natural_Landscape"],
        ],
    ),
    (
        "FA_Technozen",
        &[
            &["Shelving", "Furniture", "Interior_Design", "Table"],
            &["Corporate Headquarters", "Building", "Office", "Architecture"],
            &["Computer", "Technology", "Display_Device"],
        ],
    ),
    (
        "FA_Dark_Aero",
        &[
            &["Audio_Equiptment", "Loudspeaker", "Electronic_Device", "Gadget"],
            &["Operating_System", "Software", "Screenshot", "Computer"],
            &["Black", "Darkness", "Space", "Astronomical_Object"],
        ],
    ),
];

/// Number of distinct overlay colours; groups cycle through them.
const OVERLAY_PALETTE_SIZE: usize = 8;

const CREDIT: &str = "<b>Important:</b> These points represent semantic embeddings generated using \
Google Vertex AI’s <code>text-embedding-005</code> model.<br>\
Labels come directly from Google Cloud Vision and are not hand-curated.";

// ---------------------------------------------------------------------------
// Category / Profile
// ---------------------------------------------------------------------------

/// One aesthetic category as seen by a profile.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: &'static str,
    /// File name written under `dashboard/`.
    pub output: String,
    /// Labels removed before reduction (empty when the profile does not filter).
    pub deny: DenyList,
    /// Label groups connected by overlay lines (empty when the profile has no overlay).
    pub clusters: Vec<Vec<String>>,
}

/// Look and wording of the generated page.
#[derive(Debug, Clone)]
pub struct PageTheme {
    pub background: &'static str,
    pub font_color: &'static str,
    pub muted_color: &'static str,
    pub container_width: &'static str,
    pub container_height: &'static str,
    /// Leading phrase of the titles, e.g. `3D t-SNE`.
    pub heading: &'static str,
    /// Fixed disclaimer HTML, trusted.
    pub disclaimer: String,
    /// Overlay colours as `#rrggbb`.
    pub overlay_palette: Vec<String>,
}

impl PageTheme {
    fn dark(heading: &'static str, note: &str) -> Self {
        PageTheme {
            background: "#111",
            font_color: "white",
            muted_color: "#ccc",
            container_width: "90vw",
            container_height: "75vh",
            heading,
            disclaimer: format!("{CREDIT}<br>\n{note}"),
            overlay_palette: generate_palette(OVERLAY_PALETTE_SIZE),
        }
    }

    /// Figure title for a category.
    pub fn figure_title(&self, category: &str) -> String {
        format!("{} — {category} Object Embeddings", self.heading)
    }

    /// Browser tab title for a category.
    pub fn page_title(&self, category: &str) -> String {
        format!("{category} {} Embedding", self.heading)
    }
}

/// A full batch: which categories, how to reduce them, how to render them.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: &'static str,
    pub tsne: TsneConfig,
    pub theme: PageTheme,
    pub categories: Vec<Category>,
}

impl Profile {
    /// Seeded layout, no filtering, no overlay.
    pub fn standard() -> Self {
        Profile {
            name: "standard",
            tsne: deterministic_tsne(),
            theme: PageTheme::dark(
                "3D t-SNE",
                "This version uses a fixed random seed, so the layout is identical on every run.",
            ),
            categories: categories("", false, false),
        }
    }

    /// Outliers removed, exact solver, layout varies between runs.
    pub fn randomized() -> Self {
        Profile {
            name: "randomized",
            tsne: TsneConfig {
                perplexity: 30.0,
                learning_rate: 300.0,
                max_iter: 1000,
                init: Init::Pca,
                solver: Solver::Exact,
                seed: None,
                ..TsneConfig::default()
            },
            theme: PageTheme::dark(
                "Randomized 3D t-SNE",
                "This version uses <i>non-deterministic</i> t-SNE settings, so layouts vary every run.",
            ),
            categories: categories("r_", true, false),
        }
    }

    /// Seeded layout with hand-curated cluster groups drawn as connecting lines.
    pub fn clustered() -> Self {
        Profile {
            name: "clustered",
            tsne: deterministic_tsne(),
            theme: PageTheme::dark(
                "Clustered 3D t-SNE",
                "Lines connect manually curated groups of related labels; each colour is one group.",
            ),
            categories: categories("c_", false, true),
        }
    }

    /// Every profile, in the order the batch runs them.
    pub fn all() -> Vec<Profile> {
        vec![Self::standard(), Self::randomized(), Self::clustered()]
    }
}

fn deterministic_tsne() -> TsneConfig {
    TsneConfig {
        perplexity: 20.0,
        learning_rate: 200.0,
        max_iter: 1000,
        init: Init::Random,
        solver: Solver::BarnesHut { theta: 0.5 },
        seed: Some(42),
        ..TsneConfig::default()
    }
}

fn categories(prefix: &str, with_outliers: bool, with_clusters: bool) -> Vec<Category> {
    CATEGORIES
        .iter()
        .map(|&(name, stem)| Category {
            name,
            output: format!("{prefix}{stem}_embedding.html"),
            deny: if with_outliers { outliers_for(name) } else { DenyList::new() },
            clusters: if with_clusters { clusters_for(name) } else { Vec::new() },
        })
        .collect()
}

fn outliers_for(category: &str) -> DenyList {
    OUTLIERS
        .iter()
        .filter(|(name, _)| *name == category)
        .flat_map(|(_, labels)| labels.iter().map(|l| l.to_string()))
        .collect()
}

fn clusters_for(category: &str) -> Vec<Vec<String>> {
    CLUSTERS
        .iter()
        .filter(|(name, _)| *name == category)
        .flat_map(|(_, groups)| groups.iter())
        .map(|group| group.iter().map(|l| l.to_string()).collect())
        .collect()
}

// ---------------------------------------------------------------------------
// Directory layout
// ---------------------------------------------------------------------------

/// Where inputs are read from and pages are written to.
#[derive(Debug, Clone)]
pub struct Layout {
    pub root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Layout { root: root.into() }
    }

    /// `<root>/images/<category>/vectors_object_instances.txt`
    pub fn input_path(&self, category: &str) -> PathBuf {
        self.root.join("images").join(category).join(VECTORS_FILE)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("dashboard")
    }

    /// `<root>/dashboard/<file>`
    pub fn output_path(&self, file: impl AsRef<Path>) -> PathBuf {
        self.output_dir().join(file)
    }
}
