use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

const CATEGORIES: [&str; 6] = [
    "FA_DORFic",
    "FA_classic",
    "FA_Frutiger_Metro",
    "FA_Frutiger_Eco",
    "FA_Technozen",
    "FA_Dark_Aero",
];

/// Labels grouped by theme; each theme becomes one blob in embedding space.
const THEMES: [&[&str]; 6] = [
    &["Blue", "Ocean", "Water", "Sky", "Azure", "Cloud", "Natural_Landscape", "Wave", "Aqua", "Horizon"],
    &["Plant", "Leaf", "Grass", "Tree", "Flower", "Vegetation", "Floor", "Apples", "Fruit", "Natural_Foods"],
    &[
        "Computer",
        "Display_Device",
        "Technology",
        "Electronic_Device",
        "Gadget",
        "Mobile_Device",
        "Compact_Disk",
        "Screenshot",
        "Multimedia",
        "Wallpaper",
    ],
    &[
        "Graphic_Design",
        "Illustration",
        "Art",
        "Pattern",
        "Visual_Arts",
        "Sticker",
        "Motif",
        "Logo",
        "Silhouette",
        "Psychadelic_Art",
    ],
    &[
        "Building",
        "Architecture",
        "Urban_Design",
        "Office",
        "Corporate Headquarters",
        "Shelving",
        "Furniture",
        "Interior_Design",
        "Table",
        "Plastic",
    ],
    &[
        "Audio_Equiptment",
        "Loudspeaker",
        "Operating_System",
        "Software",
        "Black",
        "Darkness",
        "Space",
        "Astronomical_Object",
        "Toy",
        "Graphics",
    ],
];

const DIMS: usize = 64;

fn main() -> Result<()> {
    let root = std::env::current_dir().context("resolving project root")?;
    let mut rng = StdRng::seed_from_u64(42);

    let centers: Vec<Vec<f64>> = THEMES
        .iter()
        .map(|_| (0..DIMS).map(|_| rng.sample::<f64, _>(StandardNormal)).collect())
        .collect();

    for category in CATEGORIES {
        let mut text = String::new();
        let mut count = 0;

        for (theme, labels) in THEMES.iter().enumerate() {
            for label in labels.iter() {
                // Not every label shows up in every aesthetic.
                if rng.gen_bool(0.1) {
                    continue;
                }
                let score: f64 = rng.gen_range(0.5..1.0);
                let instances: u32 = rng.gen_range(1..=12);
                let vector: Vec<String> = centers[theme]
                    .iter()
                    .map(|c| format!("{:.6}", c + 0.35 * rng.sample::<f64, _>(StandardNormal)))
                    .collect();
                writeln!(text, "{label}:{score:.4}:{instances}:[{}]", vector.join(", "))?;
                count += 1;
            }
        }

        // A few lines the loader is expected to skip.
        writeln!(text, "Truncated_Line:0.42")?;
        writeln!(text, "Bad_Vector:0.42:3:[0.1, oops]")?;
        writeln!(text, "Short_Vector:0.42:3:[0.1, 0.2]")?;

        let dir: PathBuf = root.join("images").join(category);
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join("vectors_object_instances.txt");
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;

        println!("Wrote {count} vectors ({DIMS} dims each) to {}", path.display());
    }
    Ok(())
}
