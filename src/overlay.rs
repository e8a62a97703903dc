use std::collections::{BTreeSet, HashMap};

use crate::color;
use crate::reduce::Coord;

/// A line drawn between two reduced points of the same cluster group.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    pub from: Coord,
    pub to: Coord,
    pub from_label: String,
    pub to_label: String,
    /// Index of the group in the category's cluster list.
    pub group: usize,
    pub color: String,
}

/// Connect every pair of present labels within each group.
///
/// `coords[i]` must belong to `labels[i]`. Labels missing from `labels` are
/// ignored, so a group with fewer than two present labels draws nothing.
/// Groups take their colour from `palette` by group index, wrapping around.
pub fn build_segments(
    coords: &[Coord],
    labels: &[String],
    groups: &[Vec<String>],
    palette: &[String],
) -> Vec<LineSegment> {
    debug_assert_eq!(coords.len(), labels.len());

    let mut position: HashMap<&str, usize> = HashMap::new();
    for (i, label) in labels.iter().enumerate().take(coords.len()) {
        position.entry(label.as_str()).or_insert(i);
    }

    let mut segments = Vec::new();
    for (group_idx, group) in groups.iter().enumerate() {
        let color = color::cycle(palette, group_idx).unwrap_or("#ffffff");

        let mut seen = BTreeSet::new();
        let present: Vec<(&str, usize)> = group
            .iter()
            .filter(|label| seen.insert(label.as_str()))
            .filter_map(|label| position.get(label.as_str()).map(|&i| (label.as_str(), i)))
            .collect();

        for (a, &(from_label, i)) in present.iter().enumerate() {
            for &(to_label, j) in &present[a + 1..] {
                segments.push(LineSegment {
                    from: coords[i],
                    to: coords[j],
                    from_label: from_label.to_string(),
                    to_label: to_label.to_string(),
                    group: group_idx,
                    color: color.to_string(),
                });
            }
        }
    }
    segments
}
