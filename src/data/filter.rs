use std::collections::BTreeSet;

use super::model::{EmbeddingSet, Record};

/// Labels manually excluded from a category before reduction.
pub type DenyList = BTreeSet<String>;

/// Drop every record whose label is in `deny`.
///
/// Relative order is preserved and all four sequences are filtered together,
/// so index `i` of the result still describes a single record.
pub fn remove_outliers(set: &EmbeddingSet, deny: &DenyList) -> EmbeddingSet {
    if deny.is_empty() {
        return set.clone();
    }
    EmbeddingSet::from_records(
        set.iter()
            .filter(|(label, ..)| !deny.contains(*label))
            .map(|(label, score, instance_count, vector)| Record {
                label: label.to_string(),
                score,
                instance_count,
                vector: vector.to_vec(),
            }),
    )
}
