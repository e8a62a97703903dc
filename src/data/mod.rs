/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  images/<category>/vectors_object_instances.txt
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  line → Result<Record, LineError> → EmbeddingSet
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ EmbeddingSet  │  labels / scores / instances / vectors, aligned
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop deny-listed labels, alignment preserved
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
