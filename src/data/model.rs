// ---------------------------------------------------------------------------
// Record – one line of a vectors file
// ---------------------------------------------------------------------------

/// A single labeled object instance embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub label: String,
    /// Detection confidence reported upstream.
    pub score: f64,
    /// Number of detected occurrences of the label within the category.
    pub instance_count: u32,
    pub vector: Vec<f64>,
}

// ---------------------------------------------------------------------------
// EmbeddingSet – the loaded category
// ---------------------------------------------------------------------------

/// Four positionally-aligned sequences: index `i` of every field describes
/// the same record.
///
/// Fields are private so the sequences can only grow together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingSet {
    labels: Vec<String>,
    scores: Vec<f64>,
    instances: Vec<u32>,
    vectors: Vec<Vec<f64>>,
}

impl EmbeddingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I: IntoIterator<Item = Record>>(records: I) -> Self {
        let mut set = Self::new();
        for rec in records {
            set.push(rec);
        }
        set
    }

    pub fn push(&mut self, record: Record) {
        self.labels.push(record.label);
        self.scores.push(record.score);
        self.instances.push(record.instance_count);
        self.vectors.push(record.vector);
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn instances(&self) -> &[u32] {
        &self.instances
    }

    pub fn vectors(&self) -> &[Vec<f64>] {
        &self.vectors
    }

    /// Dimensionality of the stored vectors (`None` when empty).
    pub fn dim(&self) -> Option<usize> {
        self.vectors.first().map(Vec::len)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate records as borrowed tuples, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64, u32, &[f64])> + '_ {
        self.labels
            .iter()
            .zip(&self.scores)
            .zip(&self.instances)
            .zip(&self.vectors)
            .map(|(((l, s), i), v)| (l.as_str(), *s, *i, v.as_slice()))
    }
}
