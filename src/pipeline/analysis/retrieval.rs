//! In-memory vector index over extracted-text chunks.
//!
//! Built fresh for each analysis request and discarded with it; nothing here
//! persists or is shared between requests.

/// One chunk scored against a query embedding.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f32,
}

/// Request-scoped vector index using cosine similarity.
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
}

struct IndexedChunk {
    text: String,
    embedding: Vec<f32>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, text: &str, embedding: Vec<f32>) {
        self.entries.push(IndexedChunk {
            text: text.to_string(),
            embedding,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-k chunks by cosine similarity, best first.
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .entries
            .iter()
            .map(|entry| {
                let score = cosine_similarity(query_embedding, &entry.embedding);
                (score, entry)
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| ScoredChunk {
                text: entry.text.clone(),
                score,
            })
            .collect()
    }
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
