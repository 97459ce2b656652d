use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::chunk::Chunk;

/// BM25 parameters.
const K1: f32 = 1.5;
const B: f32 = 0.75;
/// Fraction of the mean IDF used as a floor for terms present in most chunks.
const EPSILON: f32 = 0.25;

/// Lowercase and split on whitespace.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Okapi BM25 index over the chunks of one knowledge base.
///
/// Built once and never updated; a changed corpus means a new index.
#[derive(Debug, Clone, Default)]
pub struct Bm25Index {
    /// chunk position -> (term -> term frequency)
    term_freqs: Vec<HashMap<String, f32>>,
    /// chunk position -> token count
    doc_lengths: Vec<f32>,
    /// term -> inverse document frequency
    idf: HashMap<String, f32>,
    avg_doc_length: f32,
}

impl Bm25Index {
    /// Build the index from every chunk, in order. Chunk positions in the
    /// slice become the indices returned by [`Bm25Index::score`].
    pub fn build(chunks: &[Arc<Chunk>]) -> Self {
        let mut term_freqs = Vec::with_capacity(chunks.len());
        let mut doc_lengths = Vec::with_capacity(chunks.len());
        let mut doc_freq: HashMap<String, f32> = HashMap::new();

        for chunk in chunks {
            let tokens = tokenize(&chunk.text);
            doc_lengths.push(tokens.len() as f32);

            let mut freqs: HashMap<String, f32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_insert(0.0) += 1.0;
            }
            for term in freqs.keys() {
                *doc_freq.entry(term.clone()).or_insert(0.0) += 1.0;
            }
            term_freqs.push(freqs);
        }

        let n = chunks.len() as f32;
        let avg_doc_length = if chunks.is_empty() {
            0.0
        } else {
            doc_lengths.iter().sum::<f32>() / n
        };

        // IDF = ln((N - df + 0.5) / (df + 0.5)). Terms in more than half the
        // chunks go negative; they are floored to EPSILON * mean IDF.
        let mut idf = HashMap::with_capacity(doc_freq.len());
        let mut idf_sum = 0.0f32;
        let mut negative = Vec::new();
        for (term, df) in doc_freq {
            let value = ((n - df + 0.5) / (df + 0.5)).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(term.clone());
            }
            idf.insert(term, value);
        }
        if !idf.is_empty() {
            let floor = EPSILON * idf_sum / idf.len() as f32;
            for term in negative {
                idf.insert(term, floor);
            }
        }

        debug!(
            chunks = chunks.len(),
            terms = idf.len(),
            avg_doc_length,
            "Built BM25 index"
        );

        Self {
            term_freqs,
            doc_lengths,
            idf,
            avg_doc_length,
        }
    }

    /// Score every chunk against the query, highest first.
    ///
    /// One entry per indexed chunk (including zero scores). Equal scores
    /// keep chunk order.
    ///
    /// ```text
    /// score = sum over query tokens t of:
    ///   IDF(t) * (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * dl / avgdl))
    /// ```
    pub fn score(&self, query: &str) -> Vec<(usize, f32)> {
        let query_tokens = tokenize(query);
        let avgdl = if self.avg_doc_length > 0.0 {
            self.avg_doc_length
        } else {
            1.0
        };

        let mut scores: Vec<(usize, f32)> = self
            .term_freqs
            .iter()
            .zip(&self.doc_lengths)
            .enumerate()
            .map(|(index, (freqs, &dl))| {
                let score = query_tokens
                    .iter()
                    .map(|token| {
                        let tf = freqs.get(token).copied().unwrap_or(0.0);
                        let idf = self.idf.get(token).copied().unwrap_or(0.0);
                        idf * (tf * (K1 + 1.0)) / (tf + K1 * (1.0 - B + B * dl / avgdl))
                    })
                    .sum::<f32>();
                (index, score)
            })
            .collect();

        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scores
    }

    /// Indices of the `k` best-scoring chunks.
    pub fn top_k(&self, query: &str, k: usize) -> Vec<usize> {
        self.score(query)
            .into_iter()
            .take(k)
            .map(|(index, _)| index)
            .collect()
    }

    /// Number of indexed chunks.
    pub fn document_count(&self) -> usize {
        self.term_freqs.len()
    }
}
