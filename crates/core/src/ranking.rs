//! Relevance ranking of heading candidates against a query.
//!
//! The ranking model is injected through the [`Ranker`] trait. This module
//! ships a deterministic lexical ranker and the vector math needed by
//! embedding-based rankers, whose I/O lives in the application shell.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{HeadingCandidate, ScoredCandidate};

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Ranking backend unavailable: {0}")]
    Unavailable(String),
    #[error("Embedding dimensions differ: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Invalid ranking response: {0}")]
    InvalidResponse(String),
}

/// Position of a ranked text in the ranker's input, with its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedIndex {
    pub index: usize,
    pub score: f32,
}

/// Maps candidate texts to relevance scores for a query.
///
/// Implementations return at most `top_k` entries sorted by descending
/// score. An empty `texts` slice yields an empty result.
pub trait Ranker: Send + Sync {
    fn rank(
        &self,
        texts: &[String],
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RankedIndex>, RankingError>;
}

/// Keep the `k` best scores, highest first. Ties keep input order.
pub fn top_k<I>(scores: I, k: usize) -> Vec<RankedIndex>
where
    I: IntoIterator<Item = f32>,
{
    let mut ranked: Vec<RankedIndex> = scores
        .into_iter()
        .enumerate()
        .map(|(index, score)| RankedIndex { index, score })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    ranked.truncate(k);
    ranked
}

/// Cosine similarity of two vectors; 0 when either has zero length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Rank precomputed candidate embeddings against a query embedding.
pub fn rank_embeddings(
    candidates: &[Vec<f32>],
    query: &[f32],
    k: usize,
) -> Result<Vec<RankedIndex>, RankingError> {
    if let Some(bad) = candidates.iter().find(|v| v.len() != query.len()) {
        return Err(RankingError::DimensionMismatch {
            expected: query.len(),
            actual: bad.len(),
        });
    }
    Ok(top_k(
        candidates.iter().map(|v| cosine_similarity(v, query)),
        k,
    ))
}

/// Embeddings fetched ahead of time: one vector per candidate text, in the
/// order the texts will be passed to [`Ranker::rank`].
#[derive(Debug, Clone, Default)]
pub struct PrecomputedEmbeddings {
    pub candidates: Vec<Vec<f32>>,
    pub query: Vec<f32>,
}

impl Ranker for PrecomputedEmbeddings {
    fn rank(
        &self,
        texts: &[String],
        _query: &str,
        top_k_count: usize,
    ) -> Result<Vec<RankedIndex>, RankingError> {
        if texts.len() != self.candidates.len() {
            return Err(RankingError::InvalidResponse(format!(
                "{} embeddings for {} texts",
                self.candidates.len(),
                texts.len()
            )));
        }
        rank_embeddings(&self.candidates, &self.query, top_k_count)
    }
}

/// Round a score to three decimals for reporting.
pub fn round_score(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}

/// Rank candidates and attach the (rounded) scores.
///
/// The result follows the ranker's order and holds at most `k` entries.
pub fn rank_candidates(
    ranker: &dyn Ranker,
    candidates: &[HeadingCandidate],
    query: &str,
    k: usize,
) -> Result<Vec<ScoredCandidate>, RankingError> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<String> = candidates.iter().map(|c| c.text().to_string()).collect();
    let ranked = ranker.rank(&texts, query, k)?;

    ranked
        .into_iter()
        .map(|r| {
            let candidate = candidates.get(r.index).ok_or_else(|| {
                RankingError::InvalidResponse(format!("index {} out of range", r.index))
            })?;
            Ok(ScoredCandidate {
                candidate: candidate.clone(),
                score: round_score(r.score),
            })
        })
        .collect()
}

/// Lowercased alphanumeric tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn term_frequencies(text: &str) -> HashMap<String, f32> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

fn sparse_cosine(a: &HashMap<String, f32>, b: &HashMap<String, f32>) -> f32 {
    let dot: f32 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let norm_a = a.values().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Bag-of-words cosine similarity between candidate and query terms.
///
/// Needs no model and is fully deterministic, which makes it the offline
/// default and the reference ranker in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalRanker;

impl Ranker for LexicalRanker {
    fn rank(
        &self,
        texts: &[String],
        query: &str,
        top_k_count: usize,
    ) -> Result<Vec<RankedIndex>, RankingError> {
        let query_terms = term_frequencies(query);
        Ok(top_k(
            texts
                .iter()
                .map(|t| sparse_cosine(&term_frequencies(t), &query_terms)),
            top_k_count,
        ))
    }
}
