//! Similarity Scorer: cosine similarity between sentence embeddings.
//!
//! Both texts go through the same encoder in full; there is no chunking, so
//! the model's own input limit applies to very long documents.

use std::sync::Arc;
use std::time::Instant;

use model2vec_rs::model::StaticModel;
use thiserror::Error;
use tracing::{debug, info};

use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to load embedding model '{model}': {message}")]
    Load { model: String, message: String },

    #[error("embedding dimensions don't match: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("embedding task failed: {0}")]
    Task(String),
}

impl From<EmbeddingError> for AppError {
    fn from(e: EmbeddingError) -> Self {
        AppError::Embedding(e.to_string())
    }
}

/// Turns text into a fixed-length vector. Implementations must be
/// deterministic for a given model.
pub trait TextEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Vec<f32>;

    fn model_name(&self) -> &str;
}

/// Model2Vec static embedding model, loaded from a local folder or the
/// Hugging Face Hub.
pub struct Model2VecEncoder {
    model: StaticModel,
    name: String,
}

impl Model2VecEncoder {
    /// Loads the model. Hub downloads are synchronous; call from a blocking context.
    pub fn load(repo_or_path: &str) -> Result<Self, EmbeddingError> {
        let start = Instant::now();
        let model = StaticModel::from_pretrained(repo_or_path, None, None, None).map_err(|e| {
            EmbeddingError::Load {
                model: repo_or_path.to_string(),
                message: format!("{e:#}"),
            }
        })?;
        info!(
            "Embedding model '{repo_or_path}' loaded in {:.2?}",
            start.elapsed()
        );
        Ok(Self {
            model,
            name: repo_or_path.to_string(),
        })
    }
}

impl TextEncoder for Model2VecEncoder {
    fn encode(&self, text: &str) -> Vec<f32> {
        self.model.encode_single(text)
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Cosine similarity in [-1, 1]. A zero vector scores 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, EmbeddingError> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

#[derive(Clone)]
pub struct SimilarityScorer {
    encoder: Arc<dyn TextEncoder>,
}

impl SimilarityScorer {
    pub fn new(encoder: Arc<dyn TextEncoder>) -> Self {
        Self { encoder }
    }

    pub fn model_name(&self) -> &str {
        self.encoder.model_name()
    }

    /// Encodes each text independently and compares the two vectors.
    pub fn similarity(&self, text1: &str, text2: &str) -> Result<f32, EmbeddingError> {
        let start = Instant::now();
        let a = self.encoder.encode(text1);
        let b = self.encoder.encode(text2);
        let score = cosine_similarity(&a, &b)?;
        debug!(
            "Similarity {score:.4} (dim={}, {:.2?})",
            a.len(),
            start.elapsed()
        );
        Ok(score)
    }

    /// Same as [`similarity`](Self::similarity), run on the blocking pool.
    pub async fn similarity_blocking(&self, text1: String, text2: String) -> Result<f32, AppError> {
        let scorer = self.clone();
        let score = tokio::task::spawn_blocking(move || scorer.similarity(&text1, &text2))
            .await
            .map_err(|e| EmbeddingError::Task(e.to_string()))??;
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::HashingEncoder;

    fn scorer() -> SimilarityScorer {
        SimilarityScorer::new(Arc::new(HashingEncoder::default()))
    }

    #[test]
    fn test_cosine_of_identical_vectors_is_one() {
        let v = [0.3, -1.2, 4.0];
        assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_of_opposite_vectors_is_minus_one() {
        let score = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap();
        assert!((score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_dimension_mismatch_is_error() {
        assert!(matches!(
            cosine_similarity(&[1.0], &[1.0, 2.0]),
            Err(EmbeddingError::DimensionMismatch { left: 1, right: 2 })
        ));
    }

    #[test]
    fn test_self_similarity_is_maximal() {
        let text = "Looking for a Python developer with AWS experience";
        let score = scorer().similarity(text, text).unwrap();
        assert!((score - 1.0).abs() < 1e-5, "got {score}");
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let a = "Senior Rust engineer for distributed storage";
        let b = "Python data scientist with storage background";
        let s = scorer();
        let ab = s.similarity(a, b).unwrap();
        let ba = s.similarity(b, a).unwrap();
        assert!((ab - ba).abs() < 1e-6);
        assert!((-1.0..=1.0).contains(&ab));
    }

    #[test]
    fn test_related_texts_score_higher_than_unrelated() {
        let s = scorer();
        let jd = "python developer aws experience";
        let close = s.similarity(jd, "python developer aws pipelines").unwrap();
        let far = s.similarity(jd, "pastry chef croissants baking").unwrap();
        assert!(close > far, "close={close}, far={far}");
    }

    #[tokio::test]
    async fn test_blocking_wrapper_matches_direct_call() {
        let s = scorer();
        let direct = s.similarity("rust", "rust tokio").unwrap();
        let pooled = s
            .similarity_blocking("rust".to_string(), "rust tokio".to_string())
            .await
            .unwrap();
        assert_eq!(direct, pooled);
    }

    /// Downloads the default model from the Hugging Face Hub.
    #[test]
    #[ignore = "requires network access to the Hugging Face Hub"]
    fn test_pretrained_model_scores_python_aws_pair_high() {
        let encoder = Model2VecEncoder::load("minishlab/potion-base-8M").unwrap();
        let s = SimilarityScorer::new(Arc::new(encoder));
        let score = s
            .similarity(
                "Looking for a Python developer with AWS experience",
                "Experienced Python developer, built AWS pipelines",
            )
            .unwrap();
        assert!(score > 0.7, "got {score}");
    }
}
