//! Offline feature-hashing embedder
//!
//! Maps word unigrams and bigrams into a fixed number of signed buckets and
//! L2-normalizes the result. Texts sharing vocabulary get high cosine
//! similarity, which is enough for tests and air-gapped deployments. The
//! hasher is seed-free so vectors are identical across processes.

use crate::embed::{EmbedResult, Embedder, EmbeddingModel};
use async_trait::async_trait;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    model: EmbeddingModel,
}

impl HashingEmbedder {
    pub fn new(model: EmbeddingModel) -> Self {
        Self { model }
    }

    /// Encode one text synchronously
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let dims = self.model.dimensions();
        let mut vector = vec![0.0f32; dims];

        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();

        for token in &tokens {
            self.accumulate(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut vector, &format!("{} {}", pair[0], pair[1]), 0.5);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in vector.iter_mut() {
                *x /= norm;
            }
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let mut hasher = FxHasher::default();
        self.model.key().hash(&mut hasher);
        feature.hash(&mut hasher);
        let h = hasher.finish();
        let bucket = (h % vector.len() as u64) as usize;
        let sign = if (h >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model(&self) -> EmbeddingModel {
        self.model
    }

    async fn encode(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::cosine_similarity;

    #[test]
    fn test_fixed_dimension_and_unit_norm() {
        for model in EmbeddingModel::ALL {
            let v = HashingEmbedder::new(model).embed("Flight 2411 from LAX to ORD");
            assert_eq!(v.len(), model.dimensions());
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_deterministic() {
        let e = HashingEmbedder::new(EmbeddingModel::MiniLm);
        assert_eq!(e.embed("late arrival"), e.embed("late arrival"));
        assert_eq!(e.embed("Late, ARRIVAL"), e.embed("late arrival"));
    }

    #[test]
    fn test_shared_vocabulary_scores_higher() {
        let e = HashingEmbedder::new(EmbeddingModel::MiniLm);
        let query = e.embed("economy journey with a long arrival delay");
        let close = e.embed("A economy class journey. Arrival delay: 95 minutes.");
        let far = e.embed("station_code: SFO");
        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = HashingEmbedder::new(EmbeddingModel::MpNet).embed("  ");
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
