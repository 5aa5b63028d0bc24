//! Text embedding.

use crate::IndexError;

/// Default vector dimension of [`HashingEmbedder`].
pub const DEFAULT_DIMENSION: usize = 512;

/// Maps normalized text to a fixed-length vector.
///
/// Implementations must be deterministic: the same text always yields the
/// same vector, so an index rebuilt from the same concepts answers queries
/// identically.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError>;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IndexError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn dimension(&self) -> usize;
}

/// Signed feature-hashing embedder over words and character trigrams.
///
/// Each whitespace token contributes a word feature, and each trigram of the
/// token padded with one space on either side contributes a character
/// feature. Features are hashed with 64-bit FNV-1a into `dimension` buckets
/// with a hash-derived sign, then the vector is L2 normalized. Empty text
/// yields the zero vector.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create an embedder; a zero dimension falls back to the default.
    pub fn new(dimension: usize) -> Self {
        let dimension = if dimension == 0 {
            DEFAULT_DIMENSION
        } else {
            dimension
        };
        Self { dimension }
    }

    fn add_feature(&self, vector: &mut [f32], kind: u8, feature: &str, weight: f32) {
        let hash = fnv1a(kind, feature.as_bytes());
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text.split_whitespace() {
            self.add_feature(&mut vector, b'w', token, 1.0);

            let padded: Vec<char> = std::iter::once(' ')
                .chain(token.chars())
                .chain(std::iter::once(' '))
                .collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut vector, b't', &trigram, 1.0);
            }
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(kind: u8, bytes: &[u8]) -> u64 {
    std::iter::once(kind)
        .chain(bytes.iter().copied())
        .fold(FNV_OFFSET, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
}

pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Cosine similarity clamped into [0, 1].
///
/// Zero vectors and mismatched lengths have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_are_deterministic_and_unit_length() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("fever").unwrap();
        let b = embedder.embed("fever").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIMENSION);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn empty_text_is_the_zero_vector() {
        let embedder = HashingEmbedder::new(64);
        let zero = embedder.embed("   ").unwrap();
        assert!(zero.iter().all(|x| *x == 0.0));
        let other = embedder.embed("fever").unwrap();
        assert_eq!(cosine_similarity(&zero, &other), 0.0);
    }

    #[test]
    fn shared_words_score_higher_than_unrelated_text() {
        let embedder = HashingEmbedder::default();
        let fever = embedder.embed("fever").unwrap();
        let high_fever = embedder.embed("high fever").unwrap();
        let fracture = embedder.embed("fracture of femur").unwrap();
        let related = cosine_similarity(&fever, &high_fever);
        let unrelated = cosine_similarity(&fever, &fracture);
        assert!(related > 0.5, "related = {related}");
        assert!(unrelated < 0.3, "unrelated = {unrelated}");
    }

    #[test]
    fn identical_text_has_similarity_one() {
        let embedder = HashingEmbedder::default();
        let v = embedder.embed("amlapitta").unwrap();
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn batch_matches_single_embeds() {
        let embedder = HashingEmbedder::new(128);
        let batch = embedder.embed_batch(&["jvara", "kasa"]).unwrap();
        assert_eq!(batch[0], embedder.embed("jvara").unwrap());
        assert_eq!(batch[1], embedder.embed("kasa").unwrap());
    }
}
