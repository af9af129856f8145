//! Similarity metric and vector encoding for stored embeddings

/// Cosine similarity between two embedding vectors
///
/// Returns a value between -1.0 and 1.0, or `None` when the dimensions
/// differ (e.g. vectors written by a different embedding model) or the
/// magnitudes overflow `f32`. Zero-magnitude vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Some(0.0);
    }

    let similarity = dot_product / (magnitude_a * magnitude_b);
    similarity.is_finite().then_some(similarity)
}

/// Encode a vector as little-endian `f32` bytes for BLOB storage
pub fn vec_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode little-endian `f32` bytes; trailing partial values are ignored
pub fn bytes_to_vec(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_relative_eq!(cosine_similarity(&a, &b).unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert_relative_eq!(cosine_similarity(&a, &b).unwrap(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        assert_relative_eq!(cosine_similarity(&a, &b).unwrap(), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), Some(0.0));
    }

    #[test]
    fn test_cosine_similarity_different_dimensions() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn test_cosine_similarity_overflow_is_none() {
        let huge = [3.0e38, 3.0e38];
        assert_eq!(cosine_similarity(&huge, &huge), None);
        // Infinite magnitude against a finite vector collapses to 0.0
        assert_eq!(cosine_similarity(&huge, &[1.0, 0.0]), Some(0.0));
    }

    #[test]
    fn test_bytes_round_trip() {
        let v = vec![1.0, 2.5, -3.25];
        let bytes = vec_to_bytes(&v);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_vec(&bytes), v);
    }
}
