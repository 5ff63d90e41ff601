use ndarray::{Array1, ArrayView1};

pub(crate) fn average_vectors(vectors: &[ArrayView1<f32>], n_features: usize) -> Array1<f32> {
    if vectors.is_empty() {
        return Array1::zeros(n_features);
    }
    let sum = vectors.iter().fold(Array1::zeros(n_features), |acc, v| acc + v);
    sum / vectors.len() as f32
}

pub(crate) fn squared_distance(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Numerically stable softmax.
pub(crate) fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_average_vectors() {
        let a = array![1.0f32, 2.0];
        let b = array![3.0f32, 6.0];
        let avg = average_vectors(&[a.view(), b.view()], 2);
        assert_eq!(avg, array![2.0, 4.0]);
        assert_eq!(average_vectors(&[], 3), Array1::<f32>::zeros(3));
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[-1000.0, -1001.0, -1002.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }
}
