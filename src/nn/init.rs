//! Weight initialization

use rand::Rng;

/// Half-width of the Xavier (Glorot) uniform distribution
pub fn xavier_bound(fan_in: usize, fan_out: usize) -> f32 {
    (6.0 / (fan_in + fan_out).max(1) as f32).sqrt()
}

/// Xavier-uniform weights for a `fan_in × fan_out` layer
///
/// The RNG is injected so a seeded session initializes identically on every
/// run. Biases are zero-initialized by the layers themselves.
pub fn weight_init<R: Rng>(rng: &mut R, fan_in: usize, fan_out: usize) -> Vec<f32> {
    let bound = xavier_bound(fan_in, fan_out);
    (0..fan_in * fan_out)
        .map(|_| rng.random_range(-bound..=bound))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_weights_within_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let bound = xavier_bound(64, 32);
        let w = weight_init(&mut rng, 64, 32);
        assert_eq!(w.len(), 64 * 32);
        assert!(w.iter().all(|v| v.abs() <= bound));
    }

    #[test]
    fn test_seeded_init_is_reproducible() {
        let a = weight_init(&mut StdRng::seed_from_u64(42), 8, 4);
        let b = weight_init(&mut StdRng::seed_from_u64(42), 8, 4);
        let c = weight_init(&mut StdRng::seed_from_u64(43), 8, 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_weights_not_degenerate() {
        let w = weight_init(&mut StdRng::seed_from_u64(1), 16, 16);
        let mean = w.iter().sum::<f32>() / w.len() as f32;
        assert!(mean.abs() < 0.1);
        assert!(w.iter().any(|v| *v != 0.0));
    }
}
