//! Mapping from normalized pulse weight to velocity and firing decisions.

use rand::Rng;

use crate::config::ArpConfig;

/// `min + w * (max - min)`, rounded
pub fn velocity(weight: f32, min: u8, max: u8) -> u8 {
    let span = max as f32 - min as f32;
    (min as f32 + weight.clamp(0.0, 1.0) * span).round().clamp(0.0, 127.0) as u8
}

/// Deterministic filter: weight within `min_weight..=max_weight`
pub fn passes_weight(weight: f32, config: &ArpConfig) -> bool {
    (config.min_weight..=config.max_weight).contains(&weight)
}

/// Firing chance of a pulse of `weight`
pub fn probability(weight: f32, config: &ArpConfig) -> f32 {
    let span = config.max_probability - config.min_probability;
    (config.min_probability + weight.clamp(0.0, 1.0) * span).clamp(0.0, 1.0)
}

/// Roll the probabilistic filter. Certain outcomes don't draw from `rng`.
pub fn roll<R: Rng + ?Sized>(weight: f32, config: &ArpConfig, rng: &mut R) -> bool {
    let chance = probability(weight, config);
    if chance >= 1.0 {
        true
    } else if chance <= 0.0 {
        false
    } else {
        rng.gen::<f32>() < chance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_velocity_tracks_weight() {
        // Normalized 4/4 weights of beats 1..4
        let weights = [1.0, 0.0, 2.0 / 3.0, 1.0 / 3.0];
        let velocities: Vec<u8> = weights.iter().map(|&w| velocity(w, 40, 100)).collect();
        assert_eq!(velocities, vec![100, 40, 80, 60]);
    }

    #[test]
    fn test_velocity_bounds() {
        assert_eq!(velocity(0.5, 0, 127), 64);
        assert_eq!(velocity(2.0, 0, 127), 127);
        assert_eq!(velocity(-1.0, 10, 20), 10);
        assert_eq!(velocity(0.7, 90, 90), 90);
    }

    #[test]
    fn test_weight_filter_is_inclusive() {
        let config = ArpConfig::default().with_weight(0.5, 1.0);
        assert!(passes_weight(0.5, &config));
        assert!(passes_weight(1.0, &config));
        assert!(!passes_weight(0.4, &config));
    }

    #[test]
    fn test_probability_interpolates() {
        let config = ArpConfig::default().with_probability(0.2, 0.6);
        assert!((probability(0.0, &config) - 0.2).abs() < 1e-6);
        assert!((probability(0.5, &config) - 0.4).abs() < 1e-6);
        assert!((probability(1.0, &config) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_roll_certain_outcomes() {
        let mut rng = StdRng::seed_from_u64(3);
        let always = ArpConfig::default();
        let never = ArpConfig::default().with_probability(0.0, 0.0);
        for _ in 0..100 {
            assert!(roll(0.3, &always, &mut rng));
            assert!(!roll(0.3, &never, &mut rng));
        }
    }

    #[test]
    fn test_roll_frequency() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = ArpConfig::default().with_probability(0.5, 0.5);
        let hits = (0..10_000).filter(|_| roll(0.0, &config, &mut rng)).count();
        assert!((4_500..5_500).contains(&hits), "hits = {hits}");
    }
}
