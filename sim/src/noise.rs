//! Idle jitter noise sources.
//!
//! The engine wobbles a little around idle purely for visual realism. The
//! source is injectable so tests can run silent or seeded.

use bevy_ecs::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Produces noise samples in `[-1, 1]`.
pub trait IdleNoise: Send + Sync {
    fn sample(&mut self) -> f32;
}

/// No jitter at all. The default, so simulation runs are reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNoise;

impl IdleNoise for SilentNoise {
    fn sample(&mut self) -> f32 {
        0.0
    }
}

/// Deterministic jitter from a seeded ChaCha8 stream.
#[derive(Debug, Clone)]
pub struct SeededNoise {
    rng: ChaCha8Rng,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seeded from OS entropy, for live sessions.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl IdleNoise for SeededNoise {
    fn sample(&mut self) -> f32 {
        self.rng.gen_range(-1.0..=1.0)
    }
}

/// World resource holding the active noise source.
#[derive(Resource)]
pub struct IdleNoiseSource(pub Box<dyn IdleNoise>);

impl IdleNoiseSource {
    pub fn new(noise: impl IdleNoise + 'static) -> Self {
        Self(Box::new(noise))
    }

    pub fn sample(&mut self) -> f32 {
        self.0.sample()
    }
}

impl Default for IdleNoiseSource {
    fn default() -> Self {
        Self::new(SilentNoise)
    }
}
