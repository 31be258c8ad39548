use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::ops::Range;


/// Source of all randomness in a simulation run: loss trials, payload bytes, and positions of
///  corrupted symbols. Every lane owns its own instance, so lanes never share RNG state.
#[cfg_attr(test, mockall::automock)]
pub trait Random {
    /// uniformly distributed in [0.0, 1.0)
    fn next_f64(&mut self) -> f64;
    fn fill_bytes(&mut self, buf: &mut [u8]);
    fn gen_usize_range(&mut self, range: Range<usize>) -> usize;

    /// Bernoulli trial that comes up `true` with the given probability
    fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }
}

#[derive(Debug)]
pub struct RngRandom {
    rng: StdRng,
}
impl RngRandom {
    pub fn from_entropy() -> RngRandom {
        RngRandom {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> RngRandom {
        RngRandom {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Derives a per-lane RNG from a run seed. Lanes get distinct but reproducible streams.
    pub fn for_lane(seed: Option<u64>, lane_id: usize) -> RngRandom {
        match seed {
            Some(seed) => Self::seeded(seed ^ (lane_id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            None => Self::from_entropy(),
        }
    }
}
impl Random for RngRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn fill_bytes(&mut self, buf: &mut [u8]) {
        self.rng.fill_bytes(buf)
    }

    fn gen_usize_range(&mut self, range: Range<usize>) -> usize {
        self.rng.gen_range(range)
    }
}
