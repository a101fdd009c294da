//! Monte-Carlo cross-check of the closed-form PD.
//!
//! Terminal values are sampled directly from the GBM solution. Paths are
//! split into fixed-size chunks, each with its own RNG seeded from
//! `(seed, chunk index)`, so the estimate depends only on the seed and the
//! path count, not on how rayon schedules the chunks.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{RiskError, RiskResult};
use crate::models::market::PriceProcess;

const CHUNK_PATHS: usize = 8_192;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulatedPd {
    pub pd: f64,
    /// Binomial standard error of `pd`.
    pub std_error: f64,
    pub paths: usize,
    pub seed: u64,
}

/// Simulated PD next to the closed form for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdCrossCheck {
    pub scenario: String,
    pub closed_form: f64,
    pub simulated: SimulatedPd,
}

impl PdCrossCheck {
    /// Distance between the two estimates in standard errors.
    pub fn z_score(&self) -> f64 {
        let se = self.simulated.std_error;
        if se > 0.0 {
            (self.simulated.pd - self.closed_form) / se
        } else if self.simulated.pd == self.closed_form {
            0.0
        } else {
            f64::INFINITY
        }
    }
}

pub fn simulate_pd(
    process: &PriceProcess,
    v0: f64,
    deposit: f64,
    shock: f64,
    paths: usize,
    seed: u64,
) -> RiskResult<SimulatedPd> {
    if paths == 0 {
        return Err(RiskError::InvalidInput("path count must be > 0".to_string()));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| RiskError::InvalidInput(format!("noise distribution: {e}")))?;

    let start = v0 * (1.0 + shock);
    let t = process.term_years;
    let drift = (process.mu - 0.5 * process.sigma * process.sigma) * t;
    let vol = process.sigma * t.sqrt();

    let n_chunks = paths.div_ceil(CHUNK_PATHS);
    let defaults: usize = (0..n_chunks)
        .into_par_iter()
        .map(|chunk| {
            let n = CHUNK_PATHS.min(paths - chunk * CHUNK_PATHS);
            let mut rng = StdRng::seed_from_u64(chunk_seed(seed, chunk));
            (0..n)
                .filter(|_| {
                    let z: f64 = normal.sample(&mut rng);
                    start * (drift + vol * z).exp() < deposit
                })
                .count()
        })
        .sum();

    let pd = defaults as f64 / paths as f64;
    let std_error = (pd * (1.0 - pd) / paths as f64).sqrt();
    tracing::debug!(pd, std_error, paths, seed, "simulated PD");
    Ok(SimulatedPd {
        pd,
        std_error,
        paths,
        seed,
    })
}

fn chunk_seed(seed: u64, chunk: usize) -> u64 {
    // splitmix64 step, so neighbouring chunks get unrelated streams.
    let mut z = seed.wrapping_add((chunk as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_estimate() {
        let p = PriceProcess::new(0.01, 0.08, 2.0).unwrap();
        let a = simulate_pd(&p, 10000.0, 9500.0, -0.1, 20_000, 7).unwrap();
        let b = simulate_pd(&p, 10000.0, 9500.0, -0.1, 20_000, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn agrees_with_closed_form() {
        let p = PriceProcess::new(0.01, 0.08, 2.0).unwrap();
        let closed = p.probability_of_default(10000.0, 9500.0, -0.1);
        let sim = simulate_pd(&p, 10000.0, 9500.0, -0.1, 200_000, 42).unwrap();
        // Well inside 5 standard errors.
        assert!((sim.pd - closed).abs() < 5.0 * sim.std_error.max(1e-3), "{} vs {closed}", sim.pd);
    }

    #[test]
    fn zero_paths_is_an_input_error() {
        let p = PriceProcess::new(0.01, 0.08, 2.0).unwrap();
        assert!(simulate_pd(&p, 1.0, 1.0, 0.0, 0, 1).is_err());
    }
}
