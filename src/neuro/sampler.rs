use ndarray::{Array1, ArrayView1, Zip};
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};

/// Poisson means above this are sampled at the cap.
const POISSON_MEAN_CAP: f64 = 1.0e15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpikeLaw {
    /// At most one spike per neuron per step, probability `dt·λ`.
    Bernoulli,
    /// Spike count with mean `dt·λ`.
    Poisson,
}

/// Draws one independent spike count per neuron from a rate vector.
#[derive(Clone, Copy, Debug)]
pub struct SpikeSampler {
    pub law: SpikeLaw,
    pub dt: f64,
}

impl SpikeSampler {
    pub fn new(law: SpikeLaw, dt: f64) -> Self {
        Self { law, dt }
    }

    /// Largest rate the Bernoulli law accepts.
    pub fn max_rate(&self) -> f64 {
        1.0 / self.dt
    }

    /// Clips rates in place so that `dt·λ ∈ [0, 1]`. Negative and NaN rates
    /// become 0. The Poisson law accepts any rate and is left untouched.
    /// Returns how many rates were lowered to the cap.
    pub fn clip(&self, rates: &mut Array1<f64>) -> usize {
        if self.law == SpikeLaw::Poisson {
            return 0;
        }

        let max_rate = self.max_rate();
        let mut clipped = 0;
        rates.mapv_inplace(|rate| {
            if !(rate > 0.0) {
                0.0
            } else if rate > max_rate {
                clipped += 1;
                max_rate
            } else {
                rate
            }
        });
        clipped
    }

    /// Draws spikes for already-clipped rates into `spikes`.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        rates: ArrayView1<f64>,
        rng: &mut R,
        spikes: &mut Array1<f64>,
    ) {
        let dt = self.dt;
        match self.law {
            SpikeLaw::Bernoulli => Zip::from(spikes).and(rates).for_each(|n, &rate| {
                let p = dt * rate;
                *n = if !(p > 0.0) {
                    0.0
                } else if p >= 1.0 || rng.random_bool(p) {
                    1.0
                } else {
                    0.0
                };
            }),
            SpikeLaw::Poisson => Zip::from(spikes).and(rates).for_each(|n, &rate| {
                let mean = dt * rate;
                *n = if !(mean > 0.0) {
                    0.0
                } else {
                    Poisson::new(mean.min(POISSON_MEAN_CAP))
                        .map(|poisson| poisson.sample(&mut *rng))
                        .unwrap_or(0.0)
                };
            }),
        }
    }

    /// Clip then draw. Returns the clip count.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rates: &mut Array1<f64>,
        rng: &mut R,
        spikes: &mut Array1<f64>,
    ) -> usize {
        let clipped = self.clip(rates);
        self.draw(rates.view(), rng, spikes);
        clipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn bernoulli_clip_bounds_probability() {
        let sampler = SpikeSampler::new(SpikeLaw::Bernoulli, 0.1);
        let mut rates = array![-3.0, f64::NAN, 4.0, 10.0, 250.0, f64::INFINITY];
        let clipped = sampler.clip(&mut rates);

        assert_eq!(clipped, 2);
        assert_eq!(rates, array![0.0, 0.0, 4.0, 10.0, 10.0, 10.0]);
        assert!(rates.iter().all(|&r| 0.1 * r <= 1.0));
    }

    #[test]
    fn poisson_is_not_clipped() {
        let sampler = SpikeSampler::new(SpikeLaw::Poisson, 0.1);
        let mut rates = array![250.0, 3.0];
        assert_eq!(sampler.clip(&mut rates), 0);
        assert_eq!(rates, array![250.0, 3.0]);
    }

    #[test]
    fn saturated_bernoulli_always_fires() {
        let sampler = SpikeSampler::new(SpikeLaw::Bernoulli, 0.1);
        let mut rng = StdRng::seed_from_u64(7);
        let mut rates = array![1.0e9, 1.0e9, 0.0];
        let mut spikes = Array1::zeros(3);

        for _ in 0..50 {
            sampler.sample(&mut rates, &mut rng, &mut spikes);
            assert_eq!(spikes, array![1.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn poisson_counts_are_nonnegative_integers() {
        let sampler = SpikeSampler::new(SpikeLaw::Poisson, 0.5);
        let mut rng = StdRng::seed_from_u64(11);
        let mut rates = Array1::from_elem(64, 8.0);
        let mut spikes = Array1::zeros(64);
        sampler.sample(&mut rates, &mut rng, &mut spikes);

        assert!(spikes.iter().all(|&n| n >= 0.0 && n.fract() == 0.0));
        assert!(spikes.iter().any(|&n| n > 1.0), "mean 4 should give multi-counts");
    }

    #[test]
    fn bernoulli_rate_matches_probability() {
        let sampler = SpikeSampler::new(SpikeLaw::Bernoulli, 0.01);
        let mut rng = StdRng::seed_from_u64(3);
        let mut rates = Array1::from_elem(10_000, 30.0);
        let mut spikes = Array1::zeros(10_000);
        sampler.sample(&mut rates, &mut rng, &mut spikes);

        let fraction = spikes.sum() / 10_000.0;
        assert!((fraction - 0.3).abs() < 0.03, "got {fraction}");
    }
}
