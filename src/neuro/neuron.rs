use ndarray::{Array1, ArrayView1, ArrayViewMut1, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::neuro::network::Connectivity;
use crate::neuro::sampler::SpikeLaw;

/// Euler update rule for the membrane potentials. `n` is always the spike
/// vector drawn at the previous step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepPolicy {
    /// `v + dt·E + J·n − n⊙v`, no leak; a spike pulls the potential to zero.
    PointProcess,
    /// `v + dt·(−v + E) + J·n`, then `v_i = v_r` wherever `n_i > 0`.
    SubtractiveReset,
    /// Same drift as [`StepPolicy::SubtractiveReset`], but the reset targets
    /// are the spike *values* read as neuron indices: every entry of `n`
    /// resets neuron `n_i`. With 0/1 spikes this resets neuron 0 on every
    /// step and neuron 1 whenever anything fired, which is not the same as
    /// resetting the neurons that spiked. Kept as its own variant.
    ExactReset,
    /// `v + dt·(−v + E) + J·Σn − n⊙(v − v_r)` with a single shared weight.
    /// Spikes are Poisson counts.
    MeanField,
    /// `v + dt·(−v + E) + (J·n)⊙(E_s − v)`, then hard reset to `v_r`.
    Conductance { e_syn: f64 },
}

impl StepPolicy {
    pub fn spike_law(&self) -> SpikeLaw {
        match self {
            StepPolicy::MeanField => SpikeLaw::Poisson,
            _ => SpikeLaw::Bernoulli,
        }
    }

    pub(crate) fn validate(&self, connectivity: &Connectivity) -> Result<()> {
        if *self == StepPolicy::MeanField && matches!(connectivity, Connectivity::Dense(_)) {
            return Err(SimError::InvalidParameter(
                "mean-field policy needs a uniform scalar connectivity".into(),
            ));
        }
        Ok(())
    }

    /// Writes `v[t]` into `next` from `prev = v[t-1]`, the previous spikes and
    /// the effective drive for step `t`.
    pub fn advance(
        &self,
        prev: ArrayView1<f64>,
        spikes: ArrayView1<f64>,
        drive: ArrayView1<f64>,
        connectivity: &Connectivity,
        dt: f64,
        v_r: f64,
        mut next: ArrayViewMut1<f64>,
    ) {
        let synaptic = connectivity.input(spikes);

        match *self {
            StepPolicy::PointProcess => Zip::from(&mut next)
                .and(&prev)
                .and(&drive)
                .and(&synaptic)
                .and(&spikes)
                .for_each(|v, &v0, &e, &syn, &n| *v = v0 + dt * e + syn - n * v0),
            StepPolicy::SubtractiveReset => {
                leak(&mut next, &prev, &drive, &synaptic, dt);
                reset_spiking(&mut next, &spikes, v_r);
            }
            StepPolicy::ExactReset => {
                leak(&mut next, &prev, &drive, &synaptic, dt);
                reset_by_value(&mut next, &spikes, v_r);
            }
            StepPolicy::MeanField => Zip::from(&mut next)
                .and(&prev)
                .and(&drive)
                .and(&synaptic)
                .and(&spikes)
                .for_each(|v, &v0, &e, &syn, &n| {
                    *v = v0 + dt * (-v0 + e) + syn - n * (v0 - v_r);
                }),
            StepPolicy::Conductance { e_syn } => {
                Zip::from(&mut next)
                    .and(&prev)
                    .and(&drive)
                    .and(&synaptic)
                    .for_each(|v, &v0, &e, &syn| {
                        *v = v0 + dt * (-v0 + e) + syn * (e_syn - v0);
                    });
                reset_spiking(&mut next, &spikes, v_r);
            }
        }
    }
}

fn leak(
    next: &mut ArrayViewMut1<f64>,
    prev: &ArrayView1<f64>,
    drive: &ArrayView1<f64>,
    synaptic: &Array1<f64>,
    dt: f64,
) {
    Zip::from(next)
        .and(prev)
        .and(drive)
        .and(synaptic)
        .for_each(|v, &v0, &e, &syn| *v = v0 + dt * (-v0 + e) + syn);
}

fn reset_spiking(next: &mut ArrayViewMut1<f64>, spikes: &ArrayView1<f64>, v_r: f64) {
    Zip::from(next).and(spikes).for_each(|v, &n| {
        if n > 0.0 {
            *v = v_r;
        }
    });
}

fn reset_by_value(next: &mut ArrayViewMut1<f64>, spikes: &ArrayView1<f64>, v_r: f64) {
    for &n in spikes {
        // Counts are nonnegative; indices past the population are dropped.
        if let Some(v) = next.get_mut(n as usize) {
            *v = v_r;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    fn step(
        policy: StepPolicy,
        prev: Array1<f64>,
        spikes: Array1<f64>,
        drive: Array1<f64>,
        j: &Connectivity,
    ) -> Array1<f64> {
        let mut next = Array1::zeros(prev.len());
        policy.advance(
            prev.view(),
            spikes.view(),
            drive.view(),
            j,
            0.1,
            -0.5,
            next.view_mut(),
        );
        next
    }

    #[test]
    fn point_process_soft_reset() {
        let j = Connectivity::Dense(array![[0.0, 1.0], [2.0, 0.0]]);
        let next = step(
            StepPolicy::PointProcess,
            array![0.4, 0.8],
            array![1.0, 0.0],
            array![1.0, 1.0],
            &j,
        );
        // neuron 0 spiked: 0.4 + 0.1 + 0 - 0.4; neuron 1: 0.8 + 0.1 + 2
        assert_relative_eq!(next[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(next[1], 2.9, epsilon = 1e-12);
    }

    #[test]
    fn subtractive_reset_only_spiking_neurons() {
        let j = Connectivity::Dense(Array2::zeros((3, 3)));
        let next = step(
            StepPolicy::SubtractiveReset,
            array![1.0, 1.0, 1.0],
            array![0.0, 1.0, 0.0],
            array![2.0, 2.0, 2.0],
            &j,
        );
        assert_relative_eq!(next[0], 1.1, epsilon = 1e-12);
        assert_relative_eq!(next[1], -0.5, epsilon = 1e-12);
        assert_relative_eq!(next[2], 1.1, epsilon = 1e-12);
    }

    #[test]
    fn exact_reset_indexes_by_spike_value() {
        let j = Connectivity::Dense(Array2::zeros((3, 3)));
        // only neuron 2 spiked, yet values [0, 0, 1] reset neurons 0 and 1
        let next = step(
            StepPolicy::ExactReset,
            array![1.0, 1.0, 1.0],
            array![0.0, 0.0, 1.0],
            array![2.0, 2.0, 2.0],
            &j,
        );
        assert_relative_eq!(next[0], -0.5, epsilon = 1e-12);
        assert_relative_eq!(next[1], -0.5, epsilon = 1e-12);
        assert_relative_eq!(next[2], 1.1, epsilon = 1e-12);
    }

    #[test]
    fn exact_reset_ignores_out_of_range_values() {
        let j = Connectivity::scalar(0.0);
        let next = step(StepPolicy::ExactReset, array![1.0], array![1.0], array![2.0], &j);
        assert_relative_eq!(next[0], 1.1, epsilon = 1e-12);
    }

    #[test]
    fn mean_field_couples_through_total_count() {
        let j = Connectivity::Uniform {
            weight: 0.01,
            size: 3,
        };
        let next = step(
            StepPolicy::MeanField,
            array![0.0, 1.0, 0.5],
            array![2.0, 0.0, 1.0],
            array![1.0, 1.0, 1.0],
            &j,
        );
        // common coupling 0.03, reset term -n·(v - v_r)
        assert_relative_eq!(next[0], 0.1 + 0.03 - 2.0 * 0.5, epsilon = 1e-12);
        assert_relative_eq!(next[1], 1.0 + 0.03, epsilon = 1e-12);
        assert_relative_eq!(next[2], 0.55 + 0.03 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn conductance_scales_with_reversal_distance() {
        let j = Connectivity::Dense(array![[0.0, 0.5], [0.0, 0.0]]);
        let next = step(
            StepPolicy::Conductance { e_syn: 3.0 },
            array![1.0, 1.0],
            array![0.0, 1.0],
            array![1.0, 1.0],
            &j,
        );
        assert_relative_eq!(next[0], 1.0 + 0.5 * 2.0, epsilon = 1e-12);
        assert_relative_eq!(next[1], -0.5, epsilon = 1e-12);
    }

    #[test]
    fn mean_field_rejects_dense_matrix() {
        let j = Connectivity::Dense(Array2::zeros((2, 2)));
        assert!(StepPolicy::MeanField.validate(&j).is_err());
        assert!(StepPolicy::SubtractiveReset.validate(&j).is_ok());
        assert_eq!(StepPolicy::MeanField.spike_law(), SpikeLaw::Poisson);
        assert_eq!(StepPolicy::ExactReset.spike_law(), SpikeLaw::Bernoulli);
    }

    #[test]
    fn policy_config_format() {
        let policy: StepPolicy =
            serde_json::from_str(r#"{ "kind": "conductance", "e_syn": 2.5 }"#).unwrap();
        assert_eq!(policy, StepPolicy::Conductance { e_syn: 2.5 });
        let policy: StepPolicy = serde_json::from_str(r#"{ "kind": "exact_reset" }"#).unwrap();
        assert_eq!(policy, StepPolicy::ExactReset);
    }
}
