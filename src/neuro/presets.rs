//! Ready-made configurations for the classic model variants. Each sets the
//! policy, initial condition, schedule and log time base; tune the rest
//! with struct update syntax:
//!
//! ```
//! use pointsim::{Drive, SimConfig};
//!
//! let config = SimConfig {
//!     tstop: 20.0,
//!     v_r: -0.5,
//!     ..SimConfig::leaky(Drive::Scalar(1.2), 0.0)
//! };
//! assert_eq!(config.tstop, 20.0);
//! ```

use crate::neuro::network::Drive;
use crate::neuro::neuron::StepPolicy;
use crate::neuro::simulation::{InitialCondition, SimConfig};
use crate::neuro::spikes::TimeBase;
use crate::neuro::stimuli::Perturbation;

/// Windowed stimulus that never opens; replaced by [`SimConfig::with_stimulus`].
fn no_stimulus() -> Perturbation {
    Perturbation::Windowed {
        tstim: 0.0,
        stim_drive: Drive::Scalar(0.0),
    }
}

impl SimConfig {
    /// Non-leaky point process, spikes logged by step index.
    pub fn point_process(drive: impl Into<Drive>) -> Self {
        Self {
            drive: drive.into(),
            policy: StepPolicy::PointProcess,
            time_base: TimeBase::Steps,
            ..Default::default()
        }
    }

    /// Leaky population with reset of the neurons that spiked, starting at
    /// `v0`.
    pub fn leaky(drive: impl Into<Drive>, v0: f64) -> Self {
        Self {
            drive: drive.into(),
            policy: StepPolicy::SubtractiveReset,
            perturbation: no_stimulus(),
            initial: InitialCondition::Constant { value: v0 },
            ..Default::default()
        }
    }

    /// Leaky population using the value-indexed reset.
    pub fn leaky_exact_reset(drive: impl Into<Drive>, v0: f64) -> Self {
        Self {
            policy: StepPolicy::ExactReset,
            ..Self::leaky(drive, v0)
        }
    }

    /// Fully connected population in the mean-field limit. Pair with
    /// `Connectivity::Uniform`.
    pub fn mean_field(drive: impl Into<Drive>) -> Self {
        Self {
            drive: drive.into(),
            policy: StepPolicy::MeanField,
            perturbation: no_stimulus(),
            initial: InitialCondition::ScaledNormal,
            ..Default::default()
        }
    }

    /// Replaces the drive with `stim_drive` for the first `tstim` time units.
    pub fn with_stimulus(self, tstim: f64, stim_drive: impl Into<Drive>) -> Self {
        Self {
            perturbation: Perturbation::Windowed {
                tstim,
                stim_drive: stim_drive.into(),
            },
            ..self
        }
    }

    /// Conductance coupling toward `e_syn` with the default two-phase
    /// perturbation (±1.5 for 10 time units at a quarter and three quarters
    /// of the run, every neuron).
    pub fn conductance(leak_drive: impl Into<Drive>, e_syn: f64) -> Self {
        Self {
            drive: leak_drive.into(),
            policy: StepPolicy::Conductance { e_syn },
            perturbation: Perturbation::TwoPhase {
                start: None,
                len: 10.0,
                amplitude: 1.5,
                targets: None,
            },
            initial: InitialCondition::UniformRandom,
            ..Default::default()
        }
    }

    /// Evenly spaced drive steps over `targets` (every neuron when `None`).
    pub fn step_sequence(
        drive: impl Into<Drive>,
        amplitudes: Vec<f64>,
        targets: Option<Vec<usize>>,
    ) -> Self {
        Self {
            drive: drive.into(),
            policy: StepPolicy::ExactReset,
            perturbation: Perturbation::StepSequence {
                amplitudes,
                targets,
            },
            initial: InitialCondition::UniformRandom,
            ..Default::default()
        }
    }

    /// Arbitrary per-step drive offsets; `offsets` needs one entry per step.
    pub fn time_dependent(
        drive: impl Into<Drive>,
        offsets: Vec<f64>,
        targets: Option<Vec<usize>>,
    ) -> Self {
        Self {
            drive: drive.into(),
            policy: StepPolicy::SubtractiveReset,
            perturbation: Perturbation::TimeSeries { offsets, targets },
            initial: InitialCondition::UniformRandom,
            ..Default::default()
        }
    }
}
