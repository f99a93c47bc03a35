//! Time-stepped simulation of stochastic point-process spiking networks.
//!
//! A [`Simulation`] is validated once from a [`Connectivity`] and a
//! [`SimConfig`], then run with an injected [`Intensity`] and random
//! generator. Each step applies the perturbation schedule, advances the
//! potentials under the chosen [`StepPolicy`], maps them to rates and
//! samples spikes.
//!
//! ```
//! use pointsim::{Connectivity, RectifiedPower, SimConfig, Simulation};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let sim = Simulation::new(
//!     Connectivity::scalar(0.0),
//!     SimConfig { tstop: 1.0, ..SimConfig::leaky(1.5, 0.0) },
//! )?;
//! let out = sim.run(&RectifiedPower, &mut StdRng::seed_from_u64(7));
//! assert_eq!(out.potentials.dim(), (100, 1));
//! # Ok::<(), pointsim::SimError>(())
//! ```

pub mod error;
pub mod neuro;

pub use error::{Result, SimError};
pub use neuro::intensity::{Intensity, IntensityParams, RectifiedPower};
pub use neuro::network::{Connectivity, Drive};
pub use neuro::neuron::StepPolicy;
pub use neuro::sampler::{SpikeLaw, SpikeSampler};
pub use neuro::simulation::{InitialCondition, Run, SimConfig, SimOutput, Simulation};
pub use neuro::spikes::{SpikeEvent, SpikeLog, TimeBase, spike_train};
pub use neuro::stimuli::{Perturbation, Schedule};
