use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Result, SimError};
use crate::neuro::intensity::{Intensity, IntensityParams};
use crate::neuro::network::{Connectivity, Drive};
use crate::neuro::neuron::StepPolicy;
use crate::neuro::sampler::SpikeSampler;
use crate::neuro::spikes::{self, SpikeEvent, SpikeLog, TimeBase};
use crate::neuro::step_count;
use crate::neuro::stimuli::{Perturbation, Schedule};

/// Potential of every neuron at step 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitialCondition {
    #[default]
    Zero,
    Constant {
        value: f64,
    },
    Vector {
        values: Vec<f64>,
    },
    /// Independent draws from `[0, 1)`.
    UniformRandom,
    /// Standard normal draws scaled by `1/√N`.
    ScaledNormal,
}

impl InitialCondition {
    fn validate(&self, n: usize) -> Result<()> {
        match self {
            InitialCondition::Vector { values } if values.len() != n => Err(SimError::shape(
                "initial condition",
                n.to_string(),
                values.len(),
            )),
            _ => Ok(()),
        }
    }

    fn realize<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array1<f64> {
        match self {
            InitialCondition::Zero => Array1::zeros(n),
            InitialCondition::Constant { value } => Array1::from_elem(n, *value),
            InitialCondition::Vector { values } => Array1::from_vec(values.clone()),
            InitialCondition::UniformRandom => Array1::from_shape_fn(n, |_| rng.random::<f64>()),
            InitialCondition::ScaledNormal => {
                let scale = (n as f64).sqrt();
                Array1::from_shape_fn(n, |_| rng.sample::<f64, _>(StandardNormal) / scale)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tstop: f64,
    pub dt: f64,
    pub intensity: IntensityParams,
    /// Reset potential.
    pub v_r: f64,
    /// Baseline external drive `E`.
    pub drive: Drive,
    pub policy: StepPolicy,
    pub perturbation: Perturbation,
    pub initial: InitialCondition,
    pub time_base: TimeBase,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tstop: 100.0,
            dt: 0.01,
            intensity: IntensityParams::default(),
            v_r: 0.0,
            drive: Drive::default(),
            policy: StepPolicy::SubtractiveReset,
            perturbation: Perturbation::None,
            initial: InitialCondition::Zero,
            time_base: TimeBase::Seconds,
        }
    }
}

/// A validated run description. Everything that can fail is checked here;
/// [`Simulation::run`] itself is infallible.
#[derive(Clone, Debug)]
pub struct Simulation {
    connectivity: Connectivity,
    config: SimConfig,
    n: usize,
    nt: usize,
    baseline: Array1<f64>,
    schedule: Schedule,
    sampler: SpikeSampler,
}

impl Simulation {
    pub fn new(connectivity: Connectivity, config: SimConfig) -> Result<Self> {
        if !(config.dt > 0.0 && config.dt.is_finite()) {
            return Err(SimError::InvalidParameter(format!(
                "dt must be positive, got {}",
                config.dt
            )));
        }
        if !(config.tstop > 0.0 && config.tstop.is_finite()) {
            return Err(SimError::InvalidParameter(format!(
                "tstop must be positive, got {}",
                config.tstop
            )));
        }

        let nt = step_count(config.tstop, config.dt);
        if nt == 0 {
            return Err(SimError::InvalidParameter(format!(
                "tstop {} is shorter than one step of {}",
                config.tstop, config.dt
            )));
        }

        let n = connectivity.validate()?;
        if nt
            .checked_mul(n)
            .is_none_or(|cells| cells > isize::MAX as usize / size_of::<f64>())
        {
            return Err(SimError::InvalidParameter(format!(
                "trajectory of {nt} steps by {n} neurons does not fit in memory"
            )));
        }
        config.policy.validate(&connectivity)?;
        let baseline = config.drive.broadcast("drive", n)?;
        config.initial.validate(n)?;
        let schedule = Schedule::resolve(&config.perturbation, n, nt, config.dt)?;
        let sampler = SpikeSampler::new(config.policy.spike_law(), config.dt);

        debug!(
            neurons = n,
            steps = nt,
            policy = ?config.policy,
            law = ?sampler.law,
            "simulation validated"
        );

        Ok(Self {
            connectivity,
            config,
            n,
            nt,
            baseline,
            schedule,
            sampler,
        })
    }

    /// Population size N.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Trajectory length Nt, including the initial row.
    pub fn steps(&self) -> usize {
        self.nt
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn baseline(&self) -> ArrayView1<f64> {
        self.baseline.view()
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Allocates the trajectory, draws the initial condition and returns a
    /// run positioned before step 1.
    pub fn start<'a, I, R>(&'a self, intensity: &'a I, rng: &'a mut R) -> Run<'a, I, R>
    where
        I: Intensity + ?Sized,
        R: Rng + ?Sized,
    {
        let mut potentials = Array2::zeros((self.nt, self.n));
        potentials
            .row_mut(0)
            .assign(&self.config.initial.realize(self.n, &mut *rng));

        Run {
            sim: self,
            intensity,
            rng,
            potentials,
            spikes: Array1::zeros(self.n),
            rates: Array1::zeros(self.n),
            drive: self.baseline.clone(),
            log: SpikeLog::new(),
            t: 1,
            clipped: 0,
        }
    }

    /// Runs every step and returns the trajectory and spike log.
    pub fn run<I, R>(&self, intensity: &I, rng: &mut R) -> SimOutput
    where
        I: Intensity + ?Sized,
        R: Rng + ?Sized,
    {
        self.start(intensity, rng).finish()
    }
}

/// An in-progress run. Steps advance strictly in order.
pub struct Run<'a, I: ?Sized, R: ?Sized> {
    sim: &'a Simulation,
    intensity: &'a I,
    rng: &'a mut R,
    potentials: Array2<f64>,
    spikes: Array1<f64>,
    rates: Array1<f64>,
    drive: Array1<f64>,
    log: SpikeLog,
    t: usize,
    clipped: usize,
}

impl<I, R> Run<'_, I, R>
where
    I: Intensity + ?Sized,
    R: Rng + ?Sized,
{
    /// Index of the next step to compute.
    pub fn step(&self) -> usize {
        self.t
    }

    pub fn is_done(&self) -> bool {
        self.t >= self.sim.nt
    }

    /// Computes one step and returns the spikes it emitted, or `None` once
    /// the trajectory is full.
    pub fn tick(&mut self) -> Option<&[SpikeEvent]> {
        if self.is_done() {
            return None;
        }

        let sim = self.sim;
        let config = &sim.config;
        let t = self.t;

        sim.schedule.drive_into(t, &sim.baseline, &mut self.drive);

        let (prev, next) = self
            .potentials
            .multi_slice_mut((s![t - 1, ..], s![t, ..]));
        config.policy.advance(
            prev.view(),
            self.spikes.view(),
            self.drive.view(),
            &sim.connectivity,
            config.dt,
            config.v_r,
            next,
        );

        self.rates = self
            .intensity
            .rates(self.potentials.row(t), &config.intensity);
        debug_assert_eq!(self.rates.len(), sim.n, "intensity changed the vector length");
        self.clipped += sim
            .sampler
            .sample(&mut self.rates, &mut *self.rng, &mut self.spikes);

        let first = self.log.len();
        let time = config.time_base.stamp(t, config.dt);
        for (i, &n) in self.spikes.iter().enumerate() {
            if n > 0.0 {
                self.log.push(time, i);
            }
        }
        trace!(step = t, spikes = self.log.len() - first, "step");

        self.t += 1;
        Some(&self.log.events()[first..])
    }

    /// Rows `0..step()` are final; later rows are still zero.
    pub fn potentials(&self) -> ArrayView2<f64> {
        self.potentials.view()
    }

    /// Spike vector drawn at the last computed step.
    pub fn spikes(&self) -> ArrayView1<f64> {
        self.spikes.view()
    }

    /// Rates used for the last draw, after clipping.
    pub fn rates(&self) -> ArrayView1<f64> {
        self.rates.view()
    }

    /// Effective drive used at the last computed step.
    pub fn drive(&self) -> ArrayView1<f64> {
        self.drive.view()
    }

    pub fn events(&self) -> &[SpikeEvent] {
        self.log.events()
    }

    /// Runs the remaining steps and hands back the results.
    pub fn finish(mut self) -> SimOutput {
        while self.tick().is_some() {}

        let sim = self.sim;
        let config = &sim.config;
        debug!(
            steps = sim.nt,
            spikes = self.log.len(),
            clipped = self.clipped,
            "simulation finished"
        );

        SimOutput {
            potentials: self.potentials,
            spikes: self.log.into_events(),
            dt: config.dt,
            tstop: config.tstop,
            time_base: config.time_base,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimOutput {
    /// Nt×N membrane potentials; row 0 is the initial condition.
    pub potentials: Array2<f64>,
    /// Time-ordered spike log.
    pub spikes: Vec<SpikeEvent>,
    pub dt: f64,
    pub tstop: f64,
    pub time_base: TimeBase,
}

impl SimOutput {
    pub fn spike_count(&self, neuron: usize) -> usize {
        spikes::spike_times(&self.spikes, neuron).count()
    }

    /// Dense `1/dt` spike train for one neuron, see [`spikes::spike_train`].
    pub fn spike_train(&self, neuron: usize) -> Array1<f64> {
        match self.time_base {
            TimeBase::Seconds => spikes::spike_train(&self.spikes, neuron, self.dt, self.tstop),
            TimeBase::Steps => {
                let seconds: Vec<SpikeEvent> = self
                    .spikes
                    .iter()
                    .map(|event| SpikeEvent {
                        time: event.time * self.dt,
                        ..*event
                    })
                    .collect();
                spikes::spike_train(&seconds, neuron, self.dt, self.tstop)
            }
        }
    }
}
