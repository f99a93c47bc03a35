use std::ops::Range;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::neuro::network::Drive;
use crate::neuro::step_count;

/// How the external drive departs from its baseline over the run.
///
/// `targets` defaults to every neuron.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Perturbation {
    #[default]
    None,

    /// `stim_drive` replaces the baseline for every step `t < tstim / dt`.
    Windowed { tstim: f64, stim_drive: Drive },

    /// `+amplitude` over one window and `−amplitude` over a second. Without
    /// `start` the windows open at a quarter and three quarters of the run;
    /// with `start` only the positive window is applied.
    TwoPhase {
        #[serde(default)]
        start: Option<f64>,
        #[serde(default = "default_perturb_len")]
        len: f64,
        #[serde(default = "default_perturb_amp")]
        amplitude: f64,
        #[serde(default)]
        targets: Option<Vec<usize>>,
    },

    /// The run is cut into `amplitudes.len() + 1` equal windows; window `w ≥ 1`
    /// offsets the targets by `amplitudes[w - 1]`.
    StepSequence {
        amplitudes: Vec<f64>,
        #[serde(default)]
        targets: Option<Vec<usize>>,
    },

    /// Per-step offset, one entry per simulation step.
    TimeSeries {
        offsets: Vec<f64>,
        #[serde(default)]
        targets: Option<Vec<usize>>,
    },
}

fn default_perturb_len() -> f64 {
    10.0
}

fn default_perturb_amp() -> f64 {
    1.5
}

/// A [`Perturbation`] resolved against the population size and the clock.
#[derive(Clone, Debug, PartialEq)]
pub enum Schedule {
    Constant,
    Windowed {
        until: usize,
        drive: Array1<f64>,
    },
    TwoPhase {
        positive: Range<usize>,
        negative: Range<usize>,
        amplitude: f64,
        targets: Vec<usize>,
    },
    StepSequence {
        window: usize,
        amplitudes: Vec<f64>,
        targets: Vec<usize>,
    },
    TimeSeries {
        offsets: Vec<f64>,
        targets: Vec<usize>,
    },
}

impl Schedule {
    /// Converts durations to step counts and validates lengths and indices.
    pub fn resolve(perturbation: &Perturbation, n: usize, nt: usize, dt: f64) -> Result<Self> {
        let schedule = match perturbation {
            Perturbation::None => Schedule::Constant,
            Perturbation::Windowed { tstim, stim_drive } => Schedule::Windowed {
                until: step_count(*tstim, dt),
                drive: stim_drive.broadcast("stimulus drive", n)?,
            },
            Perturbation::TwoPhase {
                start,
                len,
                amplitude,
                targets,
            } => {
                let len = step_count(*len, dt);
                let (positive, negative) = match start {
                    Some(start) => {
                        let start = step_count(*start, dt);
                        (start..start.saturating_add(len), nt + 1..nt + 1)
                    }
                    None => {
                        let first = nt / 4;
                        let second = 3 * nt / 4;
                        (
                            first..first.saturating_add(len),
                            second..second.saturating_add(len),
                        )
                    }
                };
                Schedule::TwoPhase {
                    positive,
                    negative,
                    amplitude: *amplitude,
                    targets: resolve_targets(targets.as_deref(), n)?,
                }
            }
            Perturbation::StepSequence {
                amplitudes,
                targets,
            } => {
                if amplitudes.is_empty() {
                    return Err(SimError::InvalidParameter(
                        "step sequence needs at least one amplitude".into(),
                    ));
                }
                let window = nt / (amplitudes.len() + 1);
                if window == 0 {
                    return Err(SimError::InvalidParameter(format!(
                        "{nt} steps cannot hold {} perturbation windows",
                        amplitudes.len() + 1
                    )));
                }
                Schedule::StepSequence {
                    window,
                    amplitudes: amplitudes.clone(),
                    targets: resolve_targets(targets.as_deref(), n)?,
                }
            }
            Perturbation::TimeSeries { offsets, targets } => {
                if offsets.len() != nt {
                    return Err(SimError::shape(
                        "perturbation time series",
                        nt.to_string(),
                        offsets.len(),
                    ));
                }
                Schedule::TimeSeries {
                    offsets: offsets.clone(),
                    targets: resolve_targets(targets.as_deref(), n)?,
                }
            }
        };
        Ok(schedule)
    }

    /// Writes the effective drive for step `t` into `out`.
    pub fn drive_into(&self, t: usize, baseline: &Array1<f64>, out: &mut Array1<f64>) {
        out.assign(baseline);

        let (targets, offset) = match self {
            Schedule::Constant => return,
            Schedule::Windowed { until, drive } => {
                if t < *until {
                    out.assign(drive);
                }
                return;
            }
            Schedule::TwoPhase {
                positive,
                negative,
                amplitude,
                targets,
            } => {
                if positive.contains(&t) {
                    (targets, *amplitude)
                } else if negative.contains(&t) {
                    (targets, -*amplitude)
                } else {
                    return;
                }
            }
            Schedule::StepSequence {
                window,
                amplitudes,
                targets,
            } => {
                let w = t / window;
                if w == 0 {
                    return;
                }
                // trailing remainder steps keep the last level
                (targets, amplitudes[(w - 1).min(amplitudes.len() - 1)])
            }
            Schedule::TimeSeries { offsets, targets } => match offsets.get(t) {
                Some(offset) => (targets, *offset),
                None => return,
            },
        };

        for &i in targets {
            out[i] = baseline[i] + offset;
        }
    }

    /// Effective drive for step `t`; the baseline is left untouched.
    pub fn drive_at(&self, t: usize, baseline: &Array1<f64>) -> Array1<f64> {
        let mut out = Array1::zeros(baseline.len());
        self.drive_into(t, baseline, &mut out);
        out
    }
}

fn resolve_targets(targets: Option<&[usize]>, n: usize) -> Result<Vec<usize>> {
    let Some(targets) = targets else {
        return Ok((0..n).collect());
    };

    if let Some(&index) = targets.iter().find(|&&i| i >= n) {
        return Err(SimError::IndexOutOfRange {
            what: "perturbation target",
            index,
            len: n,
        });
    }
    Ok(targets.to_vec())
}
