use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::neuro::step_count;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpikeEvent {
    /// Seconds (`t·dt`) or the raw step index, depending on the run's
    /// [`TimeBase`].
    pub time: f64,
    pub neuron: usize,
}

/// Unit of [`SpikeEvent::time`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    #[default]
    Seconds,
    Steps,
}

impl TimeBase {
    pub fn stamp(&self, step: usize, dt: f64) -> f64 {
        match self {
            TimeBase::Seconds => step as f64 * dt,
            TimeBase::Steps => step as f64,
        }
    }
}

/// Append-only spike record, in step order.
#[derive(Clone, Debug, Default)]
pub struct SpikeLog {
    events: Vec<SpikeEvent>,
}

impl SpikeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: f64, neuron: usize) {
        debug_assert!(self.events.last().is_none_or(|last| last.time <= time));
        self.events.push(SpikeEvent { time, neuron });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[SpikeEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<SpikeEvent> {
        self.events
    }
}

/// Spike times of one neuron, in order.
pub fn spike_times(events: &[SpikeEvent], neuron: usize) -> impl Iterator<Item = f64> + '_ {
    events
        .iter()
        .filter(move |event| event.neuron == neuron)
        .map(|event| event.time)
}

/// Dense spike train for `neuron` with `floor(tstop/dt) + 1` bins. A bin
/// holding a spike reads `1/dt`, everything else 0.
///
/// `dt` and `tstop` should match the run that produced `events`. Spikes
/// past the last bin are dropped.
pub fn spike_train(events: &[SpikeEvent], neuron: usize, dt: f64, tstop: f64) -> Array1<f64> {
    let bins = step_count(tstop, dt) + 1;
    let mut train = Array1::zeros(bins);

    for time in spike_times(events, neuron) {
        let bin = (time / dt).round();
        if bin >= 0.0 && (bin as usize) < bins {
            train[bin as usize] = 1.0 / dt;
        }
    }
    train
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn log(entries: &[(f64, usize)]) -> Vec<SpikeEvent> {
        let mut log = SpikeLog::new();
        for &(time, neuron) in entries {
            log.push(time, neuron);
        }
        log.into_events()
    }

    #[test]
    fn train_marks_only_selected_neuron() {
        let events = log(&[(0.1, 0), (0.2, 1), (0.7, 0), (0.9, 1)]);
        let train = spike_train(&events, 0, 0.1, 1.0);

        assert_eq!(train.len(), 11);
        assert_relative_eq!(train[1], 10.0);
        assert_relative_eq!(train[7], 10.0);
        assert_eq!(train.iter().filter(|&&x| x != 0.0).count(), 2);
    }

    #[test]
    fn train_integrates_to_spike_count() {
        let dt = 0.01;
        let times: Vec<(f64, usize)> = (1..100).step_by(3).map(|t| (t as f64 * dt, 2)).collect();
        let events = log(&times);
        let train = spike_train(&events, 2, dt, 1.0);

        assert_relative_eq!(train.sum() * dt, times.len() as f64, epsilon = 1e-9);
    }

    #[test]
    fn step_stamped_logs_rasterize_with_unit_dt() {
        let events = log(&[(3.0, 0), (5.0, 0)]);
        let train = spike_train(&events, 0, 1.0, 10.0);
        assert_eq!(train.len(), 11);
        assert_eq!(train[3], 1.0);
        assert_eq!(train[5], 1.0);
    }

    #[test]
    fn late_spikes_are_dropped() {
        let events = log(&[(0.5, 0), (2.0, 0)]);
        let train = spike_train(&events, 0, 0.5, 1.0);
        assert_eq!(train.to_vec(), vec![0.0, 2.0, 0.0]);
    }

    #[test]
    fn time_base_stamps() {
        assert_relative_eq!(TimeBase::Seconds.stamp(7, 0.1), 0.7);
        assert_eq!(TimeBase::Steps.stamp(7, 0.1), 7.0);
    }
}
