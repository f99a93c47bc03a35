pub mod intensity;
pub mod network;
pub mod neuron;
pub mod presets;
pub mod sampler;
pub mod simulation;
pub mod spikes;
pub mod stimuli;

/// Number of whole `dt` steps in `duration`, i.e. `floor(duration / dt)`.
///
/// Quotients a few ulps under an integer (`0.3 / 0.1`) count as that
/// integer. Negative durations give 0.
pub fn step_count(duration: f64, dt: f64) -> usize {
    let steps = duration / dt;
    let nearest = steps.round();
    if (steps - nearest).abs() <= 1e-9 * nearest.abs().max(1.0) {
        nearest.max(0.0) as usize
    } else {
        steps.floor().max(0.0) as usize
    }
}
