use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Shape parameters handed to the intensity function. The simulator never
/// interprets them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntensityParams {
    pub b: f64,
    pub v_th: f64,
    pub p: f64,
}

impl Default for IntensityParams {
    fn default() -> Self {
        Self {
            b: 1.0,
            v_th: 1.0,
            p: 1.0,
        }
    }
}

/// Conditional intensity: membrane potential to firing rate (spikes per
/// unit time). Must be pure and nonnegative.
///
/// Implemented for any `Fn(f64, IntensityParams) -> f64`, so a closure can
/// be injected directly.
pub trait Intensity {
    fn rate(&self, v: f64, params: IntensityParams) -> f64;

    fn rates(&self, v: ArrayView1<f64>, params: &IntensityParams) -> Array1<f64> {
        v.mapv(|x| self.rate(x, *params))
    }
}

impl<F> Intensity for F
where
    F: Fn(f64, IntensityParams) -> f64,
{
    fn rate(&self, v: f64, params: IntensityParams) -> f64 {
        self(v, params)
    }
}

/// `λ = B · [v − v_th]₊^p`
#[derive(Clone, Copy, Debug, Default)]
pub struct RectifiedPower;

impl Intensity for RectifiedPower {
    fn rate(&self, v: f64, params: IntensityParams) -> f64 {
        let above = (v - params.v_th).max(0.0);
        if above == 0.0 {
            return 0.0;
        }
        params.b * above.powf(params.p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn rectified_power_is_zero_below_threshold() {
        let params = IntensityParams::default();
        let rates = RectifiedPower.rates(array![-1.0, 0.5, 1.0].view(), &params);
        assert_eq!(rates, array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn rectified_power_shape() {
        let params = IntensityParams {
            b: 2.0,
            v_th: 1.0,
            p: 2.0,
        };
        assert_relative_eq!(RectifiedPower.rate(4.0, params), 18.0);
        assert_relative_eq!(RectifiedPower.rate(1.5, params), 0.5);
    }

    #[test]
    fn closures_are_intensities() {
        let double = |v: f64, params: IntensityParams| params.b * 2.0 * v;
        let params = IntensityParams {
            b: 3.0,
            ..Default::default()
        };
        let rates = double.rates(array![1.0, 2.0].view(), &params);
        assert_eq!(rates, array![6.0, 12.0]);
    }
}
