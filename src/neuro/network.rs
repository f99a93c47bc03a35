use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Synaptic weights `J`, fixed for the whole run.
#[derive(Clone, Debug, PartialEq)]
pub enum Connectivity {
    /// Square N×N matrix; row `i` holds the weights onto neuron `i`.
    Dense(Array2<f64>),
    /// Every pair shares one weight. A scalar `J` for a single neuron is
    /// `Uniform { weight, size: 1 }`.
    Uniform { weight: f64, size: usize },
}

impl Connectivity {
    pub fn scalar(weight: f64) -> Self {
        Connectivity::Uniform { weight, size: 1 }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for row in rows {
            if row.len() != n {
                return Err(SimError::shape("connectivity row", n.to_string(), row.len()));
            }
            data.extend(row);
        }

        Array2::from_shape_vec((n, n), data)
            .map(Connectivity::Dense)
            .map_err(|err| SimError::InvalidParameter(err.to_string()))
    }

    /// Population size N.
    pub fn size(&self) -> usize {
        match self {
            Connectivity::Dense(j) => j.nrows(),
            Connectivity::Uniform { size, .. } => *size,
        }
    }

    pub(crate) fn validate(&self) -> Result<usize> {
        if let Connectivity::Dense(j) = self {
            if j.nrows() != j.ncols() {
                return Err(SimError::shape(
                    "connectivity columns",
                    j.nrows().to_string(),
                    j.ncols(),
                ));
            }
        }

        let n = self.size();
        if n == 0 {
            return Err(SimError::InvalidParameter(
                "connectivity describes an empty population".into(),
            ));
        }
        Ok(n)
    }

    /// Recurrent input `J·n`.
    pub fn input(&self, spikes: ArrayView1<f64>) -> Array1<f64> {
        match self {
            Connectivity::Dense(j) => j.dot(&spikes),
            Connectivity::Uniform { weight, size } => Array1::from_elem(*size, weight * spikes.sum()),
        }
    }
}

impl From<Array2<f64>> for Connectivity {
    fn from(j: Array2<f64>) -> Self {
        Connectivity::Dense(j)
    }
}

/// External drive given either as one value for every neuron or per neuron.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Drive {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Default for Drive {
    fn default() -> Self {
        Drive::Scalar(0.0)
    }
}

impl From<f64> for Drive {
    fn from(value: f64) -> Self {
        Drive::Scalar(value)
    }
}

impl From<Vec<f64>> for Drive {
    fn from(values: Vec<f64>) -> Self {
        Drive::Vector(values)
    }
}

impl Drive {
    /// Normalizes to a length-`n` vector. A length-1 vector broadcasts like a
    /// scalar; any other length than `n` is a shape mismatch.
    pub fn broadcast(&self, what: &'static str, n: usize) -> Result<Array1<f64>> {
        match self {
            Drive::Scalar(value) => Ok(Array1::from_elem(n, *value)),
            Drive::Vector(values) if values.len() == 1 => Ok(Array1::from_elem(n, values[0])),
            Drive::Vector(values) if values.len() == n => Ok(Array1::from_vec(values.clone())),
            Drive::Vector(values) => Err(SimError::shape(what, format!("1 or {n}"), values.len())),
        }
    }
}
