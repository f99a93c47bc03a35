use thiserror::Error;

/// Errors raised while validating a simulation at initialization.
///
/// Nothing past `Simulation::new` can fail: a run that validates always
/// completes every step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: String,
        actual: usize,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{what} index {index} out of range for {len} neurons")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

impl SimError {
    pub(crate) fn shape(what: &'static str, expected: impl Into<String>, actual: usize) -> Self {
        SimError::ShapeMismatch {
            what,
            expected: expected.into(),
            actual,
        }
    }
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_names_both_lengths() {
        let err = SimError::shape("drive", "1 or 3", 2);
        assert_eq!(
            err.to_string(),
            "shape mismatch for drive: expected 1 or 3, got 2"
        );
    }

    #[test]
    fn index_message() {
        let err = SimError::IndexOutOfRange {
            what: "perturbation target",
            index: 7,
            len: 4,
        };
        assert_eq!(
            err.to_string(),
            "perturbation target index 7 out of range for 4 neurons"
        );
    }
}
