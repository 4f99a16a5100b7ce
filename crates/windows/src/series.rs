//! Validated visibility time series.

use crate::ExtractionError;

/// Borrowed `(t, v[, dv/dt])` history that has passed shape validation: equal lengths,
/// finite samples, strictly increasing times.
#[derive(Debug, Clone, Copy)]
pub struct VisibilitySeries<'a> {
    times: &'a [f64],
    values: &'a [f64],
    derivatives: Option<&'a [f64]>,
    unreliable: Option<&'a [bool]>,
}

impl<'a> VisibilitySeries<'a> {
    pub fn new(times: &'a [f64], values: &'a [f64]) -> Result<Self, ExtractionError> {
        validate(times, values, None)?;
        Ok(Self {
            times,
            values,
            derivatives: None,
            unreliable: None,
        })
    }

    pub fn with_derivatives(
        times: &'a [f64],
        values: &'a [f64],
        derivatives: &'a [f64],
    ) -> Result<Self, ExtractionError> {
        validate(times, values, Some(derivatives))?;
        Ok(Self {
            times,
            values,
            derivatives: Some(derivatives),
            unreliable: None,
        })
    }

    /// Mark samples whose derivative must not shape the interpolant. In derivative-aware
    /// extraction their slope is re-estimated from the neighbouring values.
    pub fn with_unreliable_derivatives(
        mut self,
        mask: &'a [bool],
    ) -> Result<Self, ExtractionError> {
        if mask.len() != self.times.len() {
            return Err(ExtractionError::MaskLengthMismatch {
                times: self.times.len(),
                mask: mask.len(),
            });
        }
        self.unreliable = Some(mask);
        Ok(self)
    }

    pub fn times(&self) -> &'a [f64] {
        self.times
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn derivatives(&self) -> Option<&'a [f64]> {
        self.derivatives
    }

    pub fn unreliable_derivatives(&self) -> Option<&'a [bool]> {
        self.unreliable
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

fn validate(
    times: &[f64],
    values: &[f64],
    derivatives: Option<&[f64]>,
) -> Result<(), ExtractionError> {
    if times.len() != values.len() {
        return Err(ExtractionError::LengthMismatch {
            times: times.len(),
            values: values.len(),
        });
    }
    if let Some(derivatives) = derivatives {
        if derivatives.len() != times.len() {
            return Err(ExtractionError::DerivativeLengthMismatch {
                times: times.len(),
                derivatives: derivatives.len(),
            });
        }
        if let Some(index) = derivatives.iter().position(|d| !d.is_finite()) {
            return Err(ExtractionError::NonFiniteSample { index });
        }
    }
    if let Some(index) = times
        .iter()
        .zip(values)
        .position(|(t, v)| !t.is_finite() || !v.is_finite())
    {
        return Err(ExtractionError::NonFiniteSample { index });
    }
    if let Some(index) = times.windows(2).position(|w| w[1] <= w[0]) {
        return Err(ExtractionError::NonIncreasingTime {
            index: index + 1,
            previous: times[index],
            current: times[index + 1],
        });
    }
    Ok(())
}
