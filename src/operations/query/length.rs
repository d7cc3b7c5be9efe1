use crate::error::{ArgumentError, Result};
use crate::network::{SplineId, SplineNetwork};

/// Upper bound on the number of chords summed by one query.
const MAX_STEPS: f64 = 1_000_000.0;

/// Approximates the length of a spline (or one of its curves) by summing chords.
pub struct SplineLength {
    spline: SplineId,
    curve: Option<usize>,
    delta_t: f64,
    from: f64,
    to: f64,
}

impl SplineLength {
    /// Creates a new `SplineLength` query over the whole spline with a
    /// parameter step of `0.01`.
    #[must_use]
    pub fn new(spline: SplineId) -> Self {
        Self {
            spline,
            curve: None,
            delta_t: 0.01,
            from: 0.0,
            to: 1.0,
        }
    }

    /// Sets the parameter step between chord end points.
    #[must_use]
    pub fn with_delta_t(mut self, delta_t: f64) -> Self {
        self.delta_t = delta_t;
        self
    }

    /// Restricts the query to `[from, to]`; `from` is clamped to `[0, 1]`
    /// and `to` to `[from, 1]`.
    #[must_use]
    pub fn with_range(mut self, from: f64, to: f64) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Measures a single curve; the range is then in local parameters.
    #[must_use]
    pub fn on_curve(mut self, curve: usize) -> Self {
        self.curve = Some(curve);
        self
    }

    /// Executes the query, returning the approximate length.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing, the curve is out of range,
    /// or the step is not a positive number.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn execute(&self, net: &SplineNetwork) -> Result<f64> {
        if self.delta_t.is_nan() || self.delta_t <= 0.0 {
            return Err(ArgumentError::InvalidParameter {
                parameter: "delta_t",
                value: self.delta_t,
            }
            .into());
        }
        let from = self.from.clamp(0.0, 1.0);
        let to = self.to.min(1.0).max(from);
        let steps = ((to - from) / self.delta_t).clamp(1.0, MAX_STEPS).ceil() as usize;

        let sample = |t: f64| match self.curve {
            Some(curve) => net.position_on_curve(self.spline, t, curve),
            None => net.position(self.spline, t),
        };

        let mut length = 0.0;
        let mut prev = sample(from)?;
        for i in 1..=steps {
            let t = from + (i as f64 / steps as f64) * (to - from);
            let next = sample(t)?;
            length += (next - prev).norm();
            prev = next;
        }
        Ok(length)
    }
}
