//! Curve evaluation strategies and their reactions to point edits.
//!
//! An interpolator is stateless: every call receives the network and the
//! spline or point it acts on. [`InterpolationMode::interpolator`] selects the
//! strategy for a spline.
//!
//! [`InterpolationMode::interpolator`]: crate::network::InterpolationMode::interpolator

mod bezier;
mod catmull_rom;

pub use bezier::BezierInterpolator;
pub use catmull_rom::CatmullRomInterpolator;

use crate::error::Result;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::network::{PointId, SplineData, SplineId, SplineNetwork};

/// Evaluation and edit-reaction behavior of one interpolation scheme.
pub trait Interpolator: Sync {
    /// Position at local parameter `t` of `curve`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline or one of its points is missing.
    fn position(&self, net: &SplineNetwork, spline: SplineId, t: f64, curve: usize) -> Result<Point3>;

    /// Derivative of the position with respect to the local parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline or one of its points is missing.
    fn velocity(&self, net: &SplineNetwork, spline: SplineId, t: f64, curve: usize) -> Result<Vector3>;

    /// Unit velocity, or zero where the curve stalls.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline or one of its points is missing.
    fn direction(&self, net: &SplineNetwork, spline: SplineId, t: f64, curve: usize) -> Result<Vector3> {
        let velocity = self.velocity(net, spline, t, curve)?;
        Ok(velocity
            .try_normalize(TOLERANCE)
            .unwrap_or_else(Vector3::zeros))
    }

    /// Splits a global parameter into `(curve index, local t)`.
    ///
    /// `t >= 1` maps to the end of the last curve; smaller values are
    /// clamped to `[0, 1]` first.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn to_curve_index(&self, curve_count: usize, t: f64) -> (usize, f64) {
        let last = curve_count.saturating_sub(1);
        if t >= 1.0 {
            return (last, 1.0);
        }
        let scaled = t.clamp(0.0, 1.0) * curve_count as f64;
        let curve = (scaled.floor() as usize).min(last);
        (curve, scaled - curve as f64)
    }

    /// Number of tangent handles the point exposes under this scheme.
    fn ctrl_points_count(&self, spline: &SplineData, index: usize) -> usize;

    /// The point (and any junction it belongs to) has moved.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing.
    fn on_point_position_changed(&self, net: &mut SplineNetwork, point: PointId) -> Result<()>;

    /// The point's continuity mode has changed.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing.
    fn on_point_mode_changed(&self, net: &mut SplineNetwork, point: PointId) -> Result<()>;

    /// Handle `ctrl` of the point has been written. `dragging` marks a handle
    /// under direct external edit.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing.
    fn on_ctrl_point_position_changed(
        &self,
        net: &mut SplineNetwork,
        point: PointId,
        ctrl: usize,
        dragging: bool,
    ) -> Result<()>;

    /// The point has just been attached to a junction.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing.
    fn on_point_junction_changed(&self, net: &mut SplineNetwork, point: PointId) -> Result<()>;

    /// The point has just been inserted into its spline.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced entity is missing.
    fn on_point_inserted(&self, net: &mut SplineNetwork, point: PointId) -> Result<()>;
}
