use std::collections::VecDeque;

use tracing::trace;

use crate::error::{ArgumentError, Result};
use crate::interpolation::{BezierInterpolator, CatmullRomInterpolator, Interpolator};
use crate::math::rotation::with_roll;
use crate::math::{Isometry3, Point3, UnitQuaternion, Vector3};

use super::junction::JunctionId;
use super::point::{PointData, PointId, PointMode, Twist};
use super::SplineNetwork;

slotmap::new_key_type! {
    /// Unique identifier for a spline in the network.
    pub struct SplineId;
}

/// Curve evaluation scheme of a spline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InterpolationMode {
    /// Cubic Bezier through each point's tangent handles.
    #[default]
    Bezier = 0,
    /// Catmull-Rom through the points themselves.
    CatmullRom = 1,
}

impl InterpolationMode {
    /// The stateless strategy implementing this mode.
    #[must_use]
    pub fn interpolator(self) -> &'static dyn Interpolator {
        match self {
            Self::Bezier => &BezierInterpolator,
            Self::CatmullRom => &CatmullRomInterpolator,
        }
    }
}

/// An ordered sequence of points forming a piecewise curve.
#[derive(Debug, Clone)]
pub struct SplineData {
    pub(crate) points: Vec<PointId>,
    pub mode: InterpolationMode,
    /// The spline's own transform; local-space queries are relative to it.
    pub origin: Isometry3,
}

impl SplineData {
    #[must_use]
    pub fn new(mode: InterpolationMode, origin: Isometry3) -> Self {
        Self {
            points: Vec::new(),
            mode,
            origin,
        }
    }

    #[must_use]
    pub fn points_count(&self) -> usize {
        self.points.len()
    }

    /// Number of curves (segments between consecutive points).
    #[must_use]
    pub fn curve_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Point IDs in spline order.
    #[must_use]
    pub fn points(&self) -> &[PointId] {
        &self.points
    }

    /// Whether `index` is the first or last point.
    #[must_use]
    pub fn is_endpoint(&self, index: usize) -> bool {
        index == 0 || index + 1 == self.points.len()
    }
}

/// A pending change to a twist hold region.
#[derive(Debug, Clone, Copy)]
enum TwistEdit {
    T0(PointId, f64),
    T1(PointId, f64),
}

impl SplineNetwork {
    fn interpolator_for(&self, spline: SplineId) -> Result<&'static dyn Interpolator> {
        Ok(self.spline(spline)?.mode.interpolator())
    }

    /// Runs the position reaction of each point's own interpolator.
    pub(crate) fn react_to_moves(&mut self, points: &[PointId]) -> Result<()> {
        for point in points {
            let interpolator = self.interpolator_for(self.point(*point)?.spline)?;
            interpolator.on_point_position_changed(self, *point)?;
        }
        Ok(())
    }

    // --- Interpolation mode ---

    /// Switches the interpolation mode; handle geometry is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn set_interpolation_mode(&mut self, spline: SplineId, mode: InterpolationMode) -> Result<()> {
        self.spline_mut(spline)?.mode = mode;
        Ok(())
    }

    // --- Position ---

    /// World position of a point.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn point_position(&self, spline: SplineId, index: usize) -> Result<Point3> {
        Ok(self.point_at(spline, index)?.position)
    }

    /// Moves a point (its handles follow), propagating to its junction.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn set_point_position(&mut self, spline: SplineId, index: usize, position: Point3) -> Result<()> {
        let id = self.point_id(spline, index)?;
        self.move_point(id, position)
    }

    pub(crate) fn move_point(&mut self, id: PointId, position: Point3) -> Result<()> {
        let moved = match self.junction_of(id)? {
            Some(j) => self.move_junction(j, position)?,
            None => {
                self.point_mut(id)?.position = position;
                vec![id]
            }
        };
        // The edited point reacts first so its own spline is settled before the others.
        let mut ordered = vec![id];
        ordered.extend(moved.into_iter().filter(|p| *p != id));
        self.react_to_moves(&ordered)
    }

    /// Position of a point in the spline's origin frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn point_local_position(&self, spline: SplineId, index: usize) -> Result<Point3> {
        let origin = self.spline(spline)?.origin;
        Ok(origin.inverse_transform_point(&self.point_position(spline, index)?))
    }

    /// Moves a point to a position given in the spline's origin frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn set_point_local_position(&mut self, spline: SplineId, index: usize, position: Point3) -> Result<()> {
        let origin = self.spline(spline)?.origin;
        self.set_point_position(spline, index, origin.transform_point(&position))
    }

    // --- Rotation ---

    /// World rotation of a point.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn point_rotation(&self, spline: SplineId, index: usize) -> Result<UnitQuaternion> {
        Ok(self.point_at(spline, index)?.rotation)
    }

    /// Rotates a point (its handles swing with it), reconciles the roll with
    /// the twist angle and propagates to the junction.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn set_point_rotation(&mut self, spline: SplineId, index: usize, rotation: UnitQuaternion) -> Result<()> {
        let id = self.point_id(spline, index)?;
        self.rotate_point(id, rotation)
    }

    pub(crate) fn rotate_point(&mut self, id: PointId, rotation: UnitQuaternion) -> Result<()> {
        self.apply_rotation(id, rotation)?;
        if let Some(j) = self.junction_of(id)? {
            self.set_junction_rotation(j, rotation)?;
        }
        Ok(())
    }

    /// Like [`Self::rotate_point`], but the point's own handles keep their world positions.
    pub(crate) fn rotate_point_keeping_handles(&mut self, id: PointId, rotation: UnitQuaternion) -> Result<()> {
        let handles = {
            let p = self.point(id)?;
            [p.ctrl_point_position(0), p.ctrl_point_position(1)]
        };
        self.rotate_point(id, rotation)?;
        let point = self.point_mut(id)?;
        for (ctrl, handle) in handles.iter().enumerate() {
            point.place_ctrl_point(ctrl, handle);
        }
        Ok(())
    }

    // --- Mode ---

    /// Handle continuity mode of a point.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn point_mode(&self, spline: SplineId, index: usize) -> Result<PointMode> {
        Ok(self.point_at(spline, index)?.data.mode)
    }

    /// Sets the continuity mode of a point.
    ///
    /// On the canonical point of a junction the mode is broadcast to every
    /// connection; on any other junction point it is only stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn set_point_mode(&mut self, spline: SplineId, index: usize, mode: PointMode) -> Result<()> {
        let id = self.point_id(spline, index)?;
        self.point_mut(id)?.data.mode = mode;
        if let Some(j) = self.junction_of(id)? {
            let connections = self.junction(j)?.connections.clone();
            if connections.first() != Some(&id) {
                return Ok(());
            }
            for other in connections.into_iter().skip(1) {
                self.point_mut(other)?.data.mode = mode;
            }
        }
        self.interpolator_for(spline)?.on_point_mode_changed(self, id)
    }

    /// Sets the continuity mode of every point of a spline.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn set_spline_mode(&mut self, spline: SplineId, mode: PointMode) -> Result<()> {
        for index in 0..self.spline(spline)?.points_count() {
            self.set_point_mode(spline, index, mode)?;
        }
        Ok(())
    }

    // --- Twist ---

    /// Twist of a point.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn point_twist(&self, spline: SplineId, index: usize) -> Result<Twist> {
        Ok(self.point_at(spline, index)?.data.twist)
    }

    /// Sets the twist angle (degrees) and rolls the point to match, on every
    /// point of its junction.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn set_point_twist_angle(&mut self, spline: SplineId, index: usize, angle: f64) -> Result<()> {
        let id = self.point_id(spline, index)?;
        for member in self.junction_group(id)? {
            let point = self.point_mut(member)?;
            point.data.twist.angle = angle;
            point.rotation = with_roll(&point.rotation, angle);
        }
        Ok(())
    }

    /// Sets the hold region before the point, shrinking the previous point's
    /// `t1` so the two never overlap.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn set_point_twist_t0(&mut self, spline: SplineId, index: usize, t0: f64) -> Result<()> {
        let id = self.point_id(spline, index)?;
        self.propagate_twist(TwistEdit::T0(id, t0.clamp(0.0, 1.0)))
    }

    /// Sets the hold region after the point, shrinking the next point's
    /// `t0` so the two never overlap.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn set_point_twist_t1(&mut self, spline: SplineId, index: usize, t1: f64) -> Result<()> {
        let id = self.point_id(spline, index)?;
        self.propagate_twist(TwistEdit::T1(id, t1.clamp(0.0, 1.0)))
    }

    /// Next or previous point of `id` on its own spline.
    fn neighbor(&self, id: PointId, forward: bool) -> Result<Option<PointId>> {
        let point = self.point(id)?;
        let spline = self.spline(point.spline)?;
        let index = if forward {
            point.index.checked_add(1)
        } else {
            point.index.checked_sub(1)
        };
        Ok(index.and_then(|i| spline.points.get(i).copied()))
    }

    #[allow(clippy::float_cmp)]
    fn propagate_twist(&mut self, first: TwistEdit) -> Result<()> {
        let mut queue = VecDeque::from([first]);
        while let Some(edit) = queue.pop_front() {
            match edit {
                TwistEdit::T0(id, t0) => {
                    let twist = &mut self.point_mut(id)?.data.twist;
                    if twist.t0 == t0 {
                        continue;
                    }
                    twist.t0 = t0;
                    if let Some(prev) = self.neighbor(id, false)? {
                        if 1.0 - t0 < self.point(prev)?.data.twist.t1 {
                            queue.push_back(TwistEdit::T1(prev, 1.0 - t0));
                        }
                    }
                    for member in self.junction_group(id)?.into_iter().skip(1) {
                        queue.push_back(TwistEdit::T0(member, t0));
                    }
                }
                TwistEdit::T1(id, t1) => {
                    let twist = &mut self.point_mut(id)?.data.twist;
                    if twist.t1 == t1 {
                        continue;
                    }
                    twist.t1 = t1;
                    if let Some(next) = self.neighbor(id, true)? {
                        if 1.0 - t1 < self.point(next)?.data.twist.t0 {
                            queue.push_back(TwistEdit::T0(next, 1.0 - t1));
                        }
                    }
                    for member in self.junction_group(id)?.into_iter().skip(1) {
                        queue.push_back(TwistEdit::T1(member, t1));
                    }
                }
            }
        }
        Ok(())
    }

    // --- Point data ---

    /// Detached copy of the point's mode and twist.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn point_data(&self, spline: SplineId, index: usize) -> Result<PointData> {
        Ok(self.point_at(spline, index)?.data.detached())
    }

    /// Applies mode and twist from `data` through the regular setters.
    /// The junction reference in `data` is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn set_point_data(&mut self, spline: SplineId, index: usize, data: &PointData) -> Result<()> {
        self.set_point_mode(spline, index, data.mode)?;
        self.set_point_twist_angle(spline, index, data.twist.angle)?;
        self.set_point_twist_t0(spline, index, data.twist.t0)?;
        self.set_point_twist_t1(spline, index, data.twist.t1)
    }

    /// Junction the point belongs to, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn point_junction(&self, spline: SplineId, index: usize) -> Result<Option<JunctionId>> {
        self.junction_of(self.point_id(spline, index)?)
    }

    // --- Control points ---

    /// World position of a tangent handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or an index is out of range.
    pub fn ctrl_point_position(&self, spline: SplineId, index: usize, ctrl: usize) -> Result<Point3> {
        check_ctrl(ctrl)?;
        Ok(self.point_at(spline, index)?.ctrl_point_position(ctrl))
    }

    /// Moves a tangent handle and lets the interpolator re-derive the point
    /// rotation, enforce the point mode and sync the junction.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or an index is out of range.
    pub fn set_ctrl_point_position(&mut self, spline: SplineId, index: usize, ctrl: usize, position: Point3) -> Result<()> {
        self.place_ctrl_point(spline, index, ctrl, position, false)
    }

    /// Moves a tangent handle that is under direct external edit.
    ///
    /// Same as [`Self::set_ctrl_point_position`] except that the point
    /// rotation is not re-derived, so the handle being dragged is not
    /// fought by its own rotation update.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or an index is out of range.
    pub fn drag_ctrl_point_position(&mut self, spline: SplineId, index: usize, ctrl: usize, position: Point3) -> Result<()> {
        self.place_ctrl_point(spline, index, ctrl, position, true)
    }

    fn place_ctrl_point(&mut self, spline: SplineId, index: usize, ctrl: usize, position: Point3, dragging: bool) -> Result<()> {
        check_ctrl(ctrl)?;
        let id = self.point_id(spline, index)?;
        self.point_mut(id)?.place_ctrl_point(ctrl, &position);
        self.interpolator_for(spline)?
            .on_ctrl_point_position_changed(self, id, ctrl, dragging)
    }

    /// Number of meaningful tangent handles of a point under the active interpolator.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn ctrl_points_count(&self, spline: SplineId, index: usize) -> Result<usize> {
        self.point_id(spline, index)?;
        Ok(self.interpolator_for(spline)?.ctrl_points_count(self.spline(spline)?, index))
    }

    /// Whether the point exposes any tangent handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn has_control_points(&self, spline: SplineId, index: usize) -> Result<bool> {
        Ok(self.ctrl_points_count(spline, index)? > 0)
    }

    // --- Evaluation ---

    /// Maps a global parameter to `(curve index, local t)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn curve_index(&self, spline: SplineId, t: f64) -> Result<(usize, f64)> {
        let data = self.spline(spline)?;
        Ok(data.mode.interpolator().to_curve_index(data.curve_count(), t))
    }

    /// Global parameter at which the curve passes through point `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    #[allow(clippy::cast_precision_loss)]
    pub fn t_at(&self, spline: SplineId, index: usize) -> Result<f64> {
        self.point_id(spline, index)?;
        let curves = self.spline(spline)?.curve_count();
        Ok(index as f64 / curves as f64)
    }

    fn check_curve(&self, spline: SplineId, curve: usize) -> Result<&'static dyn Interpolator> {
        let data = self.spline(spline)?;
        if curve >= data.curve_count() {
            return Err(ArgumentError::CurveIndexOutOfRange {
                index: curve,
                count: data.curve_count(),
            }
            .into());
        }
        Ok(data.mode.interpolator())
    }

    /// World position at global parameter `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn position(&self, spline: SplineId, t: f64) -> Result<Point3> {
        let (curve, t) = self.curve_index(spline, t)?;
        self.position_on_curve(spline, t, curve)
    }

    /// World position at local parameter `t` of `curve`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `curve` is out of range.
    pub fn position_on_curve(&self, spline: SplineId, t: f64, curve: usize) -> Result<Point3> {
        self.check_curve(spline, curve)?.position(self, spline, t, curve)
    }

    /// Position at global parameter `t` in the spline's origin frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn local_position(&self, spline: SplineId, t: f64) -> Result<Point3> {
        let origin = self.spline(spline)?.origin;
        Ok(origin.inverse_transform_point(&self.position(spline, t)?))
    }

    /// Position at local parameter `t` of `curve` in the spline's origin frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `curve` is out of range.
    pub fn local_position_on_curve(&self, spline: SplineId, t: f64, curve: usize) -> Result<Point3> {
        let origin = self.spline(spline)?.origin;
        Ok(origin.inverse_transform_point(&self.position_on_curve(spline, t, curve)?))
    }

    /// Derivative of the position with respect to the curve-local parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn velocity(&self, spline: SplineId, t: f64) -> Result<Vector3> {
        let (curve, t) = self.curve_index(spline, t)?;
        self.velocity_on_curve(spline, t, curve)
    }

    /// Velocity at local parameter `t` of `curve`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `curve` is out of range.
    pub fn velocity_on_curve(&self, spline: SplineId, t: f64, curve: usize) -> Result<Vector3> {
        self.check_curve(spline, curve)?.velocity(self, spline, t, curve)
    }

    /// Unit tangent at global parameter `t`; zero where the curve stalls.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn direction(&self, spline: SplineId, t: f64) -> Result<Vector3> {
        let (curve, t) = self.curve_index(spline, t)?;
        self.direction_on_curve(spline, t, curve)
    }

    /// Unit tangent at local parameter `t` of `curve`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `curve` is out of range.
    pub fn direction_on_curve(&self, spline: SplineId, t: f64, curve: usize) -> Result<Vector3> {
        self.check_curve(spline, curve)?.direction(self, spline, t, curve)
    }

    /// Twist angle at global parameter `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn twist_angle(&self, spline: SplineId, t: f64) -> Result<f64> {
        let (curve, t) = self.curve_index(spline, t)?;
        self.twist_angle_on_curve(spline, t, curve)
    }

    /// Twist angle at local parameter `t` of `curve`.
    ///
    /// The angle is held at the start point's value over `[0, t1(start)]`,
    /// at the end point's value over `[1 - t0(end), 1]`, and interpolated
    /// linearly in between.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `curve` is out of range.
    pub fn twist_angle_on_curve(&self, spline: SplineId, t: f64, curve: usize) -> Result<f64> {
        self.check_curve(spline, curve)?;
        let start = self.point_at(spline, curve)?.data.twist;
        let end = self.point_at(spline, curve + 1)?.data.twist;

        let hold_start = start.t1.clamp(0.0, 1.0);
        let hold_end = 1.0 - end.t0.clamp(0.0, 1.0);
        let s = if t <= hold_start {
            0.0
        } else if t >= hold_end {
            1.0
        } else {
            ((t - hold_start) / (hold_end - hold_start)).clamp(0.0, 1.0)
        };
        trace!(curve, t, s, "twist remapped");
        Ok(start.angle + (end.angle - start.angle) * s)
    }
}

fn check_ctrl(ctrl: usize) -> Result<()> {
    if ctrl < 2 {
        Ok(())
    } else {
        Err(ArgumentError::CtrlPointIndexOutOfRange { index: ctrl }.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn straight(net: &mut SplineNetwork, count: usize) -> SplineId {
        #[allow(clippy::cast_precision_loss)]
        let positions: Vec<Point3> = (0..count)
            .map(|i| Point3::new(0.0, 0.0, 3.0 * i as f64))
            .collect();
        net.add_spline(&positions, InterpolationMode::Bezier).unwrap()
    }

    #[test]
    fn curve_count_is_points_minus_one() {
        let mut net = SplineNetwork::new();
        let s = straight(&mut net, 4);
        let data = net.spline(s).unwrap();
        assert_eq!(data.points_count(), 4);
        assert_eq!(data.curve_count(), 3);
    }

    #[test]
    fn curve_index_splits_global_parameter() {
        let mut net = SplineNetwork::new();
        let s = straight(&mut net, 4);
        let (curve, t) = net.curve_index(s, 0.5).unwrap();
        assert_eq!(curve, 1);
        assert_relative_eq!(t, 0.5, epsilon = 1e-12);
        assert_eq!(net.curve_index(s, 1.0).unwrap(), (2, 1.0));
        assert_eq!(net.curve_index(s, -3.0).unwrap(), (0, 0.0));
    }

    #[test]
    fn global_and_local_evaluation_agree() {
        for mode in [InterpolationMode::Bezier, InterpolationMode::CatmullRom] {
            let mut net = SplineNetwork::new();
            let s = net
                .add_spline(
                    &[
                        Point3::new(0.0, 0.0, 0.0),
                        Point3::new(2.0, 1.0, 3.0),
                        Point3::new(-1.0, 0.0, 5.0),
                    ],
                    mode,
                )
                .unwrap();
            for t in [0.0, 0.2, 0.5, 0.77, 1.0] {
                let (curve, local) = net.curve_index(s, t).unwrap();
                assert_relative_eq!(
                    net.position(s, t).unwrap(),
                    net.position_on_curve(s, local, curve).unwrap(),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn curve_index_out_of_range_is_an_error() {
        let mut net = SplineNetwork::new();
        let s = straight(&mut net, 2);
        assert!(net.position_on_curve(s, 0.5, 1).is_err());
        assert!(net.ctrl_point_position(s, 0, 2).is_err());
    }

    #[test]
    fn t_at_points() {
        let mut net = SplineNetwork::new();
        let s = straight(&mut net, 5);
        assert_relative_eq!(net.t_at(s, 0).unwrap(), 0.0);
        assert_relative_eq!(net.t_at(s, 2).unwrap(), 0.5);
        assert_relative_eq!(net.t_at(s, 4).unwrap(), 1.0);
    }

    #[test]
    fn moving_a_point_carries_its_handles() {
        let mut net = SplineNetwork::new();
        let s = straight(&mut net, 2);
        let before = net.ctrl_point_position(s, 0, 1).unwrap();
        net.set_point_position(s, 0, Point3::new(1.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(
            net.ctrl_point_position(s, 0, 1).unwrap(),
            before + Vector3::x(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn local_position_is_relative_to_origin() {
        let mut net = SplineNetwork::new();
        let s = straight(&mut net, 2);
        net.spline_mut(s).unwrap().origin = Isometry3::translation(10.0, 0.0, 0.0);
        assert_relative_eq!(
            net.point_local_position(s, 1).unwrap(),
            Point3::new(-10.0, 0.0, 3.0),
            epsilon = 1e-12
        );
        net.set_point_local_position(s, 1, Point3::new(0.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(
            net.point_position(s, 1).unwrap(),
            Point3::new(10.0, 1.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn twist_angle_sets_roll() {
        let mut net = SplineNetwork::new();
        let s = straight(&mut net, 2);
        net.set_point_twist_angle(s, 0, 90.0).unwrap();
        let rotation = net.point_rotation(s, 0).unwrap();
        assert_relative_eq!(rotation * Vector3::x(), Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(net.point_twist(s, 0).unwrap().angle, 90.0);
    }

    #[test]
    fn twist_holds_near_end_points() {
        let mut net = SplineNetwork::new();
        let s = straight(&mut net, 2);
        net.set_point_twist_angle(s, 1, 100.0).unwrap();
        net.set_point_twist_t1(s, 0, 0.25).unwrap();
        net.set_point_twist_t0(s, 1, 0.25).unwrap();
        assert_relative_eq!(net.twist_angle(s, 0.1).unwrap(), 0.0);
        assert_relative_eq!(net.twist_angle(s, 0.5).unwrap(), 50.0, epsilon = 1e-9);
        assert_relative_eq!(net.twist_angle(s, 0.9).unwrap(), 100.0);
    }

    #[test]
    fn twist_regions_never_overlap() {
        let mut net = SplineNetwork::new();
        let s = straight(&mut net, 3);
        net.set_point_twist_t1(s, 0, 0.7).unwrap();
        net.set_point_twist_t0(s, 1, 0.6).unwrap();
        assert_relative_eq!(net.point_twist(s, 0).unwrap().t1, 0.4, epsilon = 1e-12);
        net.set_point_twist_t1(s, 1, 2.0).unwrap();
        assert_relative_eq!(net.point_twist(s, 1).unwrap().t1, 1.0);
        assert_relative_eq!(net.point_twist(s, 2).unwrap().t0, 0.0);
    }

    fn joined(net: &mut SplineNetwork) -> (SplineId, SplineId) {
        let a = straight(net, 3);
        let b = straight(net, 3);
        let j = net.add_junction(Point3::new(0.0, 0.0, 3.0), UnitQuaternion::identity());
        net.junction_connect(j, a, 1).unwrap();
        net.junction_connect(j, b, 1).unwrap();
        (a, b)
    }

    #[test]
    fn canonical_mode_reaches_every_connection() {
        let mut net = SplineNetwork::new();
        let (a, b) = joined(&mut net);
        net.set_point_mode(a, 1, PointMode::Mirrored).unwrap();
        assert_eq!(net.point_mode(b, 1).unwrap(), PointMode::Mirrored);
    }

    #[test]
    fn non_canonical_mode_stays_local() {
        let mut net = SplineNetwork::new();
        let (a, b) = joined(&mut net);
        net.set_point_mode(b, 1, PointMode::Aligned).unwrap();
        assert_eq!(net.point_mode(b, 1).unwrap(), PointMode::Aligned);
        assert_eq!(net.point_mode(a, 1).unwrap(), PointMode::Free);
    }

    #[test]
    fn twist_is_clamped_and_shared_across_a_junction() {
        let mut net = SplineNetwork::new();
        let (a, b) = joined(&mut net);
        net.set_point_twist_t0(a, 2, 0.5).unwrap();
        net.set_point_twist_t1(b, 1, 1.5).unwrap();
        for s in [a, b] {
            assert_relative_eq!(net.point_twist(s, 1).unwrap().t1, 1.0);
            assert_relative_eq!(net.point_twist(s, 2).unwrap().t0, 0.0);
        }

        net.set_point_twist_t0(a, 1, -0.5).unwrap();
        net.set_point_twist_angle(a, 1, 45.0).unwrap();
        for s in [a, b] {
            let twist = net.point_twist(s, 1).unwrap();
            assert_relative_eq!(twist.t0, 0.0);
            assert_relative_eq!(twist.angle, 45.0);
        }
    }

    #[test]
    fn point_data_round_trips_through_setters() {
        let mut net = SplineNetwork::new();
        let s = straight(&mut net, 3);
        net.set_point_mode(s, 0, PointMode::Aligned).unwrap();
        net.set_point_twist_angle(s, 0, 30.0).unwrap();
        net.set_point_twist_t1(s, 0, 0.2).unwrap();
        let data = net.point_data(s, 0).unwrap();
        net.set_point_data(s, 2, &data).unwrap();
        let copy = net.point_data(s, 2).unwrap();
        assert_eq!(copy.mode, PointMode::Aligned);
        assert_relative_eq!(copy.twist.angle, 30.0);
        assert_relative_eq!(copy.twist.t1, 0.2);
    }

    #[test]
    fn catmull_rom_exposes_handles_only_at_ends() {
        let mut net = SplineNetwork::new();
        let s = straight(&mut net, 3);
        assert_eq!(net.ctrl_points_count(s, 1).unwrap(), 2);
        net.set_interpolation_mode(s, InterpolationMode::CatmullRom).unwrap();
        assert_eq!(net.ctrl_points_count(s, 0).unwrap(), 2);
        assert!(!net.has_control_points(s, 1).unwrap());
        assert_eq!(net.ctrl_points_count(s, 2).unwrap(), 2);
    }
}
