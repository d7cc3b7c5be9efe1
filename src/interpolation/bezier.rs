use tracing::trace;

use crate::error::Result;
use crate::math::curve::{bezier, bezier_derivative};
use crate::math::rotation::twisted_look_rotation;
use crate::math::{points_eq, Point3, UnitQuaternion, Vector3, TOLERANCE};
use crate::network::{ControlPoint, PointId, PointMode, SplineData, SplineId, SplineNetwork};

use super::Interpolator;

/// Cubic Bezier through each point and its tangent handles.
///
/// Curve `i` runs over point `i`, handle 1 of point `i`, handle 0 of point
/// `i + 1` and point `i + 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BezierInterpolator;

impl BezierInterpolator {
    fn control_polygon(net: &SplineNetwork, spline: SplineId, curve: usize) -> Result<[Point3; 4]> {
        let start = net.point_at(spline, curve)?;
        let end = net.point_at(spline, curve + 1)?;
        Ok([
            start.position,
            start.ctrl_point_position(1),
            end.ctrl_point_position(0),
            end.position,
        ])
    }
}

impl Interpolator for BezierInterpolator {
    fn position(&self, net: &SplineNetwork, spline: SplineId, t: f64, curve: usize) -> Result<Point3> {
        let [p0, p1, p2, p3] = Self::control_polygon(net, spline, curve)?;
        Ok(bezier(&p0, &p1, &p2, &p3, t))
    }

    fn velocity(&self, net: &SplineNetwork, spline: SplineId, t: f64, curve: usize) -> Result<Vector3> {
        let [p0, p1, p2, p3] = Self::control_polygon(net, spline, curve)?;
        Ok(bezier_derivative(&p0, &p1, &p2, &p3, t))
    }

    fn ctrl_points_count(&self, _spline: &SplineData, _index: usize) -> usize {
        2
    }

    fn on_point_position_changed(&self, _net: &mut SplineNetwork, _point: PointId) -> Result<()> {
        Ok(())
    }

    fn on_point_mode_changed(&self, net: &mut SplineNetwork, point: PointId) -> Result<()> {
        force_ctrl_point_mode(net, point, 0, false)?;
        force_junction_connections(net, point)
    }

    fn on_ctrl_point_position_changed(
        &self,
        net: &mut SplineNetwork,
        point: PointId,
        ctrl: usize,
        dragging: bool,
    ) -> Result<()> {
        if !dragging {
            face_tangent(net, point, ctrl)?;
        }
        force_ctrl_point_mode(net, point, ctrl, dragging)?;
        force_junction_connections(net, point)
    }

    fn on_point_junction_changed(&self, net: &mut SplineNetwork, point: PointId) -> Result<()> {
        snap_to_junction(net, point)
    }

    fn on_point_inserted(&self, net: &mut SplineNetwork, point: PointId) -> Result<()> {
        seed_from_neighbor(net, point, false)
    }
}

/// Re-derives the point rotation from the tangent defined by handle `ctrl`.
///
/// Handle 0 looks along `point - handle`. Handle 1 only re-derives the
/// rotation of a spline's first point, looking along `point - handle 0`.
/// The twist angle is applied as a roll; both handles keep their world positions.
pub(crate) fn face_tangent(net: &mut SplineNetwork, id: PointId, ctrl: usize) -> Result<()> {
    let (to_point, to_opposite, first, twist) = {
        let point = net.point(id)?;
        (
            point.position - point.ctrl_point_position(ctrl),
            point.position - point.ctrl_point_position(ControlPoint::twin_index(ctrl)),
            point.index == 0,
            point.data.twist.angle,
        )
    };

    let forward = if to_point.norm() < TOLERANCE {
        trace!(?id, ctrl, "handle on top of its point, rotation reset");
        return net.rotate_point_keeping_handles(id, UnitQuaternion::identity());
    } else if ctrl == 0 {
        to_point
    } else if first && to_opposite.norm() >= TOLERANCE {
        to_opposite
    } else {
        return Ok(());
    };

    match twisted_look_rotation(twist, &forward, &Vector3::y()) {
        Some(rotation) => net.rotate_point_keeping_handles(id, rotation),
        None => Ok(()),
    }
}

/// Places the opposite handle according to the point's mode.
///
/// `Free` is only enforced (as a mirror) at a spline endpoint with no
/// junction. `Aligned` keeps the opposite handle's distance, `Mirrored`
/// reflects the edited handle through the point.
pub(crate) fn force_ctrl_point_mode(net: &mut SplineNetwork, id: PointId, ctrl: usize, dragging: bool) -> Result<()> {
    let twin = ControlPoint::twin_index(ctrl);
    let (position, handle, opposite, mode, enforce) = {
        let point = net.point(id)?;
        let loose_end = net.spline(point.spline)?.is_endpoint(point.index) && net.junction_of(id)?.is_none();
        (
            point.position,
            point.ctrl_point_position(ctrl),
            point.ctrl_point_position(twin),
            point.data.mode,
            point.data.mode != PointMode::Free || loose_end,
        )
    };
    if !enforce {
        return Ok(());
    }

    let tangent = handle - position;
    if tangent.norm() < TOLERANCE {
        return Ok(());
    }
    let target = match mode {
        PointMode::Aligned => position - tangent.normalize() * (position - opposite).norm(),
        PointMode::Free | PointMode::Mirrored => position - tangent,
    };
    if points_eq(&target, &opposite) {
        return Ok(());
    }

    net.point_mut(id)?.place_ctrl_point(twin, &target);
    if !dragging {
        face_tangent(net, id, twin)?;
    }
    Ok(())
}

/// Copies the point's rotation, position and handles onto every other
/// connection of its junction.
pub(crate) fn force_junction_connections(net: &mut SplineNetwork, id: PointId) -> Result<()> {
    let group = net.junction_group(id)?;
    if group.len() <= 1 {
        return Ok(());
    }
    let (position, rotation, handles) = {
        let point = net.point(id)?;
        (
            point.position,
            point.rotation,
            [point.ctrl_point_position(0), point.ctrl_point_position(1)],
        )
    };

    let mut moved = Vec::new();
    for other in group.into_iter().skip(1) {
        if !points_eq(&net.point(other)?.position, &position) {
            moved.push(other);
        }
        net.apply_rotation(other, rotation)?;
        let point = net.point_mut(other)?;
        point.position = position;
        for (ctrl, handle) in handles.iter().enumerate() {
            point.place_ctrl_point(ctrl, handle);
        }
    }
    if let Some(junction) = net.junction_of(id)? {
        let junction = net.junction_mut(junction)?;
        junction.position = position;
        junction.rotation = rotation;
    }
    net.react_to_moves(&moved)
}

/// Snaps a freshly attached point onto the junction's canonical connection.
pub(crate) fn snap_to_junction(net: &mut SplineNetwork, id: PointId) -> Result<()> {
    let Some(junction) = net.junction_of(id)? else {
        return Ok(());
    };
    let Some(canonical) = net.junction(junction)?.connected_points().first().copied() else {
        return Ok(());
    };
    let (position, rotation, handles) = {
        let reference = net.point(canonical)?;
        (
            reference.position,
            reference.rotation,
            [reference.ctrl_point_position(0), reference.ctrl_point_position(1)],
        )
    };

    net.apply_rotation(id, rotation)?;
    let point = net.point_mut(id)?;
    point.position = position;
    for (ctrl, handle) in handles.iter().enumerate() {
        point.place_ctrl_point(ctrl, handle);
    }
    net.react_to_moves(&[id])
}

/// Gives a new first or last point the mode, twist and handle lengths of
/// its neighbor. `unit_handles` replaces the copied lengths with 1.
pub(crate) fn seed_from_neighbor(net: &mut SplineNetwork, id: PointId, unit_handles: bool) -> Result<()> {
    let (spline, index) = {
        let point = net.point(id)?;
        (point.spline, point.index)
    };
    let count = net.spline(spline)?.points_count();
    let neighbor = match index {
        _ if count <= 1 => return Ok(()),
        0 => 1,
        i if i + 1 == count => i - 1,
        _ => return net.react_to_moves(&[id]),
    };

    let (lengths, data) = {
        let source = net.point_at(spline, neighbor)?;
        let lengths = if unit_handles {
            [1.0, 1.0]
        } else {
            [0, 1].map(|ctrl| (source.ctrl_point_position(ctrl) - source.position).norm())
        };
        (lengths, source.data.detached())
    };

    let point = net.point_mut(id)?;
    point.ctrl_points[0].offset = -Vector3::z() * lengths[0];
    point.ctrl_points[1].offset = Vector3::z() * lengths[1];
    net.set_point_data(spline, index, &data)?;
    net.react_to_moves(&[id])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::network::InterpolationMode;
    use approx::assert_relative_eq;

    fn line() -> (SplineNetwork, SplineId) {
        let mut net = SplineNetwork::new();
        let s = net
            .add_spline(
                &[
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(0.0, 0.0, 3.0),
                    Point3::new(0.0, 0.0, 6.0),
                ],
                InterpolationMode::Bezier,
            )
            .unwrap();
        (net, s)
    }

    #[test]
    fn curve_passes_through_points() {
        let (net, s) = line();
        assert_relative_eq!(net.position_on_curve(s, 0.0, 0).unwrap(), Point3::origin());
        assert_relative_eq!(net.position_on_curve(s, 1.0, 1).unwrap(), Point3::new(0.0, 0.0, 6.0));
    }

    #[test]
    fn mirrored_reflects_edited_handle() {
        let (mut net, s) = line();
        net.set_point_mode(s, 1, PointMode::Mirrored).unwrap();
        let handle = Point3::new(1.0, 0.5, 4.0);
        net.set_ctrl_point_position(s, 1, 1, handle).unwrap();
        let point = net.point_position(s, 1).unwrap();
        assert_relative_eq!(
            net.ctrl_point_position(s, 1, 0).unwrap(),
            point - (handle - point),
            epsilon = 1e-9
        );
        assert_relative_eq!(net.ctrl_point_position(s, 1, 1).unwrap(), handle, epsilon = 1e-9);
    }

    #[test]
    fn aligned_keeps_opposite_distance() {
        let (mut net, s) = line();
        net.set_point_mode(s, 1, PointMode::Aligned).unwrap();
        let point = net.point_position(s, 1).unwrap();
        let before = (net.ctrl_point_position(s, 1, 0).unwrap() - point).norm();
        let handle = Point3::new(2.0, 0.0, 5.0);
        net.set_ctrl_point_position(s, 1, 1, handle).unwrap();
        let opposite = net.ctrl_point_position(s, 1, 0).unwrap() - point;
        assert_relative_eq!(opposite.norm(), before, epsilon = 1e-9);
        assert_relative_eq!(opposite.normalize(), -(handle - point).normalize(), epsilon = 1e-9);
    }

    #[test]
    fn free_interior_handles_are_independent() {
        let (mut net, s) = line();
        let before = net.ctrl_point_position(s, 1, 0).unwrap();
        net.drag_ctrl_point_position(s, 1, 1, Point3::new(3.0, 0.0, 3.0)).unwrap();
        assert_relative_eq!(net.ctrl_point_position(s, 1, 0).unwrap(), before, epsilon = 1e-9);
    }

    #[test]
    fn free_loose_end_mirrors() {
        let (mut net, s) = line();
        net.set_ctrl_point_position(s, 0, 1, Point3::new(0.0, 2.0, 0.0)).unwrap();
        assert_relative_eq!(
            net.ctrl_point_position(s, 0, 0).unwrap(),
            Point3::new(0.0, -2.0, 0.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn handle_edit_turns_point_towards_tangent() {
        let (mut net, s) = line();
        net.set_ctrl_point_position(s, 1, 0, Point3::new(-1.0, 0.0, 3.0)).unwrap();
        let rotation = net.point_rotation(s, 1).unwrap();
        assert_relative_eq!(rotation * Vector3::z(), Vector3::x(), epsilon = 1e-9);
        assert_relative_eq!(
            net.ctrl_point_position(s, 1, 0).unwrap(),
            Point3::new(-1.0, 0.0, 3.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn dragging_leaves_rotation_alone() {
        let (mut net, s) = line();
        net.drag_ctrl_point_position(s, 1, 0, Point3::new(-1.0, 0.0, 3.0)).unwrap();
        assert_relative_eq!(net.point_rotation(s, 1).unwrap(), UnitQuaternion::identity());
    }

    #[test]
    fn handle_edit_reaches_junction_partners() {
        let (mut net, a) = line();
        let b = net
            .add_spline(
                &[Point3::new(4.0, 0.0, 3.0), Point3::new(8.0, 0.0, 3.0)],
                InterpolationMode::Bezier,
            )
            .unwrap();
        let j = net.add_junction(Point3::new(0.0, 0.0, 3.0), UnitQuaternion::identity());
        net.junction_connect(j, a, 1).unwrap();
        net.junction_connect(j, b, 0).unwrap();
        let handle = Point3::new(0.5, 1.0, 4.0);
        net.set_ctrl_point_position(a, 1, 1, handle).unwrap();
        assert_relative_eq!(net.ctrl_point_position(b, 0, 1).unwrap(), handle, epsilon = 1e-9);
        assert_relative_eq!(net.point_position(b, 0).unwrap(), Point3::new(0.0, 0.0, 3.0), epsilon = 1e-9);
    }
}
