use std::collections::{HashSet, VecDeque};

use tracing::trace;

use crate::error::Result;
use crate::math::curve::{catmull_rom, catmull_rom_derivative};
use crate::math::rotation::twisted_look_rotation;
use crate::math::{Point3, Vector3};
use crate::network::{JunctionId, PointId, SplineData, SplineId, SplineNetwork};

use super::bezier::{force_ctrl_point_mode, force_junction_connections, face_tangent, seed_from_neighbor, snap_to_junction};
use super::Interpolator;

/// Rotation updates stop this many points away from the edit.
const PROPAGATION_REACH: isize = 3;

/// Catmull-Rom through the spline points.
///
/// The outer control points of curve `i` are its flanking points. At a
/// spline end the endpoint's outer handle stands in; at a junction the
/// average of the neighboring points across every In (before) or Out
/// (after) connection is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatmullRomInterpolator;

impl CatmullRomInterpolator {
    fn control_points(net: &SplineNetwork, spline: SplineId, curve: usize) -> Result<[Point3; 4]> {
        let data = net.spline(spline)?;
        let last = data.points_count() - 1;
        let start = net.point_id(spline, curve)?;
        let end = net.point_id(spline, curve + 1)?;

        let p0 = match net.junction_of(start)? {
            Some(junction) => Self::junction_anchor(net, junction, false)?,
            None if curve > 0 => Some(net.point_position(spline, curve - 1)?),
            None => None,
        };
        let p0 = match p0 {
            Some(p) => p,
            None => net.ctrl_point_position(spline, 0, 0)?,
        };

        let p3 = match net.junction_of(end)? {
            Some(junction) => Self::junction_anchor(net, junction, true)?,
            None if curve + 2 <= last => Some(net.point_position(spline, curve + 2)?),
            None => None,
        };
        let p3 = match p3 {
            Some(p) => p,
            None => net.ctrl_point_position(spline, last, 1)?,
        };

        Ok([p0, net.point(start)?.position, net.point(end)?.position, p3])
    }

    /// Average of the points one step past the junction, along every Out
    /// (`forward`) or In connection.
    #[allow(clippy::cast_precision_loss)]
    fn junction_anchor(net: &SplineNetwork, junction: JunctionId, forward: bool) -> Result<Option<Point3>> {
        let mut sum = Vector3::zeros();
        let mut count = 0usize;
        for connection in net.junction_connections(junction)? {
            let neighbor = if forward {
                let next = connection.point_index + 1;
                (next < net.spline(connection.spline)?.points_count()).then_some(next)
            } else {
                connection.point_index.checked_sub(1)
            };
            if let Some(index) = neighbor {
                sum += net.point_position(connection.spline, index)?.coords;
                count += 1;
            }
        }
        Ok((count > 0).then(|| Point3::from(sum / count as f64)))
    }
}

impl Interpolator for CatmullRomInterpolator {
    fn position(&self, net: &SplineNetwork, spline: SplineId, t: f64, curve: usize) -> Result<Point3> {
        let [p0, p1, p2, p3] = Self::control_points(net, spline, curve)?;
        Ok(catmull_rom(&p0, &p1, &p2, &p3, t))
    }

    fn velocity(&self, net: &SplineNetwork, spline: SplineId, t: f64, curve: usize) -> Result<Vector3> {
        let [p0, p1, p2, p3] = Self::control_points(net, spline, curve)?;
        Ok(catmull_rom_derivative(&p0, &p1, &p2, &p3, t))
    }

    fn ctrl_points_count(&self, spline: &SplineData, index: usize) -> usize {
        if spline.is_endpoint(index) {
            2
        } else {
            0
        }
    }

    fn on_point_position_changed(&self, net: &mut SplineNetwork, point: PointId) -> Result<()> {
        face_curve_around(net, point)
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
        seed_from_neighbor(net, point, true)
    }
}

/// A point whose rotation must be re-derived from the curve tangent.
#[derive(Debug, Clone, Copy)]
struct Visit {
    spline: SplineId,
    index: isize,
    /// Signed distance (in points) from the edited point.
    offset: isize,
    /// Walk direction along the spline: +1 or -1.
    step: isize,
}

/// Turns the points around `id` to face the curve tangent.
///
/// Walks forward from the point and backward from its predecessor, up to
/// two points away, hopping across junctions (In connections when walking
/// backward, Out connections when walking forward).
fn face_curve_around(net: &mut SplineNetwork, id: PointId) -> Result<()> {
    let (spline, index) = {
        let point = net.point(id)?;
        (point.spline, to_signed(point.index))
    };
    let mut queue = VecDeque::from([
        Visit { spline, index, offset: 0, step: 1 },
        Visit { spline, index: index - 1, offset: -1, step: -1 },
    ]);
    let mut visited: HashSet<(PointId, isize)> = HashSet::new();

    while let Some(visit) = queue.pop_front() {
        if visit.offset.abs() >= PROPAGATION_REACH || !net.contains_spline(visit.spline) {
            continue;
        }
        let Ok(index) = usize::try_from(visit.index) else {
            continue;
        };
        let Ok(point) = net.point_id(visit.spline, index) else {
            continue;
        };
        if !visited.insert((point, visit.step)) {
            continue;
        }

        face_curve(net, visit.spline, index, point)?;

        if let Some(junction) = net.junction_of(point)? {
            for connection in net.junction_connections(junction)? {
                let is_self = connection.spline == visit.spline && connection.point_index == index;
                let connected = to_signed(connection.point_index);
                let count = net.spline(connection.spline)?.points_count();
                let is_in = connection.point_index > 0;
                let is_out = connection.point_index + 1 < count;
                match visit.offset {
                    0 if !is_self => {
                        if is_in {
                            queue.push_back(Visit { spline: connection.spline, index: connected - 1, offset: -1, step: -1 });
                        }
                        if is_out {
                            queue.push_back(Visit { spline: connection.spline, index: connected + 1, offset: 1, step: 1 });
                        }
                    }
                    o if o < 0 && is_in => {
                        queue.push_back(Visit { spline: connection.spline, index: connected - 1, offset: o - 1, step: -1 });
                    }
                    o if o > 0 && is_out => {
                        queue.push_back(Visit { spline: connection.spline, index: connected + 1, offset: o + 1, step: 1 });
                    }
                    _ => {}
                }
            }
        }

        queue.push_back(Visit {
            spline: visit.spline,
            index: visit.index + visit.step,
            offset: visit.offset + visit.step,
            step: visit.step,
        });
    }
    Ok(())
}

/// Rotates one point to look along the curve leaving it (or arriving at it, for the last point).
fn face_curve(net: &mut SplineNetwork, spline: SplineId, index: usize, point: PointId) -> Result<()> {
    let curves = net.spline(spline)?.curve_count();
    let direction = if index < curves {
        net.direction_on_curve(spline, 0.0, index)?
    } else {
        net.direction_on_curve(spline, 1.0, curves - 1)?
    };
    let twist = net.point(point)?.data.twist.angle;
    match twisted_look_rotation(twist, &direction, &Vector3::y()) {
        Some(rotation) => net.rotate_point(point, rotation),
        None => {
            trace!(?spline, index, "stalled tangent, rotation kept");
            Ok(())
        }
    }
}

#[allow(clippy::cast_possible_wrap)]
fn to_signed(index: usize) -> isize {
    index as isize
}
