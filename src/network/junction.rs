use tracing::{debug, trace};

use crate::error::{ArgumentError, Result};
use crate::math::{Point3, UnitQuaternion};

use super::point::PointId;
use super::spline::SplineId;
use super::SplineNetwork;

slotmap::new_key_type! {
    /// Unique identifier for a junction in the network.
    pub struct JunctionId;
}

/// A spline point registered with a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub spline: SplineId,
    pub point_index: usize,
}

/// A shared point joining two or more splines.
///
/// Connection 0 is the canonical point: its rotation, mode and handle
/// geometry are what every other connection is kept in line with.
#[derive(Debug, Clone)]
pub struct JunctionData {
    pub position: Point3,
    pub rotation: UnitQuaternion,
    pub(crate) connections: Vec<PointId>,
}

impl JunctionData {
    #[must_use]
    pub fn new(position: Point3, rotation: UnitQuaternion) -> Self {
        Self {
            position,
            rotation,
            connections: Vec::new(),
        }
    }

    /// Number of connected points.
    #[must_use]
    pub fn connections_count(&self) -> usize {
        self.connections.len()
    }

    /// IDs of the connected points, in connection order.
    #[must_use]
    pub fn connected_points(&self) -> &[PointId] {
        &self.connections
    }
}

impl SplineNetwork {
    /// Inserts an unconnected junction and returns its ID.
    pub fn add_junction(&mut self, position: Point3, rotation: UnitQuaternion) -> JunctionId {
        let id = self.junctions.insert(JunctionData::new(position, rotation));
        debug!(?id, "junction created");
        id
    }

    /// Disconnects every point from the junction and removes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is not found.
    pub fn remove_junction(&mut self, id: JunctionId) -> Result<()> {
        self.junction_disconnect_all(id)?;
        self.junctions.remove(id);
        debug!(?id, "junction removed");
        Ok(())
    }

    /// Removes every junction with fewer than two connections.
    ///
    /// Returns the number of junctions removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a connected point is missing from the arena.
    pub fn prune_junctions(&mut self) -> Result<usize> {
        let degenerate: Vec<JunctionId> = self
            .junctions
            .iter()
            .filter(|(_, j)| j.connections.len() < 2)
            .map(|(id, _)| id)
            .collect();
        for id in &degenerate {
            self.remove_junction(*id)?;
        }
        Ok(degenerate.len())
    }

    /// Removes the junction if it no longer joins anything.
    pub(crate) fn collapse_junction(&mut self, id: JunctionId) -> Result<()> {
        if self.junction(id)?.connections.len() < 2 {
            self.remove_junction(id)?;
        }
        Ok(())
    }

    /// Resolves a connection to its spline and point index.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is missing or `connection` is out of range.
    pub fn junction_connection(&self, id: JunctionId, connection: usize) -> Result<Connection> {
        let junction = self.junction(id)?;
        let point = junction.connections.get(connection).ok_or(
            ArgumentError::ConnectionIndexOutOfRange {
                index: connection,
                count: junction.connections.len(),
            },
        )?;
        let point = self.point(*point)?;
        Ok(Connection {
            spline: point.spline,
            point_index: point.index,
        })
    }

    /// Every connection of the junction, resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction or one of its points is missing.
    pub fn junction_connections(&self, id: JunctionId) -> Result<Vec<Connection>> {
        (0..self.junction(id)?.connections.len())
            .map(|c| self.junction_connection(id, c))
            .collect()
    }

    /// Flow can leave the junction forward into this connection's spline.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is missing or `connection` is out of range.
    pub fn junction_is_out(&self, id: JunctionId, connection: usize) -> Result<bool> {
        let c = self.junction_connection(id, connection)?;
        Ok(c.point_index + 1 < self.spline(c.spline)?.points_count())
    }

    /// Flow can leave the junction backward into this connection's spline.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is missing or `connection` is out of range.
    pub fn junction_is_in(&self, id: JunctionId, connection: usize) -> Result<bool> {
        Ok(self.junction_connection(id, connection)?.point_index > 0)
    }

    /// Indices of all Out connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is missing.
    pub fn junction_outputs(&self, id: JunctionId) -> Result<Vec<usize>> {
        self.filter_connections(id, |net, c| net.junction_is_out(id, c))
    }

    /// Indices of all In connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is missing.
    pub fn junction_inputs(&self, id: JunctionId) -> Result<Vec<usize>> {
        self.filter_connections(id, |net, c| net.junction_is_in(id, c))
    }

    /// First Out connection, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is missing.
    pub fn junction_first_out(&self, id: JunctionId) -> Result<Option<usize>> {
        Ok(self.junction_outputs(id)?.first().copied())
    }

    /// First In connection, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is missing.
    pub fn junction_first_in(&self, id: JunctionId) -> Result<Option<usize>> {
        Ok(self.junction_inputs(id)?.first().copied())
    }

    fn filter_connections(
        &self,
        id: JunctionId,
        predicate: impl Fn(&Self, usize) -> Result<bool>,
    ) -> Result<Vec<usize>> {
        let mut matching = Vec::new();
        for c in 0..self.junction(id)?.connections.len() {
            if predicate(self, c)? {
                matching.push(c);
            }
        }
        Ok(matching)
    }

    /// Connects a spline point to the junction.
    ///
    /// The point is snapped onto the canonical connection before it is
    /// appended. Connecting an already connected point does nothing; a point
    /// that belonged to another junction leaves it, and that junction is
    /// removed if it is left with fewer than two connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction or spline is missing or `index` is out of range.
    pub fn junction_connect(&mut self, id: JunctionId, spline: SplineId, index: usize) -> Result<()> {
        let point = self.point_id(spline, index)?;
        if self.junction(id)?.connections.contains(&point) {
            return Ok(());
        }

        let previous = self.junction_of(point)?.filter(|p| *p != id);
        if let Some(previous) = previous {
            self.junction_mut(previous)?.connections.retain(|p| *p != point);
        }

        self.point_mut(point)?.data.junction = Some(id);
        let interpolator = self.spline(spline)?.mode.interpolator();
        interpolator.on_point_junction_changed(self, point)?;
        self.junction_mut(id)?.connections.push(point);
        trace!(junction = ?id, ?spline, index, "point connected");

        if let Some(previous) = previous {
            self.collapse_junction(previous)?;
        }
        Ok(())
    }

    /// Disconnects one spline point. Absent points are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction or spline is missing or `index` is out of range.
    pub fn junction_disconnect_point(&mut self, id: JunctionId, spline: SplineId, index: usize) -> Result<()> {
        let point = self.point_id(spline, index)?;
        let junction = self.junction_mut(id)?;
        if let Some(position) = junction.connections.iter().position(|p| *p == point) {
            junction.connections.remove(position);
            self.release_point(id, point)?;
        }
        Ok(())
    }

    /// Disconnects every point of `spline`.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is missing.
    pub fn junction_disconnect_spline(&mut self, id: JunctionId, spline: SplineId) -> Result<()> {
        let connections = self.junction(id)?.connections.clone();
        for point in connections.into_iter().rev() {
            if self.point(point)?.spline == spline {
                self.junction_mut(id)?.connections.retain(|p| *p != point);
                self.release_point(id, point)?;
            }
        }
        Ok(())
    }

    /// Disconnects every point.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is missing.
    pub fn junction_disconnect_all(&mut self, id: JunctionId) -> Result<()> {
        let connections = std::mem::take(&mut self.junction_mut(id)?.connections);
        for point in connections {
            self.release_point(id, point)?;
        }
        Ok(())
    }

    /// Clears the back-reference if it still points at `junction`.
    fn release_point(&mut self, junction: JunctionId, point: PointId) -> Result<()> {
        if let Some(p) = self.points.get_mut(point) {
            if p.data.junction == Some(junction) {
                p.data.junction = None;
            }
        }
        Ok(())
    }

    /// Moves the junction and every connected point, then lets each point's
    /// interpolator react.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is missing.
    pub fn set_junction_position(&mut self, id: JunctionId, position: Point3) -> Result<()> {
        let moved = self.move_junction(id, position)?;
        for point in moved {
            let interpolator = self.spline(self.point(point)?.spline)?.mode.interpolator();
            interpolator.on_point_position_changed(self, point)?;
        }
        Ok(())
    }

    /// Moves the junction and its points without reactions; returns the moved points.
    pub(crate) fn move_junction(&mut self, id: JunctionId, position: Point3) -> Result<Vec<PointId>> {
        let junction = self.junction_mut(id)?;
        junction.position = position;
        let connections = junction.connections.clone();
        for point in &connections {
            self.point_mut(*point)?.position = position;
        }
        Ok(connections)
    }

    /// Rotates the junction and every connected point.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is missing.
    pub fn set_junction_rotation(&mut self, id: JunctionId, rotation: UnitQuaternion) -> Result<()> {
        let junction = self.junction_mut(id)?;
        junction.rotation = rotation;
        let connections = junction.connections.clone();
        for point in connections {
            self.apply_rotation(point, rotation)?;
        }
        Ok(())
    }

    /// Pushes the transform of every junction point of `spline` onto its junction.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing.
    pub fn update_junctions(&mut self, spline: SplineId) -> Result<()> {
        let points = self.spline(spline)?.points.clone();
        for point in points {
            if let Some(j) = self.junction_of(point)? {
                let (position, rotation) = {
                    let p = self.point(point)?;
                    (p.position, p.rotation)
                };
                self.set_junction_position(j, position)?;
                self.set_junction_rotation(j, rotation)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::network::InterpolationMode;
    use approx::assert_relative_eq;

    fn two_splines() -> (SplineNetwork, SplineId, SplineId) {
        let mut net = SplineNetwork::new();
        let a = net
            .add_spline(
                &[
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(0.0, 0.0, 3.0),
                    Point3::new(0.0, 0.0, 6.0),
                ],
                InterpolationMode::Bezier,
            )
            .unwrap();
        let b = net
            .add_spline(
                &[Point3::new(5.0, 0.0, 0.0), Point3::new(5.0, 0.0, 3.0)],
                InterpolationMode::Bezier,
            )
            .unwrap();
        (net, a, b)
    }

    #[test]
    fn connect_is_idempotent() {
        let (mut net, a, b) = two_splines();
        let j = net.add_junction(Point3::origin(), UnitQuaternion::identity());
        net.junction_connect(j, a, 2).unwrap();
        net.junction_connect(j, b, 0).unwrap();
        net.junction_connect(j, b, 0).unwrap();
        assert_eq!(net.junction(j).unwrap().connections_count(), 2);
    }

    #[test]
    fn connecting_snaps_onto_canonical_point() {
        let (mut net, a, b) = two_splines();
        let j = net.add_junction(Point3::origin(), UnitQuaternion::identity());
        net.junction_connect(j, a, 2).unwrap();
        net.junction_connect(j, b, 0).unwrap();
        let canonical = net.point_at(a, 2).unwrap().clone();
        let joined = net.point_at(b, 0).unwrap();
        assert_relative_eq!(joined.position, canonical.position, epsilon = 1e-12);
        for ctrl in 0..2 {
            assert_relative_eq!(
                joined.ctrl_point_position(ctrl),
                canonical.ctrl_point_position(ctrl),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn in_out_classification() {
        let (mut net, a, b) = two_splines();
        let j = net.add_junction(Point3::origin(), UnitQuaternion::identity());
        net.junction_connect(j, a, 1).unwrap();
        net.junction_connect(j, b, 0).unwrap();
        net.junction_connect(j, b, 1).unwrap();
        assert!(net.junction_is_in(j, 0).unwrap() && net.junction_is_out(j, 0).unwrap());
        assert!(!net.junction_is_in(j, 1).unwrap() && net.junction_is_out(j, 1).unwrap());
        assert!(net.junction_is_in(j, 2).unwrap() && !net.junction_is_out(j, 2).unwrap());
        assert_eq!(net.junction_outputs(j).unwrap(), vec![0, 1]);
        assert_eq!(net.junction_inputs(j).unwrap(), vec![0, 2]);
        assert_eq!(net.junction_first_out(j).unwrap(), Some(0));
    }

    #[test]
    fn empty_junction_has_no_first_connection() {
        let (mut net, _, _) = two_splines();
        let j = net.add_junction(Point3::origin(), UnitQuaternion::identity());
        assert_eq!(net.junction_first_in(j).unwrap(), None);
        assert_eq!(net.junction_first_out(j).unwrap(), None);
    }

    #[test]
    fn disconnect_clears_back_reference() {
        let (mut net, a, b) = two_splines();
        let j = net.add_junction(Point3::origin(), UnitQuaternion::identity());
        net.junction_connect(j, a, 2).unwrap();
        net.junction_connect(j, b, 0).unwrap();
        net.junction_disconnect_point(j, b, 0).unwrap();
        assert_eq!(net.point_at(b, 0).unwrap().data.junction, None);
        net.junction_disconnect_point(j, b, 1).unwrap();
        assert_eq!(net.junction(j).unwrap().connections_count(), 1);
    }

    #[test]
    fn disconnect_spline_removes_all_of_its_points() {
        let (mut net, a, b) = two_splines();
        let j = net.add_junction(Point3::origin(), UnitQuaternion::identity());
        net.junction_connect(j, a, 2).unwrap();
        net.junction_connect(j, b, 0).unwrap();
        net.junction_connect(j, b, 1).unwrap();
        net.junction_disconnect_spline(j, b).unwrap();
        assert_eq!(net.junction_connections(j).unwrap(), vec![Connection { spline: a, point_index: 2 }]);
    }

    #[test]
    fn junction_position_moves_every_point() {
        let (mut net, a, b) = two_splines();
        let j = net.add_junction(Point3::origin(), UnitQuaternion::identity());
        net.junction_connect(j, a, 2).unwrap();
        net.junction_connect(j, b, 0).unwrap();
        let target = Point3::new(1.0, 2.0, 3.0);
        net.set_junction_position(j, target).unwrap();
        assert_relative_eq!(net.point_at(a, 2).unwrap().position, target);
        assert_relative_eq!(net.point_at(b, 0).unwrap().position, target);
    }

    #[test]
    fn moving_a_point_away_removes_a_lonely_junction() {
        let (mut net, a, b) = two_splines();
        let left = net.add_junction(Point3::origin(), UnitQuaternion::identity());
        net.junction_connect(left, a, 2).unwrap();
        net.junction_connect(left, b, 0).unwrap();
        let right = net.add_junction(Point3::origin(), UnitQuaternion::identity());
        net.junction_connect(right, a, 0).unwrap();

        net.junction_connect(right, b, 0).unwrap();
        assert!(!net.contains_junction(left));
        assert_eq!(net.point_at(a, 2).unwrap().data.junction, None);
        assert_eq!(net.point_at(b, 0).unwrap().data.junction, Some(right));
        assert_eq!(net.junction(right).unwrap().connections_count(), 2);
    }

    #[test]
    fn prune_drops_lonely_junctions() {
        let (mut net, a, _) = two_splines();
        let j = net.add_junction(Point3::origin(), UnitQuaternion::identity());
        net.junction_connect(j, a, 0).unwrap();
        assert_eq!(net.prune_junctions().unwrap(), 1);
        assert!(!net.contains_junction(j));
        assert_eq!(net.point_at(a, 0).unwrap().data.junction, None);
    }
}
